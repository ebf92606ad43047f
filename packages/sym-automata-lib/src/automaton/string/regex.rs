/// Parser for the regular expressions accepted by
/// [super::StringAutomaton::make_regex].
///
/// Operators, from loosest to tightest binding:
/// ```text
/// a|b        union
/// a&b        intersection
/// ab         concatenation
/// a* a+ a?   repetition, also a{n}, a{n,} and a{n,m}
/// ~a         complement
/// ```
/// Atoms are single characters, `\x` escapes, `"..."` literals, character
/// classes such as `[a-z0-9]` or `[^ ]`, `.` for any character, `()` for the
/// empty string, `#` for the empty language, `@` for any string, and
/// parenthesized expressions.
use anyhow::bail;
use nom::{
    Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{anychar, char, digit1, none_of},
    combinator::{all_consuming, map, opt, value, verify},
    error::ParseError,
    multi::{many0, many1},
    sequence::{delimited, preceded},
};

use crate::error::AutomatonError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    Union(Box<Regex>, Box<Regex>),
    Intersection(Box<Regex>, Box<Regex>),
    Complement(Box<Regex>),
    Concat(Box<Regex>, Box<Regex>),
    Optional(Box<Regex>),
    Star(Box<Regex>),
    Plus(Box<Regex>),
    RepeatMin(Box<Regex>, u32),
    RepeatRange(Box<Regex>, u32, u32),
    Char(u8),
    Class(CharClass),
    AnyChar,
    EmptyString,
    EmptyLanguage,
    AnyString,
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub ranges: Vec<(u8, u8)>,
    pub negated: bool,
}

const META: &str = "|&~*+?{}()[].#@\"\\";

pub fn parse(pattern: &str) -> anyhow::Result<Regex> {
    if pattern.is_empty() {
        return Ok(Regex::EmptyString);
    }

    match all_consuming(union::<nom::error::Error<&str>>).parse(pattern) {
        Ok((_, regex)) => Ok(regex),
        Err(e) => bail!(AutomatonError::RegexSyntax {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }),
    }
}

fn char_regex(c: char) -> Regex {
    if c.is_ascii() {
        Regex::Char(c as u8)
    } else {
        Regex::Literal(c.to_string())
    }
}

fn number<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, u32, E> {
    let (rest, digits) = digit1(input)?;
    match digits.parse::<u32>() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Failure(E::from_error_kind(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

fn union<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    let (input, first) = intersection(input)?;
    let (input, rest) = many0(preceded(char('|'), intersection)).parse(input)?;
    let regex = rest
        .into_iter()
        .fold(first, |acc, r| Regex::Union(Box::new(acc), Box::new(r)));
    Ok((input, regex))
}

fn intersection<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    let (input, first) = concatenation(input)?;
    let (input, rest) = many0(preceded(char('&'), concatenation)).parse(input)?;
    let regex = rest
        .into_iter()
        .fold(first, |acc, r| Regex::Intersection(Box::new(acc), Box::new(r)));
    Ok((input, regex))
}

fn concatenation<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    let (input, parts) = many1(repetition).parse(input)?;
    let mut parts = parts.into_iter();
    let first = match parts.next() {
        Some(first) => first,
        None => return Err(nom::Err::Error(E::from_error_kind(input, nom::error::ErrorKind::Many1))),
    };
    let regex = parts.fold(first, |acc, r| Regex::Concat(Box::new(acc), Box::new(r)));
    Ok((input, regex))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Postfix {
    Star,
    Plus,
    Optional,
    Exactly(u32),
    AtLeast(u32),
    Between(u32, u32),
}

fn bounds<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Postfix, E> {
    let (input, min) = number(input)?;
    let (input, tail) = opt(preceded(char(','), opt(number))).parse(input)?;
    let postfix = match tail {
        None => Postfix::Exactly(min),
        Some(None) => Postfix::AtLeast(min),
        Some(Some(max)) => Postfix::Between(min, max),
    };
    Ok((input, postfix))
}

fn postfix<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Postfix, E> {
    alt((
        value(Postfix::Star, char('*')),
        value(Postfix::Plus, char('+')),
        value(Postfix::Optional, char('?')),
        delimited(char('{'), bounds, char('}')),
    ))
    .parse(input)
}

#[test]
fn test_bounds() {
    let (_, p) = postfix::<nom::error::Error<&str>>("{3}").unwrap();
    assert_eq!(p, Postfix::Exactly(3));
    let (_, p) = postfix::<nom::error::Error<&str>>("{2,}").unwrap();
    assert_eq!(p, Postfix::AtLeast(2));
    let (_, p) = postfix::<nom::error::Error<&str>>("{2,5}").unwrap();
    assert_eq!(p, Postfix::Between(2, 5));
}

fn repetition<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    let (input, base) = complement(input)?;
    let (input, postfixes) = many0(postfix).parse(input)?;
    let regex = postfixes.into_iter().fold(base, |acc, p| {
        let acc = Box::new(acc);
        match p {
            Postfix::Star => Regex::Star(acc),
            Postfix::Plus => Regex::Plus(acc),
            Postfix::Optional => Regex::Optional(acc),
            Postfix::Exactly(n) => Regex::RepeatRange(acc, n, n),
            Postfix::AtLeast(n) => Regex::RepeatMin(acc, n),
            Postfix::Between(min, max) => Regex::RepeatRange(acc, min, max),
        }
    });
    Ok((input, regex))
}

fn complement<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    alt((
        map(preceded(char('~'), complement), |r| Regex::Complement(Box::new(r))),
        atom,
    ))
    .parse(input)
}

fn class_char<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, u8, E> {
    map(
        verify(
            alt((preceded(char('\\'), anychar), none_of("]\\"))),
            |c: &char| c.is_ascii(),
        ),
        |c| c as u8,
    )
    .parse(input)
}

fn class<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, CharClass, E> {
    let (input, _) = char('[').parse(input)?;
    let (input, negated) = opt(char('^')).parse(input)?;
    let (input, ranges) =
        many1((class_char, opt(preceded(char('-'), class_char)))).parse(input)?;
    let (input, _) = char(']').parse(input)?;

    let ranges = ranges
        .into_iter()
        .map(|(from, to)| (from, to.unwrap_or(from)))
        .collect();
    Ok((
        input,
        CharClass {
            ranges,
            negated: negated.is_some(),
        },
    ))
}

#[test]
fn test_class() {
    let (_, c) = class::<nom::error::Error<&str>>("[a-c_0-9-]").unwrap();
    assert_eq!(c.ranges, vec![(b'a', b'c'), (b'_', b'_'), (b'0', b'9'), (b'-', b'-')]);
    assert!(!c.negated);

    let (_, c) = class::<nom::error::Error<&str>>("[^ ]").unwrap();
    assert_eq!(c.ranges, vec![(b' ', b' ')]);
    assert!(c.negated);
}

fn literal<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    map(
        delimited(
            char('"'),
            many0(alt((preceded(char('\\'), anychar), none_of("\"\\")))),
            char('"'),
        ),
        |chars: Vec<char>| Regex::Literal(chars.into_iter().collect()),
    )
    .parse(input)
}

fn atom<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Regex, E> {
    alt((
        value(Regex::EmptyString, tag("()")),
        delimited(char('('), union, char(')')),
        map(class, Regex::Class),
        value(Regex::AnyChar, char('.')),
        value(Regex::EmptyLanguage, char('#')),
        value(Regex::AnyString, char('@')),
        literal,
        map(preceded(char('\\'), anychar), char_regex),
        map(none_of(META), char_regex),
    ))
    .parse(input)
}

#[test]
fn test_precedence() {
    let regex = parse("ab|c*").unwrap();
    assert_eq!(
        regex,
        Regex::Union(
            Box::new(Regex::Concat(
                Box::new(Regex::Char(b'a')),
                Box::new(Regex::Char(b'b'))
            )),
            Box::new(Regex::Star(Box::new(Regex::Char(b'c'))))
        )
    );
}

#[test]
fn test_complement_binds_below_repetition() {
    let regex = parse("~a*").unwrap();
    assert_eq!(
        regex,
        Regex::Star(Box::new(Regex::Complement(Box::new(Regex::Char(b'a')))))
    );
}

#[test]
fn test_literals_and_escapes() {
    assert_eq!(parse("\"a|b\"").unwrap(), Regex::Literal("a|b".to_string()));
    assert_eq!(parse("\\*").unwrap(), Regex::Char(b'*'));
    assert_eq!(parse("()").unwrap(), Regex::EmptyString);
}

#[test]
fn test_syntax_errors() {
    for pattern in ["(ab", "a|", "[]", "a{2", "*"] {
        let error = parse(pattern).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<AutomatonError>(),
            Some(AutomatonError::RegexSyntax { .. })
        ));
    }
}
