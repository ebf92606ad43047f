use sym_automata_lib::{
    automaton::{Automaton, string::StringAutomaton},
    error::AutomatonError,
    validation::same_language::assert_language_matches,
};

const ALPHABET: &[u8] = b"abc ";

fn regex(pattern: &str) -> StringAutomaton {
    StringAutomaton::make_regex(pattern).unwrap()
}

fn error_of(pattern: &str) -> AutomatonError {
    let error = StringAutomaton::make_regex(pattern).unwrap_err();
    error
        .downcast_ref::<AutomatonError>()
        .cloned()
        .expect("regex errors are automaton errors")
}

#[test]
fn test_operators() {
    assert_language_matches(&regex("a|bc"), |w| w == b"a" || w == b"bc", ALPHABET, 4);
    assert_language_matches(
        &regex("a*b"),
        |w| w.ends_with(b"b") && w[..w.len() - 1].iter().all(|c| *c == b'a'),
        ALPHABET,
        5,
    );
    assert_language_matches(
        &regex("(ab)+"),
        |w| !w.is_empty() && w.len() % 2 == 0 && w.chunks(2).all(|c| c == b"ab"),
        ALPHABET,
        7,
    );
    assert_language_matches(&regex("ab?"), |w| w == b"a" || w == b"ab", ALPHABET, 4);
    assert_language_matches(
        &regex("@a@&@b@"),
        |w| w.contains(&b'a') && w.contains(&b'b'),
        ALPHABET,
        4,
    );
    assert_language_matches(&regex("~(a@)"), |w| !w.starts_with(b"a"), ALPHABET, 4);
}

#[test]
fn test_bounded_repetition() {
    assert_language_matches(&regex("a{2}"), |w| w == b"aa", ALPHABET, 5);
    assert_language_matches(
        &regex("a{2,}"),
        |w| w.len() >= 2 && w.iter().all(|c| *c == b'a'),
        ALPHABET,
        6,
    );
    assert_language_matches(
        &regex("a{1,3}"),
        |w| (1..=3).contains(&w.len()) && w.iter().all(|c| *c == b'a'),
        ALPHABET,
        6,
    );
    assert_language_matches(&regex("a{0,1}"), |w| w.is_empty() || w == b"a", ALPHABET, 4);
}

#[test]
fn test_atoms() {
    assert_language_matches(&regex("[a-b]"), |w| w == b"a" || w == b"b", ALPHABET, 3);
    assert_language_matches(&regex("[^ ]+"), |w| !w.is_empty() && !w.contains(&b' '), ALPHABET, 4);
    assert_language_matches(&regex("."), |w| w.len() == 1, ALPHABET, 3);
    assert_language_matches(&regex("()"), |w| w.is_empty(), ALPHABET, 3);
    assert_language_matches(&regex("#"), |_| false, ALPHABET, 3);
    assert_language_matches(&regex("@"), |_| true, ALPHABET, 3);
    assert_language_matches(&regex("\"a|b\""), |w| w == b"a|b", b"ab|", 4);
    assert_language_matches(&regex("\\*a"), |w| w == b"*a", b"a*", 3);
    assert!(regex("").is_empty_string());
}

#[test]
fn test_empty_language_is_empty() {
    assert!(regex("#").is_empty_language());
    assert!(regex("a&b").is_empty_language());
    assert!(!regex("a|#").is_empty_language());
}

#[test]
fn test_errors() {
    assert!(matches!(error_of("a{3,1}"), AutomatonError::UnsupportedRegex(_)));

    for pattern in ["(a", "a||", "[b", "{2}", "a\"b"] {
        assert!(
            matches!(error_of(pattern), AutomatonError::RegexSyntax { .. }),
            "{} should not parse",
            pattern
        );
    }
}
