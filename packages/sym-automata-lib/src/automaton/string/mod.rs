use anyhow::bail;
use itertools::Itertools;

use crate::{
    automaton::{
        Automaton, AutomatonId, AutomatonKind, Language,
        bdd::Bit,
        dfa::{Dfa, builder::DfaBuilder, minimization::Minimizable, witness::WitnessHeuristic},
        string::regex::{CharClass, Regex},
    },
    error::AutomatonError,
};

pub mod char_nfa;
pub mod regex;
pub mod substring;
pub mod transform;

/// Bits per character.
pub const VAR_PER_CHAR: usize = 8;
/// The all-ones byte, used as padding symbol by multi-track automata.
pub const LAMBDA: u8 = 0xFF;
/// The all-ones-but-last byte, reserved as internal sentinel.
pub const RESERVED: u8 = 0xFE;

pub fn is_reserved(byte: u8) -> bool {
    byte == LAMBDA || byte == RESERVED
}

/// The bits of a character, most significant bit first.
pub fn char_bits(byte: u8) -> Vec<bool> {
    (0..VAR_PER_CHAR)
        .map(|i| byte & (1 << (VAR_PER_CHAR - 1 - i)) != 0)
        .collect()
}

pub fn char_pattern(byte: u8) -> Vec<Bit> {
    char_bits(byte).into_iter().map(Bit::from_bool).collect()
}

pub fn bits_to_char(bits: &[bool]) -> u8 {
    bits.iter()
        .take(VAR_PER_CHAR)
        .fold(0u8, |acc, bit| (acc << 1) | u8::from(*bit))
}

/// Both reserved bytes as one pattern.
pub fn reserved_patterns() -> Vec<Vec<Bit>> {
    vec![Bit::pattern("1111111X")]
}

/// Every byte a user facing character can be.
pub fn alphabet() -> impl Iterator<Item = u8> {
    (0..=u8::MAX).filter(|b| !is_reserved(*b))
}

/// An automaton over byte strings with 8 bits per character. The reserved
/// bytes never lead to a live state.
#[derive(Debug)]
pub struct StringAutomaton {
    dfa: Dfa,
    id: AutomatonId,
}

impl Clone for StringAutomaton {
    fn clone(&self) -> Self {
        StringAutomaton::new(self.dfa.clone())
    }
}

impl Automaton for StringAutomaton {
    fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    fn kind(&self) -> AutomatonKind {
        AutomatonKind::String
    }

    fn id(&self) -> AutomatonId {
        self.id
    }
}

impl Language for StringAutomaton {
    fn accepts(&self, word: &[u8]) -> bool {
        let word = word.iter().map(|b| char_bits(*b)).collect_vec();
        self.dfa.accepts(&word)
    }
}

impl StringAutomaton {
    pub fn new(dfa: Dfa) -> Self {
        debug_assert_eq!(
            dfa.num_vars(),
            VAR_PER_CHAR,
            "String automata use {} bits per character",
            VAR_PER_CHAR
        );
        StringAutomaton {
            dfa,
            id: AutomatonId::fresh(),
        }
    }

    pub fn into_dfa(self) -> Dfa {
        self.dfa
    }

    pub fn make_phi() -> Self {
        let result = StringAutomaton::new(Dfa::phi(VAR_PER_CHAR));
        tracing::debug!("{} = makePhi()", result.id);
        result
    }

    /// Only the empty string.
    pub fn make_empty_string() -> Self {
        let result = StringAutomaton::new(Dfa::empty_word(VAR_PER_CHAR));
        tracing::debug!("{} = makeEmptyString()", result.id);
        result
    }

    pub fn make_any_string() -> Self {
        StringAutomaton::new(Dfa::any_except(VAR_PER_CHAR, &reserved_patterns()))
    }

    pub fn make_any_string_but_not_empty() -> Self {
        StringAutomaton::new(Dfa::any_but_not_empty(VAR_PER_CHAR, &reserved_patterns()))
    }

    pub fn make_any_char() -> Self {
        StringAutomaton::new(Dfa::any_within_range(
            VAR_PER_CHAR,
            &reserved_patterns(),
            1,
            1,
        ))
    }

    pub fn make_char(c: u8) -> Self {
        Self::make_char_range(c, c)
    }

    /// Single characters in `from..=to`, reserved bytes excluded.
    pub fn make_char_range(from: u8, to: u8) -> Self {
        Self::make_char_set(&(from..=to).collect_vec())
    }

    /// Single characters out of `chars`, reserved bytes excluded.
    pub fn make_char_set(chars: &[u8]) -> Self {
        let mut builder = DfaBuilder::new(3, VAR_PER_CHAR);
        for c in chars.iter().filter(|c| !is_reserved(**c)) {
            builder.store_exception(1, char_pattern(*c));
        }
        builder.store_state(2);
        builder.store_state(2);
        builder.store_state(2);

        StringAutomaton::new(builder.build("-+-").minimize())
    }

    pub fn make_string(text: &str) -> Self {
        let result = Self::make_bytes(text.as_bytes());
        tracing::debug!("{} = makeString({:?})", result.id, text);
        result
    }

    /// Exactly `bytes`. A reserved byte makes the language empty.
    pub fn make_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().any(|b| is_reserved(*b)) {
            return Self::make_phi();
        }

        let sink = bytes.len() + 1;
        let mut builder = DfaBuilder::new(bytes.len() + 2, VAR_PER_CHAR);
        for (i, byte) in bytes.iter().enumerate() {
            builder.store_exception(i + 1, char_pattern(*byte));
            builder.store_state(sink);
        }
        builder.store_state(sink);
        builder.store_state(sink);

        let accepting = (0..bytes.len() + 2)
            .map(|state| state == bytes.len())
            .collect_vec();
        StringAutomaton::new(builder.build_with(&accepting))
    }

    /// Any of `strings`.
    pub fn make_strings(strings: &[&str]) -> Self {
        strings
            .iter()
            .map(|s| Self::make_string(s))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(Self::make_phi)
    }

    pub fn make_length_equal(length: usize) -> Self {
        Self::make_length_range(length, length)
    }

    pub fn make_length_less_than(length: usize) -> Self {
        match length {
            0 => Self::make_phi(),
            _ => Self::make_length_range(0, length - 1),
        }
    }

    pub fn make_length_less_than_equal(length: usize) -> Self {
        Self::make_length_range(0, length)
    }

    pub fn make_length_greater_than(length: usize) -> Self {
        Self::make_length_greater_than_equal(length + 1)
    }

    pub fn make_length_greater_than_equal(length: usize) -> Self {
        StringAutomaton::new(Dfa::any_after_length(
            VAR_PER_CHAR,
            &reserved_patterns(),
            length,
        ))
    }

    /// Strings with a length in `min..=max`.
    pub fn make_length_range(min: usize, max: usize) -> Self {
        StringAutomaton::new(Dfa::any_within_range(
            VAR_PER_CHAR,
            &reserved_patterns(),
            min,
            max,
        ))
    }

    /// Compiles a regular expression, see [regex] for the syntax.
    pub fn make_regex(pattern: &str) -> anyhow::Result<Self> {
        let regex = regex::parse(pattern)?;
        let result = Self::from_regex(&regex)?;
        tracing::debug!("{} = makeRegexAuto({:?})", result.id, pattern);
        Ok(result)
    }

    pub fn from_regex(regex: &Regex) -> anyhow::Result<Self> {
        Ok(match regex {
            Regex::Union(a, b) => Self::from_regex(a)?.union(&Self::from_regex(b)?),
            Regex::Intersection(a, b) => Self::from_regex(a)?.intersect(&Self::from_regex(b)?),
            Regex::Complement(a) => Self::from_regex(a)?.complement(),
            Regex::Concat(a, b) => Self::from_regex(a)?.concatenate(&Self::from_regex(b)?),
            Regex::Optional(a) => Self::from_regex(a)?.optional(),
            Regex::Star(a) => Self::from_regex(a)?.kleene_closure(),
            Regex::Plus(a) => Self::from_regex(a)?.closure(),
            Regex::RepeatMin(a, min) => Self::from_regex(a)?.repeat(*min),
            Regex::RepeatRange(a, min, max) => {
                if min > max {
                    bail!(AutomatonError::UnsupportedRegex(format!(
                        "repetition bounds {{{},{}}} are reversed",
                        min, max
                    )));
                }
                Self::from_regex(a)?.repeat_range(*min, *max)
            }
            Regex::Char(c) => Self::make_char(*c),
            Regex::Class(class) => Self::from_class(class),
            Regex::AnyChar => Self::make_any_char(),
            Regex::EmptyString => Self::make_empty_string(),
            Regex::EmptyLanguage => Self::make_phi(),
            Regex::AnyString => Self::make_any_string(),
            Regex::Literal(text) => Self::make_string(text),
        })
    }

    fn from_class(class: &CharClass) -> Self {
        let chars = alphabet()
            .filter(|c| class.ranges.iter().any(|(from, to)| from <= c && c <= to) != class.negated)
            .collect_vec();
        Self::make_char_set(&chars)
    }

    fn derive(&self, op: &str, other: Option<&StringAutomaton>, dfa: Dfa) -> StringAutomaton {
        let result = StringAutomaton::new(dfa);
        match other {
            Some(other) => tracing::debug!("{} = [{}]->{}({})", result.id, self.id, op, other.id),
            None => tracing::debug!("{} = [{}]->{}()", result.id, self.id, op),
        }
        result
    }

    pub fn complement(&self) -> StringAutomaton {
        let dfa = Self::make_any_string().dfa.difference(&self.dfa);
        self.derive("complement", None, dfa)
    }

    pub fn union(&self, other: &StringAutomaton) -> StringAutomaton {
        self.derive("union", Some(other), self.dfa.union(&other.dfa))
    }

    pub fn intersect(&self, other: &StringAutomaton) -> StringAutomaton {
        self.derive("intersect", Some(other), self.dfa.intersect(&other.dfa))
    }

    pub fn difference(&self, other: &StringAutomaton) -> StringAutomaton {
        self.derive("difference", Some(other), self.dfa.difference(&other.dfa))
    }

    pub fn concatenate(&self, other: &StringAutomaton) -> StringAutomaton {
        self.derive("concatenate", Some(other), self.dfa.concatenate(&other.dfa))
    }

    pub fn optional(&self) -> StringAutomaton {
        self.derive("optional", None, self.dfa.optional())
    }

    /// One or more repetitions.
    pub fn closure(&self) -> StringAutomaton {
        self.derive("closure", None, self.dfa.closure())
    }

    /// Zero or more repetitions.
    pub fn kleene_closure(&self) -> StringAutomaton {
        self.derive("kleeneClosure", None, self.dfa.kleene_closure())
    }

    /// `min` or more repetitions: the closure without the words made of
    /// fewer than `min` repetitions.
    pub fn repeat(&self, min: u32) -> StringAutomaton {
        let dfa = match min {
            0 => self.dfa.kleene_closure(),
            1 => self.dfa.closure(),
            _ => {
                let shorter = self
                    .powers(min - 1)
                    .into_iter()
                    .skip(1)
                    .reduce(|a, b| a.union(&b))
                    .unwrap_or_else(|| Dfa::phi(VAR_PER_CHAR));
                self.dfa.closure().difference(&shorter)
            }
        };
        self.derive(&format!("repeat{{{},}}", min), None, dfa)
    }

    /// Between `min` and `max` repetitions.
    pub fn repeat_range(&self, min: u32, max: u32) -> StringAutomaton {
        let dfa = self
            .powers(max)
            .into_iter()
            .skip(min as usize)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Dfa::phi(VAR_PER_CHAR));
        self.derive(&format!("repeat{{{},{}}}", min, max), None, dfa)
    }

    /// `L^0, L^1, …, L^max`
    fn powers(&self, max: u32) -> Vec<Dfa> {
        let mut powers = vec![Dfa::empty_word(VAR_PER_CHAR)];
        for i in 1..=max as usize {
            let next = powers[i - 1].concatenate(&self.dfa);
            powers.push(next);
        }
        powers
    }

    pub fn check_equivalence(&self, other: &StringAutomaton) -> bool {
        self.dfa.is_equal(&other.dfa)
    }

    pub fn is_subset_of(&self, other: &StringAutomaton) -> bool {
        self.dfa.is_subset_of(&other.dfa)
    }

    pub fn has_empty_string(&self) -> bool {
        self.dfa.is_accepting(self.dfa.start())
    }

    /// Whether the language is exactly the empty string.
    pub fn is_empty_string(&self) -> bool {
        self.dfa.is_only_initial_state_accepting()
    }

    pub fn is_accepting_single_string(&self) -> bool {
        self.dfa.is_accepting_single_word()
    }

    pub fn accepts_str(&self, text: &str) -> bool {
        self.accepts(text.as_bytes())
    }

    /// An accepted string, preferring printable characters.
    pub fn get_string(&self) -> Option<String> {
        self.get_string_with(&PrintableHeuristic)
    }

    pub fn get_string_with(&self, heuristic: &impl WitnessHeuristic) -> Option<String> {
        self.get_bytes_with(heuristic)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn get_bytes_with(&self, heuristic: &impl WitnessHeuristic) -> Option<Vec<u8>> {
        self.dfa
            .accepting_word(heuristic)
            .map(|word| word.iter().map(|symbol| bits_to_char(symbol)).collect())
    }
}

/// Characters tried first when picking a witness, in order.
const PREFERRED_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Picks printable characters whenever a transition allows them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintableHeuristic;

impl PrintableHeuristic {
    fn rank(pattern: &[Bit]) -> usize {
        PREFERRED_CHARS
            .iter()
            .position(|c| Self::admits(pattern, *c))
            .unwrap_or(PREFERRED_CHARS.len())
    }

    fn admits(pattern: &[Bit], byte: u8) -> bool {
        pattern
            .iter()
            .zip(char_bits(byte))
            .all(|(bit, value)| bit.matches(value))
    }
}

/// The most printable ordinary character a character pattern admits.
pub(crate) fn pick_char(pattern: &[Bit]) -> Option<u8> {
    PREFERRED_CHARS
        .iter()
        .copied()
        .chain(alphabet())
        .find(|c| PrintableHeuristic::admits(pattern, *c))
}

impl WitnessHeuristic for PrintableHeuristic {
    fn order(&self, edges: &mut Vec<(Vec<Bit>, usize)>) {
        edges.sort_by_key(|(pattern, _)| Self::rank(pattern));
    }

    fn concretize(&self, pattern: &[Bit]) -> Vec<bool> {
        match pick_char(pattern) {
            Some(byte) => char_bits(byte),
            None => pattern.iter().map(|b| *b == Bit::One).collect(),
        }
    }
}
