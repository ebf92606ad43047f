use itertools::{Either, Itertools, repeat_n};

use crate::automaton::Language;

/// Every word over `alphabet` shorter than `max_word_length`, shortest first.
fn words(alphabet: &[u8], max_word_length: usize) -> impl Iterator<Item = Vec<u8>> + '_ {
    (0..max_word_length).flat_map(move |i| match i {
        0 => Either::Left(std::iter::once(vec![])),
        _ => Either::Right(repeat_n(alphabet.iter().copied(), i).multi_cartesian_product()),
    })
}

/// Checks if two automata agree on every word over `alphabet` shorter than
/// `max_word_length`.
pub fn same_language(
    a: &impl Language,
    b: &impl Language,
    alphabet: &[u8],
    max_word_length: usize,
) -> bool {
    words(alphabet, max_word_length).all(|word| a.accepts(&word) == b.accepts(&word))
}

pub fn assert_same_language(
    a: &impl Language,
    b: &impl Language,
    alphabet: &[u8],
    max_word_length: usize,
) {
    for word in words(alphabet, max_word_length) {
        match (a.accepts(&word), b.accepts(&word)) {
            (true, false) => {
                panic!(
                    "{:?} is accepted by automaton `a` but not by automaton `b`. Thus their languages are not equal.",
                    String::from_utf8_lossy(&word)
                );
            }
            (false, true) => {
                panic!(
                    "{:?} is accepted by automaton `b` but not by automaton `a`. Thus their languages are not equal.",
                    String::from_utf8_lossy(&word)
                );
            }
            _ => {}
        }
    }
}

/// Assert that the language accepted by automaton `a` is a subset of the
/// language accepted by automaton `b`.
pub fn assert_subset_language(
    a: &impl Language,
    b: &impl Language,
    alphabet: &[u8],
    max_word_length: usize,
) {
    for word in words(alphabet, max_word_length) {
        if a.accepts(&word) && !b.accepts(&word) {
            panic!(
                "{:?} is accepted by automaton `a` but not by automaton `b`. Thus the language of `a` is not a subset of `b`.",
                String::from_utf8_lossy(&word)
            );
        }
    }
}

/// Assert that exactly the words satisfying `expected` are accepted.
pub fn assert_language_matches(
    a: &impl Language,
    expected: impl Fn(&[u8]) -> bool,
    alphabet: &[u8],
    max_word_length: usize,
) {
    for word in words(alphabet, max_word_length) {
        assert_eq!(
            a.accepts(&word),
            expected(&word),
            "{:?} is handled differently",
            String::from_utf8_lossy(&word)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_enumeration() {
        let all = words(b"ab", 3).collect_vec();
        assert_eq!(all.len(), 1 + 2 + 4);
        assert_eq!(all[0], Vec::<u8>::new());
        assert!(all.contains(&b"ba".to_vec()));
    }
}
