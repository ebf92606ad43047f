use num::BigUint;
use sym_automata_lib::{
    automaton::{Automaton, Language, string::StringAutomaton},
    error::AutomatonError,
    validation::same_language::{assert_language_matches, assert_same_language, same_language},
};

const ALPHABET: &[u8] = b"ab ";

fn strings(strings: &[&str]) -> StringAutomaton {
    StringAutomaton::make_strings(strings)
}

#[test]
fn test_count_short_strings() {
    // every byte but the two reserved ones is a character
    let auto = StringAutomaton::make_length_less_than_equal(3);
    let chars = BigUint::from(254u32);
    let expected = BigUint::from(1u32) + &chars + &chars * &chars + &chars * &chars * &chars;

    assert_eq!(auto.count(3), expected);
    assert_eq!(auto.count_symbolic(3), expected);
    assert_eq!(auto.count_all().unwrap(), expected);
}

#[test]
fn test_count_all_needs_a_finite_language() {
    let error = StringAutomaton::make_any_string().count_all().unwrap_err();
    assert_eq!(
        error.downcast_ref::<AutomatonError>(),
        Some(&AutomatonError::InfiniteLanguage)
    );
}

#[test]
fn test_length_constructors() {
    assert_language_matches(
        &StringAutomaton::make_length_range(1, 2),
        |w| (1..=2).contains(&w.len()),
        ALPHABET,
        5,
    );
    assert_language_matches(
        &StringAutomaton::make_length_greater_than(2),
        |w| w.len() > 2,
        ALPHABET,
        5,
    );
    assert!(!StringAutomaton::make_any_string().accepts(&[0xFF]));
}

#[test]
fn test_algebra() {
    let a = strings(&["a", "ab"]);
    let b = strings(&["ab", "b"]);

    assert!(a.intersect(&b).check_equivalence(&strings(&["ab"])));
    assert!(a.union(&b).check_equivalence(&strings(&["a", "ab", "b"])));
    assert!(a.difference(&b).check_equivalence(&strings(&["a"])));
    assert_language_matches(&a.complement(), |w| w != b"a" && w != b"ab", ALPHABET, 4);
    assert!(a.concatenate(&b).check_equivalence(&strings(&["aab", "ab", "abab", "abb"])));
}

#[test]
fn test_repetition() {
    let ab = StringAutomaton::make_string("ab");

    assert_language_matches(
        &ab.repeat(2),
        |w| w.len() >= 4 && w.chunks(2).all(|c| c == b"ab"),
        ALPHABET,
        7,
    );
    assert_language_matches(
        &ab.repeat_range(1, 2),
        |w| w == b"ab" || w == b"abab",
        ALPHABET,
        7,
    );
    assert!(ab.optional().has_empty_string());
    assert!(!ab.closure().has_empty_string());
    assert!(ab.kleene_closure().is_cyclic());
}

#[test]
fn test_substrings() {
    let auto = strings(&["abc", "b"]);

    assert!(auto.prefixes().check_equivalence(&strings(&["", "a", "ab", "abc", "b"])));
    assert!(auto.suffixes().check_equivalence(&strings(&["", "c", "bc", "abc", "b"])));
    assert!(auto.suffixes_from_index(1).check_equivalence(&strings(&["bc", ""])));
    assert!(auto.char_at(1).check_equivalence(&strings(&["b"])));
    assert!(auto.substring_range(0, 1).check_equivalence(&strings(&["ab"])));
    assert!(auto.substring(2).check_equivalence(&strings(&["c"])));
    assert!(auto.prefixes_until_index(2).check_equivalence(&strings(&["", "a", "b"])));
    assert!(auto.prefixes_at_index(0).check_equivalence(&strings(&["a", "b"])));
}

#[test]
fn test_predicates() {
    let auto = strings(&["abc", "bca", "cab"]);
    let a = StringAutomaton::make_string("a");

    assert!(auto.begins(&a).check_equivalence(&strings(&["abc"])));
    assert!(auto.ends(&a).check_equivalence(&strings(&["bca"])));
    let ab = StringAutomaton::make_string("ab");
    assert!(auto.contains(&ab).check_equivalence(&strings(&["abc", "cab"])));
    assert!(auto.pre_contains().check_equivalence(&auto));
}

#[test]
fn test_pre_images() {
    let b = StringAutomaton::make_string("b");
    assert_language_matches(
        &b.pre_char_at(1, None),
        |w| w.get(1) == Some(&b'b'),
        ALPHABET,
        4,
    );

    let range = StringAutomaton::make_length_less_than(3);
    assert_language_matches(
        &b.pre_char_at(1, Some(&range)),
        |w| w.len() < 3 && w.get(1) == Some(&b'b'),
        ALPHABET,
        4,
    );

    let ab = StringAutomaton::make_string("ab");
    assert_language_matches(
        &ab.pre_substring(1, None),
        |w| w.len() == 3 && &w[1..] == b"ab",
        ALPHABET,
        5,
    );
    assert_language_matches(
        &ab.pre_substring_range(1, 2, None),
        |w| w.len() >= 3 && &w[1..3] == b"ab",
        ALPHABET,
        5,
    );
}

#[test]
fn test_case_conversion() {
    let auto = strings(&["ab", "Cd"]);
    assert!(auto.to_upper_case().check_equivalence(&strings(&["AB", "CD"])));
    assert!(auto.to_lower_case().check_equivalence(&strings(&["ab", "cd"])));

    let upper = strings(&["AB"]).pre_to_upper_case(None);
    assert!(upper.accepts_str("ab"));
    assert!(upper.accepts_str("aB"));
    assert!(upper.accepts_str("AB"));
    assert!(!upper.accepts_str("ac"));
}

#[test]
fn test_trim() {
    let auto = strings(&["  ab ", "b"]);
    assert!(auto.trim().check_equivalence(&strings(&["ab", "b"])));

    let pre = StringAutomaton::make_string("a b").pre_trim(None);
    assert_language_matches(&pre, |w| w.trim_ascii() == b"a b", ALPHABET, 6);
}

#[test]
fn test_replace() {
    let subject = strings(&["aXb", "ab"]);
    let search = StringAutomaton::make_string("X");
    let replacement = StringAutomaton::make_string("yy");

    let replaced = subject.replace(&search, &replacement).unwrap();
    assert!(replaced.check_equivalence(&strings(&["ayyb", "ab"])));

    let pre = StringAutomaton::make_string("ayyb")
        .pre_replace(&search, "yy", None)
        .unwrap();
    assert!(pre.accepts_str("aXb"));
    assert!(pre.accepts_str("ayyb"));
    assert!(!pre.accepts_str("ab"));

    let empty = StringAutomaton::make_any_string();
    assert!(subject.replace(&empty, &replacement).is_err());
}

#[test]
fn test_pre_replace_after_a_prefix() {
    let search = StringAutomaton::make_string("b");

    let pre = StringAutomaton::make_string("xa")
        .pre_replace(&search, "a", None)
        .unwrap();
    assert!(pre.check_equivalence(&strings(&["xa", "xb"])));

    // every position may have been a replaced `b`
    let pre = StringAutomaton::make_string("aaa")
        .pre_replace(&search, "a", None)
        .unwrap();
    assert_language_matches(&pre, |w| w.len() == 3 && !w.contains(&b' '), ALPHABET, 4);
}

#[test]
fn test_witnesses() {
    let auto = StringAutomaton::make_length_equal(3);
    let witness = auto.get_string().unwrap();
    assert_eq!(witness.len(), 3);
    assert!(witness.chars().all(|c| c.is_ascii_graphic()));

    assert!(StringAutomaton::make_phi().get_string().is_none());
    assert_eq!(StringAutomaton::make_empty_string().get_string(), Some(String::new()));
    assert!(StringAutomaton::make_string("x").is_accepting_single_string());
    assert!(StringAutomaton::make_empty_string().is_empty_string());
}

#[test]
fn test_language_helpers() {
    let a = strings(&["a", "ab"]);
    let b = StringAutomaton::make_string("a").union(&StringAutomaton::make_string("ab"));
    assert_same_language(&a, &b, ALPHABET, 4);
    assert!(!same_language(&a, &strings(&["a"]), ALPHABET, 4));
}
