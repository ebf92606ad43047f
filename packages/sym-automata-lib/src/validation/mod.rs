use crate::automaton::{Language, int::IntAutomaton};

pub mod same_language;

/// Checks that the integers `-1..=bound` accepted by `auto` are exactly the
/// ones satisfying `expected`.
pub fn assert_int_set(auto: &IntAutomaton, expected: impl Fn(i64) -> bool, bound: i64) {
    assert_eq!(
        auto.has_negative_1(),
        expected(-1),
        "membership of -1 differs"
    );

    for value in 0..=bound {
        let word = vec![b'a'; value as usize];
        assert_eq!(
            auto.accepts(&word),
            expected(value),
            "membership of {} differs",
            value
        );
    }
}
