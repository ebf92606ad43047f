use num::BigUint;
use sym_automata_lib::{
    automaton::{
        Automaton,
        int::{IntAutomaton, IntBound, MAX_INT},
    },
    error::AutomatonError,
    validation::assert_int_set,
};

const BOUND: i64 = 12;

fn int(value: i64) -> IntAutomaton {
    IntAutomaton::make_int(value).unwrap()
}

fn ints(values: &[i64]) -> IntAutomaton {
    IntAutomaton::make_ints(values).unwrap()
}

fn out_of_range(result: anyhow::Result<IntAutomaton>, value: i64) {
    let error = result.unwrap_err();
    assert_eq!(
        error.downcast_ref::<AutomatonError>(),
        Some(&AutomatonError::IntOutOfRange {
            value,
            max: MAX_INT
        })
    );
}

#[test]
fn test_constructors() {
    assert_int_set(&IntAutomaton::make_phi(), |_| false, BOUND);
    assert_int_set(&IntAutomaton::make_zero(), |v| v == 0, BOUND);
    assert_int_set(&IntAutomaton::make_any_int(), |_| true, BOUND);
    assert_int_set(&int(4), |v| v == 4, BOUND);
    assert_int_set(&int(-7), |v| v == -1, BOUND);
    assert_int_set(&ints(&[1, 3, -2]), |v| [-1, 1, 3].contains(&v), BOUND);

    let range = |start, end| IntAutomaton::make_int_range(start, end).unwrap();
    assert_int_set(&range(-3, 2), |v| v <= 2, BOUND);
    assert_int_set(&range(5, 2), |_| false, BOUND);

    assert_int_set(&IntAutomaton::make_int_less_than(3).unwrap(), |v| v < 3, BOUND);
    assert_int_set(
        &IntAutomaton::make_int_less_than_or_equal(3).unwrap(),
        |v| v <= 3,
        BOUND,
    );
    assert_int_set(&IntAutomaton::make_int_greater_than(3).unwrap(), |v| v > 3, BOUND);
    assert_int_set(
        &IntAutomaton::make_int_greater_than_or_equal(-1).unwrap(),
        |_| true,
        BOUND,
    );
    assert_int_set(
        &IntAutomaton::make_int_greater_than_or_equal(0).unwrap(),
        |v| v >= 0,
        BOUND,
    );
}

#[test]
fn test_constructors_at_the_i64_limits() {
    assert_int_set(&IntAutomaton::make_int_less_than(i64::MIN).unwrap(), |_| false, BOUND);
    assert_int_set(
        &IntAutomaton::make_int_less_than_or_equal(i64::MIN).unwrap(),
        |_| false,
        BOUND,
    );
    assert_int_set(
        &IntAutomaton::make_int_greater_than(i64::MIN).unwrap(),
        |_| true,
        BOUND,
    );
    assert_int_set(&int(i64::MIN), |v| v == -1, BOUND);
    assert_int_set(
        &IntAutomaton::make_int_range(i64::MIN, -1).unwrap(),
        |v| v == -1,
        BOUND,
    );
    assert_int_set(
        &IntAutomaton::make_int_range(i64::MAX, 0).unwrap(),
        |_| false,
        BOUND,
    );

    out_of_range(IntAutomaton::make_int(i64::MAX), i64::MAX);
    out_of_range(IntAutomaton::make_int(MAX_INT + 1), MAX_INT + 1);
    out_of_range(IntAutomaton::make_ints(&[1, i64::MAX]), i64::MAX);
    out_of_range(IntAutomaton::make_int_range(0, i64::MAX), i64::MAX);
    out_of_range(IntAutomaton::make_int_greater_than(i64::MAX), i64::MAX);
    out_of_range(int(2).plus_int(i64::MAX), i64::MAX);
    out_of_range(int(2).times(i64::MIN), i64::MIN);
}

#[test]
fn test_negative_one_follows_the_set_operations() {
    let a = ints(&[-1, 2]);
    let b = ints(&[2, 3]);

    assert_int_set(&a.union(&b), |v| [-1, 2, 3].contains(&v), BOUND);
    assert_int_set(&a.intersect(&b), |v| v == 2, BOUND);
    assert_int_set(&a.difference(&b), |v| v == -1, BOUND);
    assert_int_set(&a.complement(), |v| v != -1 && v != 2, BOUND);
    assert_int_set(&b.union_int(-4).unwrap(), |v| [-1, 2, 3].contains(&v), BOUND);
    assert_int_set(&a.difference_int(-1).unwrap(), |v| v == 2, BOUND);
    assert!(a.intersect_int(2).unwrap().check_equivalence(&int(2)));
}

#[test]
fn test_double_complement_keeps_the_flag() {
    for set in [ints(&[-1, 2]), ints(&[2, 3]), IntAutomaton::make_phi()] {
        let twice = set.complement().complement();
        assert_eq!(twice.has_negative_1(), set.has_negative_1());
        assert!(twice.check_equivalence(&set));
    }
}

#[test]
fn test_arithmetic() {
    let small = ints(&[1, 2]);
    let other = ints(&[0, 5]);

    assert_int_set(&small.plus(&other), |v| [1, 2, 6, 7].contains(&v), BOUND);
    assert_int_set(&int(-1).plus_int(3).unwrap(), |v| v == 2, BOUND);
    assert_int_set(&int(-1).plus_int(0).unwrap(), |v| v == -1, BOUND);

    assert_int_set(&int(5).minus_int(2).unwrap(), |v| v == 3, BOUND);
    assert_int_set(&int(1).minus_int(2).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&int(3).minus_int(-1).unwrap(), |v| v == 4, BOUND);
    assert_int_set(&int(-1).minus_int(0).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&small.subtract_from(4).unwrap(), |v| v == 2 || v == 3, BOUND);
    assert_int_set(&ints(&[7, 9]).minus(&small), |v| (5..=8).contains(&v), BOUND);
}

#[test]
fn test_results_below_negative_one_collapse() {
    assert_int_set(&int(-1).plus_int(-1).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&ints(&[-1, 0]).plus(&int(-1)), |v| v == -1, BOUND);

    assert_int_set(&int(0).minus_int(5).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&int(2).minus_int(5).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&ints(&[-1, 4]).minus_int(2).unwrap(), |v| v == -1 || v == 2, BOUND);
    assert_int_set(&ints(&[0, 3]).subtract_from(1).unwrap(), |v| v == -1 || v == 1, BOUND);

    let far = ints(&[8]).minus(&ints(&[1, 2, 3]));
    assert_int_set(&far, |v| (5..=7).contains(&v), BOUND);
}

#[test]
fn test_negation_and_scaling() {
    assert_int_set(&ints(&[-1, 0, 1, 5]).uminus(), |v| (-1..=1).contains(&v), BOUND);
    assert_int_set(&int(2).uminus(), |v| v == -1, BOUND);
    assert_int_set(&ints(&[-1, 2]).uminus(), |v| v == -1 || v == 1, BOUND);
    assert_int_set(&IntAutomaton::make_int_greater_than(3).unwrap().uminus(), |v| v == -1, BOUND);

    let small = ints(&[1, 2]);
    assert_int_set(&small.times(3).unwrap(), |v| (3..=6).contains(&v), BOUND);
    assert_int_set(&small.times(0).unwrap(), |v| v == 0, BOUND);
    assert_int_set(&IntAutomaton::make_phi().times(0).unwrap(), |_| false, BOUND);
    assert_int_set(&int(1).times(-1).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&int(3).times(-2).unwrap(), |v| v == -1, BOUND);
    assert_int_set(&int(0).times(-3).unwrap(), |v| v == 0, BOUND);
    assert!(small.times(1).unwrap().check_equivalence(&small));
}

#[test]
fn test_extrema() {
    let set = ints(&[2, 7]);
    assert_eq!(set.get_max_accepted_int(), Some(IntBound::Finite(7)));
    assert_eq!(set.get_min_accepted_int(), Some(2));
    assert_eq!(set.get_an_accepting_int(), Some(2));
    assert!(!set.is_accepting_single_int());

    let unbounded = IntAutomaton::make_int_greater_than(3).unwrap();
    assert_eq!(unbounded.get_max_accepted_int(), Some(IntBound::Infinite));
    assert_eq!(unbounded.get_min_accepted_int(), Some(4));

    let negative = int(-1);
    assert_eq!(negative.get_max_accepted_int(), Some(IntBound::Finite(-1)));
    assert!(negative.is_accepting_single_int());

    assert_eq!(IntAutomaton::make_phi().get_max_accepted_int(), None);
    assert_eq!(IntAutomaton::make_phi().get_min_accepted_int(), None);
    assert!(IntAutomaton::make_phi().is_empty_language());
    assert!(!negative.is_empty_language());

    assert!(IntAutomaton::make_zero().is_zero());
    assert!(int(4).is_accepting_single_int());
    assert!(IntAutomaton::make_int_range(0, 3).unwrap().has_zero());
    assert_eq!(IntBound::Infinite.to_string(), "inf");
}

#[test]
fn test_comparisons() {
    let set = ints(&[2, 7]);
    let other = ints(&[5, 9]);

    assert!(set.is_greater_than_int(5));
    assert!(!set.is_greater_than_int(7));
    assert!(set.is_greater_than_or_equal_int(7));
    assert!(set.is_less_than_int(3));
    assert!(!set.is_less_than_int(2));
    assert!(set.is_less_than_or_equal_int(2));

    assert!(set.is_greater_than(&other));
    assert!(set.is_less_than(&other));
    assert!(!other.is_less_than_or_equal(&int(4)));
    assert!(other.is_greater_than_or_equal(&int(9)));
    assert!(!IntAutomaton::make_phi().is_greater_than(&other));
}

#[test]
fn test_restrictions() {
    let range = IntAutomaton::make_int_range(-1, 10).unwrap();
    let other = ints(&[5, 9]);

    assert_int_set(
        &range.restrict_greater_than_to_int(3).unwrap(),
        |v| (4..=10).contains(&v),
        BOUND,
    );
    assert_int_set(
        &range.restrict_greater_than_to(&other).unwrap(),
        |v| (6..=10).contains(&v),
        BOUND,
    );
    assert_int_set(
        &range.restrict_greater_than_or_equal_to(&other).unwrap(),
        |v| (5..=10).contains(&v),
        BOUND,
    );
    assert_int_set(&range.restrict_less_than_to(&other).unwrap(), |v| v < 9, BOUND);
    assert_int_set(&range.restrict_less_than_or_equal_to_int(0).unwrap(), |v| v <= 0, BOUND);
    assert_int_set(&range.restrict_less_than_or_equal_to(&other).unwrap(), |v| v <= 9, BOUND);
    assert_int_set(&range.restrict_to(&other), |v| v == 5 || v == 9, BOUND);

    let unbounded = IntAutomaton::make_int_greater_than(20).unwrap();
    assert!(range.restrict_less_than_to(&unbounded).unwrap().check_equivalence(&range));
    assert!(
        range
            .restrict_less_than_to(&IntAutomaton::make_phi())
            .unwrap()
            .is_empty_language()
    );
}

#[test]
fn test_counting_members() {
    let set = ints(&[-1, 0, 2, 5]);
    assert_eq!(set.count(10), BigUint::from(4u32));
    assert_eq!(set.count(3), BigUint::from(3u32));
    assert_eq!(set.count_all().unwrap(), BigUint::from(4u32));

    let unary = set.to_unary_automaton();
    assert_eq!(unary.accepted_lengths(10), vec![0, 2, 5]);
    assert!(unary.to_string_automaton().accepts_str("aa"));
    assert!(!unary.to_string_automaton().accepts_str("aaa"));
}
