use itertools::{Itertools, repeat_n};
use sym_automata_lib::automaton::{
    algorithms::DfaExport,
    bdd::Bit,
    dfa::{Dfa, builder::DfaBuilder, minimization::Minimizable, witness::FirstPathHeuristic},
    nfa::Nfa,
};

/// Words over a two bit alphabet, written as `0`..`3`.
fn words(max_length: usize) -> Vec<Vec<Vec<bool>>> {
    let symbols = (0..4u8).map(|s| vec![s & 2 != 0, s & 1 != 0]).collect_vec();
    (0..=max_length)
        .flat_map(|length| match length {
            0 => vec![vec![]],
            _ => repeat_n(symbols.clone(), length)
                .multi_cartesian_product()
                .collect_vec(),
        })
        .collect()
}

/// Words whose symbols all have the first bit set.
fn high_only() -> Dfa {
    let mut builder = DfaBuilder::new(2, 2);
    builder.store_exception_str(0, "1X");
    builder.store_state(1);
    builder.store_state(1);
    builder.build("+-")
}

/// Words of even length.
fn even_length() -> Dfa {
    let mut builder = DfaBuilder::new(2, 2);
    builder.store_state(1);
    builder.store_state(0);
    builder.build("+-")
}

#[test]
fn test_builder_exceptions_match_in_order() {
    // `11` is caught by the first exception even though `1X` matches it too
    let mut builder = DfaBuilder::new(3, 2);
    builder.store_exception_str(1, "11");
    builder.store_exception_str(2, "1X");
    builder.store_state(0);
    builder.store_state(1);
    builder.store_state(2);
    let dfa = builder.build("-+-");

    assert!(dfa.accepts(&[vec![true, true]]));
    assert!(!dfa.accepts(&[vec![true, false]]));
    assert!(!dfa.accepts(&[vec![false, false]]));
    assert!(dfa.accepts(&[vec![false, true], vec![true, true]]));
}

#[test]
fn test_boolean_operations() {
    let a = high_only();
    let b = even_length();

    let and = a.intersect(&b);
    let or = a.union(&b);
    let diff = a.difference(&b);
    let not = a.negate();

    for word in words(4) {
        let (x, y) = (a.accepts(&word), b.accepts(&word));
        assert_eq!(and.accepts(&word), x && y);
        assert_eq!(or.accepts(&word), x || y);
        assert_eq!(diff.accepts(&word), x && !y);
        assert_eq!(not.accepts(&word), !x);
    }
}

#[test]
fn test_minimization_merges_equivalent_states() {
    // two copies of the even length automaton
    let mut builder = DfaBuilder::new(4, 2);
    builder.store_state(1);
    builder.store_state(2);
    builder.store_state(3);
    builder.store_state(0);
    let dfa = builder.build("+-+-").minimize();

    assert_eq!(dfa.state_count(), 2);
    assert!(dfa.is_equal(&even_length()));
}

#[test]
fn test_projection() {
    // the second bit must alternate 0, 1, 0, ...
    let mut builder = DfaBuilder::new(3, 2);
    builder.store_exception_str(1, "X0");
    builder.store_state(2);
    builder.store_exception_str(0, "X1");
    builder.store_state(2);
    builder.store_state(2);
    let dfa = builder.build("++-");

    let projected = dfa.project(1);
    for word in words(3) {
        assert!(projected.accepts(&word));
    }

    let narrowed = dfa.project_away(1);
    assert_eq!(narrowed.num_vars(), 1);
    assert!(narrowed.accepts(&[vec![true], vec![false], vec![true]]));
}

#[test]
fn test_concatenation_and_closure() {
    let one = {
        let mut builder = DfaBuilder::new(3, 2);
        builder.store_exception_str(1, "11");
        builder.store_state(2);
        builder.store_state(2);
        builder.store_state(2);
        builder.build("-+-")
    };

    let two = one.concatenate(&one);
    assert!(two.accepts(&[vec![true, true], vec![true, true]]));
    assert!(!two.accepts(&[vec![true, true]]));

    let star = one.kleene_closure();
    let plus = one.closure();
    assert!(star.accepts(&[]));
    assert!(!plus.accepts(&[]));
    assert!(plus.accepts(&vec![vec![true, true]; 5]));
    assert!(star.is_cyclic());
    assert!(!two.is_cyclic());
}

#[test]
fn test_queries() {
    let dfa = high_only();
    assert!(!dfa.is_language_empty());
    assert!(Dfa::phi(2).is_language_empty());
    assert!(Dfa::empty_word(2).is_only_initial_state_accepting());
    assert!(!dfa.is_only_initial_state_accepting());
    assert!(dfa.sink().is_some());

    let exact = Dfa::any_within_range(2, &[Bit::pattern("00")], 2, 2);
    assert!(!exact.is_accepting_single_word());
    assert!(exact.accepts(&[vec![true, false], vec![false, true]]));
    assert!(!exact.accepts(&[vec![false, false], vec![false, true]]));

    let word = dfa
        .intersect(&Dfa::any_within_range(2, &[], 3, 3))
        .accepting_word(&FirstPathHeuristic)
        .unwrap();
    assert_eq!(word.len(), 3);
    assert!(word.iter().all(|symbol| symbol[0]));
}

#[test]
fn test_subset_construction() {
    // `X1` then anything, or anything then `1X`
    let mut nfa = Nfa::new(2);
    nfa.add_state(false, &[(Bit::pattern("X1"), 1), (Bit::pattern("XX"), 2)]);
    nfa.add_state(true, &[]);
    nfa.add_state(false, &[(Bit::pattern("1X"), 3)]);
    nfa.add_state(true, &[]);
    nfa.set_start(vec![0]);
    let dfa = nfa.determinize().minimize();

    for word in words(3) {
        let expected = (word.len() == 1 && word[0][1]) || (word.len() == 2 && word[1][0]);
        assert_eq!(dfa.accepts(&word), expected, "{:?}", word);
    }
}

#[test]
fn test_export() {
    let dfa = high_only();
    let dot = dfa.to_dot(false);
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("1X"));

    let graph = dfa.to_graph();
    assert_eq!(graph.node_count(), dfa.state_count());

    let components = dfa.strongly_connected_components();
    assert_eq!(components.len(), dfa.state_count());
}
