use num::BigUint;
use rand::{RngExt, SeedableRng, rngs::StdRng};
use sym_automata_lib::{
    automaton::{
        Automaton,
        relational::{
            MultiTrackAutomaton, lambda,
            relation::{RelationKind, StringRelation, TrackMap},
            transition_table::{Comparison, RelationCache},
        },
        string::StringAutomaton,
    },
    error::AutomatonError,
    validation::same_language::assert_language_matches,
};

const ALPHABET: &[u8] = b"abc";

fn var(name: &str) -> StringRelation {
    StringRelation::var(name)
}

fn build(relation: StringRelation, tracks: &[&str]) -> MultiTrackAutomaton {
    MultiTrackAutomaton::make_automaton(&relation, TrackMap::new(tracks)).unwrap()
}

fn strings(strings: &[&str]) -> StringAutomaton {
    StringAutomaton::make_strings(strings)
}

fn accepts(auto: &MultiTrackAutomaton, tracks: &[&str]) -> bool {
    let tracks = tracks.iter().map(|t| t.as_bytes()).collect::<Vec<_>>();
    auto.accepts_tracks(&tracks)
}

fn automaton_error(error: anyhow::Error) -> AutomatonError {
    error
        .downcast_ref::<AutomatonError>()
        .cloned()
        .expect("an automaton error")
}

#[test]
fn test_equality_with_a_constant() {
    let relation = StringRelation::equal(var("x"), var("y"))
        .and(StringRelation::equal(var("y"), StringRelation::constant("foo")));
    let auto = build(relation, &["x", "y"]);

    assert!(auto.get_k_track(0).check_equivalence(&strings(&["foo"])));
    assert!(auto.get_automaton_for_variable("y").unwrap().check_equivalence(&strings(&["foo"])));
    assert!(accepts(&auto, &["foo", "foo"]));
    assert!(!accepts(&auto, &["foo", "fo"]));
    assert_eq!(
        auto.get_an_accepting_string_for_each_track(),
        Some(vec!["foo".to_string(), "foo".to_string()])
    );
}

#[test]
fn test_order_against_a_constant() {
    let lt = build(
        StringRelation::compare(RelationKind::Lt, var("x"), StringRelation::constant("b")),
        &["x"],
    );
    assert_language_matches(&lt.get_k_track(0), |w| w < b"b".as_slice(), ALPHABET, 4);

    let ge = build(
        StringRelation::compare(RelationKind::Ge, var("x"), StringRelation::constant("ab")),
        &["x"],
    );
    assert_language_matches(&ge.get_k_track(0), |w| w >= b"ab".as_slice(), ALPHABET, 4);
}

#[test]
fn test_begins_with_a_regex() {
    let begins = build(
        StringRelation::compare(RelationKind::Begins, var("x"), StringRelation::regex("a+b")),
        &["x"],
    );
    let starts = |w: &[u8]| {
        let ones = w.iter().take_while(|c| **c == b'a').count();
        ones > 0 && w.get(ones) == Some(&b'b')
    };
    assert_language_matches(&begins.get_k_track(0), starts, ALPHABET, 5);

    let not_begins = build(
        StringRelation::compare(RelationKind::NotBegins, var("x"), StringRelation::constant("ab")),
        &["x"],
    );
    assert_language_matches(&not_begins.get_k_track(0), |w| !w.starts_with(b"ab"), ALPHABET, 4);
}

#[test]
fn test_same_operand_on_both_sides() {
    let eq = build(StringRelation::equal(var("x"), var("x")), &["x"]);
    let any = MultiTrackAutomaton::make_any_string_aligned(TrackMap::new(&["x"]));
    assert!(eq.check_equivalence(&any));

    let lt = build(StringRelation::compare(RelationKind::Lt, var("x"), var("x")), &["x"]);
    assert!(lt.is_empty_language());
}

#[test]
fn test_boolean_operations() {
    let tracks = TrackMap::new(&["x", "y"]);
    let eq = build(StringRelation::equal(var("x"), var("y")), &["x", "y"]);
    let not_eq = build(
        StringRelation::compare(RelationKind::NotEq, var("x"), var("y")),
        &["x", "y"],
    );

    let complement = eq.complement();
    assert!(complement.check_equivalence(&not_eq));
    assert!(matches!(
        complement.relation(),
        StringRelation::Compare { kind: RelationKind::NotEq, .. }
    ));

    let everything = eq.union(&not_eq).unwrap();
    assert!(everything.check_equivalence(&MultiTrackAutomaton::make_any_string_aligned(tracks)));
    assert!(eq.intersect(&not_eq).unwrap().is_empty_language());
    assert!(eq.difference(&not_eq).unwrap().check_equivalence(&eq));

    for (x, y) in [("ab", "ab"), ("ab", "a"), ("", "c")] {
        assert_eq!(accepts(&eq, &[x, y]), x == y);
        assert_eq!(accepts(&not_eq, &[x, y]), x != y);
    }
}

#[test]
fn test_track_count_mismatch() {
    let one = MultiTrackAutomaton::make_any_string_aligned(TrackMap::new(&["x"]));
    let two = MultiTrackAutomaton::make_any_string_aligned(TrackMap::new(&["x", "y"]));

    assert_eq!(
        automaton_error(one.union(&two).unwrap_err()),
        AutomatonError::TrackCountMismatch { left: 1, right: 2 }
    );
    assert!(two.intersect(&one).is_err());
}

#[test]
fn test_unknown_variable() {
    let auto = build(StringRelation::equal(var("x"), var("y")), &["x", "y"]);
    assert_eq!(
        automaton_error(auto.get_automaton_for_variable("z").unwrap_err()),
        AutomatonError::UnknownVariable("z".to_string())
    );

    let relation = StringRelation::equal(var("x"), var("w"));
    let error = MultiTrackAutomaton::make_automaton(&relation, TrackMap::new(&["x"])).unwrap_err();
    assert_eq!(automaton_error(error), AutomatonError::UnknownVariable("w".to_string()));
}

#[test]
fn test_projection() {
    let begins_ab =
        StringRelation::compare(RelationKind::Begins, var("y"), StringRelation::constant("ab"));
    let relation = StringRelation::equal(var("x"), var("y")).and(begins_ab);
    let auto = build(relation, &["x", "y"]);

    let projected = auto.project_away_variable("y").unwrap();
    assert_eq!(projected.num_tracks(), 1);
    assert_eq!(projected.tracks().names().to_vec(), vec!["x".to_string()]);
    assert_language_matches(&projected.get_k_track(0), |w| w.starts_with(b"ab"), ALPHABET, 5);

    assert!(matches!(
        automaton_error(projected.project_k_track(0).unwrap_err()),
        AutomatonError::Unsupported(_)
    ));
}

#[test]
fn test_embedding_string_automata() {
    let tracks = TrackMap::new(&["x", "y"]);
    let auto =
        MultiTrackAutomaton::from_string_automaton(&strings(&["a", "bc"]), 1, tracks.clone());
    assert!(accepts(&auto, &["ccc", "bc"]));
    assert!(!accepts(&auto, &["a", "c"]));

    let restricted = auto.intersect_string(&strings(&["", "b"]), "x").unwrap();
    assert!(restricted.get_k_track(0).check_equivalence(&strings(&["", "b"])));
    assert!(restricted.get_k_track(1).check_equivalence(&strings(&["a", "bc"])));

    assert!(MultiTrackAutomaton::make_phi(tracks.clone()).is_empty_language());
    assert!(!MultiTrackAutomaton::make_any_string_unaligned(tracks).is_empty_language());
}

#[test]
fn test_counting_tuples() {
    let auto = build(StringRelation::equal(var("x"), var("y")), &["x", "y"]);
    let chars = BigUint::from(254u32);
    assert_eq!(auto.count(2), BigUint::from(1u32) + &chars + &chars * &chars);
    assert!(auto.is_cyclic());

    let fixed = build(
        StringRelation::equal(var("x"), StringRelation::constant("ab"))
            .and(StringRelation::equal(var("y"), StringRelation::constant("c"))),
        &["x", "y"],
    );
    assert_eq!(fixed.count_all().unwrap(), BigUint::from(1u32));
    assert!(matches!(
        automaton_error(auto.count_all().unwrap_err()),
        AutomatonError::InfiniteLanguage
    ));
}

#[test]
fn test_injected_cache() {
    let cache = RelationCache::new();
    let relation = StringRelation::compare(RelationKind::Le, var("x"), var("y"));
    let tracks = TrackMap::new(&["x", "y"]);

    let first =
        MultiTrackAutomaton::make_automaton_with(&relation, tracks.clone(), &cache).unwrap();
    assert_eq!(cache.cached_relations(), 1);
    assert!(cache.cached_tables().contains(&(8, Comparison::Lt)));

    let second = MultiTrackAutomaton::make_automaton_with(&relation, tracks, &cache).unwrap();
    assert_eq!(cache.cached_relations(), 1);
    assert!(first.check_equivalence(&second));
}

#[test]
fn test_random_order_pairs() {
    let auto = build(StringRelation::compare(RelationKind::Lt, var("x"), var("y")), &["x", "y"]);
    let mut random = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let mut word = || {
            let length = random.random_range(0..4);
            (0..length)
                .map(|_| ALPHABET[random.random_range(0..ALPHABET.len())])
                .collect::<Vec<_>>()
        };
        let x = word();
        let y = word();
        assert_eq!(auto.accepts_tracks(&[x.as_slice(), y.as_slice()]), x < y, "{:?} < {:?}", x, y);
    }
}

#[test]
fn test_relation_serialization() {
    let begins =
        StringRelation::compare(RelationKind::Begins, var("x"), StringRelation::regex("a*"));
    let not_b = StringRelation::equal(var("x"), StringRelation::constant("b")).negate();
    let relation = begins.or(not_b);

    let json = serde_json::to_string(&relation).unwrap();
    let parsed: StringRelation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, relation);
    assert_eq!(parsed.variables(), vec!["x".to_string()]);
}

#[test]
fn test_concatenation_through_tracks() {
    let result = lambda::concat(&strings(&["a", "ab"]), &strings(&["", "b"]));
    assert!(result.check_equivalence(&strings(&["a", "ab", "abb"])));

    let any = StringAutomaton::make_any_string();
    let result = lambda::concat(&strings(&["x"]), &any);
    assert_language_matches(&result, |w| w.starts_with(b"x"), b"xy", 4);
}

#[test]
fn test_trimming_through_tracks() {
    let subject = strings(&["abc"]);

    let rest = lambda::trim_prefix(&subject, &strings(&["a", "ab"]));
    assert!(rest.check_equivalence(&strings(&["bc", "c"])));
    assert!(lambda::trim_prefix(&subject, &subject).is_empty_string());

    let head = lambda::trim_suffix(&subject, &strings(&["c"]));
    assert!(head.check_equivalence(&strings(&["ab"])));

    let prefixes = lambda::pre_concat_prefix(&subject, &strings(&["c", "bc"]));
    assert!(prefixes.check_equivalence(&strings(&["ab", "a"])));

    let suffixes = lambda::pre_concat_suffix(&subject, &strings(&["a"]));
    assert!(suffixes.check_equivalence(&strings(&["bc"])));

    assert!(lambda::trim_prefix(&subject, &strings(&["b"])).is_empty_language());
}
