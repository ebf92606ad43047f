//! Multi-track automata built symbol by symbol.
//!
//! Every word of a multi-track automaton ends with at least one column in
//! which all tracks read the padding symbol, and a track never leaves the
//! padding once it entered it.

use itertools::Itertools;

use crate::automaton::{
    Automaton,
    bdd::Bit,
    dfa::{Dfa, builder::DfaBuilder},
    relational::{
        relation::RelationKind,
        track::TrackLayout,
        transition_table::{Comparison, RelationCache, RelationKey},
    },
    string::{LAMBDA, RESERVED, StringAutomaton, VAR_PER_CHAR, char_pattern},
};

fn lambda() -> Vec<Bit> {
    char_pattern(LAMBDA)
}

fn reserved() -> Vec<Bit> {
    char_pattern(RESERVED)
}

fn any_char() -> Vec<Bit> {
    vec![Bit::Any; VAR_PER_CHAR]
}

/// Puts the words of a single-track automaton on `track`, each followed by
/// padding. The other tracks are unconstrained.
///
/// An extra last variable tells the transitions of `dfa` apart from the ones
/// entering the padding, for automata that read the padding symbol
/// themselves. It is projected away at the end.
pub fn embed(dfa: &Dfa, track: usize, layout: TrackLayout) -> Dfa {
    assert_eq!(dfa.num_vars(), VAR_PER_CHAR);

    let extra = layout.num_vars();
    let lambda_state = dfa.state_count();
    let sink = lambda_state + 1;
    let source_sink = dfa.sink();

    let lambda_step = || {
        let mut pattern = layout.wildcard();
        layout.set_lambda(&mut pattern, track);
        pattern.push(Bit::One);
        pattern
    };

    let mut builder = DfaBuilder::new(dfa.state_count() + 2, extra + 1);
    for state in 0..dfa.state_count() {
        if dfa.is_accepting(state) {
            builder.store_exception(lambda_state, lambda_step());
        }
        for (chars, target) in dfa.paths(state) {
            if Some(target) == source_sink {
                continue;
            }
            let mut pattern = layout.wildcard();
            layout.set(&mut pattern, track, &chars);
            pattern.push(Bit::Zero);
            builder.store_exception(target, pattern);
        }
        builder.store_state(sink);
    }
    builder.store_exception(lambda_state, lambda_step());
    builder.store_state(sink);
    builder.store_state(sink);

    let mut accepting = vec![false; dfa.state_count() + 2];
    accepting[lambda_state] = true;

    builder
        .build_with(&accepting)
        .with_start(dfa.start())
        .project_away(extra)
}

/// Every track reads any string followed by padding.
pub fn any_aligned(layout: TrackLayout) -> Dfa {
    let any = StringAutomaton::make_any_string();
    (0..layout.num_tracks())
        .map(|track| embed(any.dfa(), track, layout))
        .reduce(|a, b| a.intersect(&b))
        .unwrap_or_else(|| Dfa::universe(layout.num_vars()))
}

/// Padding discipline between two tracks only.
pub fn binary_aligned(layout: TrackLayout, left: usize, right: usize) -> Dfa {
    let (init, lambda_star, lambda_lambda, star_lambda, sink) = (0, 1, 2, 3, 4);
    let pair = |l: &[Bit], r: &[Bit]| layout.pattern(&[(left, l), (right, r)]);
    let (lambda, reserved, any) = (lambda(), reserved(), any_char());

    let mut builder = DfaBuilder::new(5, layout.num_vars());

    builder.store_exception(lambda_lambda, pair(&lambda, &lambda));
    builder.store_exception(sink, pair(&lambda, &reserved));
    builder.store_exception(lambda_star, pair(&lambda, &any));
    builder.store_exception(sink, pair(&reserved, &any));
    builder.store_exception(sink, pair(&any, &reserved));
    builder.store_exception(star_lambda, pair(&any, &lambda));
    builder.store_state(init);

    builder.store_exception(lambda_lambda, pair(&lambda, &lambda));
    builder.store_exception(sink, pair(&lambda, &reserved));
    builder.store_exception(lambda_star, pair(&lambda, &any));
    builder.store_state(sink);

    builder.store_exception(lambda_lambda, pair(&lambda, &lambda));
    builder.store_state(sink);

    builder.store_exception(lambda_lambda, pair(&lambda, &lambda));
    builder.store_exception(sink, pair(&reserved, &lambda));
    builder.store_exception(star_lambda, pair(&any, &lambda));
    builder.store_state(sink);

    builder.store_state(sink);

    builder.build("--+--")
}

/// Words ending in a column of padding on every track.
pub fn ends_with_padding(layout: TrackLayout) -> Dfa {
    let all_lambda = (0..layout.num_tracks())
        .fold(layout.wildcard(), |mut pattern, track| {
            layout.set_lambda(&mut pattern, track);
            pattern
        });

    let mut builder = DfaBuilder::new(2, layout.num_vars());
    for _ in 0..2 {
        builder.store_exception(1, all_lambda.clone());
        builder.store_state(0);
    }
    builder.build("-+")
}

/// Follows the all-padding column from `state`, returning the states seen
/// after one or more steps.
pub(crate) fn padding_chain(dfa: &Dfa, state: usize) -> Vec<usize> {
    let symbol = vec![true; dfa.num_vars()];
    let mut chain: Vec<usize> = vec![];
    let mut current = dfa.next_state(state, &symbol);
    while !chain.contains(&current) {
        chain.push(current);
        current = dfa.next_state(current, &symbol);
    }
    chain
}

/// Makes the amount of trailing padding irrelevant: a word ending in padding
/// is accepted as soon as some longer padding of it is.
pub fn normalize_padding(dfa: &Dfa, layout: TrackLayout) -> Dfa {
    let mut result = dfa.clone();
    for state in 0..dfa.state_count() {
        let accepting = dfa.is_accepting(state)
            || padding_chain(dfa, state)
                .iter()
                .any(|s| dfa.is_accepting(*s));
        result.set_accepting(state, accepting);
    }
    result.intersect(&ends_with_padding(layout))
}

/// Synthesizes the order relations from the character comparison tables.
fn comparison_dfa(
    cache: &RelationCache,
    comparison: Comparison,
    layout: TrackLayout,
    left: usize,
    right: usize,
) -> Dfa {
    let (eq, smaller, greater, sink) = (0, 1, 2, 3);
    let pair = |l: &[Bit], r: &[Bit]| layout.pattern(&[(left, l), (right, r)]);
    let (lambda, any) = (lambda(), any_char());

    let mut builder = DfaBuilder::new(4, layout.num_vars());
    builder.store_exception(eq, pair(&lambda, &lambda));
    builder.store_exception(greater, pair(&any, &lambda));
    builder.store_exception(smaller, pair(&lambda, &any));
    for (target, table) in [
        (eq, Comparison::Eq),
        (smaller, Comparison::Lt),
        (greater, Comparison::Gt),
    ] {
        for (l, r) in cache.transitions(table, VAR_PER_CHAR).iter() {
            builder.store_exception(target, pair(l, r));
        }
    }
    builder.store_state(sink);
    builder.store_state(smaller);
    builder.store_state(greater);
    builder.store_state(sink);

    let accepting = comparison
        .final_states()
        .into_iter()
        .chain([false])
        .collect_vec();

    builder
        .build_with(&accepting)
        .intersect(&binary_aligned(layout, left, right))
}

/// The left track starts with the right one.
fn begins_dfa(cache: &RelationCache, layout: TrackLayout, left: usize, right: usize) -> Dfa {
    let (matching, right_done, done, sink) = (0, 1, 2, 3);
    let pair = |l: &[Bit], r: &[Bit]| layout.pattern(&[(left, l), (right, r)]);
    let (lambda, any) = (lambda(), any_char());

    let mut builder = DfaBuilder::new(4, layout.num_vars());
    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_exception(right_done, pair(&any, &lambda));
    for (l, r) in cache.transitions(Comparison::Eq, VAR_PER_CHAR).iter() {
        builder.store_exception(matching, pair(l, r));
    }
    builder.store_state(sink);

    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_exception(right_done, pair(&any, &lambda));
    builder.store_state(sink);

    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_state(sink);

    builder.store_state(sink);

    builder
        .build("--+-")
        .intersect(&binary_aligned(layout, left, right))
}

/// The left track does not start with the right one.
fn not_begins_dfa(cache: &RelationCache, layout: TrackLayout, left: usize, right: usize) -> Dfa {
    let (matching, left_done, mismatch, done, right_done, sink) = (0, 1, 2, 3, 4, 5);
    let pair = |l: &[Bit], r: &[Bit]| layout.pattern(&[(left, l), (right, r)]);
    let (lambda, any) = (lambda(), any_char());

    let mut builder = DfaBuilder::new(6, layout.num_vars());
    builder.store_exception(sink, pair(&lambda, &lambda));
    builder.store_exception(left_done, pair(&lambda, &any));
    builder.store_exception(sink, pair(&any, &lambda));
    for (l, r) in cache.transitions(Comparison::Eq, VAR_PER_CHAR).iter() {
        builder.store_exception(matching, pair(l, r));
    }
    builder.store_state(mismatch);

    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_exception(left_done, pair(&lambda, &any));
    builder.store_state(sink);

    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_exception(left_done, pair(&lambda, &any));
    builder.store_exception(right_done, pair(&any, &lambda));
    builder.store_state(mismatch);

    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_state(sink);

    builder.store_exception(done, pair(&lambda, &lambda));
    builder.store_exception(right_done, pair(&any, &lambda));
    builder.store_state(sink);

    builder.store_state(sink);

    builder
        .build("---+--")
        .intersect(&binary_aligned(layout, left, right))
}

/// The relation between two distinct tracks, memoized in `cache`.
pub fn binary_relation(
    cache: &RelationCache,
    kind: RelationKind,
    layout: TrackLayout,
    left: usize,
    right: usize,
) -> Dfa {
    assert_ne!(left, right, "A binary relation needs two distinct tracks");

    let key = RelationKey {
        kind,
        num_tracks: layout.num_tracks(),
        left,
        right,
    };
    let dfa = cache.relation(key, |cache| {
        let span = tracing::span!(tracing::Level::DEBUG, "binary_relation");
        let _enter = span.enter();

        match kind {
            RelationKind::Eq => comparison_dfa(cache, Comparison::Eq, layout, left, right),
            RelationKind::NotEq => comparison_dfa(cache, Comparison::NotEq, layout, left, right),
            RelationKind::Lt => comparison_dfa(cache, Comparison::Lt, layout, left, right),
            RelationKind::Le => comparison_dfa(cache, Comparison::Le, layout, left, right),
            RelationKind::Gt => comparison_dfa(cache, Comparison::Gt, layout, left, right),
            RelationKind::Ge => comparison_dfa(cache, Comparison::Ge, layout, left, right),
            RelationKind::Begins => begins_dfa(cache, layout, left, right),
            RelationKind::NotBegins => not_begins_dfa(cache, layout, left, right),
        }
    });
    dfa.as_ref().clone()
}

/// Three tracks `left`, `prefix` and `suffix` with `left = prefix · suffix`.
/// The suffix track starts with padding for as long as the prefix runs, so
/// the skeleton is not aligned on that track.
pub fn prefix_suffix(cache: &RelationCache) -> Dfa {
    let layout = TrackLayout::new(3);
    let (left, prefix, suffix) = (0, 1, 2);
    let (in_prefix, in_suffix, done, sink) = (0, 1, 2, 3);
    let lambda = lambda();
    let eq = cache.transitions(Comparison::Eq, VAR_PER_CHAR);
    let triple = |l: &[Bit], p: &[Bit], s: &[Bit]| {
        layout.pattern(&[(left, l), (prefix, p), (suffix, s)])
    };

    let mut builder = DfaBuilder::new(4, layout.num_vars());
    builder.store_exception(done, triple(&lambda, &lambda, &lambda));
    for (l, r) in eq.iter() {
        builder.store_exception(in_prefix, triple(l, r, &lambda));
    }
    for (l, r) in eq.iter() {
        builder.store_exception(in_suffix, triple(l, &lambda, r));
    }
    builder.store_state(sink);

    builder.store_exception(done, triple(&lambda, &lambda, &lambda));
    for (l, r) in eq.iter() {
        builder.store_exception(in_suffix, triple(l, &lambda, r));
    }
    builder.store_state(sink);

    builder.store_exception(done, triple(&lambda, &lambda, &lambda));
    builder.store_state(sink);

    builder.store_state(sink);

    builder.build("--+-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(layout: TrackLayout, tracks: &[&str]) -> Vec<Vec<bool>> {
        let bytes = tracks.iter().map(|t| t.as_bytes()).collect_vec();
        layout.encode(&bytes)
    }

    #[test]
    fn test_embedding_pads_its_track() {
        let layout = TrackLayout::new(2);
        let dfa = embed(StringAutomaton::make_string("ab").dfa(), 1, layout)
            .intersect(&any_aligned(layout));

        assert!(dfa.accepts(&word(layout, &["", "ab"])));
        assert!(dfa.accepts(&word(layout, &["xyz", "ab"])));
        assert!(!dfa.accepts(&word(layout, &["", "a"])));
        assert!(!dfa.accepts(&word(layout, &["ab", ""])));
    }

    #[test]
    fn test_order_is_lexicographic() {
        let cache = RelationCache::new();
        let layout = TrackLayout::new(2);
        let lt = binary_relation(&cache, RelationKind::Lt, layout, 0, 1);

        assert!(lt.accepts(&word(layout, &["ab", "b"])));
        assert!(lt.accepts(&word(layout, &["ab", "abc"])));
        assert!(!lt.accepts(&word(layout, &["abc", "ab"])));
        assert!(!lt.accepts(&word(layout, &["ab", "ab"])));
        assert_eq!(cache.cached_relations(), 1);
    }

    #[test]
    fn test_begins() {
        let cache = RelationCache::new();
        let layout = TrackLayout::new(2);
        let begins = binary_relation(&cache, RelationKind::Begins, layout, 0, 1);
        let not_begins = binary_relation(&cache, RelationKind::NotBegins, layout, 0, 1);

        for (left, right, expected) in [
            ("abc", "ab", true),
            ("ab", "ab", true),
            ("ab", "", true),
            ("ab", "abc", false),
            ("ab", "b", false),
            ("", "a", false),
        ] {
            let w = word(layout, &[left, right]);
            assert_eq!(begins.accepts(&w), expected, "{:?} begins {:?}", left, right);
            assert_eq!(not_begins.accepts(&w), !expected, "{:?} !begins {:?}", left, right);
        }
    }

    #[test]
    fn test_prefix_suffix_skeleton() {
        let cache = RelationCache::new();
        let layout = TrackLayout::new(3);
        let skeleton = prefix_suffix(&cache);

        // the suffix track is shifted behind the prefix
        let mut shifted = word(layout, &["abc", "ab", "  c"]);
        for step in 0..2 {
            for bit in 0..VAR_PER_CHAR {
                shifted[step][layout.var(2, bit)] = true;
            }
        }
        assert!(skeleton.accepts(&shifted));
        assert!(!skeleton.accepts(&word(layout, &["abc", "ab", "c"])));
    }
}
