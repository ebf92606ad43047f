//! String operations computed through the three track skeleton
//! `left = prefix · suffix`.
//!
//! The suffix track of the skeleton starts with padding while the prefix
//! runs, so its automaton is prefixed with `λ*` before it is embedded. When
//! a track is read back, the padding around the string is cut off again.

use crate::automaton::{
    Automaton,
    dfa::{Dfa, builder::DfaBuilder, minimization::Minimizable},
    nfa::Nfa,
    relational::{
        construct::{embed, padding_chain, prefix_suffix},
        track::TrackLayout,
        transition_table::RelationCache,
    },
    string::{LAMBDA, StringAutomaton, VAR_PER_CHAR, char_bits, char_pattern},
};

const LEFT: usize = 0;
const PREFIX: usize = 1;
const SUFFIX: usize = 2;

/// `λ* · L`
pub fn prepend_lambda(dfa: &Dfa) -> Dfa {
    let mut builder = DfaBuilder::new(2, VAR_PER_CHAR);
    builder.store_exception(0, char_pattern(LAMBDA));
    builder.store_state(1);
    builder.store_state(1);
    builder.build("+-").concatenate(dfa)
}

/// Removes a leading run of padding: the words `w` not starting with the
/// padding symbol such that `λ^n · w ∈ L`.
pub fn trim_lambda_prefix(dfa: &Dfa) -> Dfa {
    let lambda = char_bits(LAMBDA);
    let mut starts = vec![dfa.start()];
    let mut current = dfa.next_state(dfa.start(), &lambda);
    while !starts.contains(&current) {
        starts.push(current);
        current = dfa.next_state(current, &lambda);
    }

    let mut nfa = Nfa::from_dfa(dfa);
    nfa.set_start(starts);

    let mut no_leading = DfaBuilder::new(3, VAR_PER_CHAR);
    no_leading.store_exception(2, char_pattern(LAMBDA));
    no_leading.store_state(1);
    no_leading.store_state(1);
    no_leading.store_state(2);

    nfa.determinize()
        .minimize()
        .intersect(&no_leading.build("++-"))
}

/// Removes the trailing padding: the words `w` not ending with the padding
/// symbol such that `w · λ^n ∈ L` for some `n ≥ 1`.
pub fn trim_lambda_suffix(dfa: &Dfa) -> Dfa {
    assert_eq!(dfa.num_vars(), VAR_PER_CHAR);

    let mut result = dfa.clone();
    for state in 0..dfa.state_count() {
        let accepting = padding_chain(dfa, state)
            .iter()
            .any(|s| dfa.is_accepting(*s));
        result.set_accepting(state, accepting);
    }

    let mut no_trailing = DfaBuilder::new(2, VAR_PER_CHAR);
    for _ in 0..2 {
        no_trailing.store_exception(1, char_pattern(LAMBDA));
        no_trailing.store_state(0);
    }
    result.intersect(&no_trailing.build("+-"))
}

/// Reads the strings on `track` of a multi-track automaton, ignoring the
/// other tracks.
pub(crate) fn extract_track(dfa: &Dfa, track: usize, layout: TrackLayout) -> StringAutomaton {
    let mut result = dfa.clone();
    for other in (0..layout.num_tracks()).rev().filter(|t| *t != track) {
        for bit in 0..VAR_PER_CHAR {
            result = result.project(layout.var(other, bit));
        }
    }

    let map = (0..layout.num_vars())
        .map(|var| (var % layout.num_tracks() == track).then_some(var / layout.num_tracks()))
        .collect::<Vec<_>>();
    let result = result.replace_indices(&map, VAR_PER_CHAR);
    let result = trim_lambda_prefix(&trim_lambda_suffix(&result));

    StringAutomaton::new(result).intersect(&StringAutomaton::make_any_string())
}

fn skeleton_track(constraints: &[(usize, Dfa)], output: usize) -> StringAutomaton {
    let layout = TrackLayout::new(3);
    let dfa = constraints
        .iter()
        .fold(prefix_suffix(RelationCache::global()), |dfa, (track, constraint)| {
            dfa.intersect(&embed(constraint, *track, layout))
        });
    extract_track(&dfa, output, layout)
}

/// `prefix · suffix` built on the skeleton instead of the direct construction.
pub fn concat(prefix: &StringAutomaton, suffix: &StringAutomaton) -> StringAutomaton {
    let result = skeleton_track(
        &[
            (PREFIX, prefix.dfa().clone()),
            (SUFFIX, prepend_lambda(suffix.dfa())),
        ],
        LEFT,
    );
    tracing::debug!("{} = [{}]->concat({})", result.id(), prefix.id(), suffix.id());
    result
}

/// The strings `s` such that `t · s` is in `subject` for some `t` in `trim`.
pub fn trim_prefix(subject: &StringAutomaton, trim: &StringAutomaton) -> StringAutomaton {
    let result = skeleton_track(
        &[(LEFT, subject.dfa().clone()), (PREFIX, trim.dfa().clone())],
        SUFFIX,
    );
    tracing::debug!("{} = [{}]->trimPrefix({})", result.id(), subject.id(), trim.id());
    result
}

/// The strings `p` such that `p · t` is in `subject` for some `t` in `trim`.
pub fn trim_suffix(subject: &StringAutomaton, trim: &StringAutomaton) -> StringAutomaton {
    let result = skeleton_track(
        &[
            (LEFT, subject.dfa().clone()),
            (SUFFIX, prepend_lambda(trim.dfa())),
        ],
        PREFIX,
    );
    tracing::debug!("{} = [{}]->trimSuffix({})", result.id(), subject.id(), trim.id());
    result
}

/// The prefixes that, followed by a string of `suffix`, give a string of
/// `concat`.
pub fn pre_concat_prefix(concat: &StringAutomaton, suffix: &StringAutomaton) -> StringAutomaton {
    trim_suffix(concat, suffix)
}

/// The suffixes that, preceded by a string of `prefix`, give a string of
/// `concat`.
pub fn pre_concat_suffix(concat: &StringAutomaton, prefix: &StringAutomaton) -> StringAutomaton {
    trim_prefix(concat, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Language;

    #[test]
    fn test_lambda_padding() {
        let ab = StringAutomaton::make_string("ab");
        let padded = StringAutomaton::new(prepend_lambda(ab.dfa()));
        assert!(padded.accepts(b"ab"));
        assert!(padded.accepts(&[LAMBDA, LAMBDA, b'a', b'b']));
        assert!(!padded.accepts(&[b'a', LAMBDA, b'b']));

        let trimmed = trim_lambda_prefix(padded.dfa());
        assert!(trimmed.is_equal(ab.dfa()));
    }

    #[test]
    fn test_trim_suffix_padding() {
        // `a λ λ`, built by hand since the constructors refuse the padding
        let mut builder = DfaBuilder::new(5, VAR_PER_CHAR);
        for (state, c) in [b'a', LAMBDA, LAMBDA].into_iter().enumerate() {
            builder.store_exception(state + 1, char_pattern(c));
            builder.store_state(4);
        }
        builder.store_state(4);
        builder.store_state(4);
        let trimmed = StringAutomaton::new(trim_lambda_suffix(&builder.build("---+-")));
        assert!(trimmed.accepts(b"a"));
        assert!(!trimmed.accepts(b""));
        assert!(!trimmed.accepts(&[b'a', LAMBDA]));
    }
}
