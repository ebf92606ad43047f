use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use hashbrown::HashMap;
use itertools::Itertools;

use crate::automaton::{bdd::Bit, dfa::Dfa, relational::relation::RelationKind};

/// Pairs of character patterns, left track first.
pub type TransitionVector = Vec<(Vec<Bit>, Vec<Bit>)>;

/// Outcome of comparing two characters bit by bit, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// Which states of the comparator accept: equal so far, left smaller,
    /// left greater.
    pub(crate) fn final_states(self) -> [bool; 3] {
        match self {
            Comparison::Eq => [true, false, false],
            Comparison::NotEq => [false, true, true],
            Comparison::Lt => [false, true, false],
            Comparison::Le => [true, true, false],
            Comparison::Gt => [false, false, true],
            Comparison::Ge => [true, false, true],
        }
    }
}

/// The pattern pairs of `bits` wide characters that compare as `comparison`.
///
/// Runs the three state comparator breadth first: from the equal state, `00`
/// and `11` stay, `01` decides "smaller" and `10` decides "greater". A
/// decided state ignores the remaining bits.
pub fn generate_transitions(comparison: Comparison, bits: usize) -> TransitionVector {
    let equal = [
        ((Bit::Zero, Bit::Zero), 0),
        ((Bit::Zero, Bit::One), 1),
        ((Bit::One, Bit::Zero), 2),
        ((Bit::One, Bit::One), 0),
    ];
    let decided = |state| [((Bit::Any, Bit::Any), state)];

    let finals = comparison.final_states();
    let mut result = vec![];
    let mut queue = std::collections::VecDeque::from([(0usize, vec![], vec![])]);

    while let Some((state, left, right)) = queue.pop_front() {
        if left.len() >= bits {
            if finals[state] {
                result.push((left, right));
            }
            continue;
        }

        let steps = match state {
            0 => equal.to_vec(),
            _ => decided(state).to_vec(),
        };
        for ((l, r), next) in steps {
            let mut left = left.clone();
            let mut right = right.clone();
            left.push(l);
            right.push(r);
            queue.push_back((next, left, right));
        }
    }

    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub kind: RelationKind,
    pub num_tracks: usize,
    pub left: usize,
    pub right: usize,
}

/// Memoized relation building blocks: the per-character transition tables and
/// the binary relation automata synthesized from them.
///
/// Entries are pure functions of their key, so a racing insert keeps whichever
/// value landed first.
#[derive(Debug, Default)]
pub struct RelationCache {
    transitions: RwLock<HashMap<(usize, Comparison), Arc<TransitionVector>>>,
    relations: RwLock<HashMap<RelationKey, Arc<Dfa>>>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every construction that is not handed one.
    pub fn global() -> &'static RelationCache {
        static CACHE: OnceLock<RelationCache> = OnceLock::new();
        CACHE.get_or_init(RelationCache::new)
    }

    pub fn transitions(&self, comparison: Comparison, bits: usize) -> Arc<TransitionVector> {
        let key = (bits, comparison);
        if let Some(table) = self
            .transitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return table.clone();
        }

        let table = Arc::new(generate_transitions(comparison, bits));
        tracing::debug!(
            "transition table {:?}/{} with {} entries",
            comparison,
            bits,
            table.len()
        );
        self.transitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(table)
            .clone()
    }

    pub fn relation(&self, key: RelationKey, build: impl FnOnce(&Self) -> Dfa) -> Arc<Dfa> {
        if let Some(dfa) = self
            .relations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return dfa.clone();
        }

        let dfa = Arc::new(build(self));
        self.relations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(dfa)
            .clone()
    }

    pub fn cached_tables(&self) -> Vec<(usize, Comparison)> {
        self.transitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .sorted_by_key(|(bits, comparison)| (*bits, *comparison as u8))
            .collect()
    }

    pub fn cached_relations(&self) -> usize {
        self.relations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        // 2^n equal pairs, one smaller pair per length of the common prefix
        assert_eq!(generate_transitions(Comparison::Eq, 3).len(), 8);
        assert_eq!(generate_transitions(Comparison::Lt, 3).len(), 4 + 2 + 1);
        assert_eq!(generate_transitions(Comparison::Le, 3).len(), 8 + 7);
        assert_eq!(generate_transitions(Comparison::NotEq, 3).len(), 14);
    }

    #[test]
    fn test_smaller_pairs() {
        let table = generate_transitions(Comparison::Lt, 2);
        let shown = table
            .iter()
            .map(|(l, r)| format!("{}/{}", Bit::pattern_to_string(l), Bit::pattern_to_string(r)))
            .collect_vec();
        assert_eq!(shown, vec!["00/01", "0X/1X", "10/11"]);
    }

    #[test]
    fn test_cache_reuses_entries() {
        let cache = RelationCache::new();
        let a = cache.transitions(Comparison::Eq, 8);
        let b = cache.transitions(Comparison::Eq, 8);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.cached_tables(), vec![(8, Comparison::Eq)]);
    }
}
