use hashbrown::HashMap;

use crate::automaton::{
    bdd::{Bdd, BddRef},
    dfa::{Dfa, node::DfaNode},
};

pub trait Minimizable {
    fn minimize(&self) -> Self;
}

impl Minimizable for Dfa {
    /// Minimizes the automaton by partition refinement.
    ///
    /// Only states reachable from the start survive. In every round, the
    /// signature of a state is its current class together with its transition
    /// diagram relabelled to classes. Because diagrams are hash-consed,
    /// equal signatures share the same root, so a round is a single pass over
    /// the states. Classes are numbered in breadth first order, which makes
    /// the start state `0` and the result canonical.
    fn minimize(&self) -> Self {
        let span = tracing::span!(tracing::Level::DEBUG, "Dfa::minimize");
        let _enter = span.enter();

        let order = self.reachable_states();
        let mut position = vec![usize::MAX; self.state_count()];
        for (i, state) in order.iter().enumerate() {
            position[*state] = i;
        }

        let mut class = number_by_first_appearance(
            order
                .iter()
                .map(|state| self.is_accepting(*state))
                .collect(),
        );
        let mut class_count = class.iter().max().map_or(0, |max| max + 1);

        loop {
            let mut signatures = Bdd::<usize>::new();
            let mut memo = HashMap::new();
            let keys = order
                .iter()
                .enumerate()
                .map(|(i, state)| {
                    let root = signatures.map_from(
                        &self.bdd,
                        self.transitions(*state),
                        &mut memo,
                        &mut |bdd, target| bdd.leaf(class[position[*target]]),
                    );
                    (class[i], root)
                })
                .collect::<Vec<(usize, BddRef)>>();

            let refined = number_by_first_appearance(keys);
            let refined_count = refined.iter().max().map_or(0, |max| max + 1);
            class = refined;

            if refined_count == class_count {
                break;
            }
            class_count = refined_count;
        }

        let mut bdd = Bdd::new();
        let mut memo = HashMap::new();
        let mut states: Vec<Option<DfaNode>> = vec![None; class_count];

        for (i, state) in order.iter().enumerate() {
            if states[class[i]].is_some() {
                continue;
            }

            let root = bdd.map_from(
                &self.bdd,
                self.transitions(*state),
                &mut memo,
                &mut |bdd, target| bdd.leaf(class[position[*target]]),
            );
            states[class[i]] = Some(if self.is_accepting(*state) {
                DfaNode::accepting(root)
            } else {
                DfaNode::non_accepting(root)
            });
        }

        let states = states.into_iter().flatten().collect::<Vec<_>>();
        tracing::debug!(
            "minimized {} states to {}",
            self.state_count(),
            states.len()
        );

        Dfa::from_parts(self.num_vars(), 0, states, bdd)
    }
}

/// Replaces every key by the order in which it first appears.
fn number_by_first_appearance<K: Eq + std::hash::Hash>(keys: Vec<K>) -> Vec<usize> {
    let mut ids = HashMap::new();
    keys.into_iter()
        .map(|key| {
            let next = ids.len();
            *ids.entry(key).or_insert(next)
        })
        .collect()
}
