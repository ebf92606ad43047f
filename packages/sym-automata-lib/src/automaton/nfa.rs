use std::collections::VecDeque;

use hashbrown::HashMap;
use itertools::Itertools;

use crate::automaton::{
    bdd::{Bdd, BddRef, Bit},
    dfa::{Dfa, node::DfaNode},
};

/// A sorted set of states without duplicates.
pub type StateSet = Vec<usize>;

pub fn union_sets(a: &StateSet, b: &StateSet) -> StateSet {
    let mut result = a.iter().chain(b.iter()).copied().collect_vec();
    result.sort_unstable();
    result.dedup();
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NfaNode {
    pub accepting: bool,
    pub transitions: BddRef,
}

/// A nondeterministic automaton over a bit alphabet. The leaves of the
/// transition diagrams are sets of destination states, so a symbol with no
/// destination leads to the empty set. The automaton starts in a set of
/// states.
#[derive(Debug, Clone)]
pub struct Nfa {
    num_vars: usize,
    start: StateSet,
    states: Vec<NfaNode>,
    bdd: Bdd<StateSet>,
}

impl Nfa {
    pub fn new(num_vars: usize) -> Self {
        Nfa {
            num_vars,
            start: vec![],
            states: vec![],
            bdd: Bdd::new(),
        }
    }

    pub fn from_dfa(dfa: &Dfa) -> Self {
        let mut nfa = Nfa::new(dfa.num_vars());
        let mut memo = HashMap::new();

        for node in dfa.states() {
            let root = nfa
                .bdd
                .map_from(dfa.bdd(), node.transitions, &mut memo, &mut |bdd, target| {
                    bdd.leaf(vec![*target])
                });
            nfa.states.push(NfaNode {
                accepting: node.accepting,
                transitions: root,
            });
        }
        nfa.start = vec![dfa.start()];

        nfa
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn start(&self) -> &StateSet {
        &self.start
    }

    pub fn set_start(&mut self, start: StateSet) {
        let mut start = start;
        start.sort_unstable();
        start.dedup();
        self.start = start;
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    pub fn set_accepting(&mut self, state: usize, accepting: bool) {
        self.states[state].accepting = accepting;
    }

    /// Adds a state whose transitions are given by an exception list with
    /// union semantics: a symbol leads to every destination whose pattern
    /// matches it.
    pub fn add_state(&mut self, accepting: bool, edges: &[(Vec<Bit>, usize)]) -> usize {
        let root = compile_sets(&mut self.bdd, edges);
        self.states.push(NfaNode {
            accepting,
            transitions: root,
        });
        self.states.len() - 1
    }

    /// Existentially quantifies bit `var` in every transition.
    pub fn project(&mut self, var: usize) {
        let mut memo = HashMap::new();
        let mut union_memo = HashMap::new();

        for index in 0..self.states.len() {
            let root = self.states[index].transitions;
            let projected = self.bdd.exists(root, var as u32, &mut memo, &mut |bdd, low, high| {
                bdd.apply_within(low, high, &mut union_memo, &mut |bdd, a, b| {
                    bdd.leaf(union_sets(a, b))
                })
            });
            self.states[index].transitions = projected;
        }
    }

    /// Symbolic subset construction. The empty set becomes an explicit sink,
    /// so the result is complete. The result is not minimized.
    pub fn determinize(&self) -> Dfa {
        let span = tracing::span!(tracing::Level::DEBUG, "Nfa::determinize");
        let _enter = span.enter();

        let mut work = self.bdd.clone();
        let mut union_memo = HashMap::new();
        let mut map_memo = HashMap::new();

        let mut bdd = Bdd::new();
        let mut set_ids: HashMap<StateSet, usize> = HashMap::new();
        let mut sets = vec![self.start.clone()];
        let mut queue = VecDeque::from([0usize]);
        set_ids.insert(self.start.clone(), 0);

        let mut states = vec![];

        while let Some(index) = queue.pop_front() {
            let set = sets[index].clone();

            let combined = match set.split_first() {
                None => work.leaf(vec![]),
                Some((first, rest)) => {
                    rest.iter()
                        .fold(self.states[*first].transitions, |acc, state| {
                            work.apply_within(
                                acc,
                                self.states[*state].transitions,
                                &mut union_memo,
                                &mut |bdd, a, b| bdd.leaf(union_sets(a, b)),
                            )
                        })
                }
            };

            let root = bdd.map_from(&work, combined, &mut map_memo, &mut |bdd, target: &StateSet| {
                let id = *set_ids.entry(target.clone()).or_insert_with(|| {
                    sets.push(target.clone());
                    queue.push_back(sets.len() - 1);
                    sets.len() - 1
                });
                bdd.leaf(id)
            });

            let accepting = set.iter().any(|state| self.states[*state].accepting);
            states.push(if accepting {
                DfaNode::accepting(root)
            } else {
                DfaNode::non_accepting(root)
            });
        }

        tracing::debug!(
            "determinized {} states into {} subsets",
            self.states.len(),
            states.len()
        );

        Dfa::from_parts(self.num_vars, 0, states, bdd)
    }
}

/// Compiles an exception list with union semantics into a diagram whose
/// leaves are the sets of matching destinations.
pub fn compile_sets(bdd: &mut Bdd<StateSet>, edges: &[(Vec<Bit>, usize)]) -> BddRef {
    let active = (0..edges.len()).collect_vec();
    compile_sets_rec(bdd, edges, &active, 0)
}

fn compile_sets_rec(
    bdd: &mut Bdd<StateSet>,
    edges: &[(Vec<Bit>, usize)],
    active: &[usize],
    var: usize,
) -> BddRef {
    let bit_of = |i: usize| edges[i].0.get(var).copied().unwrap_or(Bit::Any);

    let settled = active
        .iter()
        .all(|i| edges[*i].0.iter().skip(var).all(|b| *b == Bit::Any));
    if settled {
        let mut targets = active.iter().map(|i| edges[*i].1).collect_vec();
        targets.sort_unstable();
        targets.dedup();
        return bdd.leaf(targets);
    }

    let low_active = active
        .iter()
        .copied()
        .filter(|i| bit_of(*i) != Bit::One)
        .collect_vec();
    let high_active = active
        .iter()
        .copied()
        .filter(|i| bit_of(*i) != Bit::Zero)
        .collect_vec();

    if low_active.len() == active.len() && high_active.len() == active.len() {
        return compile_sets_rec(bdd, edges, active, var + 1);
    }

    let low = compile_sets_rec(bdd, edges, &low_active, var + 1);
    let high = compile_sets_rec(bdd, edges, &high_active, var + 1);
    bdd.branch(var as u32, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::dfa::minimization::Minimizable;

    #[test]
    fn union_of_overlapping_edges() {
        // state 0 reads `1X` into 1 and `X1` into 2, both accept with no exits
        let mut nfa = Nfa::new(2);
        nfa.add_state(false, &[(Bit::pattern("1X"), 1), (Bit::pattern("X1"), 2)]);
        nfa.add_state(true, &[]);
        nfa.add_state(true, &[]);
        nfa.set_start(vec![0]);

        let dfa = nfa.determinize().minimize();
        assert!(dfa.accepts(&[vec![true, true]]));
        assert!(dfa.accepts(&[vec![false, true]]));
        assert!(!dfa.accepts(&[vec![false, false]]));
        assert!(!dfa.accepts(&[vec![true, true], vec![true, true]]));
    }
}
