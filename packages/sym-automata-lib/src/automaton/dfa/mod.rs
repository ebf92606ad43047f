use itertools::Itertools;

use crate::automaton::{
    bdd::{Bdd, BddRef, Bit},
    dfa::{builder::DfaBuilder, minimization::Minimizable, node::DfaNode},
};

pub mod analysis;
pub mod builder;
pub mod concat;
pub mod minimization;
pub mod node;
pub mod product;
pub mod project;
pub mod witness;

/// A complete deterministic finite automaton over a fixed-width bit alphabet.
///
/// Every symbol is a vector of `num_vars` bits. The transitions of each state
/// are a decision diagram in the automaton's own [Bdd] arena whose leaves are
/// destination states, so a single path can stand for many symbols. Since
/// every diagram is total, the automaton is complete: rejection is modelled
/// by an explicit sink state.
#[derive(Debug, Clone)]
pub struct Dfa {
    num_vars: usize,
    start: usize,
    states: Vec<DfaNode>,
    bdd: Bdd<usize>,
}

impl Dfa {
    pub fn from_parts(
        num_vars: usize,
        start: usize,
        states: Vec<DfaNode>,
        bdd: Bdd<usize>,
    ) -> Self {
        assert!(start < states.len(), "The start state must exist");

        let mut dfa = Dfa {
            num_vars,
            start,
            states,
            bdd,
        };
        dfa.refresh_sink_flags();
        dfa
    }

    /// The automaton accepting nothing.
    pub fn phi(num_vars: usize) -> Self {
        let mut builder = DfaBuilder::new(1, num_vars);
        builder.store_state(0);
        builder.build("-")
    }

    /// The automaton accepting every word, the reserved symbols included.
    pub fn universe(num_vars: usize) -> Self {
        let mut builder = DfaBuilder::new(1, num_vars);
        builder.store_state(0);
        builder.build("+")
    }

    /// The automaton accepting only the empty word.
    pub fn empty_word(num_vars: usize) -> Self {
        let mut builder = DfaBuilder::new(2, num_vars);
        builder.store_state(1);
        builder.store_state(1);
        builder.build("+-")
    }

    /// Every word over the alphabet without the `excluded` symbols.
    pub fn any_except(num_vars: usize, excluded: &[Vec<Bit>]) -> Self {
        Self::any_after_length(num_vars, excluded, 0)
    }

    /// Every non-empty word over the alphabet without the `excluded` symbols.
    pub fn any_but_not_empty(num_vars: usize, excluded: &[Vec<Bit>]) -> Self {
        Self::any_after_length(num_vars, excluded, 1)
    }

    /// Words of length `start..=end` over the alphabet without the `excluded`
    /// symbols.
    pub fn any_within_range(
        num_vars: usize,
        excluded: &[Vec<Bit>],
        start: usize,
        end: usize,
    ) -> Self {
        if start > end {
            return Self::phi(num_vars);
        }

        let sink = end + 1;
        let mut builder = DfaBuilder::new(end + 2, num_vars);
        for state in 0..=end {
            for pattern in excluded {
                builder.store_exception(sink, pattern.clone());
            }
            builder.store_state(if state == end { sink } else { state + 1 });
        }
        builder.store_state(sink);

        let accepting = (0..end + 2)
            .map(|state| state >= start && state <= end)
            .collect_vec();
        builder.build_with(&accepting).minimize()
    }

    /// Words of length at least `length` over the alphabet without the
    /// `excluded` symbols.
    pub fn any_after_length(num_vars: usize, excluded: &[Vec<Bit>], length: usize) -> Self {
        let sink = length + 1;
        let mut builder = DfaBuilder::new(length + 2, num_vars);
        for state in 0..=length {
            for pattern in excluded {
                builder.store_exception(sink, pattern.clone());
            }
            builder.store_state(if state == length { length } else { state + 1 });
        }
        builder.store_state(sink);

        let accepting = (0..length + 2).map(|state| state == length).collect_vec();
        builder.build_with(&accepting).minimize()
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[DfaNode] {
        &self.states
    }

    pub fn state(&self, state: usize) -> &DfaNode {
        &self.states[state]
    }

    pub fn bdd(&self) -> &Bdd<usize> {
        &self.bdd
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    pub fn transitions(&self, state: usize) -> BddRef {
        self.states[state].transitions
    }

    pub fn accepting_states(&self) -> Vec<usize> {
        (0..self.states.len())
            .filter(|state| self.states[*state].accepting)
            .collect()
    }

    pub fn set_accepting(&mut self, state: usize, accepting: bool) {
        self.states[state].accepting = accepting;
        self.refresh_sink_flags();
    }

    /// Recomputes which states are sinks: non-accepting states whose every
    /// transition loops back to themselves.
    pub fn refresh_sink_flags(&mut self) {
        for index in 0..self.states.len() {
            let node = self.states[index];
            let loops = self.bdd.leaf_value(node.transitions) == Some(&index);
            self.states[index].sink = !node.accepting && loops;
        }
    }

    /// The sink state, if the automaton has one.
    pub fn sink(&self) -> Option<usize> {
        self.states.iter().position(|node| node.sink)
    }

    pub fn is_sink(&self, state: usize) -> bool {
        self.states[state].sink
    }

    pub fn next_state(&self, state: usize, symbol: &[bool]) -> usize {
        *self.bdd.evaluate(self.states[state].transitions, symbol)
    }

    /// The distinct destinations of `state`.
    pub fn successors(&self, state: usize) -> Vec<usize> {
        self.bdd.leaves(self.states[state].transitions)
    }

    /// The transitions of `state` as disjoint patterns.
    pub fn paths(&self, state: usize) -> Vec<(Vec<Bit>, usize)> {
        self.bdd.paths(self.states[state].transitions, self.num_vars)
    }

    pub fn run(&self, word: &[Vec<bool>]) -> usize {
        self.run_from(self.start, word)
    }

    pub fn run_from(&self, state: usize, word: &[Vec<bool>]) -> usize {
        word.iter()
            .fold(state, |state, symbol| self.next_state(state, symbol))
    }

    pub fn accepts(&self, word: &[Vec<bool>]) -> bool {
        self.is_accepting(self.run(word))
    }

    /// Flips acceptance of every state. This is only a complement with
    /// respect to the full alphabet, reserved symbols included.
    pub fn negate(&self) -> Dfa {
        let mut dfa = self.clone();
        for node in dfa.states.iter_mut() {
            *node = node.invert();
        }
        dfa.refresh_sink_flags();
        dfa
    }

    /// Rebuilds the automaton with a different start state.
    pub fn with_start(&self, start: usize) -> Dfa {
        Dfa::from_parts(self.num_vars, start, self.states.clone(), self.bdd.clone()).minimize()
    }
}
