use itertools::Itertools;

use crate::automaton::{
    bdd::Bit,
    dfa::{Dfa, minimization::Minimizable},
    nfa::Nfa,
    string::{VAR_PER_CHAR, char_pattern},
};

#[derive(Debug, Clone, Default)]
struct CharNfaState {
    accepting: bool,
    edges: Vec<(Vec<Bit>, usize)>,
    epsilon: Vec<usize>,
}

/// An explicit NFA over characters with epsilon transitions. String
/// transformations describe their images and pre-images with it before
/// turning them into a [Dfa].
#[derive(Debug, Clone, Default)]
pub struct CharNfa {
    states: Vec<CharNfaState>,
    start: usize,
}

impl CharNfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, accepting: bool) -> usize {
        self.states.push(CharNfaState {
            accepting,
            ..Default::default()
        });
        self.states.len() - 1
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn set_start(&mut self, start: usize) {
        self.start = start;
    }

    pub fn add_edge(&mut self, from: usize, pattern: Vec<Bit>, to: usize) {
        self.states[from].edges.push((pattern, to));
    }

    pub fn add_char_edge(&mut self, from: usize, byte: u8, to: usize) {
        self.add_edge(from, char_pattern(byte), to);
    }

    pub fn add_epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    fn epsilon_closure(&self, state: usize) -> Vec<usize> {
        let mut visited = vec![false; self.states.len()];
        let mut stack = vec![state];
        visited[state] = true;

        while let Some(current) = stack.pop() {
            for next in &self.states[current].epsilon {
                if !visited[*next] {
                    visited[*next] = true;
                    stack.push(*next);
                }
            }
        }

        (0..self.states.len()).filter(|s| visited[*s]).collect()
    }

    /// Removes the epsilon transitions, then determinizes and minimizes.
    pub fn to_dfa(&self) -> Dfa {
        if self.states.is_empty() {
            return Dfa::phi(VAR_PER_CHAR);
        }

        let closures = (0..self.states.len())
            .map(|state| self.epsilon_closure(state))
            .collect_vec();

        let mut nfa = Nfa::new(VAR_PER_CHAR);
        for closure in &closures {
            let accepting = closure.iter().any(|s| self.states[*s].accepting);
            let edges = closure
                .iter()
                .flat_map(|s| self.states[*s].edges.iter())
                .flat_map(|(pattern, to)| {
                    closures[*to]
                        .iter()
                        .map(move |target| (pattern.clone(), *target))
                })
                .unique()
                .collect_vec();
            nfa.add_state(accepting, &edges);
        }
        nfa.set_start(vec![self.start]);

        nfa.determinize().minimize()
    }
}
