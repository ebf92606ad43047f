use crate::automaton::{bdd::Bit, dfa::Dfa};

/// Guides the search for an accepting word.
pub trait WitnessHeuristic {
    /// Reorders the live transitions of a state. Transitions are tried in the
    /// resulting order.
    fn order(&self, _edges: &mut Vec<(Vec<Bit>, usize)>) {}

    /// Picks one concrete symbol from a pattern.
    fn concretize(&self, pattern: &[Bit]) -> Vec<bool> {
        pattern.iter().map(|b| *b == Bit::One).collect()
    }
}

/// Tries transitions in diagram order and fills don't care bits with zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPathHeuristic;

impl WitnessHeuristic for FirstPathHeuristic {}

impl Dfa {
    /// Searches an accepting word by backtracking. States are never entered
    /// twice, and only states that can still reach acceptance are entered.
    pub fn accepting_word(&self, heuristic: &impl WitnessHeuristic) -> Option<Vec<Vec<bool>>> {
        let live = self.live_states();
        if !live[self.start()] {
            return None;
        }

        let mut visited = vec![false; self.state_count()];
        visited[self.start()] = true;

        let edges_of = |state: usize| {
            let mut edges = self
                .paths(state)
                .into_iter()
                .filter(|(_, target)| live[*target])
                .collect::<Vec<_>>();
            heuristic.order(&mut edges);
            edges
        };

        // frames of (state, live edges, next edge to try)
        let mut stack = vec![(self.start(), edges_of(self.start()), 0usize)];
        let mut word: Vec<Vec<bool>> = vec![];

        while let Some(top) = stack.len().checked_sub(1) {
            let state = stack[top].0;
            if self.is_accepting(state) {
                return Some(word);
            }

            let (_, edges, next) = &mut stack[top];
            let edge = edges.get(*next).cloned();
            *next += 1;

            match edge {
                Some((pattern, target)) => {
                    if visited[target] {
                        continue;
                    }
                    visited[target] = true;
                    word.push(heuristic.concretize(&pattern));
                    stack.push((target, edges_of(target), 0));
                }
                None => {
                    stack.pop();
                    word.pop();
                }
            }
        }

        None
    }
}
