use std::collections::VecDeque;

use hashbrown::HashSet;

use crate::automaton::{
    bdd::Bit,
    dfa::{Dfa, product::BoolOp},
};

impl Dfa {
    /// The states reachable from the start, in breadth first order.
    pub fn reachable_states(&self) -> Vec<usize> {
        self.reachable_from(self.start())
    }

    pub fn reachable_from(&self, state: usize) -> Vec<usize> {
        let mut visited = vec![false; self.state_count()];
        let mut order = vec![state];
        let mut queue = VecDeque::from([state]);
        visited[state] = true;

        while let Some(current) = queue.pop_front() {
            for successor in self.successors(current) {
                if !visited[successor] {
                    visited[successor] = true;
                    order.push(successor);
                    queue.push_back(successor);
                }
            }
        }

        order
    }

    /// States from which an accepting state can be reached.
    pub fn live_states(&self) -> Vec<bool> {
        let mut predecessors = vec![vec![]; self.state_count()];
        for state in 0..self.state_count() {
            for successor in self.successors(state) {
                predecessors[successor].push(state);
            }
        }

        let mut live = vec![false; self.state_count()];
        let mut stack = self.accepting_states();
        for state in &stack {
            live[*state] = true;
        }

        while let Some(current) = stack.pop() {
            for predecessor in &predecessors[current] {
                if !live[*predecessor] {
                    live[*predecessor] = true;
                    stack.push(*predecessor);
                }
            }
        }

        live
    }

    pub fn is_language_empty(&self) -> bool {
        !self
            .reachable_states()
            .into_iter()
            .any(|state| self.is_accepting(state))
    }

    /// Whether a cycle exists through reachable states that can still reach
    /// acceptance. Such a cycle makes the language infinite.
    pub fn is_cyclic(&self) -> bool {
        let live = self.live_states();
        if !live[self.start()] {
            return false;
        }

        // iterative depth first search with an on-stack marker
        let mut visited = vec![false; self.state_count()];
        let mut on_stack = vec![false; self.state_count()];
        let mut stack = vec![(self.start(), self.live_successors(self.start(), &live), 0)];
        visited[self.start()] = true;
        on_stack[self.start()] = true;

        while let Some(top) = stack.len().checked_sub(1) {
            let (state, successors, next) = &mut stack[top];
            let state = *state;
            let successor = successors.get(*next).copied();
            *next += 1;

            let Some(successor) = successor else {
                on_stack[state] = false;
                stack.pop();
                continue;
            };

            if on_stack[successor] {
                return true;
            }
            if !visited[successor] {
                visited[successor] = true;
                on_stack[successor] = true;
                let successors = self.live_successors(successor, &live);
                stack.push((successor, successors, 0));
            }
        }

        false
    }

    fn live_successors(&self, state: usize, live: &[bool]) -> Vec<usize> {
        self.successors(state)
            .into_iter()
            .filter(|s| live[*s])
            .collect()
    }

    /// Whether `state` can reach itself in at least one step without passing
    /// through the sink.
    pub fn is_in_cycle(&self, state: usize) -> bool {
        if self.is_sink(state) {
            return false;
        }

        let mut visited = vec![false; self.state_count()];
        let mut stack = self.successors(state);

        while let Some(current) = stack.pop() {
            if current == state {
                return true;
            }
            if visited[current] || self.is_sink(current) {
                continue;
            }
            visited[current] = true;
            stack.extend(self.successors(current));
        }

        false
    }

    pub fn is_state_reachable_from(&self, target: usize, from: usize) -> bool {
        self.reachable_from(from).contains(&target)
    }

    /// The states reached after reading exactly `steps` symbols, ignoring the
    /// sink.
    pub fn states_reachable_by_walk(&self, steps: usize) -> Vec<usize> {
        self.states_reachable_by(steps, steps)
    }

    /// The states reached after reading between `min` and `max` symbols,
    /// ignoring the sink.
    pub fn states_reachable_by(&self, min: usize, max: usize) -> Vec<usize> {
        let mut result = HashSet::new();
        let mut frontier: HashSet<usize> = HashSet::from([self.start()]);

        for step in 0..=max {
            if step >= min {
                result.extend(frontier.iter().copied());
            }
            if step == max || frontier.is_empty() {
                break;
            }

            frontier = frontier
                .iter()
                .flat_map(|state| self.successors(*state))
                .filter(|state| !self.is_sink(*state))
                .collect();
        }

        let mut result = result.into_iter().collect::<Vec<_>>();
        result.sort_unstable();
        result
    }

    pub fn is_start_state_reachable_from_an_accepting_state(&self) -> bool {
        self.reachable_states()
            .into_iter()
            .filter(|state| self.is_accepting(*state))
            .any(|state| {
                self.successors(state)
                    .into_iter()
                    .any(|s| self.is_state_reachable_from(self.start(), s))
            })
    }

    pub fn has_incoming_transition(&self, state: usize) -> bool {
        self.reachable_states()
            .into_iter()
            .any(|s| self.successors(s).contains(&state))
    }

    /// Whether the language is exactly `{ε}`.
    pub fn is_only_initial_state_accepting(&self) -> bool {
        if !self.is_accepting(self.start()) {
            return false;
        }

        let live = self.live_states();
        self.successors(self.start())
            .into_iter()
            .all(|state| !live[state])
    }

    /// Whether the language holds exactly one word.
    pub fn is_accepting_single_word(&self) -> bool {
        let live = self.live_states();
        if !live[self.start()] || self.is_cyclic() {
            return false;
        }

        // an acyclic language has a single word iff every live state is
        // either accepting with no live exit, or non-accepting with exactly
        // one live symbol
        let mut current = self.start();
        loop {
            let live_paths = self
                .paths(current)
                .into_iter()
                .filter(|(_, target)| live[*target])
                .collect::<Vec<_>>();

            if self.is_accepting(current) {
                return live_paths.is_empty();
            }

            match live_paths.as_slice() {
                [(pattern, target)] if pattern.iter().all(|b| *b != Bit::Any) => {
                    current = *target;
                }
                _ => return false,
            }
        }
    }

    pub fn is_subset_of(&self, other: &Dfa) -> bool {
        self.product(other, BoolOp::Diff).is_language_empty()
    }

    pub fn is_equal(&self, other: &Dfa) -> bool {
        let both = self.product(other, BoolOp::BiImpl);
        both.reachable_states()
            .into_iter()
            .all(|state| both.is_accepting(state))
    }
}
