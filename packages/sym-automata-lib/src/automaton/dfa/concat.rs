use hashbrown::HashMap;

use crate::automaton::{
    bdd::Bdd,
    dfa::{Dfa, node::DfaNode},
};

impl Dfa {
    /// Concatenation `L(self)·L(other)`.
    ///
    /// The states of `other` are appended after the states of `self`. An
    /// accepting state of `self` may either keep reading in `self` or behave
    /// like the start state of `other`; the two choices are told apart by an
    /// extra bit that is projected away at the end, which merges them
    /// nondeterministically.
    pub fn concatenate(&self, other: &Dfa) -> Dfa {
        assert_eq!(self.num_vars(), other.num_vars());

        let offset = self.state_count();
        let extra = self.num_vars() as u32;
        let other_start = other.transitions(other.start());
        let other_start_accepting = other.is_accepting(other.start());

        let mut bdd = Bdd::new();
        let mut jump_memo = HashMap::new();
        let mut left_memo = HashMap::new();
        let mut right_memo = HashMap::new();
        let mut states = Vec::with_capacity(offset + other.state_count());

        for state in 0..self.state_count() {
            let root = if self.is_accepting(state) {
                bdd.apply_from(
                    self.bdd(),
                    self.transitions(state),
                    other.bdd(),
                    other_start,
                    &mut jump_memo,
                    &mut |bdd, stay: &usize, jump: &usize| {
                        let low = bdd.leaf(*stay);
                        let high = bdd.leaf(offset + *jump);
                        bdd.branch(extra, low, high)
                    },
                )
            } else {
                bdd.map_from(self.bdd(), self.transitions(state), &mut left_memo, &mut |bdd, t| {
                    bdd.leaf(*t)
                })
            };
            let accepting = self.is_accepting(state) && other_start_accepting;
            states.push(DfaNode::new(accepting, false, root));
        }

        for state in 0..other.state_count() {
            let root = bdd.map_from(other.bdd(), other.transitions(state), &mut right_memo, &mut |bdd, t| {
                bdd.leaf(offset + *t)
            });
            states.push(DfaNode::new(other.is_accepting(state), false, root));
        }

        let widened = Dfa::from_parts(self.num_vars() + 1, self.start(), states, bdd);
        widened.project_away(extra as usize)
    }

    /// One or more repetitions, `L(self)+`.
    pub fn closure(&self) -> Dfa {
        let extra = self.num_vars() as u32;
        let start = self.transitions(self.start());

        let mut bdd = Bdd::new();
        let mut jump_memo = HashMap::new();
        let mut memo = HashMap::new();
        let mut states = Vec::with_capacity(self.state_count());

        for state in 0..self.state_count() {
            let root = if self.is_accepting(state) {
                bdd.apply_from(
                    self.bdd(),
                    self.transitions(state),
                    self.bdd(),
                    start,
                    &mut jump_memo,
                    &mut |bdd, stay: &usize, jump: &usize| {
                        let low = bdd.leaf(*stay);
                        let high = bdd.leaf(*jump);
                        bdd.branch(extra, low, high)
                    },
                )
            } else {
                bdd.map_from(self.bdd(), self.transitions(state), &mut memo, &mut |bdd, t| {
                    bdd.leaf(*t)
                })
            };
            states.push(DfaNode::new(self.is_accepting(state), false, root));
        }

        let widened = Dfa::from_parts(self.num_vars() + 1, self.start(), states, bdd);
        widened.project_away(extra as usize)
    }

    /// Zero or more repetitions, `L(self)*`.
    pub fn kleene_closure(&self) -> Dfa {
        self.closure().union(&Dfa::empty_word(self.num_vars()))
    }

    /// `L(self) ∪ {ε}`
    pub fn optional(&self) -> Dfa {
        self.union(&Dfa::empty_word(self.num_vars()))
    }
}
