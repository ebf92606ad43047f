use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::automaton::{
    bdd::Bdd,
    dfa::{Dfa, minimization::Minimizable, node::DfaNode},
};

/// The Boolean operator deciding acceptance of a product state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
    Impl,
    BiImpl,
    /// `a && !b`
    Diff,
}

impl BoolOp {
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            BoolOp::And => a && b,
            BoolOp::Or => a || b,
            BoolOp::Impl => !a || b,
            BoolOp::BiImpl => a == b,
            BoolOp::Diff => a && !b,
        }
    }
}

impl Dfa {
    /// Synchronized product of two automata over the same alphabet, followed
    /// by minimization.
    pub fn product(&self, other: &Dfa, op: BoolOp) -> Dfa {
        assert_eq!(
            self.num_vars(),
            other.num_vars(),
            "Product of automata with different alphabets"
        );

        let span = tracing::span!(tracing::Level::DEBUG, "Dfa::product", ?op);
        let _enter = span.enter();

        let mut bdd = Bdd::new();
        let mut memo = HashMap::new();
        let mut pair_ids = HashMap::new();
        let mut pairs = vec![(self.start(), other.start())];
        let mut queue = VecDeque::from([0usize]);
        pair_ids.insert((self.start(), other.start()), 0usize);

        let mut states = vec![];

        while let Some(index) = queue.pop_front() {
            let (p, q) = pairs[index];

            let root = bdd.apply_from(
                self.bdd(),
                self.transitions(p),
                other.bdd(),
                other.transitions(q),
                &mut memo,
                &mut |bdd, a: &usize, b: &usize| {
                    let id = *pair_ids.entry((*a, *b)).or_insert_with(|| {
                        pairs.push((*a, *b));
                        queue.push_back(pairs.len() - 1);
                        pairs.len() - 1
                    });
                    bdd.leaf(id)
                },
            );

            let accepting = op.eval(self.is_accepting(p), other.is_accepting(q));
            states.push(if accepting {
                DfaNode::accepting(root)
            } else {
                DfaNode::non_accepting(root)
            });
        }

        tracing::debug!("product explored {} state pairs", states.len());

        Dfa::from_parts(self.num_vars(), 0, states, bdd).minimize()
    }

    pub fn intersect(&self, other: &Dfa) -> Dfa {
        self.product(other, BoolOp::And)
    }

    pub fn union(&self, other: &Dfa) -> Dfa {
        self.product(other, BoolOp::Or)
    }

    pub fn difference(&self, other: &Dfa) -> Dfa {
        self.product(other, BoolOp::Diff)
    }

    /// Complement relative to `universe`.
    pub fn complement_within(&self, universe: &Dfa) -> Dfa {
        universe.product(self, BoolOp::Diff)
    }
}
