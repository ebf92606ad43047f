use std::{fmt::Display, hash::Hash};

use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A handle to a node inside a [Bdd] arena. Handles are only meaningful for
/// the arena that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BddRef(u32);

impl BddRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One position of a transition pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bit {
    Zero,
    One,
    /// Don't care.
    Any,
}

impl Bit {
    pub fn from_bool(value: bool) -> Self {
        if value { Bit::One } else { Bit::Zero }
    }

    /// Parses a pattern written with `0`, `1` and `X`. Any other character is
    /// read as don't care.
    pub fn pattern(pattern: &str) -> Vec<Bit> {
        pattern
            .chars()
            .map(|c| match c {
                '0' => Bit::Zero,
                '1' => Bit::One,
                _ => Bit::Any,
            })
            .collect()
    }

    pub fn matches(self, value: bool) -> bool {
        match self {
            Bit::Zero => !value,
            Bit::One => value,
            Bit::Any => true,
        }
    }

    pub fn pattern_to_string(pattern: &[Bit]) -> String {
        pattern.iter().map(|b| b.to_string()).join("")
    }
}

impl Display for Bit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bit::Zero => write!(f, "0"),
            Bit::One => write!(f, "1"),
            Bit::Any => write!(f, "X"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BddNode<L> {
    Leaf(L),
    Branch { var: u32, low: BddRef, high: BddRef },
}

/// A hash-consed, reduced and ordered multi-terminal decision diagram arena.
///
/// Variable `0` is tested first. Leaves carry values of type `L`, which for a
/// DFA are destination states and for an NFA are sets of destination states.
/// Two structurally equal nodes always share the same [BddRef], so roots can
/// be compared by handle.
#[derive(Debug, Clone)]
pub struct Bdd<L: Clone + Eq + Hash> {
    nodes: Vec<BddNode<L>>,
    unique: HashMap<BddNode<L>, BddRef>,
}

impl<L: Clone + Eq + Hash> Default for Bdd<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Clone + Eq + Hash> Bdd<L> {
    pub fn new() -> Self {
        Bdd {
            nodes: vec![],
            unique: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    fn intern(&mut self, node: BddNode<L>) -> BddRef {
        if let Some(r) = self.unique.get(&node) {
            return *r;
        }

        let r = BddRef(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.unique.insert(node, r);
        r
    }

    pub fn leaf(&mut self, value: L) -> BddRef {
        self.intern(BddNode::Leaf(value))
    }

    pub fn branch(&mut self, var: u32, low: BddRef, high: BddRef) -> BddRef {
        if low == high {
            return low;
        }

        debug_assert!(var < self.level(low) && var < self.level(high));

        self.intern(BddNode::Branch { var, low, high })
    }

    pub fn node(&self, r: BddRef) -> &BddNode<L> {
        &self.nodes[r.index()]
    }

    /// The variable tested at `r`, or `u32::MAX` for leaves.
    pub fn level(&self, r: BddRef) -> u32 {
        match self.node(r) {
            BddNode::Leaf(_) => u32::MAX,
            BddNode::Branch { var, .. } => *var,
        }
    }

    pub fn leaf_value(&self, r: BddRef) -> Option<&L> {
        match self.node(r) {
            BddNode::Leaf(value) => Some(value),
            BddNode::Branch { .. } => None,
        }
    }

    /// The low and high cofactors of `r` with respect to `var`. If `r` does
    /// not test `var` at its root, both cofactors are `r` itself.
    pub fn cofactors(&self, r: BddRef, var: u32) -> (BddRef, BddRef) {
        match self.node(r) {
            BddNode::Branch {
                var: v, low, high, ..
            } if *v == var => (*low, *high),
            _ => (r, r),
        }
    }

    pub fn evaluate(&self, root: BddRef, assignment: &[bool]) -> &L {
        let mut current = root;
        loop {
            match self.node(current) {
                BddNode::Leaf(value) => return value,
                BddNode::Branch { var, low, high } => {
                    current = if assignment.get(*var as usize).copied().unwrap_or(false) {
                        *high
                    } else {
                        *low
                    };
                }
            }
        }
    }

    /// All distinct leaves below `root`, in depth first order with the low
    /// branch explored first.
    pub fn leaves(&self, root: BddRef) -> Vec<L> {
        let mut result = vec![];
        let mut seen = hashbrown::HashSet::new();
        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            match self.node(current) {
                BddNode::Leaf(value) => result.push(value.clone()),
                BddNode::Branch { low, high, .. } => {
                    stack.push(*high);
                    stack.push(*low);
                }
            }
        }

        result
    }

    /// Enumerates the paths below `root` as disjoint patterns over
    /// `num_vars` variables together with the leaf they end in.
    pub fn paths(&self, root: BddRef, num_vars: usize) -> Vec<(Vec<Bit>, L)> {
        let mut result = vec![];
        let mut stack = vec![(root, vec![Bit::Any; num_vars])];

        while let Some((current, pattern)) = stack.pop() {
            match self.node(current) {
                BddNode::Leaf(value) => result.push((pattern, value.clone())),
                BddNode::Branch { var, low, high } => {
                    let mut high_pattern = pattern.clone();
                    high_pattern[*var as usize] = Bit::One;
                    stack.push((*high, high_pattern));

                    let mut low_pattern = pattern;
                    low_pattern[*var as usize] = Bit::Zero;
                    stack.push((*low, low_pattern));
                }
            }
        }

        result
    }

    /// Copies the diagram below `root` of `src` into this arena, replacing
    /// every leaf with the diagram produced by `f`. The diagrams returned by
    /// `f` must only test variables below the lowest variable of `src`.
    pub fn map_from<M, F>(
        &mut self,
        src: &Bdd<M>,
        root: BddRef,
        memo: &mut HashMap<BddRef, BddRef>,
        f: &mut F,
    ) -> BddRef
    where
        M: Clone + Eq + Hash,
        F: FnMut(&mut Self, &M) -> BddRef,
    {
        if let Some(r) = memo.get(&root) {
            return *r;
        }

        let result = match src.node(root) {
            BddNode::Leaf(value) => f(self, value),
            BddNode::Branch { var, low, high } => {
                let low = self.map_from(src, *low, memo, f);
                let high = self.map_from(src, *high, memo, f);
                self.branch(*var, low, high)
            }
        };

        memo.insert(root, result);
        result
    }

    /// Combines two diagrams from (possibly different) arenas leaf by leaf.
    pub fn apply_from<A, B, F>(
        &mut self,
        a: &Bdd<A>,
        ra: BddRef,
        b: &Bdd<B>,
        rb: BddRef,
        memo: &mut HashMap<(BddRef, BddRef), BddRef>,
        f: &mut F,
    ) -> BddRef
    where
        A: Clone + Eq + Hash,
        B: Clone + Eq + Hash,
        F: FnMut(&mut Self, &A, &B) -> BddRef,
    {
        if let Some(r) = memo.get(&(ra, rb)) {
            return *r;
        }

        let result = match (a.node(ra), b.node(rb)) {
            (BddNode::Leaf(x), BddNode::Leaf(y)) => f(self, x, y),
            _ => {
                let var = a.level(ra).min(b.level(rb));
                let (a_low, a_high) = a.cofactors(ra, var);
                let (b_low, b_high) = b.cofactors(rb, var);
                let low = self.apply_from(a, a_low, b, b_low, memo, f);
                let high = self.apply_from(a, a_high, b, b_high, memo, f);
                self.branch(var, low, high)
            }
        };

        memo.insert((ra, rb), result);
        result
    }

    /// Combines two diagrams of this arena leaf by leaf.
    pub fn apply_within<F>(
        &mut self,
        ra: BddRef,
        rb: BddRef,
        memo: &mut HashMap<(BddRef, BddRef), BddRef>,
        f: &mut F,
    ) -> BddRef
    where
        F: FnMut(&mut Self, &L, &L) -> BddRef,
    {
        if let Some(r) = memo.get(&(ra, rb)) {
            return *r;
        }

        let result = match (self.node(ra).clone(), self.node(rb).clone()) {
            (BddNode::Leaf(x), BddNode::Leaf(y)) => f(self, &x, &y),
            _ => {
                let var = self.level(ra).min(self.level(rb));
                let (a_low, a_high) = self.cofactors(ra, var);
                let (b_low, b_high) = self.cofactors(rb, var);
                let low = self.apply_within(a_low, b_low, memo, f);
                let high = self.apply_within(a_high, b_high, memo, f);
                self.branch(var, low, high)
            }
        };

        memo.insert((ra, rb), result);
        result
    }

    /// Existentially quantifies `var`: both cofactors are merged with
    /// `union`.
    pub fn exists<F>(
        &mut self,
        root: BddRef,
        var: u32,
        memo: &mut HashMap<BddRef, BddRef>,
        union: &mut F,
    ) -> BddRef
    where
        F: FnMut(&mut Self, BddRef, BddRef) -> BddRef,
    {
        if let Some(r) = memo.get(&root) {
            return *r;
        }

        let level = self.level(root);
        let result = if level > var {
            root
        } else {
            let (low, high) = match self.node(root) {
                BddNode::Branch { low, high, .. } => (*low, *high),
                BddNode::Leaf(_) => unreachable!("leaves have the maximal level"),
            };
            if level == var {
                union(self, low, high)
            } else {
                let low = self.exists(low, var, memo, union);
                let high = self.exists(high, var, memo, union);
                self.branch(level, low, high)
            }
        };

        memo.insert(root, result);
        result
    }

    /// Compiles an exception list into a diagram. Exceptions are matched in
    /// order, the first matching pattern wins and unmatched assignments go to
    /// `default`.
    pub fn compile(&mut self, exceptions: &[(Vec<Bit>, L)], default: L) -> BddRef {
        let active = (0..exceptions.len()).collect_vec();
        self.compile_rec(exceptions, &active, &default, 0)
    }

    fn compile_rec(
        &mut self,
        exceptions: &[(Vec<Bit>, L)],
        active: &[usize],
        default: &L,
        var: usize,
    ) -> BddRef {
        let Some(&first) = active.first() else {
            return self.leaf(default.clone());
        };

        let (pattern, target) = &exceptions[first];
        if pattern.iter().skip(var).all(|b| *b == Bit::Any) {
            return self.leaf(target.clone());
        }

        let bit_of = |i: usize| exceptions[i].0.get(var).copied().unwrap_or(Bit::Any);
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

        // untested variable
        if low_active.len() == active.len() && high_active.len() == active.len() {
            return self.compile_rec(exceptions, active, default, var + 1);
        }

        let low = self.compile_rec(exceptions, &low_active, default, var + 1);
        let high = self.compile_rec(exceptions, &high_active, default, var + 1);
        self.branch(var as u32, low, high)
    }

    /// Renders the diagram below `root` one node per line.
    pub fn dump(&self, root: BddRef) -> String
    where
        L: std::fmt::Debug,
    {
        let mut order = vec![];
        let mut seen = hashbrown::HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            if let BddNode::Branch { low, high, .. } = self.node(current) {
                stack.push(*high);
                stack.push(*low);
            }
        }

        order
            .into_iter()
            .map(|r| match self.node(r) {
                BddNode::Leaf(value) => format!("  {}: leaf {:?}", r.index(), value),
                BddNode::Branch { var, low, high } => format!(
                    "  {}: x{} ? {} : {}",
                    r.index(),
                    var,
                    high.index(),
                    low.index()
                ),
            })
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_exception_wins() {
        let mut bdd = Bdd::<usize>::new();
        let exceptions = vec![(Bit::pattern("11"), 1), (Bit::pattern("1X"), 2)];
        let root = bdd.compile(&exceptions, 0);

        assert_eq!(*bdd.evaluate(root, &[true, true]), 1);
        assert_eq!(*bdd.evaluate(root, &[true, false]), 2);
        assert_eq!(*bdd.evaluate(root, &[false, true]), 0);
    }

    #[test]
    fn nodes_are_shared() {
        let mut bdd = Bdd::<usize>::new();
        let a = bdd.compile(&[(Bit::pattern("X1"), 3)], 4);
        let b = bdd.compile(&[(Bit::pattern("01"), 3), (Bit::pattern("11"), 3)], 4);

        assert_eq!(a, b);
        assert_eq!(bdd.level(a), 1);
    }

    #[test]
    fn paths_cover_every_assignment() {
        let mut bdd = Bdd::<usize>::new();
        let root = bdd.compile(&[(Bit::pattern("1X0"), 1), (Bit::pattern("0XX"), 2)], 0);
        let paths = bdd.paths(root, 3);

        let covered: usize = paths
            .iter()
            .map(|(p, _)| 1 << p.iter().filter(|b| **b == Bit::Any).count())
            .sum();
        assert_eq!(covered, 8);
    }
}
