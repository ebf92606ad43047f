use crate::automaton::{
    bdd::Bit,
    dfa::{Dfa, builder::DfaBuilder, minimization::Minimizable},
    nfa::Nfa,
};

impl Dfa {
    /// Existentially quantifies bit `var`. The variable stays part of the
    /// alphabet but no transition depends on it anymore.
    pub fn project(&self, var: usize) -> Dfa {
        assert!(var < self.num_vars(), "Cannot project unknown bit {}", var);

        let mut nfa = Nfa::from_dfa(self);
        nfa.project(var);
        nfa.determinize().minimize()
    }

    /// Projects bit `var` and closes the gap in the variable numbering.
    pub fn project_away(&self, var: usize) -> Dfa {
        let map = (0..self.num_vars())
            .map(|i| match i.cmp(&var) {
                std::cmp::Ordering::Less => Some(i),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(i - 1),
            })
            .collect::<Vec<_>>();

        self.project(var).replace_indices(&map, self.num_vars() - 1)
    }

    /// Renames the bit variables: old variable `i` becomes `map[i]`. Variables
    /// mapped to `None` must not be tested by any transition.
    pub fn replace_indices(&self, map: &[Option<usize>], new_num_vars: usize) -> Dfa {
        assert_eq!(map.len(), self.num_vars());

        let mut builder = DfaBuilder::new(self.state_count(), new_num_vars);
        for state in 0..self.state_count() {
            for (pattern, target) in self.paths(state) {
                let mut renamed = vec![Bit::Any; new_num_vars];
                for (old, bit) in pattern.iter().enumerate() {
                    match map[old] {
                        Some(new) => renamed[new] = *bit,
                        None => debug_assert_eq!(*bit, Bit::Any, "bit {} is still in use", old),
                    }
                }
                builder.store_exception(target, renamed);
            }
            builder.store_state(state);
        }

        let accepting = self.states().iter().map(|s| s.accepting).collect::<Vec<_>>();
        let dfa = builder.build_with(&accepting);
        dfa.with_start(self.start())
    }

    /// Widens the alphabet to `new_num_vars` bits. Old variable `i` becomes
    /// `map[i]`, the new variables are unconstrained.
    pub fn extend_vars(&self, map: &[usize], new_num_vars: usize) -> Dfa {
        let map = map.iter().map(|i| Some(*i)).collect::<Vec<_>>();
        self.replace_indices(&map, new_num_vars)
    }
}
