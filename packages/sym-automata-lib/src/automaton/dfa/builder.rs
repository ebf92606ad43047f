use crate::automaton::{
    bdd::{Bdd, BddRef, Bit},
    dfa::{Dfa, node::DfaNode},
};

/// Builds a [Dfa] state by state from exception lists.
///
/// For every state, exceptions are stored with [DfaBuilder::store_exception]
/// and then closed with [DfaBuilder::store_state], which takes the default
/// destination for every symbol no exception matches. Exceptions are matched
/// in the order they were stored.
///
/// ```
/// use sym_automata_lib::automaton::dfa::builder::DfaBuilder;
///
/// // accepts exactly the words made of `1`s
/// let mut builder = DfaBuilder::new(2, 1);
/// builder.store_exception_str(0, "1");
/// builder.store_state(1);
/// builder.store_state(1);
/// let dfa = builder.build("+-");
///
/// assert!(dfa.accepts(&[vec![true], vec![true]]));
/// assert!(!dfa.accepts(&[vec![false]]));
/// ```
#[derive(Debug)]
pub struct DfaBuilder {
    num_states: usize,
    num_vars: usize,
    exceptions: Vec<(Vec<Bit>, usize)>,
    roots: Vec<BddRef>,
    bdd: Bdd<usize>,
}

impl DfaBuilder {
    pub fn new(num_states: usize, num_vars: usize) -> Self {
        DfaBuilder {
            num_states,
            num_vars,
            exceptions: vec![],
            roots: Vec::with_capacity(num_states),
            bdd: Bdd::new(),
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn store_exception(&mut self, to: usize, pattern: Vec<Bit>) {
        assert!(to < self.num_states, "Destination {} out of range", to);
        assert_eq!(
            pattern.len(),
            self.num_vars,
            "Pattern width does not match the number of variables"
        );
        self.exceptions.push((pattern, to));
    }

    pub fn store_exception_str(&mut self, to: usize, pattern: &str) {
        self.store_exception(to, Bit::pattern(pattern));
    }

    /// Closes the current state.
    pub fn store_state(&mut self, default: usize) {
        assert!(default < self.num_states, "Default {} out of range", default);
        assert!(
            self.roots.len() < self.num_states,
            "All {} states are already stored",
            self.num_states
        );

        let exceptions = std::mem::take(&mut self.exceptions);
        let root = self.bdd.compile(&exceptions, default);
        self.roots.push(root);
    }

    /// Finishes the automaton. `statuses` holds one character per state,
    /// `+` for accepting states and anything else for rejecting ones.
    pub fn build(self, statuses: &str) -> Dfa {
        let accepting = statuses.chars().map(|c| c == '+').collect::<Vec<_>>();
        self.build_with(&accepting)
    }

    pub fn build_with(self, accepting: &[bool]) -> Dfa {
        assert_eq!(
            self.roots.len(),
            self.num_states,
            "Every state must be stored before building"
        );
        assert_eq!(accepting.len(), self.num_states);

        let states = self
            .roots
            .iter()
            .zip(accepting)
            .map(|(root, accepting)| {
                if *accepting {
                    DfaNode::accepting(*root)
                } else {
                    DfaNode::non_accepting(*root)
                }
            })
            .collect();

        Dfa::from_parts(self.num_vars, 0, states, self.bdd)
    }
}
