use crate::automaton::{
    Automaton, AutomatonId, AutomatonKind,
    dfa::{Dfa, builder::DfaBuilder},
    int::IntAutomaton,
    string::{StringAutomaton, VAR_PER_CHAR, char_bits, reserved_patterns},
};

/// Natural numbers in unary: `n` is the word `1^n` over a single variable.
#[derive(Debug)]
pub struct UnaryAutomaton {
    dfa: Dfa,
    id: AutomatonId,
}

impl Clone for UnaryAutomaton {
    fn clone(&self) -> Self {
        UnaryAutomaton::new(self.dfa.clone())
    }
}

impl Automaton for UnaryAutomaton {
    fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    fn kind(&self) -> AutomatonKind {
        AutomatonKind::Unary
    }

    fn id(&self) -> AutomatonId {
        self.id
    }
}

impl UnaryAutomaton {
    pub fn new(dfa: Dfa) -> Self {
        debug_assert_eq!(dfa.num_vars(), 1, "Unary automata use a single variable");
        UnaryAutomaton {
            dfa,
            id: AutomatonId::fresh(),
        }
    }

    /// Collapses a length automaton over characters. Every ordinary character
    /// leads to the same successor in a length automaton, so `0x00` stands in
    /// for all of them.
    pub fn from_length_dfa(dfa: &Dfa) -> Self {
        let sink = dfa.state_count();
        let step = char_bits(0);

        let mut builder = DfaBuilder::new(sink + 1, 1);
        for state in 0..sink {
            builder.store_exception_str(dfa.next_state(state, &step), "1");
            builder.store_state(sink);
        }
        builder.store_state(sink);

        let mut accepting = (0..sink).map(|s| dfa.is_accepting(s)).collect::<Vec<_>>();
        accepting.push(false);

        let result = UnaryAutomaton::new(builder.build_with(&accepting).with_start(dfa.start()));
        tracing::debug!("{} = toUnary()", result.id);
        result
    }

    /// Every ordinary character of the target stands for one `1`.
    fn expand(&self) -> Dfa {
        let sink = self.dfa.state_count();

        let mut builder = DfaBuilder::new(sink + 1, VAR_PER_CHAR);
        for state in 0..sink {
            for pattern in reserved_patterns() {
                builder.store_exception(sink, pattern);
            }
            builder.store_state(self.dfa.next_state(state, &[true]));
        }
        builder.store_state(sink);

        let mut accepting = (0..sink)
            .map(|s| self.dfa.is_accepting(s))
            .collect::<Vec<_>>();
        accepting.push(false);

        builder.build_with(&accepting).with_start(self.dfa.start())
    }

    pub fn to_int_automaton(&self) -> IntAutomaton {
        let result = IntAutomaton::new(self.expand(), false);
        tracing::debug!("{} = [{}]->toIntAutomaton()", result.id(), self.id);
        result
    }

    /// The strings whose length is accepted.
    pub fn to_string_automaton(&self) -> StringAutomaton {
        let result = StringAutomaton::new(self.expand());
        tracing::debug!("{} = [{}]->toStringAutomaton()", result.id(), self.id);
        result
    }

    /// The accepted numbers up to `bound`.
    pub fn accepted_lengths(&self, bound: usize) -> Vec<usize> {
        let mut state = self.dfa.start();
        let mut lengths = vec![];
        for length in 0..=bound {
            if self.dfa.is_accepting(state) {
                lengths.push(length);
            }
            state = self.dfa.next_state(state, &[true]);
        }
        lengths
    }
}
