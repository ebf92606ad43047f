use crate::automaton::{
    Automaton,
    dfa::minimization::Minimizable,
    nfa::Nfa,
    string::StringAutomaton,
};

impl StringAutomaton {
    /// Every prefix of an accepted string.
    pub fn prefixes(&self) -> StringAutomaton {
        let mut dfa = self.dfa().clone();
        let live = dfa.live_states();
        for (state, live) in live.into_iter().enumerate() {
            dfa.set_accepting(state, live);
        }

        let result = StringAutomaton::new(dfa.minimize());
        tracing::debug!("{} = [{}]->prefixes()", result.id(), self.id());
        result
    }

    /// Prefixes shorter than `index`.
    pub fn prefixes_until_index(&self, index: usize) -> StringAutomaton {
        self.prefixes()
            .intersect(&StringAutomaton::make_length_less_than(index))
    }

    /// Prefixes of length `index + 1`, the ones that end with the character at
    /// `index`.
    pub fn prefixes_at_index(&self, index: usize) -> StringAutomaton {
        self.prefixes()
            .intersect(&StringAutomaton::make_length_equal(index + 1))
    }

    /// Every suffix of an accepted string.
    pub fn suffixes(&self) -> StringAutomaton {
        let live = self.dfa().live_states();
        let start = self
            .dfa()
            .reachable_states()
            .into_iter()
            .filter(|state| live[*state])
            .collect();

        let result = self.restart_from(start);
        tracing::debug!("{} = [{}]->suffixes()", result.id(), self.id());
        result
    }

    /// The suffixes left after removing the first `index` characters.
    pub fn suffixes_from_index(&self, index: usize) -> StringAutomaton {
        if index == 0 {
            return self.clone();
        }

        let live = self.dfa().live_states();
        let start = self
            .dfa()
            .states_reachable_by_walk(index)
            .into_iter()
            .filter(|state| live[*state])
            .collect();

        let result = self.restart_from(start);
        tracing::debug!(
            "{} = [{}]->suffixesFromIndex({})",
            result.id(),
            self.id(),
            index
        );
        result
    }

    fn restart_from(&self, start: Vec<usize>) -> StringAutomaton {
        let mut nfa = Nfa::from_dfa(self.dfa());
        nfa.set_start(start);
        StringAutomaton::new(nfa.determinize().minimize())
    }

    pub fn char_at(&self, index: usize) -> StringAutomaton {
        self.substring_range(index, index)
    }

    pub fn substring(&self, start: usize) -> StringAutomaton {
        self.suffixes_from_index(start)
    }

    /// Substrings from `start` to `end`, both inclusive.
    pub fn substring_range(&self, start: usize, end: usize) -> StringAutomaton {
        if end < start {
            return StringAutomaton::make_phi();
        }

        self.suffixes_from_index(start)
            .prefixes_at_index(end - start)
    }

    /// The accepted strings that contain a string of `search`.
    pub fn contains(&self, search: &StringAutomaton) -> StringAutomaton {
        let any = StringAutomaton::make_any_string();
        self.intersect(&any.concatenate(search).concatenate(&any))
    }

    pub fn begins(&self, search: &StringAutomaton) -> StringAutomaton {
        self.intersect(&search.concatenate(&StringAutomaton::make_any_string()))
    }

    pub fn ends(&self, search: &StringAutomaton) -> StringAutomaton {
        self.intersect(&StringAutomaton::make_any_string().concatenate(search))
    }

    /// The predicates only restrict their subject, so the subject is its own
    /// pre-image.
    pub fn pre_contains(&self) -> StringAutomaton {
        self.clone()
    }

    pub fn pre_begins(&self) -> StringAutomaton {
        self.clone()
    }

    pub fn pre_ends(&self) -> StringAutomaton {
        self.clone()
    }

    /// Strings whose character at `index` is one of the single character
    /// strings of `self`.
    pub fn pre_char_at(&self, index: usize, range: Option<&StringAutomaton>) -> StringAutomaton {
        let chars = self.intersect(&StringAutomaton::make_any_char());
        let result = StringAutomaton::make_length_equal(index)
            .concatenate(&chars)
            .concatenate(&StringAutomaton::make_any_string());
        restrict(result, range)
    }

    /// Strings whose suffix from `start` is accepted.
    pub fn pre_substring(&self, start: usize, range: Option<&StringAutomaton>) -> StringAutomaton {
        let result = StringAutomaton::make_length_equal(start).concatenate(self);
        restrict(result, range)
    }

    /// Strings whose characters `start..=end` form an accepted string.
    pub fn pre_substring_range(
        &self,
        start: usize,
        end: usize,
        range: Option<&StringAutomaton>,
    ) -> StringAutomaton {
        if end < start {
            return StringAutomaton::make_phi();
        }

        let window = self.intersect(&StringAutomaton::make_length_equal(end - start + 1));
        let result = StringAutomaton::make_length_equal(start)
            .concatenate(&window)
            .concatenate(&StringAutomaton::make_any_string());
        restrict(result, range)
    }
}

pub(crate) fn restrict(result: StringAutomaton, range: Option<&StringAutomaton>) -> StringAutomaton {
    match range {
        Some(range) => result.intersect(range),
        None => result,
    }
}
