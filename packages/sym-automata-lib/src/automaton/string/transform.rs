use std::collections::VecDeque;

use anyhow::bail;
use hashbrown::HashMap;

use crate::{
    automaton::{
        Automaton,
        dfa::{Dfa, builder::DfaBuilder, minimization::Minimizable},
        nfa::Nfa,
        string::{
            StringAutomaton, VAR_PER_CHAR, alphabet, char_bits, char_nfa::CharNfa, char_pattern,
            substring::restrict,
        },
    },
    error::AutomatonError,
};

const SPACE: u8 = b' ';

impl StringAutomaton {
    pub fn to_upper_case(&self) -> StringAutomaton {
        let result = self.map_chars(|c| c.to_ascii_uppercase());
        tracing::debug!("{} = [{}]->toUpperCase()", result.id(), self.id());
        result
    }

    pub fn to_lower_case(&self) -> StringAutomaton {
        let result = self.map_chars(|c| c.to_ascii_lowercase());
        tracing::debug!("{} = [{}]->toLowerCase()", result.id(), self.id());
        result
    }

    pub fn pre_to_upper_case(&self, range: Option<&StringAutomaton>) -> StringAutomaton {
        restrict(self.pre_map_chars(|c| c.to_ascii_uppercase()), range)
    }

    pub fn pre_to_lower_case(&self, range: Option<&StringAutomaton>) -> StringAutomaton {
        restrict(self.pre_map_chars(|c| c.to_ascii_lowercase()), range)
    }

    /// The image under a character mapping.
    fn map_chars(&self, f: impl Fn(u8) -> u8) -> StringAutomaton {
        let dfa = self.dfa();
        let live = dfa.live_states();

        let mut nfa = CharNfa::new();
        for state in 0..dfa.state_count() {
            nfa.add_state(dfa.is_accepting(state));
        }
        nfa.set_start(dfa.start());

        for state in (0..dfa.state_count()).filter(|s| live[*s]) {
            for c in alphabet() {
                let target = dfa.next_state(state, &char_bits(c));
                if live[target] {
                    nfa.add_char_edge(state, f(c), target);
                }
            }
        }

        StringAutomaton::new(nfa.to_dfa())
    }

    /// The pre-image under a character mapping: reading `c` behaves like
    /// reading `f(c)`.
    fn pre_map_chars(&self, f: impl Fn(u8) -> u8) -> StringAutomaton {
        let dfa = self.dfa();
        let sink = dfa.state_count();

        let mut builder = DfaBuilder::new(dfa.state_count() + 1, VAR_PER_CHAR);
        for state in 0..dfa.state_count() {
            for c in alphabet() {
                builder.store_exception(dfa.next_state(state, &char_bits(f(c))), char_pattern(c));
            }
            builder.store_state(sink);
        }
        builder.store_state(sink);

        let mut accepting = dfa.states().iter().map(|s| s.accepting).collect::<Vec<_>>();
        accepting.push(false);
        let mapped = builder.build_with(&accepting).with_start(dfa.start());

        StringAutomaton::new(mapped)
    }

    /// Removes leading and trailing spaces from every accepted string.
    pub fn trim(&self) -> StringAutomaton {
        let dfa = self.dfa();
        let space = char_bits(SPACE);

        let mut start = vec![];
        let mut current = dfa.start();
        while !start.contains(&current) {
            start.push(current);
            current = dfa.next_state(current, &space);
        }

        let mut nfa = Nfa::from_dfa(dfa);
        nfa.set_start(start);
        for state in 0..dfa.state_count() {
            let mut visited = vec![];
            let mut current = state;
            let mut accepting = false;
            while !visited.contains(&current) {
                accepting |= dfa.is_accepting(current);
                visited.push(current);
                current = dfa.next_state(current, &space);
            }
            nfa.set_accepting(state, accepting);
        }

        let trimmed = StringAutomaton::new(nfa.determinize().minimize());
        let result = trimmed.intersect(&not_space_bounded());
        tracing::debug!("{} = [{}]->trim()", result.id(), self.id());
        result
    }

    /// Strings that trim to an accepted string.
    pub fn pre_trim(&self, range: Option<&StringAutomaton>) -> StringAutomaton {
        let spaces = StringAutomaton::make_char(SPACE).kleene_closure();
        let result = spaces
            .concatenate(&self.intersect(&not_space_bounded()))
            .concatenate(&spaces);
        restrict(result, range)
    }

    /// Replaces every occurrence of a string of `search` with a string of
    /// `replacement`. The result over-approximates the exact image: copied
    /// segments never contain a complete match, but matches are not forced
    /// to be leftmost.
    pub fn replace(
        &self,
        search: &StringAutomaton,
        replacement: &StringAutomaton,
    ) -> anyhow::Result<StringAutomaton> {
        if search.has_empty_string() {
            bail!(AutomatonError::Unsupported(
                "replace with a search pattern that matches the empty string".to_string()
            ));
        }

        let subject = self.dfa();
        let search_dfa = search.dfa();
        let replacement_dfa = replacement.dfa();
        let clean = no_match_tracker(search);

        let subject_live = subject.live_states();
        let search_live = search_dfa.live_states();
        let replacement_live = replacement_dfa.live_states();
        let clean_live = clean.live_states();

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum Mode {
            /// (subject state, tracker state)
            Copy(usize, usize),
            /// (replacement state, subject state to resume in)
            Replace(usize, usize),
        }

        let mut nfa = CharNfa::new();
        let mut ids: HashMap<Mode, usize> = HashMap::new();
        let mut queue = VecDeque::new();

        let mut intern = |mode: Mode, nfa: &mut CharNfa, queue: &mut VecDeque<Mode>| -> usize {
            *ids.entry(mode).or_insert_with(|| {
                let accepting = match mode {
                    Mode::Copy(q, _) => subject.is_accepting(q),
                    Mode::Replace(..) => false,
                };
                queue.push_back(mode);
                nfa.add_state(accepting)
            })
        };

        let start = intern(
            Mode::Copy(subject.start(), clean.start()),
            &mut nfa,
            &mut queue,
        );
        nfa.set_start(start);

        while let Some(mode) = queue.pop_front() {
            let from = intern(mode, &mut nfa, &mut queue);
            match mode {
                Mode::Copy(q, c) => {
                    for byte in alphabet() {
                        let bits = char_bits(byte);
                        let next_q = subject.next_state(q, &bits);
                        let next_c = clean.next_state(c, &bits);
                        if subject_live[next_q] && clean_live[next_c] {
                            let to = intern(Mode::Copy(next_q, next_c), &mut nfa, &mut queue);
                            nfa.add_char_edge(from, byte, to);
                        }
                    }

                    let resumes =
                        matched_targets(subject, &subject_live, search_dfa, &search_live, q);
                    for resume in resumes {
                        let to = intern(
                            Mode::Replace(replacement_dfa.start(), resume),
                            &mut nfa,
                            &mut queue,
                        );
                        nfa.add_epsilon(from, to);
                    }
                }
                Mode::Replace(r, resume) => {
                    for byte in alphabet() {
                        let next_r = replacement_dfa.next_state(r, &char_bits(byte));
                        if replacement_live[next_r] {
                            let to = intern(Mode::Replace(next_r, resume), &mut nfa, &mut queue);
                            nfa.add_char_edge(from, byte, to);
                        }
                    }

                    if replacement_dfa.is_accepting(r) {
                        let to = intern(Mode::Copy(resume, clean.start()), &mut nfa, &mut queue);
                        nfa.add_epsilon(from, to);
                    }
                }
            }
        }

        let result =
            StringAutomaton::new(nfa.to_dfa()).intersect(&StringAutomaton::make_any_string());
        tracing::debug!(
            "{} = [{}]->replace({}, {})",
            result.id(),
            self.id(),
            search.id(),
            replacement.id()
        );
        Ok(result)
    }

    /// Strings whose replacement of `search` by `replacement` is accepted.
    pub fn pre_replace(
        &self,
        search: &StringAutomaton,
        replacement: &str,
        range: Option<&StringAutomaton>,
    ) -> anyhow::Result<StringAutomaton> {
        if search.has_empty_string() {
            bail!(AutomatonError::Unsupported(
                "pre-image of replace with a search pattern that matches the empty string"
                    .to_string()
            ));
        }

        let target = self.dfa();
        let search_dfa = search.dfa();
        let clean = no_match_tracker(search);

        let target_live = target.live_states();
        let search_live = search_dfa.live_states();
        let clean_live = clean.live_states();

        let replacement_bits = replacement.bytes().map(char_bits).collect::<Vec<_>>();

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum Mode {
            /// (target state, tracker state)
            Copy(usize, usize),
            /// (search state, target state after the replacement)
            Match(usize, usize),
        }

        let mut nfa = CharNfa::new();
        let mut ids: HashMap<Mode, usize> = HashMap::new();
        let mut queue = VecDeque::new();

        let mut intern = |mode: Mode, nfa: &mut CharNfa, queue: &mut VecDeque<Mode>| -> usize {
            *ids.entry(mode).or_insert_with(|| {
                let accepting = match mode {
                    Mode::Copy(q, _) => target.is_accepting(q),
                    Mode::Match(..) => false,
                };
                queue.push_back(mode);
                nfa.add_state(accepting)
            })
        };

        let start = intern(
            Mode::Copy(target.start(), clean.start()),
            &mut nfa,
            &mut queue,
        );
        nfa.set_start(start);

        while let Some(mode) = queue.pop_front() {
            let from = intern(mode, &mut nfa, &mut queue);
            match mode {
                Mode::Copy(q, c) => {
                    for byte in alphabet() {
                        let bits = char_bits(byte);
                        let next_q = target.next_state(q, &bits);
                        let next_c = clean.next_state(c, &bits);
                        if target_live[next_q] && clean_live[next_c] {
                            let to = intern(Mode::Copy(next_q, next_c), &mut nfa, &mut queue);
                            nfa.add_char_edge(from, byte, to);
                        }
                    }

                    let after = target.run_from(q, &replacement_bits);
                    if target_live[after] {
                        let mode = Mode::Match(search_dfa.start(), after);
                        let to = intern(mode, &mut nfa, &mut queue);
                        nfa.add_epsilon(from, to);
                    }
                }
                Mode::Match(s, after) => {
                    for byte in alphabet() {
                        let next_s = search_dfa.next_state(s, &char_bits(byte));
                        if search_live[next_s] {
                            let to = intern(Mode::Match(next_s, after), &mut nfa, &mut queue);
                            nfa.add_char_edge(from, byte, to);
                        }
                    }

                    if search_dfa.is_accepting(s) {
                        let to = intern(Mode::Copy(after, clean.start()), &mut nfa, &mut queue);
                        nfa.add_epsilon(from, to);
                    }
                }
            }
        }

        let result =
            StringAutomaton::new(nfa.to_dfa()).intersect(&StringAutomaton::make_any_string());
        tracing::debug!(
            "{} = [{}]->preReplace({}, {:?})",
            result.id(),
            self.id(),
            search.id(),
            replacement
        );
        Ok(restrict(result, range))
    }
}

/// Strings without a leading or trailing space.
fn not_space_bounded() -> StringAutomaton {
    let not_space = StringAutomaton::make_any_char().difference(&StringAutomaton::make_char(SPACE));
    StringAutomaton::make_empty_string()
        .union(&not_space)
        .union(
            &not_space
                .concatenate(&StringAutomaton::make_any_string())
                .concatenate(&not_space),
        )
}

/// Tracks whether a complete match of `search` has been read.
fn no_match_tracker(search: &StringAutomaton) -> Dfa {
    let any = StringAutomaton::make_any_string();
    any.concatenate(search)
        .concatenate(&any)
        .complement()
        .into_dfa()
}

/// The subject states reached from `from` by reading one non-empty string of
/// `search`.
fn matched_targets(
    subject: &Dfa,
    subject_live: &[bool],
    search: &Dfa,
    search_live: &[bool],
    from: usize,
) -> Vec<usize> {
    let mut visited = hashbrown::HashSet::new();
    let mut queue = VecDeque::from([(from, search.start())]);
    let mut result = vec![];

    while let Some((q, s)) = queue.pop_front() {
        for byte in alphabet() {
            let bits = char_bits(byte);
            let next = (subject.next_state(q, &bits), search.next_state(s, &bits));
            if !subject_live[next.0] || !search_live[next.1] || !visited.insert(next) {
                continue;
            }
            if search.is_accepting(next.1) && !result.contains(&next.0) {
                result.push(next.0);
            }
            queue.push_back(next);
        }
    }

    result
}
