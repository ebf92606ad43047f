use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::bail;
use num::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{algorithms::DfaExport, counter::SymbolicCounter, dfa::Dfa},
    error::AutomatonError,
};

pub mod algorithms;
pub mod bdd;
pub mod counter;
pub mod dfa;
pub mod int;
pub mod nfa;
pub mod relational;
pub mod string;

/// The domain an automaton's words are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomatonKind {
    Bool,
    Int,
    String,
    Unary,
    MultiTrack,
}

/// A process-unique id, only used to trace where automata come from in the
/// logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AutomatonId(u64);

impl AutomatonId {
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        AutomatonId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for AutomatonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared behaviour of the domain automata. Each of them exclusively owns one
/// minimized [Dfa].
pub trait Automaton {
    fn dfa(&self) -> &Dfa;

    fn kind(&self) -> AutomatonKind;

    fn id(&self) -> AutomatonId;

    fn num_vars(&self) -> usize {
        self.dfa().num_vars()
    }

    fn state_count(&self) -> usize {
        self.dfa().state_count()
    }

    fn is_empty_language(&self) -> bool {
        self.dfa().is_language_empty()
    }

    fn is_cyclic(&self) -> bool {
        self.dfa().is_cyclic()
    }

    fn to_dot(&self, print_sink: bool) -> String {
        self.dfa().to_dot(print_sink)
    }

    fn symbolic_counter(&self) -> SymbolicCounter {
        SymbolicCounter::from_dfa(self.dfa(), self.kind())
    }

    /// Number of members whose encoding is at most `bound` symbols long.
    fn count(&self, bound: u64) -> BigUint {
        self.symbolic_counter().count(bound)
    }

    fn count_symbolic(&self, bound: u64) -> BigUint {
        self.symbolic_counter().count_symbolic(bound)
    }

    /// Number of members of a finite language.
    fn count_all(&self) -> anyhow::Result<BigUint> {
        if self.is_cyclic() {
            bail!(AutomatonError::InfiniteLanguage);
        }
        Ok(self.count(self.state_count() as u64))
    }
}

/// Automata whose words are byte strings.
pub trait Language {
    fn accepts(&self, word: &[u8]) -> bool;
}
