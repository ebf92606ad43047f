use std::fmt::Display;

use anyhow::bail;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{
        Automaton, AutomatonId, AutomatonKind, Language,
        counter::SymbolicCounter,
        dfa::Dfa,
        int::unary::UnaryAutomaton,
        string::{StringAutomaton, VAR_PER_CHAR},
    },
    error::AutomatonError,
};

pub mod unary;

/// Largest value the constructors accept. A value `n` costs `n` states.
pub const MAX_INT: i64 = 1 << 16;

fn length_of(value: i64) -> anyhow::Result<usize> {
    if value > MAX_INT {
        bail!(AutomatonError::IntOutOfRange {
            value,
            max: MAX_INT
        });
    }
    Ok(value as usize)
}

/// The maximum of an integer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntBound {
    Finite(i64),
    Infinite,
}

impl Display for IntBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntBound::Finite(value) => write!(f, "{}", value),
            IntBound::Infinite => write!(f, "inf"),
        }
    }
}

/// A set of integers out of `{-1, 0, 1, 2, …}`.
///
/// A natural number `n` is encoded by the words of length `n`, so the
/// automaton is a length automaton over the string alphabet. `-1` has no word
/// and is tracked by `has_negative_1` instead. Values below `-1` collapse
/// into `-1`, both in the constructors and in the arithmetic.
#[derive(Debug)]
pub struct IntAutomaton {
    dfa: Dfa,
    has_negative_1: bool,
    id: AutomatonId,
}

impl Clone for IntAutomaton {
    fn clone(&self) -> Self {
        IntAutomaton::new(self.dfa.clone(), self.has_negative_1)
    }
}

impl Automaton for IntAutomaton {
    fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    fn kind(&self) -> AutomatonKind {
        AutomatonKind::Int
    }

    fn id(&self) -> AutomatonId {
        self.id
    }

    fn is_empty_language(&self) -> bool {
        !self.has_negative_1 && self.dfa.is_language_empty()
    }

    /// Counts through the unary encoding, `-1` included.
    fn symbolic_counter(&self) -> SymbolicCounter {
        self.to_unary_automaton()
            .symbolic_counter()
            .with_extra(u64::from(self.has_negative_1))
    }
}

impl Language for IntAutomaton {
    fn accepts(&self, word: &[u8]) -> bool {
        StringAutomaton::new(self.dfa.clone()).accepts(word)
    }
}

impl IntAutomaton {
    pub fn new(dfa: Dfa, has_negative_1: bool) -> Self {
        debug_assert_eq!(dfa.num_vars(), VAR_PER_CHAR);
        IntAutomaton {
            dfa,
            has_negative_1,
            id: AutomatonId::fresh(),
        }
    }

    fn from_lengths(lengths: StringAutomaton, has_negative_1: bool) -> Self {
        IntAutomaton::new(lengths.into_dfa(), has_negative_1)
    }

    pub fn has_negative_1(&self) -> bool {
        self.has_negative_1
    }

    pub fn set_negative_1(&mut self, has_negative_1: bool) {
        self.has_negative_1 = has_negative_1;
    }

    pub fn make_phi() -> Self {
        let result = Self::from_lengths(StringAutomaton::make_phi(), false);
        tracing::debug!("{} = makePhi()", result.id);
        result
    }

    pub fn make_zero() -> Self {
        let result = Self::from_lengths(StringAutomaton::make_empty_string(), false);
        tracing::debug!("{} = makeZero()", result.id);
        result
    }

    pub fn make_any_int() -> Self {
        let result = Self::from_lengths(StringAutomaton::make_any_string(), true);
        tracing::debug!("{} = makeAnyInt()", result.id);
        result
    }

    /// Negative values collapse to `-1`. Fails above [MAX_INT].
    pub fn make_int(value: i64) -> anyhow::Result<Self> {
        let result = if value < 0 {
            Self::from_lengths(StringAutomaton::make_phi(), true)
        } else {
            Self::from_lengths(StringAutomaton::make_length_equal(length_of(value)?), false)
        };
        tracing::debug!("{} = makeInt({})", result.id, value);
        Ok(result)
    }

    pub fn make_ints(values: &[i64]) -> anyhow::Result<Self> {
        let mut lengths = StringAutomaton::make_phi();
        for value in values.iter().filter(|v| **v >= 0) {
            lengths = lengths.union(&StringAutomaton::make_length_equal(length_of(*value)?));
        }

        let result = Self::from_lengths(lengths, values.iter().any(|v| *v < 0));
        tracing::debug!("{} = makeInts({:?})", result.id, values);
        Ok(result)
    }

    /// Values in `start..=end`. A non-empty range must end at or below
    /// [MAX_INT].
    pub fn make_int_range(start: i64, end: i64) -> anyhow::Result<Self> {
        let has_negative_1 = start <= -1 && -1 <= end;
        let lengths = if end < 0 || start > end {
            StringAutomaton::make_phi()
        } else {
            StringAutomaton::make_length_range(start.max(0) as usize, length_of(end)?)
        };

        let result = Self::from_lengths(lengths, has_negative_1);
        tracing::debug!("{} = makeIntRange({},{})", result.id, start, end);
        Ok(result)
    }

    pub fn make_int_less_than(value: i64) -> anyhow::Result<Self> {
        Self::make_int_range(-1, value.saturating_sub(1))
    }

    pub fn make_int_less_than_or_equal(value: i64) -> anyhow::Result<Self> {
        Self::make_int_range(-1, value)
    }

    pub fn make_int_greater_than(value: i64) -> anyhow::Result<Self> {
        if value < -1 {
            return Ok(Self::make_any_int());
        }
        Ok(Self::make_int_less_than_or_equal(value)?.complement())
    }

    pub fn make_int_greater_than_or_equal(value: i64) -> anyhow::Result<Self> {
        if value < -1 {
            return Ok(Self::make_any_int());
        }
        Ok(Self::make_int_less_than(value)?.complement())
    }

    fn derive(
        &self,
        op: &str,
        other: Option<&IntAutomaton>,
        dfa: Dfa,
        has_negative_1: bool,
    ) -> IntAutomaton {
        let result = IntAutomaton::new(dfa, has_negative_1);
        match other {
            Some(other) => tracing::debug!("{} = [{}]->{}({})", result.id, self.id, op, other.id),
            None => tracing::debug!("{} = [{}]->{}()", result.id, self.id, op),
        }
        result
    }

    fn lengths(&self) -> StringAutomaton {
        StringAutomaton::new(self.dfa.clone())
    }

    pub fn complement(&self) -> IntAutomaton {
        let dfa = self.lengths().complement().into_dfa();
        self.derive("complement", None, dfa, !self.has_negative_1)
    }

    pub fn union(&self, other: &IntAutomaton) -> IntAutomaton {
        self.derive(
            "union",
            Some(other),
            self.dfa.union(&other.dfa),
            self.has_negative_1 || other.has_negative_1,
        )
    }

    pub fn union_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.union(&Self::make_int(value)?))
    }

    pub fn intersect(&self, other: &IntAutomaton) -> IntAutomaton {
        self.derive(
            "intersect",
            Some(other),
            self.dfa.intersect(&other.dfa),
            self.has_negative_1 && other.has_negative_1,
        )
    }

    pub fn intersect_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.intersect(&Self::make_int(value)?))
    }

    pub fn difference(&self, other: &IntAutomaton) -> IntAutomaton {
        self.intersect(&other.complement())
    }

    pub fn difference_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.difference(&Self::make_int(value)?))
    }

    /// `{x - 1 | x ∈ self, x >= 0}`
    fn decrement(&self) -> IntAutomaton {
        let lengths = self.lengths().suffixes_from_index(1);
        IntAutomaton::from_lengths(lengths, self.has_zero())
    }

    /// `{x + 1 | x ∈ self, x >= 0}`, the `-1` becomes `0`.
    fn increment(&self) -> IntAutomaton {
        let mut lengths = StringAutomaton::make_any_char().concatenate(&self.lengths());
        if self.has_negative_1 {
            lengths = lengths.union(&StringAutomaton::make_empty_string());
        }
        IntAutomaton::from_lengths(lengths, false)
    }

    /// Sum of two sets. Sums below `-1` collapse into the `-1` flag.
    pub fn plus(&self, other: &IntAutomaton) -> IntAutomaton {
        let lengths = self.lengths().concatenate(&other.lengths());
        let mut sum = IntAutomaton::from_lengths(lengths, false);
        if self.has_negative_1 {
            sum = sum.union(&other.decrement());
        }
        if other.has_negative_1 {
            sum = sum.union(&self.decrement());
        }
        // -1 + -1
        if self.has_negative_1 && other.has_negative_1 {
            sum.has_negative_1 = true;
        }

        let dfa = sum.dfa.clone();
        self.derive("plus", Some(other), dfa, sum.has_negative_1)
    }

    pub fn plus_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.plus(&Self::make_int(value)?))
    }

    /// Differences of two sets. Differences below `-1` collapse into the `-1`
    /// flag.
    pub fn minus(&self, other: &IntAutomaton) -> IntAutomaton {
        // natural numbers on both sides: d >= 0 with d + y ∈ self
        let mut dfa = self.dfa.clone();
        for state in 0..dfa.state_count() {
            let rest = self.dfa.with_start(state);
            let accepting = !rest.intersect(&other.dfa).is_language_empty();
            dfa.set_accepting(state, accepting);
        }
        let lengths = StringAutomaton::new(dfa).intersect(&StringAutomaton::make_any_string());
        let mut difference = IntAutomaton::from_lengths(lengths, false);

        // x < y
        let below = self.lengths().concatenate(&StringAutomaton::make_length_greater_than(0));
        if !below.dfa().intersect(&other.dfa).is_language_empty() {
            difference.has_negative_1 = true;
        }
        // -1 - y
        if self.has_negative_1 && !other.dfa.is_language_empty() {
            difference.has_negative_1 = true;
        }
        // x - (-1)
        if other.has_negative_1 {
            difference = difference.union(&self.increment());
        }

        let dfa = difference.dfa.clone();
        self.derive("minus", Some(other), dfa, difference.has_negative_1)
    }

    pub fn minus_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.minus(&Self::make_int(value)?))
    }

    /// `value - self`
    pub fn subtract_from(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(Self::make_int(value)?.minus(self))
    }

    /// `{-x | x ∈ self}`, every positive member collapses into `-1`.
    pub fn uminus(&self) -> IntAutomaton {
        let mut lengths = StringAutomaton::make_phi();
        if self.has_negative_1 {
            lengths = lengths.union(&StringAutomaton::make_length_equal(1));
        }
        if self.has_zero() {
            lengths = lengths.union(&StringAutomaton::make_empty_string());
        }
        let has_positive = !self
            .dfa
            .intersect(StringAutomaton::make_length_greater_than(0).dfa())
            .is_language_empty();

        self.derive("uminus", None, lengths.into_dfa(), has_positive)
    }

    /// Repeated addition of the set to itself, negated for negative factors.
    /// Fails for factors beyond [MAX_INT].
    pub fn times(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        if value.unsigned_abs() > MAX_INT as u64 {
            bail!(AutomatonError::IntOutOfRange {
                value,
                max: MAX_INT
            });
        }

        let result = match value {
            0 => {
                if self.is_empty_language() {
                    IntAutomaton::make_phi()
                } else {
                    IntAutomaton::make_zero()
                }
            }
            1 => self.clone(),
            -1 => self.uminus(),
            _ => {
                let mut sum = self.clone();
                for _ in 1..value.unsigned_abs() {
                    sum = sum.plus(self);
                }
                if value < 0 { sum.uminus() } else { sum }
            }
        };
        tracing::debug!("{} = [{}]->times({})", result.id, self.id, value);
        Ok(result)
    }

    /// `levels[k]` is whether an accepting state is reachable in exactly `k`
    /// steps. Stops once the reachable set dies out or repeats.
    fn accepting_levels(&self) -> Vec<bool> {
        let live = self.dfa.live_states();
        let mut levels = vec![];
        let mut seen = HashSet::new();
        let mut frontier = vec![self.dfa.start()];

        loop {
            frontier.retain(|s| live[*s]);
            frontier.sort_unstable();
            frontier.dedup();
            if frontier.is_empty() {
                return levels;
            }
            if !seen.insert(frontier.clone()) {
                return levels;
            }

            levels.push(frontier.iter().any(|s| self.dfa.is_accepting(*s)));
            frontier = frontier
                .iter()
                .flat_map(|s| self.dfa.successors(*s))
                .collect();
        }
    }

    /// The largest member, [IntBound::Infinite] for unbounded sets and `None`
    /// for the empty set.
    pub fn get_max_accepted_int(&self) -> Option<IntBound> {
        if self.dfa.is_cyclic() {
            return Some(IntBound::Infinite);
        }

        let levels = self.accepting_levels();
        match levels.iter().rposition(|accepting| *accepting) {
            Some(level) => Some(IntBound::Finite(level as i64)),
            None if self.has_negative_1 => Some(IntBound::Finite(-1)),
            None => None,
        }
    }

    /// The smallest member, `None` for the empty set.
    pub fn get_min_accepted_int(&self) -> Option<i64> {
        if self.has_negative_1 {
            return Some(-1);
        }

        self.accepting_levels()
            .iter()
            .position(|accepting| *accepting)
            .map(|level| level as i64)
    }

    pub fn get_an_accepting_int(&self) -> Option<i64> {
        self.get_min_accepted_int()
    }

    pub fn has_zero(&self) -> bool {
        self.dfa.is_accepting(self.dfa.start())
    }

    pub fn is_zero(&self) -> bool {
        !self.has_negative_1 && self.dfa.is_only_initial_state_accepting()
    }

    pub fn is_accepting_single_int(&self) -> bool {
        if self.has_negative_1 {
            return self.dfa.is_language_empty();
        }
        match (self.get_min_accepted_int(), self.get_max_accepted_int()) {
            (Some(min), Some(IntBound::Finite(max))) => min == max,
            _ => false,
        }
    }

    pub fn check_equivalence(&self, other: &IntAutomaton) -> bool {
        self.has_negative_1 == other.has_negative_1 && self.dfa.is_equal(&other.dfa)
    }

    pub fn is_greater_than_int(&self, value: i64) -> bool {
        self.get_max_accepted_int()
            .is_some_and(|max| max > IntBound::Finite(value))
    }

    pub fn is_greater_than(&self, other: &IntAutomaton) -> bool {
        match (self.get_max_accepted_int(), other.get_min_accepted_int()) {
            (Some(max), Some(min)) => max > IntBound::Finite(min),
            _ => false,
        }
    }

    pub fn is_greater_than_or_equal_int(&self, value: i64) -> bool {
        self.get_max_accepted_int()
            .is_some_and(|max| max >= IntBound::Finite(value))
    }

    pub fn is_greater_than_or_equal(&self, other: &IntAutomaton) -> bool {
        match (self.get_max_accepted_int(), other.get_min_accepted_int()) {
            (Some(max), Some(min)) => max >= IntBound::Finite(min),
            _ => false,
        }
    }

    pub fn is_less_than_int(&self, value: i64) -> bool {
        self.get_min_accepted_int().is_some_and(|min| min < value)
    }

    pub fn is_less_than(&self, other: &IntAutomaton) -> bool {
        match (self.get_min_accepted_int(), other.get_max_accepted_int()) {
            (Some(min), Some(max)) => IntBound::Finite(min) < max,
            _ => false,
        }
    }

    pub fn is_less_than_or_equal_int(&self, value: i64) -> bool {
        self.get_min_accepted_int().is_some_and(|min| min <= value)
    }

    pub fn is_less_than_or_equal(&self, other: &IntAutomaton) -> bool {
        match (self.get_min_accepted_int(), other.get_max_accepted_int()) {
            (Some(min), Some(max)) => IntBound::Finite(min) <= max,
            _ => false,
        }
    }

    pub fn restrict_to(&self, other: &IntAutomaton) -> IntAutomaton {
        self.intersect(other)
    }

    pub fn restrict_greater_than_to_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.intersect(&Self::make_int_greater_than(value)?))
    }

    /// Members greater than some member of `other`.
    pub fn restrict_greater_than_to(&self, other: &IntAutomaton) -> anyhow::Result<IntAutomaton> {
        match other.get_min_accepted_int() {
            Some(min) => self.restrict_greater_than_to_int(min),
            None => Ok(Self::make_phi()),
        }
    }

    pub fn restrict_greater_than_or_equal_to_int(
        &self,
        value: i64,
    ) -> anyhow::Result<IntAutomaton> {
        Ok(self.intersect(&Self::make_int_greater_than_or_equal(value)?))
    }

    pub fn restrict_greater_than_or_equal_to(
        &self,
        other: &IntAutomaton,
    ) -> anyhow::Result<IntAutomaton> {
        match other.get_min_accepted_int() {
            Some(min) => self.restrict_greater_than_or_equal_to_int(min),
            None => Ok(Self::make_phi()),
        }
    }

    pub fn restrict_less_than_to_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.intersect(&Self::make_int_less_than(value)?))
    }

    /// Members less than some member of `other`.
    pub fn restrict_less_than_to(&self, other: &IntAutomaton) -> anyhow::Result<IntAutomaton> {
        match other.get_max_accepted_int() {
            Some(IntBound::Finite(max)) => self.restrict_less_than_to_int(max),
            Some(IntBound::Infinite) => Ok(self.clone()),
            None => Ok(Self::make_phi()),
        }
    }

    pub fn restrict_less_than_or_equal_to_int(&self, value: i64) -> anyhow::Result<IntAutomaton> {
        Ok(self.intersect(&Self::make_int_less_than_or_equal(value)?))
    }

    pub fn restrict_less_than_or_equal_to(
        &self,
        other: &IntAutomaton,
    ) -> anyhow::Result<IntAutomaton> {
        match other.get_max_accepted_int() {
            Some(IntBound::Finite(max)) => self.restrict_less_than_or_equal_to_int(max),
            Some(IntBound::Infinite) => Ok(self.clone()),
            None => Ok(Self::make_phi()),
        }
    }

    /// Re-encodes the natural members with one bit per step.
    pub fn to_unary_automaton(&self) -> UnaryAutomaton {
        UnaryAutomaton::from_length_dfa(&self.dfa)
    }
}
