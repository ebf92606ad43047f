use std::fmt::Display;

use anyhow::bail;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::AutomatonError;

/// Binary relations between two string operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Eq,
    NotEq,
    /// Lexicographic, a proper prefix is smaller.
    Lt,
    Le,
    Gt,
    Ge,
    /// The left operand starts with the right one.
    Begins,
    NotBegins,
}

impl RelationKind {
    pub fn negate(self) -> RelationKind {
        match self {
            RelationKind::Eq => RelationKind::NotEq,
            RelationKind::NotEq => RelationKind::Eq,
            RelationKind::Lt => RelationKind::Ge,
            RelationKind::Le => RelationKind::Gt,
            RelationKind::Gt => RelationKind::Le,
            RelationKind::Ge => RelationKind::Lt,
            RelationKind::Begins => RelationKind::NotBegins,
            RelationKind::NotBegins => RelationKind::Begins,
        }
    }

    /// Whether every string is related to itself.
    pub fn is_reflexive(self) -> bool {
        matches!(
            self,
            RelationKind::Eq | RelationKind::Le | RelationKind::Ge | RelationKind::Begins
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RelationKind::Eq => "=",
            RelationKind::NotEq => "!=",
            RelationKind::Lt => "<",
            RelationKind::Le => "<=",
            RelationKind::Gt => ">",
            RelationKind::Ge => ">=",
            RelationKind::Begins => "begins",
            RelationKind::NotBegins => "!begins",
        }
    }
}

/// How a multi-track automaton was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringRelation {
    Var(String),
    Constant(String),
    Regex(String),
    Compare {
        kind: RelationKind,
        left: Box<StringRelation>,
        right: Box<StringRelation>,
    },
    Intersect(Vec<StringRelation>),
    Union(Vec<StringRelation>),
    Not(Box<StringRelation>),
    Any,
    Phi,
}

impl StringRelation {
    pub fn var(name: &str) -> Self {
        StringRelation::Var(name.to_string())
    }

    pub fn constant(text: &str) -> Self {
        StringRelation::Constant(text.to_string())
    }

    pub fn regex(pattern: &str) -> Self {
        StringRelation::Regex(pattern.to_string())
    }

    pub fn compare(kind: RelationKind, left: StringRelation, right: StringRelation) -> Self {
        StringRelation::Compare {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equal(left: StringRelation, right: StringRelation) -> Self {
        Self::compare(RelationKind::Eq, left, right)
    }

    /// Conjunction, flattening nested conjunctions.
    pub fn and(self, other: StringRelation) -> Self {
        let mut parts = vec![];
        for relation in [self, other] {
            match relation {
                StringRelation::Intersect(inner) => parts.extend(inner),
                StringRelation::Any => {}
                relation => parts.push(relation),
            }
        }
        match parts.len() {
            0 => StringRelation::Any,
            1 => parts.remove(0),
            _ => StringRelation::Intersect(parts),
        }
    }

    pub fn or(self, other: StringRelation) -> Self {
        let mut parts = vec![];
        for relation in [self, other] {
            match relation {
                StringRelation::Union(inner) => parts.extend(inner),
                StringRelation::Phi => {}
                relation => parts.push(relation),
            }
        }
        match parts.len() {
            0 => StringRelation::Phi,
            1 => parts.remove(0),
            _ => StringRelation::Union(parts),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            StringRelation::Compare { kind, left, right } => StringRelation::Compare {
                kind: kind.negate(),
                left,
                right,
            },
            StringRelation::Not(inner) => *inner,
            StringRelation::Any => StringRelation::Phi,
            StringRelation::Phi => StringRelation::Any,
            relation => StringRelation::Not(Box::new(relation)),
        }
    }

    /// Every variable mentioned, in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut names = vec![];
        self.collect_variables(&mut names);
        names.into_iter().unique().collect()
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            StringRelation::Var(name) => names.push(name.clone()),
            StringRelation::Compare { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            StringRelation::Intersect(parts) | StringRelation::Union(parts) => {
                for part in parts {
                    part.collect_variables(names);
                }
            }
            StringRelation::Not(inner) => inner.collect_variables(names),
            StringRelation::Constant(_)
            | StringRelation::Regex(_)
            | StringRelation::Any
            | StringRelation::Phi => {}
        }
    }
}

impl Display for StringRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StringRelation::Var(name) => write!(f, "{}", name),
            StringRelation::Constant(text) => write!(f, "{:?}", text),
            StringRelation::Regex(pattern) => write!(f, "/{}/", pattern),
            StringRelation::Compare { kind, left, right } => {
                write!(f, "{} {} {}", left, kind.symbol(), right)
            }
            StringRelation::Intersect(parts) => {
                write!(f, "({})", parts.iter().map(|p| p.to_string()).join(" & "))
            }
            StringRelation::Union(parts) => {
                write!(f, "({})", parts.iter().map(|p| p.to_string()).join(" | "))
            }
            StringRelation::Not(inner) => write!(f, "!({})", inner),
            StringRelation::Any => write!(f, "true"),
            StringRelation::Phi => write!(f, "false"),
        }
    }
}

/// Variable names in track order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackMap {
    names: Vec<String>,
}

impl TrackMap {
    pub fn new(names: &[&str]) -> Self {
        let names = names.iter().map(|n| n.to_string()).collect_vec();
        assert!(names.iter().all_unique(), "Track names must be unique");
        TrackMap { names }
    }

    /// Tracks named `t0`, `t1`, ...
    pub fn anonymous(num_tracks: usize) -> Self {
        TrackMap {
            names: (0..num_tracks).map(|i| format!("t{}", i)).collect(),
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, track: usize) -> &str {
        &self.names[track]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn track_of(&self, name: &str) -> anyhow::Result<usize> {
        match self.index_of(name) {
            Some(track) => Ok(track),
            None => bail!(AutomatonError::UnknownVariable(name.to_string())),
        }
    }

    /// The map without `track`, later tracks move down by one.
    pub fn without(&self, track: usize) -> TrackMap {
        let mut names = self.names.clone();
        names.remove(track);
        TrackMap { names }
    }
}

impl Display for TrackMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conjunction_flattens() {
        let a = StringRelation::equal(StringRelation::var("x"), StringRelation::var("y"));
        let b = StringRelation::equal(StringRelation::var("y"), StringRelation::constant("foo"));
        let c = StringRelation::Any.and(a.clone()).and(b.clone());

        assert_eq!(c, StringRelation::Intersect(vec![a, b]));
        assert_eq!(c.variables(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(c.to_string(), "(x = y & y = \"foo\")");
    }

    #[test]
    fn test_negation() {
        let lt = StringRelation::compare(
            RelationKind::Lt,
            StringRelation::var("x"),
            StringRelation::regex("a*"),
        );
        let ge = lt.clone().negate();
        assert!(matches!(ge, StringRelation::Compare { kind: RelationKind::Ge, .. }));
        assert_eq!(ge.negate(), lt);
    }

    #[test]
    fn test_track_map() {
        let tracks = TrackMap::new(&["x", "y", "z"]);
        assert_eq!(tracks.index_of("z"), Some(2));
        assert_eq!(tracks.without(0).index_of("z"), Some(1));
        assert!(tracks.track_of("w").is_err());
    }
}
