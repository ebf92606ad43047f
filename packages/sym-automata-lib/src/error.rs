/// Precondition violations raised by automaton operations. They are returned
/// wrapped in an [anyhow::Error] and can be recovered with
/// `error.downcast_ref::<AutomatonError>()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomatonError {
    #[error("Multi-track automata with {left} and {right} tracks cannot be combined")]
    TrackCountMismatch { left: usize, right: usize },
    #[error("Variable `{0}` has no track in this automaton")]
    UnknownVariable(String),
    #[error("Relation {0} cannot be turned into an automaton")]
    UnsupportedRelation(String),
    #[error("Invalid regular expression `{pattern}`: {message}")]
    RegexSyntax { pattern: String, message: String },
    #[error("Unsupported regular expression: {0}")]
    UnsupportedRegex(String),
    #[error("The language is infinite, counting it needs a bound")]
    InfiniteLanguage,
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Integer {value} is outside the encodable range -1..={max}")]
    IntOutOfRange { value: i64, max: i64 },
}
