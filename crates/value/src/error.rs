use thiserror::Error;

/// The five error kinds the join core can raise.
///
/// `Config`, `Bounds` and `Unsupported` are raised during setup, before any
/// tuple ever crosses the wire; `Invariant` and `Overflow` are fatal for the
/// running invocation and propagate straight out of whatever call detected
/// them. None of the five is retried inside the core -- the host decides
/// retry policy.
#[derive(Debug, Error)]
pub enum JoinError {
    /// Malformed or conflicting configuration (E-CONFIG).
    #[error("illegal operation: {0}")]
    Config(String),

    /// A resolved column ordinal fell outside the schema (E-BOUNDS).
    #[error("illegal operation: column ordinal {0} out of range")]
    Bounds(i64),

    /// Something the implementation asserts cannot happen, happened
    /// (E-INVARIANT). Aborts the operator invocation.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// A requested feature is not supported in this configuration
    /// (E-UNSUPPORTED).
    #[error("illegal operation: {0}")]
    Unsupported(String),

    /// A signed size counter went negative (E-OVERFLOW).
    #[error("illegal operation: size counter overflowed")]
    Overflow,
}

pub type JoinResult<T> = Result<T, JoinError>;
