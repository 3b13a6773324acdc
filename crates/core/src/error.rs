//! Engine error model.
//!
//! Keep this focused on *configuration* failures (malformed requirements,
//! registry misuse). A claim set that fails a policy is not an error — that
//! outcome is carried by the `Verdict` type in `warden-policy`.

use thiserror::Error;

/// Result type used across the engine.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Configuration-time error.
///
/// These are programming/deployment mistakes and are surfaced eagerly (at
/// requirement construction or registry setup), never at request time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A requirement was constructed with malformed parameters
    /// (empty required sets, blank names, unknown timezone, inverted window).
    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),

    /// A policy was built with no requirements at all.
    #[error("empty policy: {0}")]
    EmptyPolicy(String),

    /// A named policy was registered twice.
    #[error("duplicate policy '{0}'")]
    DuplicatePolicy(String),

    /// A named policy was looked up but never registered.
    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),
}

impl PolicyError {
    pub fn invalid_requirement(msg: impl Into<String>) -> Self {
        Self::InvalidRequirement(msg.into())
    }

    pub fn empty_policy(msg: impl Into<String>) -> Self {
        Self::EmptyPolicy(msg.into())
    }
}
