//! Error types for reward and termination configuration.

use thiserror::Error;

/// Errors raised while configuring reward, termination or curriculum terms.
///
/// Evaluating a configured term never fails; only construction does.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RewardError {
    /// A term parameter is out of range.
    #[error("invalid parameter for {term}: {reason}")]
    InvalidParameter {
        /// Term the parameter belongs to.
        term: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// Two terms share a name.
    #[error("duplicate term: {name}")]
    DuplicateTerm {
        /// The repeated name.
        name: String,
    },

    /// A term name was referenced but is not configured.
    #[error("unknown term: {name}")]
    UnknownTerm {
        /// The missing name.
        name: String,
    },

    /// Environment step duration is not positive.
    #[error("invalid step duration: {0} (must be positive and finite)")]
    InvalidStepDt(f64),
}

impl RewardError {
    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid(term: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            term: term.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown term error.
    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownTerm { name: name.into() }
    }
}
