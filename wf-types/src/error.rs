use crate::Cost;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid scoring configuration: {reason}.")]
    Config { reason: String },

    #[error("Invalid input sequences: {reason}.")]
    Sequence { reason: String },

    #[error("No alignment was found up to score {score}: {reason}.")]
    Unreachable { score: Cost, reason: String },

    #[error(
        "The traced alignment costs {actual} while the wavefronts reported score {expected}. This is a bug."
    )]
    BacktraceInconsistency { expected: Cost, actual: Cost },
}

impl Error {
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    pub fn sequence(reason: impl Into<String>) -> Self {
        Error::Sequence {
            reason: reason.into(),
        }
    }

    pub fn unreachable(score: Cost, reason: impl Into<String>) -> Self {
        Error::Unreachable {
            score,
            reason: reason.into(),
        }
    }

    /// True for the outcomes a caller may retry with a larger bound or relaxed heuristics.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Unreachable { .. })
    }
}
