use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::query::errors::AnalyzerError;

/// Result alias used by substitution maps and the combination algorithms.
pub type SmapResult<T> = std::result::Result<T, SmapError>;

/// Errors raised while building or combining substitution maps.
#[derive(Debug, Error)]
pub enum SmapError {
    /// A strict map was handed a right-hand side that was never analyzed.
    /// This is a bug in the calling analysis step.
    #[error("rhs expr must be analyzed: {lhs} -> {rhs}")]
    UnanalyzedRhs {
        /// SQL rendering of the offending left-hand side.
        lhs: String,
        /// SQL rendering of the unanalyzed right-hand side.
        rhs: String,
    },
    /// Replacement left-hand list does not pair up with the right-hand list.
    #[error("lhs replacement has {found} exprs but the map holds {expected} pairs")]
    LhsCountMismatch {
        /// Number of pairs in the map.
        expected: usize,
        /// Number of expressions supplied.
        found: usize,
    },
    /// Substituting into an expression was not legal.
    #[error("cannot substitute into {expr}: {reason}")]
    Substitution {
        /// SQL rendering of the subtree being replaced.
        expr: String,
        /// Why the replacement was refused.
        reason: String,
    },
    /// Semantic analysis failed.
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SmapError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            SmapError::UnanalyzedRhs { .. } | SmapError::LhsCountMismatch { .. } => {
                "InternalConsistency"
            }
            SmapError::Substitution { .. } => "SubstitutionFailed",
            SmapError::Analyzer(err) => err.code(),
            SmapError::Config(_) => "Config",
            SmapError::InvalidArgument(_) => "InvalidArgument",
        }
    }

    /// True for failures that indicate a bug in the caller rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SmapError::UnanalyzedRhs { .. } | SmapError::LhsCountMismatch { .. }
        )
    }
}

/// Convenience wrapper that formats errors with their codes.
pub struct SmapErrorWithCode<'a>(pub &'a SmapError);

impl fmt::Display for SmapErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}
