#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::types::DataType;

/// Structured errors emitted by the expression analyzer.
///
/// Callers can distinguish catalog resolution failures from typing errors
/// without parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    /// Referenced column does not exist in any visible table.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },
    /// Unqualified column name matches more than one table.
    #[error("column '{column}' is ambiguous")]
    AmbiguousColumn { column: String },
    /// Function name is not a known built-in.
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },
    /// Function called with the wrong number of arguments.
    #[error("{name}() expects {expected} argument(s) (got {found})")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Operand or argument type not accepted in this position.
    #[error("{context} cannot accept {found}")]
    TypeMismatch {
        context: String,
        found: DataType,
    },
    /// `*` used outside of `count(*)`.
    #[error("'*' is only valid inside count(*)")]
    StarNotAllowed,
}

impl AnalyzerError {
    /// Builds an [`AnalyzerError::TypeMismatch`] for a specific context.
    pub fn type_mismatch(context: impl Into<String>, found: DataType) -> Self {
        AnalyzerError::TypeMismatch {
            context: context.into(),
            found,
        }
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzerError::UnknownColumn { .. } => "UnknownColumn",
            AnalyzerError::AmbiguousColumn { .. } => "AmbiguousColumn",
            AnalyzerError::UnknownFunction { .. } => "UnknownFunction",
            AnalyzerError::ArgumentCount { .. } => "ArgumentCount",
            AnalyzerError::TypeMismatch { .. } => "TypeMismatch",
            AnalyzerError::StarNotAllowed => "StarNotAllowed",
        }
    }
}

/// Convenience wrapper that formats analyzer errors with their codes.
pub struct AnalyzerErrorWithCode<'a>(pub &'a AnalyzerError);

impl fmt::Display for AnalyzerErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}
