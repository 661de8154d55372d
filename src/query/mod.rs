#![forbid(unsafe_code)]

//! Expression model, analysis and substitution maps.
//!
//! This module holds the expression tree the analyzer produces, the
//! substitution maps that record rewrites between query blocks, and the
//! algebra that combines those maps.

/// Composition, subtraction and union of substitution maps.
///
/// Every operation tolerates absent inputs and never mutates its arguments.
pub mod algebra;

/// Expression binding and slot equivalence tracking.
pub mod analyze;

/// Error types for semantic analysis.
pub mod errors;

/// Expression tree and top-down substitution.
pub mod expr;

/// Catalog lookup used to bind column references to slots.
pub mod metadata;

/// Behavior switches carried by every substitution map.
pub mod options;

/// Ordered `lhs -> rhs` substitution maps.
pub mod smap;

/// Literal values.
pub mod value;

pub use analyze::{AnalyzeResult, Analyzer, EquivalenceSink, SlotEquivalences};
pub use errors::AnalyzerError;
pub use expr::{Expr, SubstituteMode};
pub use metadata::{InMemoryMetadata, MetadataProvider};
pub use options::SmapOptions;
pub use smap::{Substitution, SubstitutionMap};
pub use value::Value;
