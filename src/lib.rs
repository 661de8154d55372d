//! Expression substitution maps for SQL semantic analysis.
//!
//! A query analyzer rewrites expressions as it moves them between query
//! blocks: aggregate outputs replace aggregate calls, inline-view columns
//! replace the view's defining expressions, and so on. Each rewrite step is
//! recorded as a [`SubstitutionMap`], and the algebra in [`query::algebra`]
//! composes, subtracts and combines those maps as analysis proceeds.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod types;

pub use config::{ConfigError, SmapConfig};
pub use error::{SmapError, SmapErrorWithCode, SmapResult};
pub use query::analyze::{Analyzer, EquivalenceSink, SlotEquivalences};
pub use query::expr::{BinaryOp, Expr, ExprKind, SubstituteMode};
pub use query::options::SmapOptions;
pub use query::smap::{Substitution, SubstitutionMap};
pub use query::value::Value;
pub use types::{DataType, SlotId, TupleId};
