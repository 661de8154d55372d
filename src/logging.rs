//! Tracing subscriber setup for binaries and tests embedding the analyzer.
//!
//! Map operations emit events under the `expr_subst` target. Duplicate-key
//! reports from verification are at `debug`, full map dumps at `trace`.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{SmapError, SmapResult};

/// Directive used when the caller passes no level and `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "expr_subst=info";

/// Installs a global formatting subscriber filtered by `level`, which accepts
/// any [`EnvFilter`] directive such as `"info"` or `"expr_subst=trace"`.
/// An empty `level` defers to `RUST_LOG`, then [`DEFAULT_DIRECTIVE`].
pub fn init_logging(level: &str) -> SmapResult<()> {
    let filter = if level.trim().is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    } else {
        EnvFilter::try_new(level)
            .map_err(|e| SmapError::InvalidArgument(format!("invalid log directive {level:?}: {e}")))?
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|_| SmapError::InvalidArgument("logging already initialized".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        let err = init_logging("expr_subst=loud").unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
        assert!(err.to_string().contains("expr_subst=loud"));
    }

    #[test]
    fn default_directive_parses() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVE).is_ok());
    }
}
