/// Configuration options carried by a [`super::SubstitutionMap`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SmapOptions {
    /// Whether right-hand sides must be analyzed when inserted.
    pub check_analyzed: bool,
    /// Whether combination results run the quadratic invariant check.
    pub verify: bool,
}

impl Default for SmapOptions {
    fn default() -> Self {
        Self {
            check_analyzed: true,
            verify: cfg!(feature = "verify-smap"),
        }
    }
}

impl SmapOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether right-hand sides must be analyzed.
    pub fn check_analyzed(mut self, enabled: bool) -> Self {
        self.check_analyzed = enabled;
        self
    }

    /// Sets whether invariant verification runs.
    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Options for a map freshly built from `f` and `g`: strict, verifying
    /// when either input does.
    pub(crate) fn for_result(f: &SmapOptions, g: &SmapOptions) -> Self {
        Self {
            check_analyzed: true,
            verify: f.verify || g.verify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_are_strict_and_inherit_verification() {
        let lenient = SmapOptions::new().check_analyzed(false);
        let verifying = SmapOptions::new().verify(true);
        let merged = SmapOptions::for_result(&lenient, &verifying);
        assert!(merged.check_analyzed);
        assert!(merged.verify);
        let quiet = SmapOptions::for_result(&lenient.verify(false), &lenient.verify(false));
        assert!(!quiet.verify);
    }
}
