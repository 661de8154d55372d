//! Ordered expression substitution maps.
//!
//! A [`SubstitutionMap`] records `lhs -> rhs` rewrites produced by one
//! analysis step. Right-hand sides must already be analyzed (unless the map
//! was built with `check_analyzed` off) so that substituting them into another
//! query block cannot introduce references that block is unable to resolve.
//!
//! Lookups scan pairs in insertion order and return the first structural
//! match. Maps are small and built once per pass, so the linear scan is
//! intentional. Duplicate left-hand keys are tolerated: combining
//! `PARTITION BY k1` and `ORDER BY k1` rewrites legitimately produces them,
//! and callers rely on the earliest pair winning.

use tracing::{debug, error, trace};

use crate::error::{SmapError, SmapResult};
use crate::query::expr::Expr;
use crate::query::options::SmapOptions;

/// One `lhs -> rhs` rewrite.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    /// Expression to replace.
    pub lhs: Expr,
    /// Replacement.
    pub rhs: Expr,
}

/// Ordered list of expression substitutions.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionMap {
    pub(crate) entries: Vec<Substitution>,
    opts: SmapOptions,
}

impl SubstitutionMap {
    /// Creates an empty strict map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with explicit options.
    pub fn with_options(opts: SmapOptions) -> Self {
        Self {
            entries: Vec::new(),
            opts,
        }
    }

    pub(crate) fn from_entries(entries: Vec<Substitution>, opts: SmapOptions) -> Self {
        Self { entries, opts }
    }

    /// Options this map was built with.
    pub fn options(&self) -> SmapOptions {
        self.opts
    }

    /// Appends a mapping. `lhs` need not be analyzed; `rhs` must be when the
    /// map is strict.
    pub fn put(&mut self, lhs: Expr, rhs: Expr) -> SmapResult<()> {
        if self.opts.check_analyzed && !rhs.is_analyzed() {
            error!(
                lhs = %lhs,
                rhs = %rhs,
                "smap.put.unanalyzed_rhs"
            );
            return Err(SmapError::UnanalyzedRhs {
                lhs: lhs.to_sql(),
                rhs: rhs.to_sql(),
            });
        }
        self.entries.push(Substitution { lhs, rhs });
        Ok(())
    }

    /// Returns the value mapped to the first key equal to `lhs`.
    pub fn get(&self, lhs: &Expr) -> Option<&Expr> {
        self.entries
            .iter()
            .find(|entry| entry.lhs == *lhs)
            .map(|entry| &entry.rhs)
    }

    /// Whether some key equals `lhs`.
    pub fn contains_mapping_for(&self, lhs: &Expr) -> bool {
        self.entries.iter().any(|entry| entry.lhs == *lhs)
    }

    /// Returns the key of the first pair whose value equals `rhs`.
    pub fn mapping_for_rhs_expr(&self, rhs: &Expr) -> Option<&Expr> {
        self.entries
            .iter()
            .find(|entry| entry.rhs == *rhs)
            .map(|entry| &entry.lhs)
    }

    /// Removes the first pair whose value equals `rhs`.
    pub fn remove_by_rhs_expr(&mut self, rhs: &Expr) {
        if let Some(pos) = self.entries.iter().position(|entry| entry.rhs == *rhs) {
            self.entries.remove(pos);
        }
    }

    /// Replaces every key positionally, leaving values untouched.
    pub fn replace_left_sides(&mut self, lhs: Vec<Expr>) -> SmapResult<()> {
        if lhs.len() != self.entries.len() {
            return Err(SmapError::LhsCountMismatch {
                expected: self.entries.len(),
                found: lhs.len(),
            });
        }
        for (entry, new_lhs) in self.entries.iter_mut().zip(lhs) {
            entry.lhs = new_lhs;
        }
        Ok(())
    }

    /// Rewrites every key through `lhs_smap`, leaving values untouched.
    pub fn substitute_lhs(&mut self, lhs_smap: &SubstitutionMap) {
        for entry in &mut self.entries {
            entry.lhs = entry.lhs.substitute(lhs_smap);
        }
    }

    /// Keys in insertion order.
    pub fn lhs(&self) -> impl ExactSizeIterator<Item = &Expr> + '_ {
        self.entries.iter().map(|entry| &entry.lhs)
    }

    /// Values in insertion order.
    pub fn rhs(&self) -> impl ExactSizeIterator<Item = &Expr> + '_ {
        self.entries.iter().map(|entry| &entry.rhs)
    }

    /// Pairs in insertion order.
    pub fn entries(&self) -> &[Substitution] {
        &self.entries
    }

    /// Iterates `(lhs, rhs)` pairs in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Expr, &Expr)> + '_ {
        self.entries.iter().map(|entry| (&entry.lhs, &entry.rhs))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Renders `smap(lhs:rhs (lhs_dbg:rhs_dbg) ...)`.
    pub fn debug_string(&self) -> String {
        let mut output = Vec::with_capacity(self.entries.len() * 2);
        for entry in &self.entries {
            output.push(format!("{}:{}", entry.lhs.to_sql(), entry.rhs.to_sql()));
            output.push(format!(
                "({}:{})",
                entry.lhs.debug_string(),
                entry.rhs.debug_string()
            ));
        }
        format!("smap({})", output.join(" "))
    }

    /// Index pairs `(i, j)` with `i < j` whose keys are equal.
    pub fn duplicate_lhs(&self) -> Vec<(usize, usize)> {
        let mut dups = Vec::new();
        for (i, a) in self.entries.iter().enumerate() {
            for (j, b) in self.entries.iter().enumerate().skip(i + 1) {
                if a.lhs == b.lhs {
                    dups.push((i, j));
                }
            }
        }
        dups
    }

    /// Checks internal invariants when `verify` is enabled.
    ///
    /// Quadratic in the number of pairs. Duplicate keys are only logged;
    /// an unanalyzed value in a strict map is an error.
    pub fn verify(&self) -> SmapResult<()> {
        if !self.opts.verify {
            return Ok(());
        }
        let dups = self.duplicate_lhs();
        if !dups.is_empty() {
            debug!(duplicates = dups.len(), size = self.len(), "smap.verify.duplicate_lhs");
            trace!(smap = %self.debug_string(), "smap.verify.dump");
        }
        if self.opts.check_analyzed {
            if let Some(entry) = self.entries.iter().find(|entry| !entry.rhs.is_analyzed()) {
                return Err(SmapError::UnanalyzedRhs {
                    lhs: entry.lhs.to_sql(),
                    rhs: entry.rhs.to_sql(),
                });
            }
        }
        Ok(())
    }
}
