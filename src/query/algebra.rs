//! Combination algorithms over substitution maps.
//!
//! Every operation accepts optional inputs: both absent yields an empty map,
//! one absent yields a copy of the other unchanged. Fresh results are strict
//! and verify when either input has verification enabled.

use tracing::{debug, trace};

use crate::error::SmapResult;
use crate::query::analyze::EquivalenceSink;
use crate::query::expr::Expr;
use crate::query::options::SmapOptions;
use crate::query::smap::{Substitution, SubstitutionMap};
use crate::types::SlotId;

enum Inputs<'a> {
    Both(&'a SubstitutionMap, &'a SubstitutionMap),
    Settled(SubstitutionMap),
}

fn inputs<'a>(f: Option<&'a SubstitutionMap>, g: Option<&'a SubstitutionMap>) -> Inputs<'a> {
    match (f, g) {
        (Some(f), Some(g)) => Inputs::Both(f, g),
        (None, None) => Inputs::Settled(SubstitutionMap::new()),
        (Some(only), None) | (None, Some(only)) => Inputs::Settled(only.clone()),
    }
}

fn both_columns(lhs: &Expr, rhs: &Expr) -> Option<(SlotId, SlotId)> {
    Some((lhs.slot_id()?, rhs.slot_id()?))
}

impl SubstitutionMap {
    /// Returns a map equivalent to applying `f` and then `g`.
    ///
    /// `f`'s values are rewritten through `g`, then `g`'s pairs are appended
    /// unless their key is already present. If `f` holds
    /// `count(*) -> zeroifnull(count(*))` and `g` holds `count(*) -> slot`,
    /// the result keeps only `count(*) -> zeroifnull(slot)`.
    pub fn compose(
        f: Option<&SubstitutionMap>,
        g: Option<&SubstitutionMap>,
    ) -> SmapResult<SubstitutionMap> {
        let (f, g) = match inputs(f, g) {
            Inputs::Both(f, g) => (f, g),
            Inputs::Settled(result) => return Ok(result),
        };
        let mut entries: Vec<Substitution> = f
            .entries()
            .iter()
            .map(|entry| Substitution {
                lhs: entry.lhs.clone(),
                rhs: entry.rhs.substitute(g),
            })
            .collect();
        for entry in g.entries() {
            if !entries.iter().any(|existing| existing.lhs == entry.lhs) {
                entries.push(entry.clone());
            }
        }
        let opts = SmapOptions::for_result(&f.options(), &g.options());
        let result = SubstitutionMap::from_entries(entries, opts);
        debug!(
            f = f.len(),
            g = g.len(),
            result = result.len(),
            "smap.compose"
        );
        result.verify()?;
        Ok(result)
    }

    /// Rebases `g` through `f`: each key of `g` that `f` already maps is
    /// replaced by `f`'s value for it.
    ///
    /// `f = {A.id -> B.id}`, `g = {A.id -> C.id}` gives `{B.id -> C.id}`.
    /// Every resulting pair whose sides are both bound columns is reported to
    /// `sink` as `(rhs_slot, lhs_slot)`, once per pair of `g`, in `g`'s order.
    pub fn subtraction(
        f: Option<&SubstitutionMap>,
        g: Option<&SubstitutionMap>,
        sink: &mut dyn EquivalenceSink,
    ) -> SmapResult<SubstitutionMap> {
        let (f, g) = match inputs(f, g) {
            Inputs::Both(f, g) => (f, g),
            Inputs::Settled(result) => return Ok(result),
        };
        let mut result =
            SubstitutionMap::with_options(SmapOptions::for_result(&f.options(), &g.options()));
        for entry in g.entries() {
            let lhs = f.get(&entry.lhs).unwrap_or(&entry.lhs);
            if let Some((lhs_slot, rhs_slot)) = both_columns(lhs, &entry.rhs) {
                trace!(
                    rhs_slot = rhs_slot.0,
                    lhs_slot = lhs_slot.0,
                    "smap.subtraction.equivalent_slot"
                );
                sink.put_equivalent_slot(rhs_slot, lhs_slot);
            }
            result.put(lhs.clone(), entry.rhs.clone())?;
        }
        debug!(
            f = f.len(),
            g = g.len(),
            result = result.len(),
            "smap.subtraction"
        );
        Ok(result)
    }

    /// Composes `f` and `g` where `g`'s keys may occur nested inside `f`'s
    /// values: `f = {a -> fn(b)}`, `g = {b -> c}` gives `{a -> fn(c)}`.
    ///
    /// Keys of `g` found in no value of `f` are carried over directly, then
    /// the remaining pairs of `f`. The first pair recorded for a key wins.
    /// Fails if `g` cannot legally be substituted into a value of `f`.
    pub fn compose_and_replace(
        f: Option<&SubstitutionMap>,
        g: Option<&SubstitutionMap>,
    ) -> SmapResult<SubstitutionMap> {
        let (f, g) = match inputs(f, g) {
            Inputs::Both(f, g) => (f, g),
            Inputs::Settled(result) => return Ok(result),
        };
        let mut result =
            SubstitutionMap::with_options(SmapOptions::for_result(&f.options(), &g.options()));
        for g_entry in g.entries() {
            let mut matched = false;
            for f_entry in f.entries() {
                if !f_entry.rhs.contains(&g_entry.lhs) {
                    continue;
                }
                matched = true;
                let rewritten = f_entry.rhs.try_substitute(g)?;
                if !result.contains_mapping_for(&f_entry.lhs) {
                    result.put(f_entry.lhs.clone(), rewritten)?;
                }
            }
            if !matched && !result.contains_mapping_for(&g_entry.lhs) {
                result.put(g_entry.lhs.clone(), g_entry.rhs.clone())?;
            }
        }
        for f_entry in f.entries() {
            if !result.contains_mapping_for(&f_entry.lhs) {
                result.put(f_entry.lhs.clone(), f_entry.rhs.clone())?;
            }
        }
        debug!(
            f = f.len(),
            g = g.len(),
            result = result.len(),
            "smap.compose_and_replace"
        );
        Ok(result)
    }

    /// Concatenates `f` and `g` without deduplication or rebasing.
    pub fn combine(
        f: Option<&SubstitutionMap>,
        g: Option<&SubstitutionMap>,
    ) -> SmapResult<SubstitutionMap> {
        let (f, g) = match inputs(f, g) {
            Inputs::Both(f, g) => (f, g),
            Inputs::Settled(result) => return Ok(result),
        };
        let mut entries = Vec::with_capacity(f.len() + g.len());
        entries.extend_from_slice(f.entries());
        entries.extend_from_slice(g.entries());
        let opts = SmapOptions::for_result(&f.options(), &g.options());
        let result = SubstitutionMap::from_entries(entries, opts);
        debug!(
            f = f.len(),
            g = g.len(),
            result = result.len(),
            "smap.combine"
        );
        result.verify()?;
        Ok(result)
    }
}
