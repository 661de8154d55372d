#![forbid(unsafe_code)]

//! Expression binding and slot equivalence tracking.
//!
//! The [`Analyzer`] resolves column references to slots, assigns result types
//! and marks nodes analyzed, which is the precondition for using an
//! expression as the value of a strict [`crate::SubstitutionMap`]. It also
//! keeps the transitive equivalence classes between slots that
//! [`crate::SubstitutionMap::subtraction`] reports into.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::query::errors::AnalyzerError;
use crate::query::expr::{BinaryOp, Expr, ExprKind};
use crate::query::metadata::MetadataProvider;
use crate::types::{DataType, SlotId};

/// Convenience alias for analyzer results.
pub type AnalyzeResult<T> = std::result::Result<T, AnalyzerError>;

/// Receives "these two slots always hold equal values" facts.
pub trait EquivalenceSink {
    /// Records that `a` and `b` are equivalent.
    fn put_equivalent_slot(&mut self, a: SlotId, b: SlotId);
}

/// Records notifications in arrival order.
impl EquivalenceSink for Vec<(SlotId, SlotId)> {
    fn put_equivalent_slot(&mut self, a: SlotId, b: SlotId) {
        self.push((a, b));
    }
}

/// Union-find over slot identifiers.
#[derive(Clone, Debug, Default)]
pub struct SlotEquivalences {
    parent: FxHashMap<SlotId, SlotId>,
}

impl SlotEquivalences {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, slot: SlotId) -> SlotId {
        let mut current = slot;
        while let Some(&next) = self.parent.get(&current) {
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Merges the classes of `a` and `b`. Returns false if they were
    /// already equivalent.
    pub fn union(&mut self, a: SlotId, b: SlotId) -> bool {
        self.parent.entry(a).or_insert(a);
        self.parent.entry(b).or_insert(b);
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        // Smaller id becomes the representative so classes print stably.
        let (root, child) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent.insert(child, root);
        true
    }

    /// Whether `a` and `b` are known to be equivalent.
    pub fn are_equivalent(&self, a: SlotId, b: SlotId) -> bool {
        a == b || self.find(a) == self.find(b)
    }

    /// Sorted members of the class containing `slot`.
    pub fn class_of(&self, slot: SlotId) -> Vec<SlotId> {
        let root = self.find(slot);
        let mut members: Vec<SlotId> = self
            .parent
            .keys()
            .copied()
            .filter(|member| self.find(*member) == root)
            .collect();
        if members.is_empty() {
            members.push(slot);
        }
        members.sort();
        members
    }

    /// Number of slots that appear in some recorded equivalence.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether no equivalence has been recorded.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

impl EquivalenceSink for SlotEquivalences {
    fn put_equivalent_slot(&mut self, a: SlotId, b: SlotId) {
        self.union(a, b);
    }
}

/// Binds expressions against a metadata provider.
pub struct Analyzer<'m> {
    metadata: &'m dyn MetadataProvider,
    equivalences: SlotEquivalences,
}

impl<'m> Analyzer<'m> {
    /// Creates an analyzer over `metadata`.
    pub fn new(metadata: &'m dyn MetadataProvider) -> Self {
        Self {
            metadata,
            equivalences: SlotEquivalences::new(),
        }
    }

    /// Slot equivalence classes recorded so far.
    pub fn equivalences(&self) -> &SlotEquivalences {
        &self.equivalences
    }

    /// Returns an analyzed copy of `expr`.
    pub fn analyze(&self, expr: &Expr) -> AnalyzeResult<Expr> {
        match expr.kind() {
            ExprKind::Literal(_) => Ok(expr.clone()),
            ExprKind::Column(slot_ref) => {
                let mut candidates = self
                    .metadata
                    .lookup_columns(slot_ref.table.as_deref(), &slot_ref.column);
                match candidates.len() {
                    0 => Err(AnalyzerError::UnknownColumn {
                        column: expr.to_sql(),
                    }),
                    1 => {
                        let meta = candidates.remove(0);
                        let table = slot_ref.table.clone().unwrap_or(meta.table);
                        Ok(Expr::slot_ref(meta.slot, table, meta.column, meta.ty))
                    }
                    _ => Err(AnalyzerError::AmbiguousColumn {
                        column: expr.to_sql(),
                    }),
                }
            }
            ExprKind::Function(call) => {
                let name = call.name.to_ascii_lowercase();
                let args = if name == "count" && matches!(call.args.as_slice(), [star] if *star.kind() == ExprKind::Star)
                {
                    vec![Expr::star().mark_analyzed(DataType::Null)]
                } else {
                    let mut analyzed = Vec::with_capacity(call.args.len());
                    for arg in &call.args {
                        if *arg.kind() == ExprKind::Star {
                            return Err(AnalyzerError::StarNotAllowed);
                        }
                        analyzed.push(self.analyze(arg)?);
                    }
                    analyzed
                };
                let arg_types: Vec<DataType> =
                    args.iter().map(|arg| arg.ty().unwrap_or(DataType::Null)).collect();
                let ty = builtin_return_type(&name, &arg_types)?;
                let rebuilt = if call.distinct {
                    Expr::distinct_function(call.name.clone(), args)
                } else {
                    Expr::function(call.name.clone(), args)
                };
                Ok(rebuilt.mark_analyzed(ty))
            }
            ExprKind::Cast { expr: inner, to } => {
                let inner = self.analyze(inner)?;
                Ok(Expr::cast(inner, *to).mark_analyzed(*to))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.analyze(left)?;
                let right = self.analyze(right)?;
                let ty = binary_result_type(
                    *op,
                    left.ty().unwrap_or(DataType::Null),
                    right.ty().unwrap_or(DataType::Null),
                )?;
                Ok(Expr::binary(*op, left, right).mark_analyzed(ty))
            }
            ExprKind::Star => Err(AnalyzerError::StarNotAllowed),
        }
    }
}

impl EquivalenceSink for Analyzer<'_> {
    fn put_equivalent_slot(&mut self, a: SlotId, b: SlotId) {
        let merged = self.equivalences.union(a, b);
        trace!(a = a.0, b = b.0, merged, "analyzer.equivalent_slot");
    }
}

fn expect_args(name: &str, args: &[DataType], expected: usize) -> AnalyzeResult<()> {
    if args.len() != expected {
        return Err(AnalyzerError::ArgumentCount {
            name: name.to_owned(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn expect_numeric(name: &str, ty: DataType) -> AnalyzeResult<DataType> {
    if ty.is_numeric() || ty == DataType::Null {
        Ok(ty)
    } else {
        Err(AnalyzerError::type_mismatch(format!("{name}()"), ty))
    }
}

fn builtin_return_type(name: &str, args: &[DataType]) -> AnalyzeResult<DataType> {
    match name {
        "count" => {
            expect_args(name, args, 1)?;
            Ok(DataType::BigInt)
        }
        "sum" => {
            expect_args(name, args, 1)?;
            Ok(match expect_numeric(name, args[0])? {
                DataType::Double => DataType::Double,
                _ => DataType::BigInt,
            })
        }
        "avg" => {
            expect_args(name, args, 1)?;
            expect_numeric(name, args[0])?;
            Ok(DataType::Double)
        }
        "min" | "max" => {
            expect_args(name, args, 1)?;
            Ok(args[0])
        }
        "abs" | "zeroifnull" => {
            expect_args(name, args, 1)?;
            expect_numeric(name, args[0])
        }
        "ifnull" | "coalesce" => {
            if name == "ifnull" {
                expect_args(name, args, 2)?;
            } else if args.is_empty() {
                return Err(AnalyzerError::ArgumentCount {
                    name: name.to_owned(),
                    expected: 1,
                    found: 0,
                });
            }
            args.iter().skip(1).try_fold(args[0], |acc, ty| {
                acc.wider(*ty)
                    .ok_or_else(|| AnalyzerError::type_mismatch(format!("{name}()"), *ty))
            })
        }
        "upper" | "lower" => {
            expect_args(name, args, 1)?;
            expect_string(name, args[0])
        }
        "concat" => {
            for ty in args {
                expect_string(name, *ty)?;
            }
            Ok(DataType::Varchar)
        }
        _ => Err(AnalyzerError::UnknownFunction {
            name: name.to_owned(),
        }),
    }
}

fn expect_string(name: &str, ty: DataType) -> AnalyzeResult<DataType> {
    match ty {
        DataType::Varchar | DataType::Null => Ok(DataType::Varchar),
        other => Err(AnalyzerError::type_mismatch(format!("{name}()"), other)),
    }
}

fn binary_result_type(op: BinaryOp, left: DataType, right: DataType) -> AnalyzeResult<DataType> {
    let context = || format!("operator {}", op.symbol());
    if op.is_logical() {
        for ty in [left, right] {
            if !matches!(ty, DataType::Boolean | DataType::Null) {
                return Err(AnalyzerError::type_mismatch(context(), ty));
            }
        }
        return Ok(DataType::Boolean);
    }
    if op.is_arithmetic() {
        for ty in [left, right] {
            if !(ty.is_numeric() || ty == DataType::Null) {
                return Err(AnalyzerError::type_mismatch(context(), ty));
            }
        }
        if op == BinaryOp::Div {
            return Ok(DataType::Double);
        }
        return left
            .wider(right)
            .ok_or_else(|| AnalyzerError::type_mismatch(context(), right));
    }
    match left.wider(right) {
        Some(_) => Ok(DataType::Boolean),
        None => Err(AnalyzerError::type_mismatch(context(), right)),
    }
}
