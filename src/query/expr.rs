//! Scalar expression trees consumed by substitution maps.
//!
//! [`Expr`] is a closed set of node kinds so that structural equality and
//! containment stay total. Equality ignores analysis state: an unresolved
//! `t.a` and its analyzed counterpart compare equal, which is what lets a
//! map built from parser output be applied to analyzed trees.

use std::fmt;

use crate::error::{SmapError, SmapResult};
use crate::query::smap::SubstitutionMap;
use crate::query::value::Value;
use crate::types::{DataType, SlotId};

/// Binary operators understood by the analyzer.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// SQL spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    /// True for `+ - * /`.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    /// True for `AND` / `OR`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Column reference, optionally bound to a slot.
#[derive(Clone, Debug)]
pub struct SlotRef {
    /// Slot assigned by the analyzer; `None` until resolved.
    pub slot: Option<SlotId>,
    /// Qualifying table or alias as written.
    pub table: Option<String>,
    /// Column name as written.
    pub column: String,
}

impl PartialEq for SlotRef {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.slot, other.slot) {
            return a == b;
        }
        let tables_match = match (&self.table, &other.table) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        tables_match && self.column.eq_ignore_ascii_case(&other.column)
    }
}

/// Scalar or aggregate function call.
#[derive(Clone, Debug)]
pub struct FunctionCall {
    /// Function name; compared case-insensitively.
    pub name: String,
    /// Call arguments in order.
    pub args: Vec<Expr>,
    /// `DISTINCT` qualifier for aggregates.
    pub distinct: bool,
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.distinct == other.distinct
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.args == other.args
    }
}

/// Node kinds of an expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Column reference.
    Column(SlotRef),
    /// Literal constant.
    Literal(Value),
    /// Function call.
    Function(FunctionCall),
    /// Explicit cast.
    Cast {
        /// Operand.
        expr: Box<Expr>,
        /// Target type.
        to: DataType,
    },
    /// Binary operator application.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `*` argument of `count(*)`.
    Star,
}

/// Expression tree node.
#[derive(Clone, Debug)]
pub struct Expr {
    kind: ExprKind,
    ty: Option<DataType>,
    analyzed: bool,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// How [`Expr::substitute_with`] treats replacements it cannot apply.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SubstituteMode {
    /// Skip matches whose replacement is unanalyzed; never fails.
    Lenient,
    /// Fail on unanalyzed or type-incompatible replacements.
    Strict,
}

impl Expr {
    fn unanalyzed(kind: ExprKind) -> Self {
        Self {
            kind,
            ty: None,
            analyzed: false,
        }
    }

    /// Unresolved, unqualified column reference.
    pub fn column(column: impl Into<String>) -> Self {
        Self::unanalyzed(ExprKind::Column(SlotRef {
            slot: None,
            table: None,
            column: column.into(),
        }))
    }

    /// Unresolved, table-qualified column reference.
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::unanalyzed(ExprKind::Column(SlotRef {
            slot: None,
            table: Some(table.into()),
            column: column.into(),
        }))
    }

    /// Column reference already bound to `slot`.
    pub fn slot_ref(
        slot: SlotId,
        table: impl Into<String>,
        column: impl Into<String>,
        ty: DataType,
    ) -> Self {
        Self {
            kind: ExprKind::Column(SlotRef {
                slot: Some(slot),
                table: Some(table.into()),
                column: column.into(),
            }),
            ty: Some(ty),
            analyzed: true,
        }
    }

    /// Literal; literals are analyzed on construction.
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = value.data_type();
        Self {
            kind: ExprKind::Literal(value),
            ty: Some(ty),
            analyzed: true,
        }
    }

    /// Unresolved function call.
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::unanalyzed(ExprKind::Function(FunctionCall {
            name: name.into(),
            args,
            distinct: false,
        }))
    }

    /// Unresolved `name(DISTINCT args)` aggregate call.
    pub fn distinct_function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::unanalyzed(ExprKind::Function(FunctionCall {
            name: name.into(),
            args,
            distinct: true,
        }))
    }

    /// Bare `*` argument.
    pub fn star() -> Self {
        Self::unanalyzed(ExprKind::Star)
    }

    /// Unresolved `count(*)`.
    pub fn count_star() -> Self {
        Self::function("count", vec![Self::star()])
    }

    /// Unresolved cast.
    pub fn cast(expr: Expr, to: DataType) -> Self {
        Self::unanalyzed(ExprKind::Cast {
            expr: Box::new(expr),
            to,
        })
    }

    /// Unresolved binary operation.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::unanalyzed(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Marks this node analyzed with the given result type. Children keep
    /// their own state.
    pub fn mark_analyzed(mut self, ty: DataType) -> Self {
        self.ty = Some(ty);
        self.analyzed = true;
        self
    }

    /// Node kind.
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Result type, known once analyzed.
    pub fn ty(&self) -> Option<DataType> {
        self.ty
    }

    /// Whether the analyzer has resolved this node.
    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    /// Column reference payload, if this is one.
    pub fn as_slot_ref(&self) -> Option<&SlotRef> {
        match &self.kind {
            ExprKind::Column(slot_ref) => Some(slot_ref),
            _ => None,
        }
    }

    /// Bound slot of a column reference.
    pub fn slot_id(&self) -> Option<SlotId> {
        self.as_slot_ref().and_then(|slot_ref| slot_ref.slot)
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Function(call) => call.args.iter().collect(),
            ExprKind::Cast { expr, .. } => vec![expr.as_ref()],
            ExprKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ExprKind::Column(_) | ExprKind::Literal(_) | ExprKind::Star => Vec::new(),
        }
    }

    /// True when `needle` equals this node or any descendant.
    pub fn contains(&self, needle: &Expr) -> bool {
        self == needle || self.children().into_iter().any(|child| child.contains(needle))
    }

    /// Rewrites every occurrence of a key of `smap`, skipping matches whose
    /// replacement is unanalyzed.
    pub fn substitute(&self, smap: &SubstitutionMap) -> Expr {
        self.substitute_with(smap, SubstituteMode::Lenient)
            .unwrap_or_else(|_| self.clone())
    }

    /// Rewrites every occurrence of a key of `smap`, failing if a match
    /// cannot legally apply.
    pub fn try_substitute(&self, smap: &SubstitutionMap) -> SmapResult<Expr> {
        self.substitute_with(smap, SubstituteMode::Strict)
    }

    /// Top-down substitution. A node equal to a key is replaced by a clone of
    /// the first mapped value and its replacement is not revisited.
    pub fn substitute_with(&self, smap: &SubstitutionMap, mode: SubstituteMode) -> SmapResult<Expr> {
        if let Some(replacement) = smap.get(self) {
            match mode {
                SubstituteMode::Strict => {
                    self.check_replacement(replacement)?;
                    return Ok(replacement.clone());
                }
                SubstituteMode::Lenient if replacement.is_analyzed() => {
                    return Ok(replacement.clone());
                }
                SubstituteMode::Lenient => {}
            }
        }
        self.map_children(|child| child.substitute_with(smap, mode))
    }

    fn check_replacement(&self, replacement: &Expr) -> SmapResult<()> {
        if !replacement.is_analyzed() {
            return Err(SmapError::Substitution {
                expr: self.to_sql(),
                reason: format!("replacement {} is not analyzed", replacement.to_sql()),
            });
        }
        // Strict callers splice the result into typed positions.
        if let (Some(expected), Some(found)) = (self.ty, replacement.ty) {
            if !expected.is_assignable_from(found) {
                return Err(SmapError::Substitution {
                    expr: self.to_sql(),
                    reason: format!(
                        "replacement {} has type {found}, expected {expected}",
                        replacement.to_sql()
                    ),
                });
            }
        }
        Ok(())
    }

    fn map_children<F>(&self, mut f: F) -> SmapResult<Expr>
    where
        F: FnMut(&Expr) -> SmapResult<Expr>,
    {
        let kind = match &self.kind {
            ExprKind::Function(call) => {
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(f(arg)?);
                }
                ExprKind::Function(FunctionCall {
                    name: call.name.clone(),
                    args,
                    distinct: call.distinct,
                })
            }
            ExprKind::Cast { expr, to } => ExprKind::Cast {
                expr: Box::new(f(expr)?),
                to: *to,
            },
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: Box::new(f(left)?),
                right: Box::new(f(right)?),
            },
            leaf @ (ExprKind::Column(_) | ExprKind::Literal(_) | ExprKind::Star) => leaf.clone(),
        };
        Ok(Expr {
            kind,
            ty: self.ty,
            analyzed: self.analyzed,
        })
    }

    /// Renders the expression as SQL text.
    pub fn to_sql(&self) -> String {
        match &self.kind {
            ExprKind::Column(slot_ref) => match &slot_ref.table {
                Some(table) => format!("{table}.{}", slot_ref.column),
                None => slot_ref.column.clone(),
            },
            ExprKind::Literal(value) => value.to_sql(),
            ExprKind::Function(call) => {
                let args: Vec<String> = call.args.iter().map(Expr::to_sql).collect();
                let distinct = if call.distinct { "DISTINCT " } else { "" };
                format!("{}({distinct}{})", call.name, args.join(", "))
            }
            ExprKind::Cast { expr, to } => format!("CAST({} AS {to})", expr.to_sql()),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", left.to_sql(), op.symbol(), right.to_sql())
            }
            ExprKind::Star => "*".into(),
        }
    }

    /// Structural rendering for diagnostics.
    pub fn debug_string(&self) -> String {
        match &self.kind {
            ExprKind::Column(slot_ref) => {
                let slot = slot_ref
                    .slot
                    .map(|slot| slot.to_string())
                    .unwrap_or_else(|| "?".into());
                format!("SlotRef{{slot={slot} col={}}}", self.to_sql())
            }
            ExprKind::Literal(value) => {
                let ty = self.ty.map(DataType::sql_name).unwrap_or("?");
                format!("Literal{{type={ty} value={}}}", value.to_sql())
            }
            ExprKind::Function(call) => {
                let args: Vec<String> = call.args.iter().map(Expr::debug_string).collect();
                format!(
                    "Function{{name={} distinct={} args=[{}]}}",
                    call.name,
                    call.distinct,
                    args.join(" ")
                )
            }
            ExprKind::Cast { expr, to } => format!("Cast{{to={to} expr={}}}", expr.debug_string()),
            ExprKind::Binary { op, left, right } => format!(
                "Binary{{op={} left={} right={}}}",
                op.symbol(),
                left.debug_string(),
                right.debug_string()
            ),
            ExprKind::Star => "Star".into(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
