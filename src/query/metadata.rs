//! Metadata resolution helpers bridging column names to slot identifiers.
//!
//! The analyzer binds column references to slots before any substitution map
//! may use them as replacement values. These helpers provide that lookup.

use crate::types::{DataType, SlotId, TupleId};

/// Catalog facts about one visible column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Slot the column is materialized into.
    pub slot: SlotId,
    /// Tuple owning the slot.
    pub tuple: TupleId,
    /// Table name or alias the column is visible under.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Column type.
    pub ty: DataType,
}

/// Provides name-to-slot resolution for analyzer consumers.
pub trait MetadataProvider {
    /// Returns every visible column named `column`, restricted to `table`
    /// when qualified. Names compare case-insensitively.
    fn lookup_columns(&self, table: Option<&str>, column: &str) -> Vec<ColumnMeta>;
}

/// Simple in-memory metadata provider used for tests or prototyping.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMetadata {
    columns: Vec<ColumnMeta>,
    next_tuple: u32,
    tables: Vec<(String, TupleId)>,
}

impl InMemoryMetadata {
    /// Creates a new empty in-memory metadata provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a column of `table` materialized into `slot`.
    pub fn with_column(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        slot: SlotId,
        ty: DataType,
    ) -> Self {
        let table = table.into();
        let tuple = self.tuple_for(&table);
        self.columns.push(ColumnMeta {
            slot,
            tuple,
            table,
            column: column.into(),
            ty,
        });
        self
    }

    fn tuple_for(&mut self, table: &str) -> TupleId {
        if let Some((_, id)) = self
            .tables
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(table))
        {
            return *id;
        }
        let id = TupleId(self.next_tuple);
        self.next_tuple += 1;
        self.tables.push((table.to_owned(), id));
        id
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn lookup_columns(&self, table: Option<&str>, column: &str) -> Vec<ColumnMeta> {
        self.columns
            .iter()
            .filter(|meta| meta.column.eq_ignore_ascii_case(column))
            .filter(|meta| table.map_or(true, |t| meta.table.eq_ignore_ascii_case(t)))
            .cloned()
            .collect()
    }
}
