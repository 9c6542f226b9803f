//! Schema catalog - stores table and column definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::LogicalColumnType;

/// Ordered set of table definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    tables: Vec<DomainTable>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing an earlier definition with the same name
    pub fn add_table(&mut self, table: DomainTable) {
        match self.position(&table.sql_name) {
            Some(idx) => self.tables[idx] = table,
            None => self.tables.push(table),
        }
    }

    /// Look up a table by name (case-insensitive)
    pub fn get_table(&self, name: &str) -> Option<&DomainTable> {
        self.position(name).map(|idx| &self.tables[idx])
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut DomainTable> {
        self.position(name).map(move |idx| &mut self.tables[idx])
    }

    pub fn remove_table(&mut self, name: &str) -> Option<DomainTable> {
        self.position(name).map(|idx| self.tables.remove(idx))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All tables in definition order
    pub fn tables(&self) -> &[DomainTable] {
        &self.tables
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.sql_name.eq_ignore_ascii_case(name))
    }
}

/// Table definition as declared by the schema author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTable {
    pub sql_name: String,
    pub columns: IndexMap<String, DomainColumn>,
}

impl DomainTable {
    pub fn new(sql_name: impl Into<String>) -> Self {
        Self {
            sql_name: sql_name.into(),
            columns: IndexMap::new(),
        }
    }

    /// Append a column (builder style)
    pub fn with_column(mut self, column: DomainColumn) -> Self {
        self.add_column(column);
        self
    }

    pub fn add_column(&mut self, column: DomainColumn) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&DomainColumn> {
        // Case-insensitive lookup
        self.columns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut DomainColumn> {
        self.columns
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Remove a column, keeping the order of the rest
    pub fn remove_column(&mut self, name: &str) -> Option<DomainColumn> {
        let idx = self.column_index(name)?;
        self.columns.shift_remove_index(idx).map(|(_, column)| column)
    }

    /// Rename a column in place
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        let Some(idx) = self.column_index(old) else {
            return false;
        };
        let Some((_, mut column)) = self.columns.shift_remove_index(idx) else {
            return false;
        };
        column.name = new.to_string();
        self.columns.shift_insert(idx, column.name.clone(), column);
        true
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.keys().position(|k| k.eq_ignore_ascii_case(name))
    }

    /// Check if a column exists
    pub fn column_exists(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Get all column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: LogicalColumnType,
    pub nullable: bool,
}

impl DomainColumn {
    pub fn new(name: impl Into<String>, column_type: LogicalColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}
