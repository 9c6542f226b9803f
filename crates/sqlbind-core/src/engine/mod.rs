//! SQL analysis engine
//!
//! Parses one statement with sqlparser, resolves its names and types against
//! the registered tables and numbers its bound parameters. The analyzer only
//! talks to this module through [`Engine`] and [`AnalysisContext`].

mod functions;
mod resolver;
pub mod tree;
mod usage;
mod variables;

use serde::{Deserialize, Serialize};
use sqlparser::parser::Parser;
use std::collections::HashMap;

use crate::dialect::SqlDialect;
use crate::error::{Diagnostic, EngineError};
use crate::types::ResolvedType;

pub use functions::{is_aggregate, return_type};
pub use tree::{ExprId, ResolvedExpr, ResolvedQuery, ResolvedStatement};
pub use usage::find_referenced_tables;

/// Handle of a registered table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub usize);

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Table as the engine sees it
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTable {
    pub name: String,
    pub columns: Vec<NativeColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeColumn {
    pub name: String,
    pub ty: ResolvedType,
}

/// Analysis engine holding the registered schema
#[derive(Debug, Default)]
pub struct Engine {
    dialect: SqlDialect,
    tables: Vec<NativeTable>,
}

impl Engine {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            tables: Vec::new(),
        }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Register a table and return its handle
    pub fn register_table(&mut self, table: NativeTable) -> TableId {
        let id = TableId(self.tables.len());
        tracing::trace!(table = %table.name, %id, "registered table");
        self.tables.push(table);
        id
    }

    pub fn table(&self, id: TableId) -> Option<&NativeTable> {
        self.tables.get(id.0)
    }

    /// Look up a table by name (case-insensitive); later registrations win
    pub fn find_table(&self, name: &str) -> Option<TableId> {
        self.tables
            .iter()
            .rposition(|t| t.name.eq_ignore_ascii_case(name))
            .map(TableId)
    }

    /// Parse and resolve exactly one statement
    pub fn analyze(&self, sql: &str) -> Result<AnalysisContext, EngineError> {
        let dialect = self.dialect.parser_dialect();
        let statements = Parser::parse_sql(dialect.as_ref(), sql)?;
        let [statement] = statements.as_slice() else {
            return Err(EngineError::StatementCount(statements.len()));
        };

        let resolution = resolver::Resolver::new(self).resolve(statement);
        let mut root = resolution.root;
        let mut types = resolution.types;
        let mut diagnostics = resolution.diagnostics;
        variables::assign_indices(&mut root, &mut types, &mut diagnostics);

        Ok(AnalysisContext {
            root,
            diagnostics,
            types,
            source: sql.to_string(),
        })
    }
}

/// Result of analyzing one statement
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    root: ResolvedStatement,
    diagnostics: Vec<Diagnostic>,
    types: HashMap<ExprId, ResolvedType>,
    source: String,
}

impl AnalysisContext {
    pub fn root(&self) -> &ResolvedStatement {
        &self.root
    }

    /// Semantic problems found while resolving
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn type_of(&self, expr: &ResolvedExpr) -> Option<ResolvedType> {
        self.type_of_id(expr.id)
    }

    pub fn type_of_id(&self, id: ExprId) -> Option<ResolvedType> {
        self.types.get(&id).copied()
    }

    pub fn sql(&self) -> &str {
        &self.source
    }
}
