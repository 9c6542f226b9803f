//! Tables referenced by a resolved statement

use indexmap::IndexSet;

use super::tree::{walk_source, walk_statement, ResolvedSource, ResolvedStatement, SourceKind, Visitor};
use super::TableId;

/// Collect the tables a statement reads from, in order of first reference.
///
/// CTEs and derived tables contribute the tables they read; the CTE names
/// themselves are not tables.
pub fn find_referenced_tables(stmt: &ResolvedStatement) -> IndexSet<TableId> {
    let mut finder = TableFinder::default();
    walk_statement(&mut finder, stmt);
    finder.tables
}

#[derive(Default)]
struct TableFinder {
    tables: IndexSet<TableId>,
}

impl<'t> Visitor<'t> for TableFinder {
    fn visit_source(&mut self, source: &'t ResolvedSource) {
        if let SourceKind::Table(id) = source.kind {
            self.tables.insert(id);
        }
        walk_source(self, source);
    }
}
