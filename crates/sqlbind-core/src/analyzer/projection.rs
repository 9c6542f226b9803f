//! Projection of domain tables into the analysis engine

use std::collections::HashMap;

use crate::dialect::SqlDialect;
use crate::engine::{Engine, NativeColumn, NativeTable, TableId};
use crate::schema::DomainTable;
use crate::types::to_resolved;

/// Engine loaded with the run's schema, plus the way back from engine
/// tables to the domain tables they were built from.
#[derive(Debug)]
pub struct SchemaProjection<'a> {
    engine: Engine,
    reverse: HashMap<TableId, &'a DomainTable>,
}

impl<'a> SchemaProjection<'a> {
    /// Register every table with a fresh engine
    pub fn project(tables: &'a [DomainTable], dialect: SqlDialect) -> Self {
        let mut engine = Engine::new(dialect);
        let mut reverse = HashMap::with_capacity(tables.len());

        for table in tables {
            let id = engine.register_table(native_table(table));
            reverse.insert(id, table);
        }

        tracing::debug!(tables = reverse.len(), dialect = %engine.dialect(), "schema projected");
        Self { engine, reverse }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Domain table an engine table was built from
    pub fn domain_table(&self, id: TableId) -> Option<&'a DomainTable> {
        self.reverse.get(&id).copied()
    }
}

/// Convert a domain table into the engine's representation
pub fn native_table(table: &DomainTable) -> NativeTable {
    NativeTable {
        name: table.sql_name.clone(),
        columns: table
            .columns
            .values()
            .map(|column| NativeColumn {
                name: column.name.clone(),
                ty: to_resolved(column.column_type).with_nullable(column.nullable),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DomainColumn;
    use crate::types::{BasicKind, LogicalColumnType, SemanticHint};

    #[test]
    fn test_projection_round_trip() {
        let tables = vec![
            DomainTable::new("users")
                .with_column(DomainColumn::new("id", LogicalColumnType::Integer).not_null())
                .with_column(DomainColumn::new("created_at", LogicalColumnType::DateTime)),
            DomainTable::new("tags"),
        ];
        let projection = SchemaProjection::project(&tables, SqlDialect::SQLite);

        let id = projection.engine().find_table("USERS").unwrap();
        assert_eq!(projection.domain_table(id), Some(&tables[0]));

        let native = projection.engine().table(id).unwrap();
        assert_eq!(native.columns[0].ty.basic, BasicKind::Int);
        assert!(!native.columns[0].ty.nullable);
        assert_eq!(native.columns[1].ty.hint, Some(SemanticHint::IsDateTime));
        assert!(native.columns[1].ty.nullable);

        let tags = projection.engine().find_table("tags").unwrap();
        assert_eq!(projection.domain_table(tags).map(|t| t.sql_name.as_str()), Some("tags"));
    }
}
