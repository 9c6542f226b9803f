//! Result shape inference

use super::projection::SchemaProjection;
use super::query::{InferredResultSet, ResultColumn};
use crate::engine::{find_referenced_tables, AnalysisContext, ResolvedQuery};
use crate::error::FatalError;
use crate::schema::DomainTable;
use crate::types::to_logical;

/// Determine the tables a query touches and the columns it returns.
///
/// Columns keep engine order and duplicate names. A column whose type the
/// engine could not determine is reported as nullable text.
pub fn infer_result_set(
    context: &AnalysisContext,
    query: &ResolvedQuery,
    projection: &SchemaProjection<'_>,
    query_name: &str,
) -> Result<(Vec<DomainTable>, InferredResultSet), FatalError> {
    let referenced_tables = find_referenced_tables(context.root())
        .into_iter()
        .map(|id| {
            projection
                .domain_table(id)
                .cloned()
                .ok_or_else(|| FatalError::MissingTableMapping {
                    query: query_name.to_string(),
                    table: id,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let columns = query
        .output_columns()
        .iter()
        .map(|column| {
            let ty = context.type_of_id(column.id);
            ResultColumn {
                name: column.name.clone(),
                column_type: to_logical(ty),
                nullable: ty.map_or(true, |t| t.nullable),
            }
        })
        .collect();

    Ok((
        referenced_tables,
        InferredResultSet {
            name: None,
            columns,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqlDialect;
    use crate::engine::{Engine, NativeTable};
    use crate::schema::DomainColumn;
    use crate::types::LogicalColumnType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unmapped_engine_table_is_fatal() {
        let tables = vec![DomainTable::new("users")
            .with_column(DomainColumn::new("id", LogicalColumnType::Integer).not_null())];
        let projection = SchemaProjection::project(&tables, SqlDialect::SQLite);

        // A second engine knows a table the projection never registered
        let mut engine = Engine::new(SqlDialect::SQLite);
        engine.register_table(NativeTable {
            name: "users".to_string(),
            columns: Vec::new(),
        });
        engine.register_table(NativeTable {
            name: "audit".to_string(),
            columns: Vec::new(),
        });
        let context = engine.analyze("SELECT * FROM audit").unwrap();
        let query = context.root().as_query().unwrap();

        let err = infer_result_set(&context, query, &projection, "Audit").unwrap_err();
        assert_eq!(
            err,
            FatalError::MissingTableMapping {
                query: "Audit".to_string(),
                table: crate::engine::TableId(1),
            }
        );
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let tables = vec![DomainTable::new("users")
            .with_column(DomainColumn::new("id", LogicalColumnType::Integer).not_null())];
        let projection = SchemaProjection::project(&tables, SqlDialect::SQLite);
        let context = projection
            .engine()
            .analyze("SELECT id, id, 'x' AS id FROM users")
            .unwrap();
        let query = context.root().as_query().unwrap();

        let (referenced, result_set) =
            infer_result_set(&context, query, &projection, "Dupes").unwrap();
        assert_eq!(referenced, tables);
        let names: Vec<_> = result_set.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "id", "id"]);
        assert_eq!(result_set.columns[2].column_type, LogicalColumnType::Text);
        assert!(!result_set.columns[2].nullable);
    }
}
