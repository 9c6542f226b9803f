//! Schema builder - converts DDL into domain tables

use sqlparser::ast::{
    AlterTableOperation, ColumnOption, CreateTable, ObjectName, ObjectType, Statement,
    TableConstraint,
};
use sqlparser::parser::Parser;

use crate::dialect::SqlDialect;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::schema::{Catalog, DomainColumn, DomainTable};
use crate::types::LogicalColumnType;

/// Builder for constructing a Catalog from SQL schema definitions
pub struct SchemaBuilder {
    catalog: Catalog,
    dialect: SqlDialect,
    diagnostics: Vec<Diagnostic>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::with_dialect(SqlDialect::default())
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            catalog: Catalog::new(),
            dialect,
            diagnostics: Vec::new(),
        }
    }

    /// Parse SQL schema definitions and add them to the catalog
    pub fn parse(&mut self, sql: &str) -> Result<(), Vec<Diagnostic>> {
        let dialect = self.dialect.parser_dialect();

        // Try parsing the entire SQL first (fast path)
        match Parser::parse_sql(dialect.as_ref(), sql) {
            Ok(statements) => {
                for stmt in &statements {
                    self.process_statement(stmt);
                }
            }
            Err(_) => {
                // Fall back to statement-by-statement parsing to skip unsupported syntax
                self.parse_statements_individually(sql);
            }
        }

        if self
            .diagnostics
            .iter()
            .any(|d| d.severity == crate::error::Severity::Error)
        {
            Err(std::mem::take(&mut self.diagnostics))
        } else {
            Ok(())
        }
    }

    /// Parse statements one at a time so a trigger body or other syntax the
    /// parser rejects does not hide the tables around it.
    fn parse_statements_individually(&mut self, sql: &str) {
        let dialect = self.dialect.parser_dialect();

        for raw_stmt in split_sql_statements(sql) {
            let trimmed = raw_stmt.trim();
            if trimmed.is_empty() {
                continue;
            }

            match Parser::parse_sql(dialect.as_ref(), trimmed) {
                Ok(stmts) => {
                    for stmt in &stmts {
                        self.process_statement(stmt);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable schema statement");
                }
            }
        }
    }

    fn process_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::CreateTable(create) => self.process_create_table(create),
            Statement::AlterTable {
                name, operations, ..
            } => self.process_alter_table(name, operations),
            Statement::Drop {
                object_type: ObjectType::Table,
                names,
                ..
            } => {
                for name in names {
                    self.catalog.remove_table(&table_name(name));
                }
            }
            _ => {}
        }
    }

    fn process_create_table(&mut self, create: &CreateTable) {
        let mut table = DomainTable::new(table_name(&create.name));

        for column in &create.columns {
            let mut col = DomainColumn::new(
                &column.name.value,
                LogicalColumnType::from_ast(&column.data_type),
            );
            for option in &column.options {
                apply_column_option(&mut col, &option.option);
            }
            table.add_column(col);
        }

        for constraint in &create.constraints {
            if let TableConstraint::PrimaryKey { columns, .. } = constraint {
                for ident in columns {
                    if let Some(col) = table.get_column_mut(&ident.value) {
                        col.nullable = false;
                    }
                }
            }
        }

        tracing::debug!(table = %table.sql_name, columns = table.columns.len(), "table defined");
        self.catalog.add_table(table);
    }

    fn process_alter_table(&mut self, name: &ObjectName, operations: &[AlterTableOperation]) {
        let name = table_name(name);

        if !self.catalog.table_exists(&name) {
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::TableNotFound,
                    format!(
                        "ALTER TABLE references table '{}' which was not found in schema",
                        name
                    ),
                )
                .with_help("Ensure the CREATE TABLE statement appears before ALTER TABLE"),
            );
            return;
        }

        for operation in operations {
            match operation {
                AlterTableOperation::AddColumn { column_def, .. } => {
                    let mut col = DomainColumn::new(
                        &column_def.name.value,
                        LogicalColumnType::from_ast(&column_def.data_type),
                    );
                    for option in &column_def.options {
                        apply_column_option(&mut col, &option.option);
                    }
                    if let Some(table) = self.catalog.get_table_mut(&name) {
                        table.add_column(col);
                    }
                }
                AlterTableOperation::DropColumn { column_name, .. } => {
                    if let Some(table) = self.catalog.get_table_mut(&name) {
                        table.remove_column(&column_name.value);
                    }
                }
                AlterTableOperation::RenameColumn {
                    old_column_name,
                    new_column_name,
                } => {
                    if let Some(table) = self.catalog.get_table_mut(&name) {
                        table.rename_column(&old_column_name.value, &new_column_name.value);
                    }
                }
                AlterTableOperation::RenameTable {
                    table_name: new_name,
                } => {
                    if let Some(mut table) = self.catalog.remove_table(&name) {
                        table.sql_name = table_name(new_name);
                        self.catalog.add_table(table);
                    }
                    return;
                }
                _ => {
                    // Other ALTER TABLE operations do not change the column set
                }
            }
        }
    }

    /// Consume the builder and return the catalog
    pub fn build(self) -> (Catalog, Vec<Diagnostic>) {
        (self.catalog, self.diagnostics)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_column_option(col: &mut DomainColumn, option: &ColumnOption) {
    match option {
        ColumnOption::Null => col.nullable = true,
        ColumnOption::NotNull => col.nullable = false,
        ColumnOption::Unique { is_primary, .. } if *is_primary => col.nullable = false,
        _ => {}
    }
}

/// Unqualified table name (schema prefixes are not modelled)
fn table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Split SQL text into individual statements by semicolons,
/// respecting string literals, quoted identifiers and comments.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < len {
                    if bytes[i] == quote {
                        i += 1;
                        if i < len && bytes[i] == quote {
                            i += 1; // escaped quote
                        } else {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len {
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                let stmt = &sql[start..i];
                if !stmt.trim().is_empty() {
                    statements.push(stmt);
                }
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let last = &sql[start.min(len)..];
    if !last.trim().is_empty() {
        statements.push(last);
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(sql: &str) -> Catalog {
        let mut builder = SchemaBuilder::new();
        builder.parse(sql).unwrap();
        builder.build().0
    }

    #[test]
    fn test_drop_only_removes_tables() {
        let catalog = build(
            r#"
            CREATE TABLE users (id INTEGER PRIMARY KEY);
            CREATE TABLE posts (id INTEGER PRIMARY KEY);
            DROP INDEX users;
            DROP VIEW users;
            DROP TABLE posts;
        "#,
        );

        assert!(catalog.get_table("users").is_some());
        assert!(catalog.get_table("posts").is_none());
    }

    #[test]
    fn test_parse_simple_table() {
        let catalog = build(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                is_admin BOOLEAN NOT NULL,
                created_at DATETIME,
                avatar BLOB,
                score REAL
            );
        "#,
        );

        let table = catalog.get_table("users").unwrap();
        assert_eq!(
            table.column_names(),
            vec!["id", "name", "is_admin", "created_at", "avatar", "score"]
        );

        let id = table.get_column("id").unwrap();
        assert!(!id.nullable);
        assert_eq!(id.column_type, LogicalColumnType::Integer);

        let created_at = table.get_column("created_at").unwrap();
        assert!(created_at.nullable);
        assert_eq!(created_at.column_type, LogicalColumnType::DateTime);

        assert_eq!(
            table.get_column("is_admin").unwrap().column_type,
            LogicalColumnType::Boolean
        );
    }

    #[test]
    fn test_table_primary_key_constraint() {
        let catalog = build("CREATE TABLE pairs (a INTEGER, b INTEGER, PRIMARY KEY (a, b));");
        let table = catalog.get_table("pairs").unwrap();
        assert!(!table.get_column("a").unwrap().nullable);
        assert!(!table.get_column("b").unwrap().nullable);
    }

    #[test]
    fn test_alter_table() {
        let catalog = build(
            r#"
            CREATE TABLE users (id INTEGER NOT NULL, name TEXT, legacy TEXT);
            ALTER TABLE users ADD COLUMN email TEXT NOT NULL;
            ALTER TABLE users DROP COLUMN legacy;
            ALTER TABLE users RENAME COLUMN name TO display_name;
            ALTER TABLE users RENAME TO accounts;
        "#,
        );

        assert!(!catalog.table_exists("users"));
        let table = catalog.get_table("accounts").unwrap();
        assert_eq!(table.column_names(), vec!["id", "display_name", "email"]);
        assert!(!table.get_column("email").unwrap().nullable);
    }

    #[test]
    fn test_alter_unknown_table_is_reported() {
        let mut builder = SchemaBuilder::new();
        builder
            .parse("ALTER TABLE ghosts ADD COLUMN id INTEGER;")
            .unwrap();
        let (_, diagnostics) = builder.build();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::TableNotFound);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_split_preserves_string_literals() {
        let sql = "SELECT 'hello; world'; CREATE TABLE t (id INT);";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("hello; world"));
    }

    #[test]
    fn test_parse_with_unsupported_statements() {
        let catalog = build(
            r#"
            CREATE TABLE actor (
                actor_id integer NOT NULL,
                first_name varchar(45) NOT NULL
            );

            THIS IS NOT SQL AT ALL;

            CREATE TABLE category (
                category_id integer NOT NULL,
                name varchar(25) NOT NULL
            );
        "#,
        );

        assert!(catalog.table_exists("actor"));
        assert!(catalog.table_exists("category"));
    }
}
