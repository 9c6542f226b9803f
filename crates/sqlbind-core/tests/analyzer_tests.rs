// Integration tests for the query analyzer
use pretty_assertions::assert_eq;
use sqlbind_core::analyzer::{Analyzer, FoundVariable, QueryInput, ResultColumn};
use sqlbind_core::error::{DiagnosticKind, FatalError};
use sqlbind_core::schema::{Catalog, DomainColumn, DomainTable, SchemaBuilder};
use sqlbind_core::types::LogicalColumnType;

fn setup_catalog() -> Catalog {
    let schema_sql = r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                is_admin BOOLEAN NOT NULL,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE posts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                body BLOB,
                score REAL
            );
        "#;

    let mut builder = SchemaBuilder::new();
    builder.parse(schema_sql).unwrap();
    let (catalog, _) = builder.build();
    catalog
}

fn column(name: &str, column_type: LogicalColumnType, nullable: bool) -> ResultColumn {
    ResultColumn {
        name: name.to_string(),
        column_type,
        nullable,
    }
}

fn variable(index: usize, name: Option<&str>, column_type: LogicalColumnType) -> FoundVariable {
    FoundVariable {
        index,
        name: name.map(str::to_string),
        column_type,
    }
}

#[test]
fn test_result_shape_and_referenced_tables() {
    let tables = vec![DomainTable::new("T")
        .with_column(DomainColumn::new("id", LogicalColumnType::Integer).not_null())
        .with_column(DomainColumn::new("flag", LogicalColumnType::Boolean))];
    let mut analyzer = Analyzer::new(&tables);

    analyzer
        .parse(&[QueryInput::new("Q", "SELECT id, flag FROM T")])
        .unwrap();

    assert!(analyzer.diagnostics().is_empty());
    let results = analyzer.results();
    assert_eq!(results.len(), 1);
    let query = &results[0];
    assert_eq!(query.name, "Q");
    assert_eq!(query.sql, "SELECT id, flag FROM T");
    assert!(query.variables.is_empty());
    assert_eq!(query.referenced_tables, tables);
    assert_eq!(query.result_set.name, None);
    assert_eq!(
        query.result_set.columns,
        vec![
            column("id", LogicalColumnType::Integer, false),
            column("flag", LogicalColumnType::Boolean, true),
        ]
    );
}

#[test]
fn test_every_logical_type_survives_projection() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[
            QueryInput::new(
                "Users",
                "SELECT id, name, email, is_admin, created_at FROM users",
            ),
            QueryInput::new("Posts", "SELECT body, score FROM posts"),
        ])
        .unwrap();

    assert!(analyzer.diagnostics().is_empty());
    assert_eq!(
        analyzer.results()[0].result_set.columns,
        vec![
            column("id", LogicalColumnType::Integer, false),
            column("name", LogicalColumnType::Text, false),
            column("email", LogicalColumnType::Text, true),
            column("is_admin", LogicalColumnType::Boolean, false),
            column("created_at", LogicalColumnType::DateTime, false),
        ]
    );
    assert_eq!(
        analyzer.results()[1].result_set.columns,
        vec![
            column("body", LogicalColumnType::Blob, true),
            column("score", LogicalColumnType::Real, true),
        ]
    );
}

#[test]
fn test_repeated_named_parameter_is_one_variable() {
    let mut analyzer = Analyzer::new(&[]);

    analyzer
        .parse(&[QueryInput::new("Eq", "SELECT :a = :a AS eq")])
        .unwrap();

    let query = &analyzer.results()[0];
    assert_eq!(query.variables, vec![variable(1, Some("a"), LogicalColumnType::Text)]);
    assert_eq!(query.result_set.columns.len(), 1);
    assert_eq!(query.result_set.columns[0].name, "eq");
    assert_eq!(
        query.result_set.columns[0].column_type,
        LogicalColumnType::Boolean
    );
}

#[test]
fn test_numbered_parameters_deduplicate() {
    let mut analyzer = Analyzer::new(&[]);

    analyzer
        .parse(&[QueryInput::new("Numbered", "SELECT ?1, ?2, ?1")])
        .unwrap();

    let query = &analyzer.results()[0];
    assert_eq!(
        query.variables,
        vec![
            variable(1, None, LogicalColumnType::Text),
            variable(2, None, LogicalColumnType::Text),
        ]
    );
}

#[test]
fn test_sparse_parameter_indices_are_renumbered() {
    let mut analyzer = Analyzer::new(&[]);

    analyzer
        .parse(&[QueryInput::new("Sparse", "SELECT ?1, ?3, ?3")])
        .unwrap();

    // Slots 1, 3, 3: the counter only skips a reference equal to itself,
    // so the gap leaves a third variable behind.
    let indices: Vec<usize> = analyzer.results()[0]
        .variables
        .iter()
        .map(|v| v.index)
        .collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
fn test_parameter_types_from_context() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[QueryInput::new(
            "Search",
            "SELECT p.title FROM posts p JOIN users u ON u.id = p.user_id \
             WHERE u.is_admin = :admin AND p.score BETWEEN ? AND ? \
             AND u.created_at > :since AND p.title LIKE :pattern \
             LIMIT :limit",
        )])
        .unwrap();

    assert_eq!(
        analyzer.results()[0].variables,
        vec![
            variable(1, Some("admin"), LogicalColumnType::Boolean),
            variable(2, None, LogicalColumnType::Real),
            variable(3, None, LogicalColumnType::Real),
            variable(4, Some("since"), LogicalColumnType::DateTime),
            variable(5, Some("pattern"), LogicalColumnType::Text),
            variable(6, Some("limit"), LogicalColumnType::Integer),
        ]
    );
}

#[test]
fn test_undeclared_table_is_not_fatal() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    let outcome = analyzer.parse(&[
        QueryInput::new("Ghosts", "SELECT id FROM ghosts"),
        QueryInput::new("Users", "SELECT id FROM users"),
    ]);

    assert!(outcome.is_ok());
    let diagnostics = analyzer.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TableNotFound);
    assert!(!diagnostics[0].critical);
    assert_eq!(diagnostics[0].query.as_deref(), Some("Ghosts"));
    assert_eq!(diagnostics[0].sql.as_deref(), Some("SELECT id FROM ghosts"));

    // Best-effort result for the broken query, full result for the next one
    let results = analyzer.results();
    assert_eq!(results.len(), 2);
    assert!(results[0].referenced_tables.is_empty());
    assert_eq!(
        results[0].result_set.columns,
        vec![column("id", LogicalColumnType::Text, true)]
    );
    assert_eq!(results[1].referenced_tables[0].sql_name, "users");
}

#[test]
fn test_unknown_column_is_reported_with_suggestion() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[QueryInput::new("Typo", "SELECT emial FROM users")])
        .unwrap();

    let diagnostics = analyzer.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::ColumnNotFound);
    assert_eq!(diagnostics[0].help.as_deref(), Some("Did you mean 'email'?"));
    assert_eq!(analyzer.results().len(), 1);
}

#[test]
fn test_insert_aborts_the_run() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    let err = analyzer
        .parse(&[
            QueryInput::new("First", "SELECT id FROM users"),
            QueryInput::new("AddUser", "INSERT INTO users (id, name) VALUES (1, 'a')"),
            QueryInput::new("Never", "SELECT id FROM posts"),
        ])
        .unwrap_err();

    assert_eq!(
        err,
        FatalError::UnsupportedStatement {
            query: "AddUser".to_string(),
            statement: "INSERT".to_string(),
        }
    );
    assert_eq!(analyzer.results().len(), 1);
    assert!(analyzer.has_critical());
    let last = analyzer.diagnostics().last().unwrap();
    assert!(last.critical);
    assert_eq!(last.kind, DiagnosticKind::UnsupportedStatement);
    assert_eq!(last.query.as_deref(), Some("AddUser"));
}

#[test]
fn test_aborting_query_keeps_its_warnings() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    let err = analyzer
        .parse(&[QueryInput::new(
            "CopyUsers",
            "INSERT INTO users (id, name) SELECT id, nmae FROM users",
        )])
        .unwrap_err();

    assert_eq!(
        err,
        FatalError::UnsupportedStatement {
            query: "CopyUsers".to_string(),
            statement: "INSERT".to_string(),
        }
    );
    let kinds: Vec<_> = analyzer
        .diagnostics()
        .iter()
        .map(|d| (d.kind, d.critical))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (DiagnosticKind::ColumnNotFound, false),
            (DiagnosticKind::UnsupportedStatement, true),
        ]
    );
    assert_eq!(analyzer.diagnostics()[0].query.as_deref(), Some("CopyUsers"));
}

#[test]
fn test_out_of_range_parameter_stays_in_its_query() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[
            QueryInput::new("Huge", "SELECT ?18446744073709551615, ?"),
            QueryInput::new("Ids", "SELECT id FROM users"),
        ])
        .unwrap();

    let names: Vec<&str> = analyzer.results().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Huge", "Ids"]);
    assert!(analyzer.results()[0].variables.is_empty());
    assert!(analyzer
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::InvalidParameter && d.query.as_deref() == Some("Huge")));
    assert!(!analyzer.has_critical());
}

#[test]
fn test_parse_error_is_isolated() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[
            QueryInput::new("Broken", "SELEC id FROM users"),
            QueryInput::new("Fine", "SELECT name FROM users"),
        ])
        .unwrap();

    let diagnostics = analyzer.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].critical);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::ParseError);
    assert!(diagnostics[0].message.contains("Broken"));

    assert_eq!(analyzer.results().len(), 1);
    assert_eq!(analyzer.results()[0].name, "Fine");
}

#[test]
fn test_multiple_statements_in_one_query() {
    let mut analyzer = Analyzer::new(&[]);

    analyzer
        .parse(&[QueryInput::new("Two", "SELECT 1; SELECT 2")])
        .unwrap();

    assert!(analyzer.results().is_empty());
    assert_eq!(analyzer.diagnostics().len(), 1);
    assert!(analyzer.diagnostics()[0].critical);
}

#[test]
fn test_results_are_stable_across_runs() {
    let catalog = setup_catalog();
    let queries = vec![
        QueryInput::new("A", "SELECT u.name, p.title FROM users u JOIN posts p ON p.user_id = u.id"),
        QueryInput::new("B", "SELECT count(*) AS n FROM posts WHERE user_id = ?"),
        QueryInput::new("C", "SELECT * FROM missing"),
    ];

    let mut first = Analyzer::new(catalog.tables());
    first.parse(&queries).unwrap();
    let mut second = Analyzer::new(catalog.tables());
    second.parse(&queries).unwrap();

    assert_eq!(first.results(), second.results());
    assert_eq!(first.diagnostics(), second.diagnostics());
    let names: Vec<_> = first.results().iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn test_left_join_makes_right_side_nullable() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[QueryInput::new(
            "UserPosts",
            "SELECT u.name, p.title FROM users u LEFT JOIN posts p ON p.user_id = u.id",
        )])
        .unwrap();

    let query = &analyzer.results()[0];
    assert_eq!(
        query.result_set.columns,
        vec![
            column("name", LogicalColumnType::Text, false),
            column("title", LogicalColumnType::Text, true),
        ]
    );
    let tables: Vec<_> = query
        .referenced_tables
        .iter()
        .map(|t| t.sql_name.as_str())
        .collect();
    assert_eq!(tables, vec!["users", "posts"]);
}

#[test]
fn test_cte_and_derived_table_types() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[QueryInput::new(
            "Stats",
            "WITH admins AS (SELECT id, created_at FROM users WHERE is_admin) \
             SELECT a.created_at, s.total \
             FROM admins a \
             JOIN (SELECT user_id, count(*) AS total FROM posts GROUP BY user_id) s \
               ON s.user_id = a.id",
        )])
        .unwrap();

    assert!(analyzer.diagnostics().is_empty());
    let query = &analyzer.results()[0];
    assert_eq!(
        query.result_set.columns,
        vec![
            column("created_at", LogicalColumnType::DateTime, false),
            column("total", LogicalColumnType::Integer, false),
        ]
    );
    let tables: Vec<_> = query
        .referenced_tables
        .iter()
        .map(|t| t.sql_name.as_str())
        .collect();
    assert_eq!(tables, vec!["users", "posts"]);
}

#[test]
fn test_union_widens_nullability() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[QueryInput::new(
            "Contacts",
            "SELECT name AS label FROM users UNION ALL SELECT email FROM users",
        )])
        .unwrap();

    assert_eq!(
        analyzer.results()[0].result_set.columns,
        vec![column("label", LogicalColumnType::Text, true)]
    );
}

#[test]
fn test_aggregate_and_expression_columns() {
    let catalog = setup_catalog();
    let mut analyzer = Analyzer::new(catalog.tables());

    analyzer
        .parse(&[QueryInput::new(
            "Summary",
            "SELECT user_id, count(*), max(score) AS best, \
             coalesce(body, x'00') AS payload, score IS NULL AS unscored \
             FROM posts GROUP BY user_id",
        )])
        .unwrap();

    assert_eq!(
        analyzer.results()[0].result_set.columns,
        vec![
            column("user_id", LogicalColumnType::Integer, false),
            column("count(*)", LogicalColumnType::Integer, false),
            column("best", LogicalColumnType::Real, true),
            column("payload", LogicalColumnType::Blob, false),
            column("unscored", LogicalColumnType::Boolean, false),
        ]
    );
}
