//! sqlbind-core: SQL query type inference and schema binding
//!
//! Given table definitions and a batch of named SELECT queries, this library
//! works out the shape of each query's result rows, the tables it reads and
//! the parameters it binds, without a database connection.

pub mod analyzer;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod schema;
pub mod types;

pub use analyzer::{
    AnalyzedQuery, Analyzer, FoundVariable, InferredResultSet, QueryInput, ResultColumn,
};
pub use dialect::SqlDialect;
pub use error::{Diagnostic, DiagnosticKind, FatalError, Severity, Span};
pub use schema::{Catalog, DomainColumn, DomainTable, SchemaBuilder};
pub use types::LogicalColumnType;
