//! Query inputs and analysis results

use serde::{Deserialize, Serialize};

use crate::schema::DomainTable;
use crate::types::LogicalColumnType;

/// Named SQL query to analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    pub name: String,
    pub sql: String,
}

impl QueryInput {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Bound parameter after deduplication and renumbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundVariable {
    /// 1-based position in the bind list
    pub index: usize,
    /// Parameter name without its `:`, `@` or `$` prefix
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub column_type: LogicalColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: LogicalColumnType,
    pub nullable: bool,
}

/// Shape of the rows a query returns
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InferredResultSet {
    pub name: Option<String>,
    pub columns: Vec<ResultColumn>,
}

/// Everything code generation needs to know about one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedQuery {
    pub name: String,
    pub sql: String,
    pub variables: Vec<FoundVariable>,
    /// Tables the query reads, deduplicated in first-reference order
    pub referenced_tables: Vec<DomainTable>,
    pub result_set: InferredResultSet,
}
