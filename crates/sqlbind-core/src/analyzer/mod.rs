//! Query analyzer
//!
//! Drives the engine over a batch of queries and turns each resolved query
//! into an [`AnalyzedQuery`]. Failures stay scoped to the query that caused
//! them, except the conditions in [`FatalError`] which end the run.

mod projection;
mod query;
mod result_set;
mod variables;

use crate::dialect::SqlDialect;
use crate::engine::ResolvedStatement;
use crate::error::{Diagnostic, DiagnosticKind, EngineError, FatalError};
use crate::schema::DomainTable;

pub use projection::{native_table, SchemaProjection};
pub use query::{AnalyzedQuery, FoundVariable, InferredResultSet, QueryInput, ResultColumn};
pub use result_set::infer_result_set;
pub use variables::extract_variables;

/// Outcome of analyzing a single query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// The analyzed query, or the critical diagnostic that prevented it
    pub result: Result<AnalyzedQuery, Diagnostic>,
    /// Non-critical diagnostics raised by the engine
    pub warnings: Vec<Diagnostic>,
}

/// A query that ended the run, with the engine diagnostics raised before it did
#[derive(Debug, Clone, PartialEq)]
pub struct Aborted {
    pub error: FatalError,
    pub warnings: Vec<Diagnostic>,
}

/// Batch analyzer over a fixed set of domain tables
pub struct Analyzer<'a> {
    tables: &'a [DomainTable],
    dialect: SqlDialect,
    results: Vec<AnalyzedQuery>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    pub fn new(tables: &'a [DomainTable]) -> Self {
        Self::with_dialect(tables, SqlDialect::default())
    }

    pub fn with_dialect(tables: &'a [DomainTable], dialect: SqlDialect) -> Self {
        Self {
            tables,
            dialect,
            results: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Analyze every query in input order.
    ///
    /// Results and diagnostics accumulate across calls. A fatal error stops
    /// the batch; its critical diagnostic is recorded before returning.
    pub fn parse(&mut self, queries: &[QueryInput]) -> Result<(), FatalError> {
        let projection = SchemaProjection::project(self.tables, self.dialect);

        for query in queries {
            match analyze_query(&projection, query) {
                Ok(outcome) => {
                    self.diagnostics.extend(outcome.warnings);
                    match outcome.result {
                        Ok(analyzed) => self.results.push(analyzed),
                        Err(diagnostic) => self.diagnostics.push(diagnostic),
                    }
                }
                Err(Aborted { error, warnings }) => {
                    tracing::warn!(query = %query.name, %error, "analysis aborted");
                    self.diagnostics.extend(warnings);
                    self.diagnostics
                        .push(error.to_diagnostic().for_query(&query.name, &query.sql));
                    return Err(error);
                }
            }
        }

        Ok(())
    }

    pub fn results(&self) -> &[AnalyzedQuery] {
        &self.results
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether any critical diagnostic was recorded
    pub fn has_critical(&self) -> bool {
        self.diagnostics.iter().any(|d| d.critical)
    }

    pub fn into_parts(self) -> (Vec<AnalyzedQuery>, Vec<Diagnostic>) {
        (self.results, self.diagnostics)
    }
}

/// Analyze one query against a projected schema
pub fn analyze_query(
    projection: &SchemaProjection<'_>,
    query: &QueryInput,
) -> Result<QueryOutcome, Aborted> {
    tracing::debug!(query = %query.name, "analyzing query");

    let context = match projection.engine().analyze(&query.sql) {
        Ok(context) => context,
        Err(err) => {
            let kind = match err {
                EngineError::Parse(_) => DiagnosticKind::ParseError,
                EngineError::StatementCount(_) => DiagnosticKind::UnsupportedStatement,
            };
            let diagnostic = Diagnostic::critical(
                kind,
                format!("Failed to analyze query '{}': {}", query.name, err),
            )
            .for_query(&query.name, &query.sql);
            return Ok(QueryOutcome {
                result: Err(diagnostic),
                warnings: Vec::new(),
            });
        }
    };

    let warnings: Vec<Diagnostic> = context
        .diagnostics()
        .iter()
        .map(|d| d.clone().for_query(&query.name, context.sql()))
        .collect();
    if !warnings.is_empty() {
        tracing::debug!(query = %query.name, count = warnings.len(), "engine reported diagnostics");
    }

    let resolved = match context.root() {
        ResolvedStatement::Select(resolved) => resolved,
        other => {
            return Err(Aborted {
                error: FatalError::UnsupportedStatement {
                    query: query.name.clone(),
                    statement: other.kind_name().to_string(),
                },
                warnings,
            })
        }
    };

    let (referenced_tables, result_set) =
        match infer_result_set(&context, resolved, projection, &query.name) {
            Ok(inferred) => inferred,
            Err(error) => return Err(Aborted { error, warnings }),
        };
    let variables = extract_variables(&context);

    Ok(QueryOutcome {
        result: Ok(AnalyzedQuery {
            name: query.name.clone(),
            sql: query.sql.clone(),
            variables,
            referenced_tables,
            result_set,
        }),
        warnings,
    })
}
