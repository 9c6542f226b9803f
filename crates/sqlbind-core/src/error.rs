//! Error and diagnostic types

use miette::SourceSpan;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::TableId;

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of source (optional, for miette compatibility)
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            line: 0,
            column: 0,
        }
    }

    /// Create a span from sqlparser's Span
    pub fn from_sqlparser(span: &sqlparser::tokenizer::Span) -> Self {
        let start = span.start;
        let end = span.end;
        let length = if end.line == start.line && end.column > start.column {
            end.column as usize - start.column as usize
        } else {
            1
        };
        Self {
            offset: 0,
            length,
            line: start.line as usize,
            column: start.column as usize,
        }
    }

    /// Whether the parser attached a real location
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.offset.into(), span.length)
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic produced while analyzing a batch of queries.
///
/// `critical` marks diagnostics after which the analysis result of the
/// affected query (or of the whole run) cannot be trusted. Everything else
/// is scoped to a single query and leaves its best-effort result in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub critical: bool,
    pub message: String,
    /// Name of the query the diagnostic belongs to
    pub query: Option<String>,
    /// SQL text of the offending query
    pub sql: Option<String>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            critical: false,
            message: message.into(),
            query: None,
            sql: None,
            span: None,
            help: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    pub fn critical(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            critical: true,
            ..Self::error(kind, message)
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        if span.is_known() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach the originating query
    pub fn for_query(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.query = Some(name.into());
        self.sql = Some(sql.into());
        self
    }

    /// Get the error code string (e.g., "E0001")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// E0001: Table not found
    TableNotFound,
    /// E0002: Column not found
    ColumnNotFound,
    /// E0003: Ambiguous column reference
    AmbiguousColumn,
    /// E0004: Bound parameter with an invalid number
    InvalidParameter,
    /// E0005: Syntax the resolver does not understand
    UnsupportedSyntax,
    /// Parse error
    ParseError,
    /// Statement other than a read query
    UnsupportedStatement,
    /// Internal consistency failure
    InternalError,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "E0001",
            DiagnosticKind::ColumnNotFound => "E0002",
            DiagnosticKind::AmbiguousColumn => "E0003",
            DiagnosticKind::InvalidParameter => "E0004",
            DiagnosticKind::UnsupportedSyntax => "E0005",
            DiagnosticKind::ParseError => "E1000",
            DiagnosticKind::UnsupportedStatement => "E1001",
            DiagnosticKind::InternalError => "E1002",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "table-not-found",
            DiagnosticKind::ColumnNotFound => "column-not-found",
            DiagnosticKind::AmbiguousColumn => "ambiguous-column",
            DiagnosticKind::InvalidParameter => "invalid-parameter",
            DiagnosticKind::UnsupportedSyntax => "unsupported-syntax",
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::UnsupportedStatement => "unsupported-statement",
            DiagnosticKind::InternalError => "internal-error",
        }
    }
}

/// Failure to run the analysis engine on a query at all
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),

    #[error("expected exactly one statement, found {0}")]
    StatementCount(usize),
}

/// Conditions that abort a whole analysis run
#[derive(Debug, Clone, PartialEq, Error, miette::Diagnostic)]
pub enum FatalError {
    #[error("query '{query}' is a {statement} statement, only SELECT queries can be analyzed")]
    #[diagnostic(
        code(sqlbind::unsupported_statement),
        help("move data-modifying statements out of the query batch")
    )]
    UnsupportedStatement { query: String, statement: String },

    #[error("query '{query}' references engine table {table} that has no schema entry")]
    #[diagnostic(code(sqlbind::missing_table_mapping))]
    MissingTableMapping { query: String, table: TableId },
}

impl FatalError {
    /// Critical diagnostic recorded alongside the aborted run
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (kind, query) = match self {
            FatalError::UnsupportedStatement { query, .. } => {
                (DiagnosticKind::UnsupportedStatement, query)
            }
            FatalError::MissingTableMapping { query, .. } => (DiagnosticKind::InternalError, query),
        };
        let mut diag = Diagnostic::critical(kind, self.to_string());
        diag.query = Some(query.clone());
        diag
    }
}
