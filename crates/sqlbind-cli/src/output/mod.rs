//! Output formatting

use std::collections::HashMap;
use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use sqlbind_core::{AnalyzedQuery, Diagnostic, Severity};

use crate::args::OutputFormat;

/// Everything one `analyze` run prints
pub struct Report<'a> {
    pub results: &'a [AnalyzedQuery],
    pub diagnostics: &'a [Diagnostic],
    /// File each query was loaded from, by query name
    pub sources: &'a HashMap<String, PathBuf>,
}

impl Report<'_> {
    fn file_of(&self, diag: &Diagnostic) -> Option<String> {
        diag.query
            .as_ref()
            .and_then(|q| self.sources.get(q))
            .map(|p| p.display().to_string())
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn print_report(&self, report: &Report<'_>) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if !self.quiet {
                    for query in report.results {
                        print!("{}", render_query(query));
                    }
                }
                self.print_human(report);
                Ok(())
            }
            OutputFormat::Json => print_json(report),
            OutputFormat::Sarif => print_sarif(report),
        }
    }

    /// Schema diagnostics have no query, only a file
    pub fn print_schema_diagnostics(&self, diagnostics: &[Diagnostic], file: &str) {
        for diag in diagnostics {
            eprint!("{}", render_diagnostic(diag, Some(file)));
        }
    }

    fn print_human(&self, report: &Report<'_>) {
        for diag in report.diagnostics {
            if self.quiet && diag.severity == Severity::Warning {
                continue;
            }
            eprint!("{}", render_diagnostic(diag, report.file_of(diag).as_deref()));
        }
    }
}

fn render_query(query: &AnalyzedQuery) -> String {
    let mut out = format!("\x1b[1m{}\x1b[0m\n", query.name);

    if !query.variables.is_empty() {
        out.push_str("  params:\n");
        for var in &query.variables {
            match &var.name {
                Some(name) => {
                    out.push_str(&format!("    ${} {}: {}\n", var.index, name, var.column_type))
                }
                None => out.push_str(&format!("    ${}: {}\n", var.index, var.column_type)),
            }
        }
    }

    out.push_str("  columns:\n");
    for column in &query.result_set.columns {
        let nullable = if column.nullable { "" } else { " not null" };
        out.push_str(&format!(
            "    {} {}{}\n",
            column.name, column.column_type, nullable
        ));
    }

    if !query.referenced_tables.is_empty() {
        let tables: Vec<&str> = query
            .referenced_tables
            .iter()
            .map(|t| t.sql_name.as_str())
            .collect();
        out.push_str(&format!("  tables: {}\n", tables.join(", ")));
    }
    out.push('\n');
    out
}

fn render_diagnostic(diag: &Diagnostic, file: Option<&str>) -> String {
    let severity_str = match (diag.severity, diag.critical) {
        (_, true) => "\x1b[31mcritical\x1b[0m",
        (Severity::Error, false) => "\x1b[31merror\x1b[0m",
        (Severity::Warning, false) => "\x1b[33mwarning\x1b[0m",
    };
    let mut out = format!("{}[{}]: {}\n", severity_str, diag.code(), diag.message);

    let location = match (file, &diag.query) {
        (Some(file), Some(query)) => Some(format!("{} ({})", file, query)),
        (Some(file), None) => Some(file.to_string()),
        (None, Some(query)) => Some(query.clone()),
        (None, None) => None,
    };

    match (&diag.span, location) {
        (Some(span), Some(location)) => {
            out.push_str(&format!(
                "  --> {}:{}:{}\n",
                location, span.line, span.column
            ));
            if let Some(source_line) = diag
                .sql
                .as_deref()
                .and_then(|sql| sql.lines().nth(span.line.saturating_sub(1)))
            {
                out.push_str("   |\n");
                out.push_str(&format!("{:>3} | {}\n", span.line, source_line));
                let padding = " ".repeat(span.column.saturating_sub(1));
                let room = source_line.len().saturating_sub(span.column) + 1;
                let underline = "^".repeat(span.length.min(room).max(1));
                out.push_str(&format!("   | {}{}\n", padding, underline));
            }
        }
        (None, Some(location)) => out.push_str(&format!("  --> {}\n", location)),
        _ => {}
    }

    if let Some(help) = &diag.help {
        out.push_str(&format!("   = help: {}\n", help));
    }
    out.push('\n');
    out
}

fn diagnostic_json(diag: &Diagnostic, file: Option<String>) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(diag).into_diagnostic()?;
    if let Some(object) = value.as_object_mut() {
        object.insert("code".to_string(), diag.code().into());
        object.insert("file".to_string(), file.into());
    }
    Ok(value)
}

fn print_json(report: &Report<'_>) -> Result<()> {
    let diagnostics = report
        .diagnostics
        .iter()
        .map(|d| diagnostic_json(d, report.file_of(d)))
        .collect::<Result<Vec<_>>>()?;
    let output = serde_json::json!({
        "queries": report.results,
        "diagnostics": diagnostics,
    });
    println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    Ok(())
}

fn print_sarif(report: &Report<'_>) -> Result<()> {
    let results: Vec<serde_json::Value> = report
        .diagnostics
        .iter()
        .map(|d| {
            let mut location = serde_json::json!({
                "logicalLocations": [{
                    "name": d.query,
                    "kind": "function"
                }]
            });
            if let Some(file) = report.file_of(d) {
                location["physicalLocation"] = serde_json::json!({
                    "artifactLocation": { "uri": file }
                });
            }
            serde_json::json!({
                "ruleId": d.code(),
                "level": match d.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                },
                "message": {
                    "text": d.message
                },
                "locations": [location]
            })
        })
        .collect();

    let sarif = serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "sqlbind",
                    "version": env!("CARGO_PKG_VERSION")
                }
            },
            "results": results
        }]
    });

    println!("{}", serde_json::to_string_pretty(&sarif).into_diagnostic()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbind_core::{
        DiagnosticKind, FoundVariable, InferredResultSet, LogicalColumnType, ResultColumn, Span,
    };

    #[test]
    fn test_render_query() {
        let query = AnalyzedQuery {
            name: "GetUser".to_string(),
            sql: "SELECT id FROM users WHERE id = :id".to_string(),
            variables: vec![FoundVariable {
                index: 1,
                name: Some("id".to_string()),
                column_type: LogicalColumnType::Integer,
            }],
            referenced_tables: Vec::new(),
            result_set: InferredResultSet {
                name: None,
                columns: vec![ResultColumn {
                    name: "id".to_string(),
                    column_type: LogicalColumnType::Integer,
                    nullable: false,
                }],
            },
        };

        assert_eq!(
            render_query(&query),
            "\x1b[1mGetUser\x1b[0m\n  params:\n    $1 id: integer\n  columns:\n    id integer not null\n\n"
        );
    }

    #[test]
    fn test_render_diagnostic_with_span() {
        let diag = Diagnostic::error(DiagnosticKind::ColumnNotFound, "Column 'nme' not found")
            .with_span(Span {
                offset: 0,
                length: 3,
                line: 1,
                column: 8,
            })
            .with_help("Did you mean 'name'?")
            .for_query("GetUser", "SELECT nme FROM users");

        let rendered = render_diagnostic(&diag, Some("queries/users.sql"));
        assert!(rendered.contains("error\x1b[0m[E0002]: Column 'nme' not found"));
        assert!(rendered.contains("--> queries/users.sql (GetUser):1:8"));
        assert!(rendered.contains("  1 | SELECT nme FROM users\n   |        ^^^\n"));
        assert!(rendered.contains("= help: Did you mean 'name'?"));
    }

    #[test]
    fn test_json_diagnostic_carries_code() {
        let diag = Diagnostic::warning(DiagnosticKind::TableNotFound, "Table 'x' not found");
        let value = diagnostic_json(&diag, Some("q.sql".to_string())).unwrap();
        assert_eq!(value["code"], "E0001");
        assert_eq!(value["file"], "q.sql");
        assert_eq!(value["severity"], "warning");
    }
}
