//! sqlbind CLI - infer result columns and parameters of SQL queries

mod args;
mod config;
mod output;
mod queries;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use sqlbind_core::{Analyzer, Catalog, SchemaBuilder, Severity, SqlDialect};

use crate::args::{Args, Command};
use crate::config::{Config, Overrides};
use crate::output::{OutputFormatter, Report};

/// How a run ended
enum Outcome {
    Clean,
    Diagnostics,
    Aborted,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(args.log_directive().into()),
        )
        .init();

    match run(args) {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Diagnostics) => ExitCode::from(1),
        Ok(Outcome::Aborted) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn parse_dialect(name: &str) -> Result<SqlDialect> {
    name.parse().map_err(|e: String| miette::miette!(e))
}

fn run(args: Args) -> Result<Outcome> {
    let quiet = args.quiet;
    match args.command {
        Command::Analyze {
            files,
            schema,
            schema_dir,
            dialect,
            format,
            config: config_path,
            disable,
        } => {
            let config = match config_path {
                Some(path) => Config::from_file(&path)?,
                None => Config::find_and_load()?.unwrap_or_default(),
            };
            let config = config.merge_with_args(Overrides {
                schema: &schema,
                schema_dir: schema_dir.as_deref(),
                files: &files,
                dialect: dialect.as_deref(),
                format,
                disable: &disable,
            });

            let dialect = match &config.dialect {
                Some(name) => parse_dialect(name)?,
                None => SqlDialect::default(),
            };
            let formatter = OutputFormatter::new(config.format.unwrap_or_default(), quiet);

            let schema_files = schema_files(&config)?;
            if schema_files.is_empty() {
                miette::bail!(
                    "No schema files specified. Use --schema, --schema-dir, or configure in sqlbind.toml"
                );
            }
            let Some(catalog) = build_catalog(&schema_files, dialect, &formatter)? else {
                return Ok(Outcome::Diagnostics);
            };

            let query_files = queries::expand_patterns(&config.files)?;
            if query_files.is_empty() {
                miette::bail!(
                    "No query files specified. Use positional arguments or configure in sqlbind.toml"
                );
            }

            let loaded = query_files
                .iter()
                .map(|file| Ok((file.clone(), queries::load_file(file)?)))
                .collect::<Result<Vec<_>>>()?;
            let (inputs, sources) = queries::collect(loaded)?;
            tracing::info!(
                queries = inputs.len(),
                files = query_files.len(),
                tables = catalog.tables().len(),
                "analyzing"
            );

            let mut analyzer = Analyzer::with_dialect(catalog.tables(), dialect);
            let fatal = analyzer.parse(&inputs).err();
            let (results, diagnostics) = analyzer.into_parts();

            let disabled: HashSet<&str> = config.disable.iter().map(String::as_str).collect();
            let diagnostics: Vec<_> = diagnostics
                .into_iter()
                .filter(|d| d.critical || !disabled.contains(d.code()))
                .collect();

            formatter.print_report(&Report {
                results: &results,
                diagnostics: &diagnostics,
                sources: &sources,
            })?;

            if let Some(fatal) = fatal {
                eprintln!("{:?}", miette::Report::new(fatal));
                return Ok(Outcome::Aborted);
            }

            let errors = diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count();
            let warnings = diagnostics.len() - errors;
            if !quiet {
                if errors > 0 || warnings > 0 {
                    eprintln!(
                        "Found {} error(s), {} warning(s) in {} queries",
                        errors,
                        warnings,
                        inputs.len()
                    );
                } else {
                    eprintln!("Analyzed {} queries", results.len());
                }
            }

            Ok(if errors > 0 {
                Outcome::Diagnostics
            } else {
                Outcome::Clean
            })
        }

        Command::Schema { files, dialect } => {
            let dialect = parse_dialect(&dialect)?;
            let formatter = OutputFormatter::new(Default::default(), quiet);
            let Some(catalog) = build_catalog(&files, dialect, &formatter)? else {
                return Ok(Outcome::Diagnostics);
            };

            println!("Schema Information:");
            println!("==================");
            for table in catalog.tables() {
                println!("\nTable: {}", table.sql_name);
                for column in table.columns.values() {
                    let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
                    println!(
                        "  - {} {} {}",
                        column.name,
                        column.column_type.display_name(),
                        nullable
                    );
                }
            }

            Ok(Outcome::Clean)
        }

        Command::Parse { file, dialect } => {
            use sqlparser::parser::Parser;

            let content = fs::read_to_string(&file)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read {}", file.display()))?;
            let dialect = parse_dialect(&dialect)?.parser_dialect();
            match Parser::parse_sql(dialect.as_ref(), &content) {
                Ok(statements) => {
                    for (i, stmt) in statements.iter().enumerate() {
                        println!("Statement {}:", i + 1);
                        println!("{:#?}", stmt);
                        println!();
                    }
                    Ok(Outcome::Clean)
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    Ok(Outcome::Diagnostics)
                }
            }
        }
    }
}

/// Explicit schema files first, then `*.sql` under the schema directory
fn schema_files(config: &Config) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = config.schema.iter().map(PathBuf::from).collect();

    if let Some(dir) = &config.schema_dir {
        let pattern = format!("{}/**/*.sql", dir);
        let mut found: Vec<PathBuf> = glob::glob(&pattern).into_diagnostic()?.flatten().collect();
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

/// Build the catalog; `None` when a schema file failed to parse
fn build_catalog(
    files: &[PathBuf],
    dialect: SqlDialect,
    formatter: &OutputFormatter,
) -> Result<Option<Catalog>> {
    let mut builder = SchemaBuilder::with_dialect(dialect);
    for file in files {
        let content = fs::read_to_string(file)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read schema {}", file.display()))?;
        if let Err(diags) = builder.parse(&content) {
            formatter.print_schema_diagnostics(&diags, &file.display().to_string());
            return Ok(None);
        }
    }

    let (catalog, warnings) = builder.build();
    for warning in &warnings {
        tracing::warn!(code = warning.code(), "{}", warning.message);
    }
    Ok(Some(catalog))
}
