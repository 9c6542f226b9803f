//! Configuration file handling

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;

use crate::args::OutputFormat;

pub const CONFIG_FILE_NAME: &str = "sqlbind.toml";

/// Contents of sqlbind.toml
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema file paths
    #[serde(default)]
    pub schema: Vec<String>,

    /// Directory scanned for `*.sql` schema files
    pub schema_dir: Option<String>,

    /// Query files or glob patterns
    #[serde(default)]
    pub files: Vec<String>,

    /// SQL dialect name
    pub dialect: Option<String>,

    pub format: Option<OutputFormat>,

    /// Diagnostic codes to suppress (e.g., ["E0002"])
    #[serde(default)]
    pub disable: Vec<String>,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub schema: &'a [PathBuf],
    pub schema_dir: Option<&'a Path>,
    pub files: &'a [PathBuf],
    pub dialect: Option<&'a str>,
    pub format: Option<OutputFormat>,
    pub disable: &'a [String],
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&contents).wrap_err_with(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Load sqlbind.toml from the current directory or the nearest parent
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                tracing::debug!(path = %config_path.display(), "using config file");
                return Ok(Some(Self::from_file(&config_path)?));
            }
            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    pub fn merge_with_args(mut self, overrides: Overrides<'_>) -> Self {
        if !overrides.schema.is_empty() {
            self.schema = overrides
                .schema
                .iter()
                .map(|p| p.display().to_string())
                .collect();
        }

        if let Some(dir) = overrides.schema_dir {
            self.schema_dir = Some(dir.display().to_string());
        }

        if !overrides.files.is_empty() {
            self.files = overrides
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect();
        }

        if let Some(dialect) = overrides.dialect {
            self.dialect = Some(dialect.to_string());
        }

        if overrides.format.is_some() {
            self.format = overrides.format;
        }

        if !overrides.disable.is_empty() {
            self.disable = overrides.disable.to_vec();
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml(
            r#"
            schema = ["db/schema.sql"]
            files = ["queries/*.sql"]
            dialect = "sqlite"
            format = "json"
            disable = ["E0002"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                schema: vec!["db/schema.sql".to_string()],
                schema_dir: None,
                files: vec!["queries/*.sql".to_string()],
                dialect: Some("sqlite".to_string()),
                format: Some(OutputFormat::Json),
                disable: vec!["E0002".to_string()],
            }
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_toml("schemas = []").is_err());
    }

    #[test]
    fn test_arguments_override_file() {
        let config = Config::from_toml(
            r#"
            schema = ["a.sql"]
            files = ["q.sql"]
            format = "sarif"
            "#,
        )
        .unwrap();

        let schema = vec![PathBuf::from("b.sql")];
        let merged = config.merge_with_args(Overrides {
            schema: &schema,
            format: Some(OutputFormat::Human),
            ..Default::default()
        });

        assert_eq!(merged.schema, vec!["b.sql".to_string()]);
        assert_eq!(merged.files, vec!["q.sql".to_string()]);
        assert_eq!(merged.format, Some(OutputFormat::Human));
        assert_eq!(merged.dialect, None);
    }
}
