//! SQL dialect selection

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use std::str::FromStr;

/// Dialect queries and schema files are written in.
///
/// Parameter numbering always follows SQLite's rules; the dialect decides
/// how the text is tokenized and which implicit columns tables carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    SQLite,
    PostgreSQL,
    MySQL,
}

impl SqlDialect {
    pub const ALL: [SqlDialect; 3] = [SqlDialect::SQLite, SqlDialect::PostgreSQL, SqlDialect::MySQL];

    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::SQLite => Box::new(SQLiteDialect {}),
            SqlDialect::PostgreSQL => Box::new(PostgreSqlDialect {}),
            SqlDialect::MySQL => Box::new(MySqlDialect {}),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::SQLite => "sqlite",
            SqlDialect::PostgreSQL => "postgresql",
            SqlDialect::MySQL => "mysql",
        }
    }

    /// Whether ordinary tables answer to `rowid`, `oid` and `_rowid_`
    pub fn has_rowid(&self) -> bool {
        matches!(self, SqlDialect::SQLite)
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(SqlDialect::SQLite),
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::PostgreSQL),
            "mysql" | "mysql8" => Ok(SqlDialect::MySQL),
            _ => {
                let names: Vec<&str> = Self::ALL.iter().map(|d| d.name()).collect();
                Err(format!(
                    "Unknown dialect: '{}'. Supported dialects: {}.",
                    s,
                    names.join(", ")
                ))
            }
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dialect_names() {
        assert_eq!("sqlite".parse::<SqlDialect>(), Ok(SqlDialect::SQLite));
        assert_eq!("PG".parse::<SqlDialect>(), Ok(SqlDialect::PostgreSQL));
        assert_eq!(
            "oracle".parse::<SqlDialect>(),
            Err("Unknown dialect: 'oracle'. Supported dialects: sqlite, postgresql, mysql.".to_string())
        );
    }

    #[test]
    fn test_names_round_trip() {
        for dialect in SqlDialect::ALL {
            assert_eq!(dialect.to_string().parse::<SqlDialect>(), Ok(dialect));
        }
    }

    #[test]
    fn test_only_sqlite_has_rowid() {
        assert!(SqlDialect::SQLite.has_rowid());
        assert!(!SqlDialect::PostgreSQL.has_rowid());
        assert!(!SqlDialect::MySQL.has_rowid());
    }
}
