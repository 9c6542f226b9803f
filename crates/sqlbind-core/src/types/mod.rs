//! Logical column types and their mapping onto resolved engine types

use serde::{Deserialize, Serialize};
use sqlparser::ast::DataType;

/// Column types exposed to schema authors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalColumnType {
    Integer,
    Text,
    Boolean,
    DateTime,
    Blob,
    Real,
}

impl LogicalColumnType {
    pub const ALL: [LogicalColumnType; 6] = [
        LogicalColumnType::Integer,
        LogicalColumnType::Text,
        LogicalColumnType::Boolean,
        LogicalColumnType::DateTime,
        LogicalColumnType::Blob,
        LogicalColumnType::Real,
    ];

    /// Convert a declared type from sqlparser's DataType
    ///
    /// Names the parser does not know follow SQLite's affinity rules, so
    /// `UNSIGNED BIG INT` or `NVARCHAR` still land on a sensible type.
    pub fn from_ast(data_type: &DataType) -> Self {
        match data_type {
            DataType::TinyInt(_)
            | DataType::UnsignedTinyInt(_)
            | DataType::SmallInt(_)
            | DataType::UnsignedSmallInt(_)
            | DataType::Int2(_)
            | DataType::MediumInt(_)
            | DataType::UnsignedMediumInt(_)
            | DataType::Integer(_)
            | DataType::UnsignedInteger(_)
            | DataType::Int(_)
            | DataType::UnsignedInt(_)
            | DataType::Int4(_)
            | DataType::BigInt(_)
            | DataType::UnsignedBigInt(_)
            | DataType::Int8(_) => LogicalColumnType::Integer,

            DataType::Real
            | DataType::Float(_)
            | DataType::Float4
            | DataType::Float8
            | DataType::Double
            | DataType::DoublePrecision
            | DataType::Decimal(_)
            | DataType::Numeric(_) => LogicalColumnType::Real,

            DataType::Boolean | DataType::Bool => LogicalColumnType::Boolean,

            DataType::Date
            | DataType::Time(..)
            | DataType::Timestamp(..)
            | DataType::Datetime(_) => LogicalColumnType::DateTime,

            DataType::Blob(_) | DataType::Bytea | DataType::Binary(_) | DataType::Varbinary(_) => {
                LogicalColumnType::Blob
            }

            DataType::Custom(name, _) => {
                let type_name = name
                    .0
                    .iter()
                    .map(|i| i.value.clone())
                    .collect::<Vec<_>>()
                    .join(".");
                Self::from_type_name(&type_name)
            }

            _ => LogicalColumnType::Text,
        }
    }

    /// Resolve a free-form type name by affinity
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.to_uppercase();
        if upper.contains("INT") {
            LogicalColumnType::Integer
        } else if upper.contains("BOOL") {
            LogicalColumnType::Boolean
        } else if upper.contains("DATE") || upper.contains("TIME") {
            LogicalColumnType::DateTime
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            LogicalColumnType::Text
        } else if upper.contains("BLOB") {
            LogicalColumnType::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            LogicalColumnType::Real
        } else {
            LogicalColumnType::Text
        }
    }

    /// Get a human-readable name for this type
    pub fn display_name(&self) -> &'static str {
        match self {
            LogicalColumnType::Integer => "integer",
            LogicalColumnType::Text => "text",
            LogicalColumnType::Boolean => "boolean",
            LogicalColumnType::DateTime => "datetime",
            LogicalColumnType::Blob => "blob",
            LogicalColumnType::Real => "real",
        }
    }
}

impl std::fmt::Display for LogicalColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Storage-level kind the engine reasons about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    NullType,
    Int,
    Real,
    Text,
    Blob,
}

/// Narrows what an integer really stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticHint {
    IsBoolean,
    IsDateTime,
}

/// Type the engine resolved for an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedType {
    pub basic: BasicKind,
    pub nullable: bool,
    pub hint: Option<SemanticHint>,
}

impl ResolvedType {
    pub const fn new(basic: BasicKind) -> Self {
        Self {
            basic,
            nullable: false,
            hint: None,
        }
    }

    /// Integer carrying truth values, as produced by comparisons
    pub const fn boolean() -> Self {
        Self {
            basic: BasicKind::Int,
            nullable: false,
            hint: Some(SemanticHint::IsBoolean),
        }
    }

    pub const fn null() -> Self {
        Self {
            basic: BasicKind::NullType,
            nullable: true,
            hint: None,
        }
    }

    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub const fn with_hint(mut self, hint: SemanticHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Same storage kind without any semantic hint
    pub const fn without_hint(mut self) -> Self {
        self.hint = None;
        self
    }
}

impl From<LogicalColumnType> for ResolvedType {
    fn from(column_type: LogicalColumnType) -> Self {
        to_resolved(column_type)
    }
}

/// Map a logical column type onto the engine's type system.
///
/// The result is never nullable; callers apply the column's nullability.
pub fn to_resolved(column_type: LogicalColumnType) -> ResolvedType {
    match column_type {
        LogicalColumnType::Integer => ResolvedType::new(BasicKind::Int),
        LogicalColumnType::Text => ResolvedType::new(BasicKind::Text),
        LogicalColumnType::Boolean => {
            ResolvedType::new(BasicKind::Int).with_hint(SemanticHint::IsBoolean)
        }
        LogicalColumnType::DateTime => {
            ResolvedType::new(BasicKind::Int).with_hint(SemanticHint::IsDateTime)
        }
        LogicalColumnType::Blob => ResolvedType::new(BasicKind::Blob),
        LogicalColumnType::Real => ResolvedType::new(BasicKind::Real),
    }
}

/// Map a resolved type back onto a logical column type.
///
/// Expressions the engine could not type fall back to text.
pub fn to_logical(resolved: Option<ResolvedType>) -> LogicalColumnType {
    let Some(resolved) = resolved else {
        return LogicalColumnType::Text;
    };
    match resolved.basic {
        BasicKind::NullType | BasicKind::Text => LogicalColumnType::Text,
        BasicKind::Int => match resolved.hint {
            Some(SemanticHint::IsBoolean) => LogicalColumnType::Boolean,
            Some(SemanticHint::IsDateTime) => LogicalColumnType::DateTime,
            None => LogicalColumnType::Integer,
        },
        BasicKind::Real => LogicalColumnType::Real,
        BasicKind::Blob => LogicalColumnType::Blob,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::SQLiteDialect;
    use sqlparser::parser::Parser;

    fn declared(type_sql: &str) -> LogicalColumnType {
        let sql = format!("CREATE TABLE t (c {type_sql})");
        let statements = Parser::parse_sql(&SQLiteDialect {}, &sql).unwrap();
        match &statements[0] {
            sqlparser::ast::Statement::CreateTable(create) => {
                LogicalColumnType::from_ast(&create.columns[0].data_type)
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn test_round_trip() {
        for column_type in LogicalColumnType::ALL {
            assert_eq!(to_logical(Some(to_resolved(column_type))), column_type);
        }
    }

    #[test]
    fn test_nullability_is_independent_of_mapping() {
        let resolved = to_resolved(LogicalColumnType::Integer).with_nullable(true);
        assert!(resolved.nullable);
        assert_eq!(resolved.basic, BasicKind::Int);
        assert_eq!(to_logical(Some(resolved)), LogicalColumnType::Integer);
        assert!(!to_resolved(LogicalColumnType::Integer).nullable);
    }

    #[test]
    fn test_untyped_falls_back_to_text() {
        assert_eq!(to_logical(None), LogicalColumnType::Text);
        assert_eq!(to_logical(Some(ResolvedType::null())), LogicalColumnType::Text);
    }

    #[test]
    fn test_declared_types() {
        assert_eq!(declared("INTEGER"), LogicalColumnType::Integer);
        assert_eq!(declared("BIGINT"), LogicalColumnType::Integer);
        assert_eq!(declared("BOOLEAN"), LogicalColumnType::Boolean);
        assert_eq!(declared("DATETIME"), LogicalColumnType::DateTime);
        assert_eq!(declared("BLOB"), LogicalColumnType::Blob);
        assert_eq!(declared("REAL"), LogicalColumnType::Real);
        assert_eq!(declared("VARCHAR(20)"), LogicalColumnType::Text);
    }

    #[test]
    fn test_affinity_names() {
        assert_eq!(
            LogicalColumnType::from_type_name("UNSIGNED BIG INT"),
            LogicalColumnType::Integer
        );
        assert_eq!(LogicalColumnType::from_type_name("nclob"), LogicalColumnType::Text);
        assert_eq!(LogicalColumnType::from_type_name("money"), LogicalColumnType::Text);
    }
}
