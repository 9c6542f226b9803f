//! Return types of built-in functions

use crate::types::{BasicKind, ResolvedType, SemanticHint};

/// Whether the function aggregates over a group
pub fn is_aggregate(name: &str) -> bool {
    matches!(
        name,
        "count" | "sum" | "total" | "avg" | "min" | "max" | "group_concat" | "string_agg"
    )
}

/// Resolve the return type of a function call from its argument types.
///
/// `name` must be lowercase. Unknown functions yield `None`.
pub fn return_type(name: &str, args: &[Option<ResolvedType>]) -> Option<ResolvedType> {
    let any_nullable = args.iter().any(|a| a.map_or(true, |t| t.nullable));
    let first = args.first().copied().flatten();

    let ty = match name {
        "count" => ResolvedType::new(BasicKind::Int),
        "total" => ResolvedType::new(BasicKind::Real),
        "avg" => ResolvedType::new(BasicKind::Real).with_nullable(true),
        "sum" => match first {
            Some(t) if t.basic == BasicKind::Real => t.without_hint().with_nullable(true),
            _ => ResolvedType::new(BasicKind::Int).with_nullable(true),
        },
        "group_concat" | "string_agg" => ResolvedType::new(BasicKind::Text).with_nullable(true),

        // Scalar min/max take several arguments; the aggregate form takes one
        "min" | "max" if args.len() == 1 => first?.with_nullable(true),
        "min" | "max" => common_type(args)?.with_nullable(any_nullable),

        "coalesce" | "ifnull" => {
            let ty = common_type(args)?;
            // Non-null as soon as one argument is
            let nullable = args.iter().all(|a| a.map_or(true, |t| t.nullable));
            ty.with_nullable(nullable)
        }
        "nullif" => first?.with_nullable(true),
        "iif" => common_type(&args[1.min(args.len())..])?.with_nullable(any_nullable),

        "lower" | "upper" | "trim" | "ltrim" | "rtrim" | "substr" | "substring" | "replace"
        | "printf" | "format" | "quote" | "hex" | "char" | "concat" | "concat_ws"
        | "soundex" | "typeof" | "json" | "json_extract" | "json_array" | "json_object"
        | "json_type" | "json_quote" | "sqlite_version" => {
            ResolvedType::new(BasicKind::Text).with_nullable(any_nullable)
        }

        "length" | "octet_length" | "instr" | "unicode" | "changes" | "total_changes"
        | "last_insert_rowid" | "random" | "json_array_length" | "sign" => {
            ResolvedType::new(BasicKind::Int).with_nullable(any_nullable)
        }

        "abs" => match first {
            Some(t) => t.without_hint().with_nullable(any_nullable),
            None => ResolvedType::new(BasicKind::Int).with_nullable(true),
        },
        "round" | "ceil" | "ceiling" | "floor" | "trunc" | "sqrt" | "pow" | "power" | "exp"
        | "ln" | "log" | "log10" | "log2" | "pi" | "sin" | "cos" | "tan" | "mod" => {
            ResolvedType::new(BasicKind::Real).with_nullable(any_nullable)
        }

        "date" | "time" | "datetime" | "strftime" | "timediff" => {
            ResolvedType::new(BasicKind::Text).with_nullable(true)
        }
        "julianday" => ResolvedType::new(BasicKind::Real).with_nullable(true),
        "unixepoch" => ResolvedType::new(BasicKind::Int)
            .with_hint(SemanticHint::IsDateTime)
            .with_nullable(true),

        "randomblob" | "zeroblob" | "unhex" => {
            ResolvedType::new(BasicKind::Blob).with_nullable(any_nullable)
        }

        "like" | "glob" => ResolvedType::boolean().with_nullable(any_nullable),

        "row_number" | "rank" | "dense_rank" | "ntile" => ResolvedType::new(BasicKind::Int),
        "percent_rank" | "cume_dist" => ResolvedType::new(BasicKind::Real),
        "lag" | "lead" | "first_value" | "last_value" | "nth_value" => {
            first?.with_nullable(true)
        }

        _ => return None,
    };

    Some(ty)
}

/// Type shared by a list of arguments: the first known one
fn common_type(args: &[Option<ResolvedType>]) -> Option<ResolvedType> {
    args.iter().flatten().copied().find(|t| t.basic != BasicKind::NullType)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(nullable: bool) -> Option<ResolvedType> {
        Some(ResolvedType::new(BasicKind::Int).with_nullable(nullable))
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(
            return_type("count", &[None]),
            Some(ResolvedType::new(BasicKind::Int))
        );
        assert_eq!(
            return_type("max", &[int(false)]),
            Some(ResolvedType::new(BasicKind::Int).with_nullable(true))
        );
        assert_eq!(return_type("avg", &[int(false)]).map(|t| t.basic), Some(BasicKind::Real));
        assert!(is_aggregate("sum"));
        assert!(!is_aggregate("lower"));
    }

    #[test]
    fn test_coalesce_nullability() {
        let text = Some(ResolvedType::new(BasicKind::Text).with_nullable(true));
        let literal = Some(ResolvedType::new(BasicKind::Text));
        let ty = return_type("coalesce", &[text, literal]).unwrap();
        assert_eq!(ty.basic, BasicKind::Text);
        assert!(!ty.nullable);

        assert!(return_type("coalesce", &[None, None]).is_none());
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(return_type("my_udf", &[int(false)]), None);
    }
}
