//! Query file loading
//!
//! A query file holds one or more queries. Each `-- name: <QueryName>`
//! comment starts a new query that runs until the next marker. A file
//! without markers is a single query named after the file stem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use sqlbind_core::QueryInput;

const NAME_MARKER: &str = "name:";

/// Expand file arguments and glob patterns in the given order
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let mut matched: Vec<PathBuf> = glob::glob(pattern)
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid glob pattern '{}'", pattern))?
                .flatten()
                .collect();
            matched.sort();
            files.extend(matched);
        } else {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

pub fn load_file(path: &Path) -> Result<Vec<QueryInput>> {
    let contents = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(split_queries(&contents, &stem))
}

/// Queries of every file in order, with the file each query came from.
///
/// Query names identify queries in the report, so they must be unique
/// across the whole batch.
pub fn collect(
    loaded: impl IntoIterator<Item = (PathBuf, Vec<QueryInput>)>,
) -> Result<(Vec<QueryInput>, HashMap<String, PathBuf>)> {
    let mut inputs = Vec::new();
    let mut sources: HashMap<String, PathBuf> = HashMap::new();
    for (file, queries) in loaded {
        for query in queries {
            if let Some(first) = sources.get(&query.name) {
                miette::bail!(
                    "query '{}' in {} is already defined in {}",
                    query.name,
                    file.display(),
                    first.display()
                );
            }
            sources.insert(query.name.clone(), file.clone());
            inputs.push(query);
        }
    }
    Ok((inputs, sources))
}

/// Split file contents into named queries
pub fn split_queries(contents: &str, default_name: &str) -> Vec<QueryInput> {
    let mut queries = Vec::new();
    let mut name: Option<String> = None;
    let mut body = String::new();

    for line in contents.lines() {
        if let Some(marker) = parse_marker(line) {
            flush(&mut queries, name.take(), &body, default_name);
            body.clear();
            name = Some(marker.to_string());
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }
    flush(&mut queries, name, &body, default_name);

    queries
}

fn flush(queries: &mut Vec<QueryInput>, name: Option<String>, body: &str, default_name: &str) {
    let sql = body.trim().trim_end_matches(';').trim_end();
    if sql.is_empty() || is_comment_only(sql) {
        return;
    }
    let name = name.unwrap_or_else(|| default_name.to_string());
    queries.push(QueryInput::new(name, sql));
}

/// `-- name: GetUser :one` yields `GetUser`
fn parse_marker(line: &str) -> Option<&str> {
    let comment = line.trim_start().strip_prefix("--")?.trim_start();
    let rest = comment.strip_prefix(NAME_MARKER)?;
    rest.split_whitespace().next()
}

fn is_comment_only(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_queries() {
        let contents = "\
-- Users queries
-- name: GetUser :one
SELECT id, name FROM users WHERE id = ?;

-- name: ListUsers
SELECT id FROM users
ORDER BY name;
";
        assert_eq!(
            split_queries(contents, "users"),
            vec![
                QueryInput::new("GetUser", "SELECT id, name FROM users WHERE id = ?"),
                QueryInput::new("ListUsers", "SELECT id FROM users\nORDER BY name"),
            ]
        );
    }

    #[test]
    fn test_file_without_markers() {
        assert_eq!(
            split_queries("SELECT 1;\n", "one"),
            vec![QueryInput::new("one", "SELECT 1")]
        );
    }

    #[test]
    fn test_empty_file() {
        assert!(split_queries("\n-- nothing here\n", "empty").is_empty());
    }

    #[test]
    fn test_collect_records_sources() {
        let (inputs, sources) = collect([
            (
                PathBuf::from("users.sql"),
                split_queries("-- name: GetUser\nSELECT 1;\n", "users"),
            ),
            (PathBuf::from("posts.sql"), split_queries("SELECT 2;\n", "posts")),
        ])
        .unwrap();
        assert_eq!(
            inputs,
            vec![
                QueryInput::new("GetUser", "SELECT 1"),
                QueryInput::new("posts", "SELECT 2"),
            ]
        );
        assert_eq!(sources.get("GetUser"), Some(&PathBuf::from("users.sql")));
        assert_eq!(sources.get("posts"), Some(&PathBuf::from("posts.sql")));
    }

    #[test]
    fn test_duplicate_query_names_are_rejected() {
        let err = collect([
            (
                PathBuf::from("a.sql"),
                split_queries("-- name: GetUser\nSELECT 1;\n", "a"),
            ),
            (
                PathBuf::from("b.sql"),
                split_queries("-- name: GetUser\nSELECT 2;\n", "b"),
            ),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "query 'GetUser' in b.sql is already defined in a.sql"
        );
    }

    #[test]
    fn test_plain_patterns_are_kept() {
        let files = expand_patterns(&["a.sql".to_string(), "b.sql".to_string()]).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.sql"), PathBuf::from("b.sql")]);
    }
}
