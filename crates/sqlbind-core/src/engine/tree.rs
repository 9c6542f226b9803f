//! Resolved syntax tree
//!
//! The resolver lowers a parsed statement into this tree. Names are bound to
//! sources, every expression carries an [`ExprId`] under which the analysis
//! context stores its type, and bound parameters know their slot index.

use serde::{Deserialize, Serialize};

use super::TableId;
use crate::dialect::SqlDialect;

/// Identity of an expression node within one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub u32);

/// Root of a resolved statement
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedStatement {
    Select(ResolvedQuery),
    Insert { table: String },
    Update { table: String },
    Delete,
    Other { kind: String },
}

impl ResolvedStatement {
    /// SQL keyword naming the statement kind
    pub fn kind_name(&self) -> &str {
        match self {
            ResolvedStatement::Select(_) => "SELECT",
            ResolvedStatement::Insert { .. } => "INSERT",
            ResolvedStatement::Update { .. } => "UPDATE",
            ResolvedStatement::Delete => "DELETE",
            ResolvedStatement::Other { kind } => kind,
        }
    }

    pub fn as_query(&self) -> Option<&ResolvedQuery> {
        match self {
            ResolvedStatement::Select(query) => Some(query),
            _ => None,
        }
    }
}

/// A query with its WITH clause and trailing clauses
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub ctes: Vec<ResolvedCte>,
    pub body: QueryBody,
    pub order_by: Vec<ResolvedExpr>,
    pub limit: Option<ResolvedExpr>,
    pub offset: Option<ResolvedExpr>,
    /// Output columns in result order
    pub columns: Vec<OutputColumn>,
}

impl ResolvedQuery {
    pub fn output_columns(&self) -> &[OutputColumn] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCte {
    pub name: String,
    pub query: ResolvedQuery,
}

/// Column of a query result; its type is recorded under `id`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub id: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryBody {
    Select(Box<ResolvedSelect>),
    Compound {
        op: String,
        left: Box<QueryBody>,
        right: Box<QueryBody>,
    },
    Values(Vec<Vec<ResolvedExpr>>),
    Nested(Box<ResolvedQuery>),
    /// Body kind the resolver does not lower
    Unsupported { kind: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelect {
    pub projection: Vec<ProjectedColumn>,
    pub sources: Vec<ResolvedSource>,
    pub selection: Option<ResolvedExpr>,
    pub group_by: Vec<ResolvedExpr>,
    pub having: Option<ResolvedExpr>,
}

/// Projection item after wildcard expansion
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedColumn {
    pub name: String,
    pub expr: ResolvedExpr,
}

/// One FROM item or joined relation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    /// Name the source is visible under (alias or table name)
    pub name: String,
    pub kind: SourceKind,
    pub join_condition: Option<ResolvedExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Table(TableId),
    Cte(String),
    Derived(Box<ResolvedQuery>),
    Nested(Vec<ResolvedSource>),
    Function { name: String, args: Vec<ResolvedExpr> },
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExpr {
    pub id: ExprId,
    pub kind: ExprKind,
    /// Operands in textual order
    pub children: Vec<ResolvedExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Column {
        source: Option<String>,
        table: Option<TableId>,
        name: String,
    },
    Literal,
    Variable(VariableRef),
    Operation(String),
    Function(String),
    Subquery(Box<ResolvedQuery>),
}

/// Occurrence of a bound parameter
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub kind: VariableKind,
    /// Slot the parameter binds to, assigned after resolution
    pub resolved_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// `?`
    Anonymous,
    /// `?NNN`, or `$NNN` in PostgreSQL
    Numbered(usize),
    /// `:name`, `@name` or `$name`
    Named { prefix: char, name: String },
}

impl VariableKind {
    /// Classify a placeholder as written in the SQL text.
    ///
    /// `$NNN` is positional only in PostgreSQL; SQLite and MySQL treat it as
    /// a name. Digits too large for `usize` saturate so numbering can reject
    /// them.
    pub fn parse(text: &str, dialect: SqlDialect) -> Self {
        let mut chars = text.chars();
        let Some(prefix) = chars.next() else {
            return VariableKind::Anonymous;
        };
        let rest = chars.as_str();

        if rest.is_empty() {
            return VariableKind::Anonymous;
        }
        let positional = prefix == '?' || (prefix == '$' && dialect == SqlDialect::PostgreSQL);
        if positional && rest.bytes().all(|b| b.is_ascii_digit()) {
            return VariableKind::Numbered(rest.parse().unwrap_or(usize::MAX));
        }
        VariableKind::Named {
            prefix,
            name: rest.to_string(),
        }
    }

    /// Parameter name without its prefix
    pub fn name(&self) -> Option<&str> {
        match self {
            VariableKind::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Spelling used to match repeated named parameters
    pub fn spelling(&self) -> Option<String> {
        match self {
            VariableKind::Named { prefix, name } => Some(format!("{prefix}{name}")),
            _ => None,
        }
    }
}

/// Read-only traversal in textual order.
///
/// Override a method to observe nodes; call the matching `walk_*` function to
/// keep descending.
pub trait Visitor<'t> {
    fn visit_query(&mut self, query: &'t ResolvedQuery) {
        walk_query(self, query);
    }

    fn visit_source(&mut self, source: &'t ResolvedSource) {
        walk_source(self, source);
    }

    fn visit_expr(&mut self, expr: &'t ResolvedExpr) {
        walk_expr(self, expr);
    }
}

pub fn walk_statement<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, stmt: &'t ResolvedStatement) {
    if let ResolvedStatement::Select(query) = stmt {
        visitor.visit_query(query);
    }
}

pub fn walk_query<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, query: &'t ResolvedQuery) {
    for cte in &query.ctes {
        visitor.visit_query(&cte.query);
    }
    walk_body(visitor, &query.body);
    for expr in &query.order_by {
        visitor.visit_expr(expr);
    }
    if let Some(limit) = &query.limit {
        visitor.visit_expr(limit);
    }
    if let Some(offset) = &query.offset {
        visitor.visit_expr(offset);
    }
}

fn walk_body<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, body: &'t QueryBody) {
    match body {
        QueryBody::Select(select) => {
            for column in &select.projection {
                visitor.visit_expr(&column.expr);
            }
            for source in &select.sources {
                visitor.visit_source(source);
            }
            if let Some(selection) = &select.selection {
                visitor.visit_expr(selection);
            }
            for expr in &select.group_by {
                visitor.visit_expr(expr);
            }
            if let Some(having) = &select.having {
                visitor.visit_expr(having);
            }
        }
        QueryBody::Compound { left, right, .. } => {
            walk_body(visitor, left);
            walk_body(visitor, right);
        }
        QueryBody::Values(rows) => {
            for expr in rows.iter().flatten() {
                visitor.visit_expr(expr);
            }
        }
        QueryBody::Nested(query) => visitor.visit_query(query),
        QueryBody::Unsupported { .. } => {}
    }
}

pub fn walk_source<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, source: &'t ResolvedSource) {
    match &source.kind {
        SourceKind::Derived(query) => visitor.visit_query(query),
        SourceKind::Nested(sources) => {
            for inner in sources {
                visitor.visit_source(inner);
            }
        }
        SourceKind::Function { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        SourceKind::Table(_) | SourceKind::Cte(_) | SourceKind::Unresolved(_) => {}
    }
    if let Some(condition) = &source.join_condition {
        visitor.visit_expr(condition);
    }
}

pub fn walk_expr<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, expr: &'t ResolvedExpr) {
    if let ExprKind::Subquery(query) = &expr.kind {
        visitor.visit_query(query);
    }
    for child in &expr.children {
        visitor.visit_expr(child);
    }
}

/// Apply `f` to every expression of the statement, in the same order as
/// [`Visitor`] visits them.
pub fn for_each_expr_mut(stmt: &mut ResolvedStatement, f: &mut dyn FnMut(&mut ResolvedExpr)) {
    if let ResolvedStatement::Select(query) = stmt {
        query_mut(query, f);
    }
}

fn query_mut(query: &mut ResolvedQuery, f: &mut dyn FnMut(&mut ResolvedExpr)) {
    for cte in &mut query.ctes {
        query_mut(&mut cte.query, f);
    }
    body_mut(&mut query.body, f);
    for expr in &mut query.order_by {
        expr_mut(expr, f);
    }
    if let Some(limit) = &mut query.limit {
        expr_mut(limit, f);
    }
    if let Some(offset) = &mut query.offset {
        expr_mut(offset, f);
    }
}

fn body_mut(body: &mut QueryBody, f: &mut dyn FnMut(&mut ResolvedExpr)) {
    match body {
        QueryBody::Select(select) => {
            for column in &mut select.projection {
                expr_mut(&mut column.expr, f);
            }
            for source in &mut select.sources {
                source_mut(source, f);
            }
            if let Some(selection) = &mut select.selection {
                expr_mut(selection, f);
            }
            for expr in &mut select.group_by {
                expr_mut(expr, f);
            }
            if let Some(having) = &mut select.having {
                expr_mut(having, f);
            }
        }
        QueryBody::Compound { left, right, .. } => {
            body_mut(left, f);
            body_mut(right, f);
        }
        QueryBody::Values(rows) => {
            for expr in rows.iter_mut().flatten() {
                expr_mut(expr, f);
            }
        }
        QueryBody::Nested(query) => query_mut(query, f),
        QueryBody::Unsupported { .. } => {}
    }
}

fn source_mut(source: &mut ResolvedSource, f: &mut dyn FnMut(&mut ResolvedExpr)) {
    match &mut source.kind {
        SourceKind::Derived(query) => query_mut(query, f),
        SourceKind::Nested(sources) => {
            for inner in sources {
                source_mut(inner, f);
            }
        }
        SourceKind::Function { args, .. } => {
            for arg in args {
                expr_mut(arg, f);
            }
        }
        SourceKind::Table(_) | SourceKind::Cte(_) | SourceKind::Unresolved(_) => {}
    }
    if let Some(condition) = &mut source.join_condition {
        expr_mut(condition, f);
    }
}

fn expr_mut(expr: &mut ResolvedExpr, f: &mut dyn FnMut(&mut ResolvedExpr)) {
    f(expr);
    if let ExprKind::Subquery(query) = &mut expr.kind {
        query_mut(query, f);
    }
    for child in &mut expr.children {
        expr_mut(child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_kinds() {
        let sqlite = SqlDialect::SQLite;
        assert_eq!(VariableKind::parse("?", sqlite), VariableKind::Anonymous);
        assert_eq!(VariableKind::parse("?3", sqlite), VariableKind::Numbered(3));
        assert_eq!(
            VariableKind::parse(":id", sqlite),
            VariableKind::Named {
                prefix: ':',
                name: "id".to_string()
            }
        );
        assert_eq!(VariableKind::parse("$name", sqlite).name(), Some("name"));
        assert_eq!(
            VariableKind::parse("@user", sqlite).spelling().as_deref(),
            Some("@user")
        );
    }

    #[test]
    fn test_dollar_digits_depend_on_dialect() {
        assert_eq!(
            VariableKind::parse("$12", SqlDialect::PostgreSQL),
            VariableKind::Numbered(12)
        );
        assert_eq!(
            VariableKind::parse("$12", SqlDialect::SQLite),
            VariableKind::Named {
                prefix: '$',
                name: "12".to_string()
            }
        );
    }

    #[test]
    fn test_oversized_index_saturates() {
        assert_eq!(
            VariableKind::parse("?99999999999999999999999", SqlDialect::SQLite),
            VariableKind::Numbered(usize::MAX)
        );
    }
}
