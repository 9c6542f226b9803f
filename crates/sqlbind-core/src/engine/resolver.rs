//! Name and type resolver
//!
//! Lowers a parsed statement into the resolved tree. Table and column
//! references are bound against registered tables, CTEs, derived tables and
//! enclosing query scopes; every expression is annotated with the type it
//! produces where one can be determined.

use sqlparser::ast::{
    visit_expressions, BinaryOperator, Cte, Expr, FunctionArg, FunctionArgExpr,
    FunctionArguments, GroupByExpr, Ident, JoinConstraint, JoinOperator, ObjectName, Query,
    Select, SelectItem, SetExpr, Statement, TableAlias, TableFactor, TableWithJoins, UnaryOperator,
    Value, WindowType,
};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::ops::Range;

use super::functions;
use super::tree::{
    ExprId, ExprKind, OutputColumn, ProjectedColumn, QueryBody, ResolvedCte, ResolvedExpr,
    ResolvedQuery, ResolvedSelect, ResolvedSource, ResolvedStatement, SourceKind, VariableKind,
    VariableRef,
};
use super::{Engine, TableId};
use crate::error::{Diagnostic, DiagnosticKind, Span};
use crate::types::{to_resolved, BasicKind, LogicalColumnType, ResolvedType};

/// Everything the resolver learned about one statement
pub(crate) struct Resolution {
    pub(crate) root: ResolvedStatement,
    pub(crate) types: HashMap<ExprId, ResolvedType>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// Column visible through a scope source
#[derive(Debug, Clone)]
struct SourceColumn {
    name: String,
    ty: Option<ResolvedType>,
}

/// Relation visible in a FROM scope
#[derive(Debug, Clone)]
struct ScopeSource {
    /// Alias or table name
    name: String,
    table: Option<TableId>,
    /// `None` when the columns cannot be known (unresolved table, table function)
    columns: Option<Vec<SourceColumn>>,
    /// Right side of an outer join
    nullable: bool,
    /// Columns folded into the left side by USING or NATURAL
    merged: Vec<String>,
    /// Exposes the implicit rowid aliases
    rowid: bool,
}

struct ColumnMatch {
    source: String,
    table: Option<TableId>,
    name: String,
    ty: Option<ResolvedType>,
}

enum Lookup {
    Found(ColumnMatch),
    Missing { suggestion: Option<String> },
}

impl ScopeSource {
    fn new(name: String, table: Option<TableId>, columns: Option<Vec<SourceColumn>>) -> Self {
        Self {
            name,
            table,
            columns,
            nullable: false,
            merged: Vec::new(),
            rowid: false,
        }
    }

    fn adjust(&self, ty: Option<ResolvedType>) -> Option<ResolvedType> {
        ty.map(|t| if self.nullable { t.with_nullable(true) } else { t })
    }

    fn resolve(&self, name: &str) -> Lookup {
        let Some(columns) = &self.columns else {
            return Lookup::Found(ColumnMatch {
                source: self.name.clone(),
                table: self.table,
                name: name.to_string(),
                ty: None,
            });
        };

        match columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            Some(column) => Lookup::Found(ColumnMatch {
                source: self.name.clone(),
                table: self.table,
                name: column.name.clone(),
                ty: self.adjust(column.ty),
            }),
            None if self.rowid && is_rowid(name) => Lookup::Found(ColumnMatch {
                source: self.name.clone(),
                table: self.table,
                name: name.to_string(),
                ty: self.adjust(Some(ResolvedType::new(BasicKind::Int))),
            }),
            None => Lookup::Missing {
                suggestion: find_similar_column(columns.iter().map(|c| c.name.as_str()), name),
            },
        }
    }

    /// Whether an unqualified reference to `name` binds to this source
    fn has_column(&self, name: &str) -> bool {
        self.columns
            .as_ref()
            .is_some_and(|cols| cols.iter().any(|c| c.name.eq_ignore_ascii_case(name)))
            && !self.merged.iter().any(|m| m.eq_ignore_ascii_case(name))
    }
}

/// Statement resolver for one analysis
pub(crate) struct Resolver<'e> {
    engine: &'e Engine,
    /// FROM scopes, innermost last
    scopes: Vec<Vec<ScopeSource>>,
    /// CTEs in scope (lowercase name -> columns)
    ctes: HashMap<String, Vec<SourceColumn>>,
    /// Projection aliases visible in ORDER BY
    select_aliases: Vec<(String, ExprId)>,
    types: HashMap<ExprId, ResolvedType>,
    diagnostics: Vec<Diagnostic>,
    next_id: u32,
}

impl<'e> Resolver<'e> {
    pub(crate) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            scopes: Vec::new(),
            ctes: HashMap::new(),
            select_aliases: Vec::new(),
            types: HashMap::new(),
            diagnostics: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn resolve(mut self, stmt: &Statement) -> Resolution {
        let root = match stmt {
            Statement::Query(query) => ResolvedStatement::Select(self.query(query)),
            Statement::Insert(insert) => {
                // Only the source query is bound, for its diagnostics
                if let Some(source) = &insert.source {
                    self.query(source);
                }
                ResolvedStatement::Insert {
                    table: insert.table_name.to_string(),
                }
            }
            Statement::Update { table, .. } => ResolvedStatement::Update {
                table: table.relation.to_string(),
            },
            Statement::Delete(_) => ResolvedStatement::Delete,
            other => ResolvedStatement::Other {
                kind: statement_keyword(other),
            },
        };

        Resolution {
            root,
            types: self.types,
            diagnostics: self.diagnostics,
        }
    }

    // ---- nodes and types ----

    fn node(
        &mut self,
        kind: ExprKind,
        children: Vec<ResolvedExpr>,
        ty: Option<ResolvedType>,
    ) -> ResolvedExpr {
        let id = self.fresh(ty);
        ResolvedExpr { id, kind, children }
    }

    /// Allocate an expression id, recording its type when known
    fn fresh(&mut self, ty: Option<ResolvedType>) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        if let Some(ty) = ty {
            self.types.insert(id, ty);
        }
        id
    }

    fn type_of(&self, expr: &ResolvedExpr) -> Option<ResolvedType> {
        self.types.get(&expr.id).copied()
    }

    /// Unknown types count as nullable
    fn is_nullable(&self, expr: &ResolvedExpr) -> bool {
        self.type_of(expr).map_or(true, |t| t.nullable)
    }

    /// Give an untyped parameter the type its context implies
    fn backfill(&mut self, expr: &ResolvedExpr, ty: Option<ResolvedType>) {
        if let (ExprKind::Variable(_), Some(ty)) = (&expr.kind, ty) {
            self.types.entry(expr.id).or_insert(ty);
        }
    }

    fn boolean(&mut self, children: Vec<ResolvedExpr>, op: String, nullable: bool) -> ResolvedExpr {
        self.node(
            ExprKind::Operation(op),
            children,
            Some(ResolvedType::boolean().with_nullable(nullable)),
        )
    }

    fn error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // ---- queries ----

    fn query(&mut self, query: &Query) -> ResolvedQuery {
        let saved_ctes = self.ctes.clone();

        let mut ctes = Vec::new();
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                ctes.push(self.cte(cte, with.recursive));
            }
        }

        let order_exprs: Vec<&Expr> = query
            .order_by
            .as_ref()
            .map(|o| o.exprs.iter().map(|e| &e.expr).collect())
            .unwrap_or_default();

        let (body, columns, order_by) = match query.body.as_ref() {
            SetExpr::Select(select) => {
                let (select, columns, order_by) = self.select(select, &order_exprs);
                (QueryBody::Select(Box::new(select)), columns, order_by)
            }
            body => {
                let (body, columns) = self.set_expr(body);
                let order_by = self.order_by_outputs(&columns, &order_exprs);
                (body, columns, order_by)
            }
        };

        let int = Some(ResolvedType::new(BasicKind::Int));
        let limit = query.limit.as_ref().map(|e| self.expr(e, int));
        let offset = query.offset.as_ref().map(|o| self.expr(&o.value, int));

        self.ctes = saved_ctes;

        ResolvedQuery {
            ctes,
            body,
            order_by,
            limit,
            offset,
            columns,
        }
    }

    fn cte(&mut self, cte: &Cte, recursive: bool) -> ResolvedCte {
        let name = cte.alias.name.value.clone();
        let declared = alias_columns(Some(&cte.alias));

        if recursive {
            // Pre-register so the recursive member can reference itself
            let names = if declared.is_empty() {
                infer_column_names(&cte.query.body)
            } else {
                declared.clone()
            };
            self.ctes.insert(
                name.to_lowercase(),
                names
                    .into_iter()
                    .map(|name| SourceColumn { name, ty: None })
                    .collect(),
            );
        }

        // CTE bodies do not see the FROM scope of the statement declaring them
        let saved_scopes = std::mem::take(&mut self.scopes);
        let query = self.query(&cte.query);
        self.scopes = saved_scopes;

        let columns = self.source_columns(&query.columns, &declared);
        self.ctes.insert(name.to_lowercase(), columns);

        ResolvedCte { name, query }
    }

    fn set_expr(&mut self, body: &SetExpr) -> (QueryBody, Vec<OutputColumn>) {
        match body {
            SetExpr::Select(select) => {
                let (select, columns, _) = self.select(select, &[]);
                (QueryBody::Select(Box::new(select)), columns)
            }
            SetExpr::Query(query) => {
                let query = self.query(query);
                let columns = query.columns.clone();
                (QueryBody::Nested(Box::new(query)), columns)
            }
            SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right,
            } => {
                let (left, left_columns) = self.set_expr(left);
                let (right, right_columns) = self.set_expr(right);

                let mut columns = Vec::with_capacity(left_columns.len());
                for (idx, column) in left_columns.iter().enumerate() {
                    let left_ty = self.types.get(&column.id).copied();
                    let right_ty = right_columns
                        .get(idx)
                        .and_then(|c| self.types.get(&c.id).copied());
                    let id = self.fresh(widen(left_ty, right_ty));
                    columns.push(OutputColumn {
                        name: column.name.clone(),
                        id,
                    });
                }

                let op = format!("{} {}", op, set_quantifier).trim_end().to_string();
                let body = QueryBody::Compound {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                (body, columns)
            }
            SetExpr::Values(values) => {
                let mut rows = Vec::with_capacity(values.rows.len());
                for row in &values.rows {
                    let mut resolved = Vec::with_capacity(row.len());
                    for expr in row {
                        resolved.push(self.expr(expr, None));
                    }
                    rows.push(resolved);
                }

                let width = rows.first().map_or(0, Vec::len);
                let mut columns = Vec::with_capacity(width);
                for idx in 0..width {
                    let cells: Vec<Option<ResolvedType>> = rows
                        .iter()
                        .map(|row| row.get(idx).and_then(|e| self.type_of(e)))
                        .collect();
                    let nullable = cells.iter().any(|t| t.map_or(true, |t| t.nullable));
                    let ty = cells
                        .iter()
                        .flatten()
                        .find(|t| t.basic != BasicKind::NullType)
                        .map(|t| t.with_nullable(nullable));
                    let id = self.fresh(ty);
                    columns.push(OutputColumn {
                        name: format!("column{}", idx + 1),
                        id,
                    });
                }

                (QueryBody::Values(rows), columns)
            }
            other => {
                let kind = match other {
                    SetExpr::Insert(_) => "INSERT",
                    SetExpr::Update(_) => "UPDATE",
                    SetExpr::Table(_) => "TABLE",
                    _ => "query body",
                }
                .to_string();
                self.error(
                    Diagnostic::error(
                        DiagnosticKind::UnsupportedSyntax,
                        format!("{} is not supported as a query body", kind),
                    )
                    .with_help("Rewrite the query as a SELECT"),
                );
                (QueryBody::Unsupported { kind }, Vec::new())
            }
        }
    }

    fn select(
        &mut self,
        select: &Select,
        order_by: &[&Expr],
    ) -> (ResolvedSelect, Vec<OutputColumn>, Vec<ResolvedExpr>) {
        self.scopes.push(Vec::new());

        let mut sources = Vec::new();
        for table in &select.from {
            self.table_with_joins(table, &mut sources);
        }

        let mut projection = Vec::new();
        for item in &select.projection {
            self.select_item(item, &mut projection);
        }

        let selection = select
            .selection
            .as_ref()
            .map(|e| self.expr(e, Some(ResolvedType::boolean())));

        let group_by = match &select.group_by {
            GroupByExpr::All(_) => Vec::new(),
            GroupByExpr::Expressions(exprs, _) => exprs.iter().map(|e| self.expr(e, None)).collect(),
        };

        let having = select
            .having
            .as_ref()
            .map(|e| self.expr(e, Some(ResolvedType::boolean())));

        // ORDER BY sees the FROM sources and the projection aliases
        let aliases = projection
            .iter()
            .map(|c: &ProjectedColumn| (c.name.clone(), c.expr.id))
            .collect();
        let saved_aliases = std::mem::replace(&mut self.select_aliases, aliases);
        let order_by = order_by.iter().map(|e| self.expr(e, None)).collect();
        self.select_aliases = saved_aliases;

        self.scopes.pop();

        let columns = projection
            .iter()
            .map(|c| OutputColumn {
                name: c.name.clone(),
                id: c.expr.id,
            })
            .collect();

        let select = ResolvedSelect {
            projection,
            sources,
            selection,
            group_by,
            having,
        };
        (select, columns, order_by)
    }

    /// ORDER BY of a compound or VALUES body only sees the output columns
    fn order_by_outputs(&mut self, columns: &[OutputColumn], exprs: &[&Expr]) -> Vec<ResolvedExpr> {
        if exprs.is_empty() {
            return Vec::new();
        }
        let outputs = self.source_columns(columns, &[]);
        self.scopes
            .push(vec![ScopeSource::new(String::new(), None, Some(outputs))]);
        let resolved = exprs.iter().map(|e| self.expr(e, None)).collect();
        self.scopes.pop();
        resolved
    }

    fn source_columns(&self, columns: &[OutputColumn], declared: &[String]) -> Vec<SourceColumn> {
        columns
            .iter()
            .enumerate()
            .map(|(idx, column)| SourceColumn {
                name: declared
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| column.name.clone()),
                ty: self.types.get(&column.id).copied(),
            })
            .collect()
    }

    fn select_item(&mut self, item: &SelectItem, projection: &mut Vec<ProjectedColumn>) {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                let resolved = self.expr(expr, None);
                projection.push(ProjectedColumn {
                    name: column_name(expr),
                    expr: resolved,
                });
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                let resolved = self.expr(expr, None);
                projection.push(ProjectedColumn {
                    name: alias.value.clone(),
                    expr: resolved,
                });
            }
            SelectItem::Wildcard(_) => {
                let sources = self.scopes.last().cloned().unwrap_or_default();
                if sources.is_empty() {
                    self.error(Diagnostic::error(
                        DiagnosticKind::TableNotFound,
                        "SELECT * requires at least one table in FROM clause",
                    ));
                }
                for source in &sources {
                    self.expand(source, true, projection);
                }
            }
            SelectItem::QualifiedWildcard(name, _) => {
                let Some(qualifier) = name.0.last() else {
                    return;
                };
                let source = self.scopes.last().and_then(|scope| {
                    scope
                        .iter()
                        .find(|s| s.name.eq_ignore_ascii_case(&qualifier.value))
                        .cloned()
                });
                match source {
                    Some(source) => self.expand(&source, false, projection),
                    None => self.error(
                        Diagnostic::error(
                            DiagnosticKind::TableNotFound,
                            format!(
                                "Table or alias '{}' not found in FROM clause",
                                qualifier.value
                            ),
                        )
                        .with_span(Span::from_sqlparser(&qualifier.span)),
                    ),
                }
            }
        }
    }

    /// Expand `*` or `source.*` into one projected column per source column
    fn expand(
        &mut self,
        source: &ScopeSource,
        skip_merged: bool,
        projection: &mut Vec<ProjectedColumn>,
    ) {
        let Some(columns) = &source.columns else {
            return;
        };
        for column in columns {
            if skip_merged && source.merged.iter().any(|m| m.eq_ignore_ascii_case(&column.name)) {
                continue;
            }
            let expr = self.node(
                ExprKind::Column {
                    source: Some(source.name.clone()),
                    table: source.table,
                    name: column.name.clone(),
                },
                Vec::new(),
                source.adjust(column.ty),
            );
            projection.push(ProjectedColumn {
                name: column.name.clone(),
                expr,
            });
        }
    }

    // ---- FROM clause ----

    fn bind(&mut self, source: ScopeSource) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(source);
        }
    }

    fn scope_len(&self) -> usize {
        self.scopes.last().map_or(0, Vec::len)
    }

    fn scope_range(&mut self, range: Range<usize>) -> &mut [ScopeSource] {
        match self.scopes.last_mut().and_then(|scope| scope.get_mut(range)) {
            Some(sources) => sources,
            None => &mut [],
        }
    }

    fn table_with_joins(&mut self, table: &TableWithJoins, sources: &mut Vec<ResolvedSource>) {
        let start = self.scope_len();
        let relation = self.table_factor(&table.relation);
        sources.push(relation);

        for join in &table.joins {
            let before = self.scope_len();
            let mut source = self.table_factor(&join.relation);
            let after = self.scope_len();

            let (constraint, left_nullable, right_nullable) = match &join.join_operator {
                JoinOperator::Inner(c) => (Some(c), false, false),
                JoinOperator::LeftOuter(c) => (Some(c), false, true),
                JoinOperator::RightOuter(c) => (Some(c), true, false),
                JoinOperator::FullOuter(c) => (Some(c), true, true),
                JoinOperator::LeftSemi(c)
                | JoinOperator::RightSemi(c)
                | JoinOperator::LeftAnti(c)
                | JoinOperator::RightAnti(c)
                | JoinOperator::Semi(c)
                | JoinOperator::Anti(c) => (Some(c), false, false),
                JoinOperator::CrossJoin
                | JoinOperator::CrossApply
                | JoinOperator::OuterApply
                | JoinOperator::AsOf { .. } => (None, false, false),
            };

            if right_nullable {
                for s in self.scope_range(before..after) {
                    s.nullable = true;
                }
            }
            if left_nullable {
                for s in self.scope_range(start..before) {
                    s.nullable = true;
                }
            }

            match constraint {
                Some(JoinConstraint::On(expr)) => {
                    source.join_condition = Some(self.expr(expr, Some(ResolvedType::boolean())));
                }
                Some(JoinConstraint::Using(columns)) => {
                    let names: Vec<String> =
                        columns.iter().map(|c| plain_name(&c.to_string())).collect();
                    for s in self.scope_range(before..after) {
                        s.merged.extend(names.iter().cloned());
                    }
                }
                Some(JoinConstraint::Natural) => {
                    let left: Vec<String> = self
                        .scope_range(start..before)
                        .iter()
                        .filter_map(|s| s.columns.as_ref())
                        .flatten()
                        .map(|c| c.name.clone())
                        .collect();
                    for s in self.scope_range(before..after) {
                        let shared: Vec<String> = s
                            .columns
                            .iter()
                            .flatten()
                            .filter(|c| left.iter().any(|l| l.eq_ignore_ascii_case(&c.name)))
                            .map(|c| c.name.clone())
                            .collect();
                        s.merged.extend(shared);
                    }
                }
                Some(JoinConstraint::None) | None => {}
            }

            sources.push(source);
        }
    }

    fn table_factor(&mut self, factor: &TableFactor) -> ResolvedSource {
        match factor {
            TableFactor::Table {
                name, alias, args, ..
            } => {
                let table_name = object_name(name);
                let declared = alias_columns(alias.as_ref());
                let visible = alias
                    .as_ref()
                    .map(|a| a.name.value.clone())
                    .unwrap_or_else(|| table_name.clone());

                // Table-valued function call, e.g. json_each(...)
                if let Some(args) = args {
                    let args = self.function_arg_exprs(&args.args);
                    let columns = (!declared.is_empty()).then(|| {
                        declared
                            .iter()
                            .map(|name| SourceColumn {
                                name: name.clone(),
                                ty: None,
                            })
                            .collect()
                    });
                    self.bind(ScopeSource::new(visible.clone(), None, columns));
                    return ResolvedSource {
                        name: visible,
                        kind: SourceKind::Function {
                            name: table_name,
                            args,
                        },
                        join_condition: None,
                    };
                }

                if name.0.len() == 1 {
                    if let Some(columns) = self.ctes.get(&table_name.to_lowercase()).cloned() {
                        let columns = rename(columns, &declared);
                        self.bind(ScopeSource::new(visible.clone(), None, Some(columns)));
                        return ResolvedSource {
                            name: visible,
                            kind: SourceKind::Cte(table_name),
                            join_condition: None,
                        };
                    }
                }

                if let Some(id) = self.engine.find_table(&table_name) {
                    let columns = self
                        .engine
                        .table(id)
                        .map(|t| {
                            t.columns
                                .iter()
                                .map(|c| SourceColumn {
                                    name: c.name.clone(),
                                    ty: Some(c.ty),
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    let columns = rename(columns, &declared);
                    let mut source = ScopeSource::new(visible.clone(), Some(id), Some(columns));
                    source.rowid = self.engine.dialect().has_rowid();
                    self.bind(source);
                    return ResolvedSource {
                        name: visible,
                        kind: SourceKind::Table(id),
                        join_condition: None,
                    };
                }

                let mut diag = Diagnostic::error(
                    DiagnosticKind::TableNotFound,
                    format!("Table '{}' not found", table_name),
                )
                .with_help("Check that the table exists in your schema definition");
                if let Some(ident) = name.0.last() {
                    diag = diag.with_span(Span::from_sqlparser(&ident.span));
                }
                self.error(diag);

                // Unknown columns keep later references from cascading into more errors
                self.bind(ScopeSource::new(visible.clone(), None, None));
                ResolvedSource {
                    name: visible,
                    kind: SourceKind::Unresolved(table_name),
                    join_condition: None,
                }
            }
            TableFactor::Derived {
                lateral,
                subquery,
                alias,
            } => {
                // Non-LATERAL subqueries cannot see sibling FROM items
                let hidden = if *lateral {
                    None
                } else {
                    self.scopes.last_mut().map(std::mem::take)
                };
                let saved_aliases = std::mem::take(&mut self.select_aliases);
                let query = self.query(subquery);
                self.select_aliases = saved_aliases;
                if let (Some(hidden), Some(scope)) = (hidden, self.scopes.last_mut()) {
                    *scope = hidden;
                }

                let declared = alias_columns(alias.as_ref());
                let columns = self.source_columns(&query.columns, &declared);
                let name = alias
                    .as_ref()
                    .map(|a| a.name.value.clone())
                    .unwrap_or_default();
                self.bind(ScopeSource::new(name.clone(), None, Some(columns)));
                ResolvedSource {
                    name,
                    kind: SourceKind::Derived(Box::new(query)),
                    join_condition: None,
                }
            }
            TableFactor::NestedJoin {
                table_with_joins,
                alias,
            } => {
                let mut inner = Vec::new();
                self.table_with_joins(table_with_joins, &mut inner);
                ResolvedSource {
                    name: alias
                        .as_ref()
                        .map(|a| a.name.value.clone())
                        .unwrap_or_default(),
                    kind: SourceKind::Nested(inner),
                    join_condition: None,
                }
            }
            other => {
                let text = other.to_string();
                self.error(Diagnostic::error(
                    DiagnosticKind::UnsupportedSyntax,
                    format!("Unsupported FROM item '{}'", text),
                ));
                self.bind(ScopeSource::new(String::new(), None, None));
                ResolvedSource {
                    name: String::new(),
                    kind: SourceKind::Unresolved(text),
                    join_condition: None,
                }
            }
        }
    }

    // ---- column references ----

    fn column_node(&mut self, found: ColumnMatch) -> ResolvedExpr {
        self.node(
            ExprKind::Column {
                source: Some(found.source),
                table: found.table,
                name: found.name,
            },
            Vec::new(),
            found.ty,
        )
    }

    fn unresolved_column(&mut self, name: &str) -> ResolvedExpr {
        self.node(
            ExprKind::Column {
                source: None,
                table: None,
                name: name.to_string(),
            },
            Vec::new(),
            None,
        )
    }

    fn qualified_column(&mut self, qualifier: &Ident, ident: &Ident) -> ResolvedExpr {
        let lookup = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| {
                scope
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(&qualifier.value))
            })
            .map(|source| source.resolve(&ident.value));

        match lookup {
            Some(Lookup::Found(found)) => self.column_node(found),
            Some(Lookup::Missing { suggestion }) => {
                let mut diag = Diagnostic::error(
                    DiagnosticKind::ColumnNotFound,
                    format!(
                        "Column '{}' not found in table '{}'",
                        ident.value, qualifier.value
                    ),
                )
                .with_span(Span::from_sqlparser(&ident.span));
                if let Some(suggestion) = suggestion {
                    diag = diag.with_help(format!("Did you mean '{}'?", suggestion));
                }
                self.error(diag);
                self.unresolved_column(&ident.value)
            }
            None => {
                self.error(
                    Diagnostic::error(
                        DiagnosticKind::TableNotFound,
                        format!(
                            "Table or alias '{}' not found in FROM clause",
                            qualifier.value
                        ),
                    )
                    .with_span(Span::from_sqlparser(&qualifier.span)),
                );
                self.unresolved_column(&ident.value)
            }
        }
    }

    fn unqualified_column(&mut self, ident: &Ident) -> ResolvedExpr {
        let name = ident.value.as_str();
        let span = Span::from_sqlparser(&ident.span);

        // Innermost scope that has the column wins
        let mut matches: Vec<ColumnMatch> = Vec::new();
        for scope in self.scopes.iter().rev() {
            for source in scope.iter().filter(|s| s.has_column(name)) {
                if let Lookup::Found(found) = source.resolve(name) {
                    matches.push(found);
                }
            }
            if !matches.is_empty() {
                break;
            }
        }

        if matches.len() > 1 {
            let found_in: Vec<&str> = matches.iter().map(|m| m.source.as_str()).collect();
            let diag = Diagnostic::error(
                DiagnosticKind::AmbiguousColumn,
                format!(
                    "Column '{}' is ambiguous (found in tables: {})",
                    name,
                    found_in.join(", ")
                ),
            )
            .with_span(span)
            .with_help(format!(
                "Qualify the column with a table name: {}.{}",
                found_in[0], name
            ));
            self.error(diag);
        }
        if let Some(found) = matches.into_iter().next() {
            return self.column_node(found);
        }

        // SELECT aliases are valid in ORDER BY
        let alias = self
            .select_aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, id)| *id);
        if let Some(id) = alias {
            let ty = self.types.get(&id).copied();
            return self.node(
                ExprKind::Column {
                    source: None,
                    table: None,
                    name: name.to_string(),
                },
                Vec::new(),
                ty,
            );
        }

        // rowid of a table in scope, then any source whose columns are unknown
        let fallback = self
            .scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|s| (s.rowid && is_rowid(name)) || s.columns.is_none())
            .map(|s| s.resolve(name));
        if let Some(Lookup::Found(found)) = fallback {
            return self.column_node(found);
        }

        // A double-quoted name that binds to nothing is a string literal
        if ident.quote_style == Some('"') {
            return self.node(
                ExprKind::Literal,
                Vec::new(),
                Some(ResolvedType::new(BasicKind::Text)),
            );
        }

        let suggestion = self
            .scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .filter_map(|s| s.columns.as_ref())
            .find_map(|cols| find_similar_column(cols.iter().map(|c| c.name.as_str()), name));

        let mut diag = Diagnostic::error(
            DiagnosticKind::ColumnNotFound,
            format!("Column '{}' not found", name),
        )
        .with_span(span);
        if let Some(suggestion) = suggestion {
            diag = diag.with_help(format!("Did you mean '{}'?", suggestion));
        }
        self.error(diag);
        self.unresolved_column(name)
    }

    // ---- expressions ----

    fn variable(&mut self, text: &str, hint: Option<ResolvedType>) -> ResolvedExpr {
        let variable = VariableRef {
            kind: VariableKind::parse(text, self.engine.dialect()),
            resolved_index: 0,
        };
        self.node(ExprKind::Variable(variable), Vec::new(), hint)
    }

    /// Resolve two operands that should share a type
    fn operands(
        &mut self,
        left: &Expr,
        right: &Expr,
        hint: Option<ResolvedType>,
    ) -> (ResolvedExpr, ResolvedExpr) {
        let left = self.expr(left, hint);
        let left_ty = self.type_of(&left);
        let right = self.expr(right, left_ty.or(hint));
        let right_ty = self.type_of(&right);
        self.backfill(&left, right_ty);
        (left, right)
    }

    /// Resolve an expression; `hint` is the type its context expects and is
    /// given to bound parameters that have nothing better.
    fn expr(&mut self, expr: &Expr, hint: Option<ResolvedType>) -> ResolvedExpr {
        match expr {
            Expr::Identifier(ident) => {
                // Some dialects tokenize $name / :name / @name as identifiers
                if ident.quote_style.is_none() && ident.value.starts_with(['$', ':', '@']) {
                    self.variable(&ident.value, hint)
                } else {
                    self.unqualified_column(ident)
                }
            }
            Expr::CompoundIdentifier(idents) => match idents.as_slice() {
                [table, column] | [_, table, column] => self.qualified_column(table, column),
                _ => self.opaque(expr),
            },
            Expr::Value(value) => self.literal(value, hint),
            Expr::Nested(inner) => self.expr(inner, hint),
            Expr::Collate { expr: inner, .. } => self.expr(inner, hint),
            Expr::BinaryOp { left, op, right } => self.binary_op(left, op, right, hint),
            Expr::UnaryOp { op, expr: inner } => match op {
                UnaryOperator::Not => {
                    let operand = self.expr(inner, Some(ResolvedType::boolean()));
                    let nullable = self.is_nullable(&operand);
                    self.boolean(vec![operand], op.to_string(), nullable)
                }
                _ => {
                    let operand = self.expr(inner, hint);
                    let ty = self.type_of(&operand).map(|t| t.without_hint());
                    self.node(ExprKind::Operation(op.to_string()), vec![operand], ty)
                }
            },
            Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::IsTrue(inner)
            | Expr::IsNotTrue(inner)
            | Expr::IsFalse(inner)
            | Expr::IsNotFalse(inner)
            | Expr::IsUnknown(inner)
            | Expr::IsNotUnknown(inner) => {
                let operand = self.expr(inner, None);
                self.boolean(vec![operand], "IS".to_string(), false)
            }
            Expr::IsDistinctFrom(a, b) | Expr::IsNotDistinctFrom(a, b) => {
                let (a, b) = self.operands(a, b, None);
                self.boolean(vec![a, b], "IS".to_string(), false)
            }
            Expr::InList {
                expr: target, list, ..
            } => {
                let target = self.expr(target, None);
                let target_ty = self.type_of(&target);
                let mut element_ty = None;
                let mut children = vec![target];
                for item in list {
                    let item = self.expr(item, target_ty);
                    element_ty = element_ty.or(self.type_of(&item));
                    children.push(item);
                }
                self.backfill(&children[0], element_ty);
                let nullable = children.iter().any(|c| self.is_nullable(c));
                self.boolean(children, "IN".to_string(), nullable)
            }
            Expr::InSubquery {
                expr: target,
                subquery,
                ..
            } => {
                let target = self.expr(target, None);
                let subquery = self.subquery(subquery);
                self.backfill(&target, self.type_of(&subquery));
                let nullable = self.is_nullable(&target);
                self.boolean(vec![target, subquery], "IN".to_string(), nullable)
            }
            Expr::Between {
                expr: target,
                low,
                high,
                ..
            } => {
                let target = self.expr(target, None);
                let target_ty = self.type_of(&target);
                let low = self.expr(low, target_ty);
                let low_ty = self.type_of(&low);
                let high = self.expr(high, target_ty.or(low_ty));
                self.backfill(&target, low_ty.or(self.type_of(&high)));
                let children = vec![target, low, high];
                let nullable = children.iter().any(|c| self.is_nullable(c));
                self.boolean(children, "BETWEEN".to_string(), nullable)
            }
            Expr::Like {
                expr: target,
                pattern,
                ..
            }
            | Expr::ILike {
                expr: target,
                pattern,
                ..
            }
            | Expr::SimilarTo {
                expr: target,
                pattern,
                ..
            }
            | Expr::RLike {
                expr: target,
                pattern,
                ..
            } => {
                let text = Some(ResolvedType::new(BasicKind::Text));
                let target = self.expr(target, text);
                let pattern = self.expr(pattern, text);
                let nullable = self.is_nullable(&target) || self.is_nullable(&pattern);
                self.boolean(vec![target, pattern], "LIKE".to_string(), nullable)
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => self.case(operand.as_deref(), conditions, results, else_result.as_deref(), hint),
            Expr::Cast {
                expr: inner,
                data_type,
                ..
            } => {
                let target = to_resolved(LogicalColumnType::from_ast(data_type));
                let operand = self.expr(inner, Some(target));
                let nullable = self.is_nullable(&operand);
                self.node(
                    ExprKind::Operation("CAST".to_string()),
                    vec![operand],
                    Some(target.with_nullable(nullable)),
                )
            }
            Expr::TypedString { data_type, .. } => self.node(
                ExprKind::Literal,
                Vec::new(),
                Some(to_resolved(LogicalColumnType::from_ast(data_type))),
            ),
            Expr::Function(func) => self.function(func, hint),
            Expr::Subquery(query) => self.subquery(query),
            Expr::Exists { subquery, .. } => {
                let subquery = self.subquery(subquery);
                self.boolean(vec![subquery], "EXISTS".to_string(), false)
            }
            Expr::Tuple(items) => {
                let children = items.iter().map(|e| self.expr(e, None)).collect();
                self.node(ExprKind::Operation("ROW".to_string()), children, None)
            }
            Expr::Trim {
                expr: inner,
                trim_what,
                trim_characters,
                ..
            } => {
                let text = Some(ResolvedType::new(BasicKind::Text));
                let mut operands = vec![(inner.as_ref(), text)];
                operands.extend(trim_what.as_deref().map(|e| (e, text)));
                operands.extend(trim_characters.iter().flatten().map(|e| (e, text)));
                self.builtin("trim", &operands, text)
            }
            Expr::Substring {
                expr: inner,
                substring_from,
                substring_for,
                ..
            } => {
                let text = Some(ResolvedType::new(BasicKind::Text));
                let int = Some(ResolvedType::new(BasicKind::Int));
                let mut operands = vec![(inner.as_ref(), text)];
                operands.extend(substring_from.as_deref().map(|e| (e, int)));
                operands.extend(substring_for.as_deref().map(|e| (e, int)));
                self.builtin("substring", &operands, text)
            }
            Expr::Overlay {
                expr: inner,
                overlay_what,
                overlay_from,
                overlay_for,
            } => {
                let text = Some(ResolvedType::new(BasicKind::Text));
                let int = Some(ResolvedType::new(BasicKind::Int));
                let mut operands = vec![
                    (inner.as_ref(), text),
                    (overlay_what.as_ref(), text),
                    (overlay_from.as_ref(), int),
                ];
                operands.extend(overlay_for.as_deref().map(|e| (e, int)));
                self.builtin("overlay", &operands, text)
            }
            Expr::Position { expr: needle, r#in } => {
                let text = Some(ResolvedType::new(BasicKind::Text));
                let operands = [(needle.as_ref(), text), (r#in.as_ref(), text)];
                self.builtin("position", &operands, Some(ResolvedType::new(BasicKind::Int)))
            }
            Expr::Extract { expr: inner, .. } => self.builtin(
                "extract",
                &[(inner.as_ref(), None)],
                Some(ResolvedType::new(BasicKind::Int)),
            ),
            Expr::Ceil { expr: inner, .. } => self.builtin("ceil", &[(inner.as_ref(), hint)], None),
            Expr::Floor { expr: inner, .. } => {
                self.builtin("floor", &[(inner.as_ref(), hint)], None)
            }
            Expr::AtTimeZone {
                timestamp,
                time_zone,
            } => {
                let operands = [
                    (timestamp.as_ref(), hint),
                    (time_zone.as_ref(), Some(ResolvedType::new(BasicKind::Text))),
                ];
                self.builtin("timezone", &operands, None)
            }
            _ => self.opaque(expr),
        }
    }

    /// SQL special forms with function semantics. The result is `result`,
    /// or the first operand's type when that is `None`, and is nullable when
    /// any operand is.
    fn builtin(
        &mut self,
        name: &str,
        operands: &[(&Expr, Option<ResolvedType>)],
        result: Option<ResolvedType>,
    ) -> ResolvedExpr {
        let children: Vec<ResolvedExpr> = operands
            .iter()
            .map(|&(operand, hint)| self.expr(operand, hint))
            .collect();
        let nullable = children.iter().any(|c| self.is_nullable(c));
        let ty = result
            .or_else(|| children.first().and_then(|c| self.type_of(c)))
            .map(|t| t.with_nullable(nullable));
        self.node(ExprKind::Function(name.to_string()), children, ty)
    }

    fn binary_op(
        &mut self,
        left: &Expr,
        op: &BinaryOperator,
        right: &Expr,
        hint: Option<ResolvedType>,
    ) -> ResolvedExpr {
        let name = op.to_string();
        match op {
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Xor => {
                let left = self.expr(left, Some(ResolvedType::boolean()));
                let right = self.expr(right, Some(ResolvedType::boolean()));
                let nullable = self.is_nullable(&left) || self.is_nullable(&right);
                self.boolean(vec![left, right], name, nullable)
            }
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Spaceship => {
                let (left, right) = self.operands(left, right, None);
                let nullable = self.is_nullable(&left) || self.is_nullable(&right);
                self.boolean(vec![left, right], name, nullable)
            }
            BinaryOperator::Plus
            | BinaryOperator::Minus
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo => {
                let (left, right) = self.operands(left, right, hint.map(|t| t.without_hint()));
                let ty = arithmetic(self.type_of(&left), self.type_of(&right));
                self.node(ExprKind::Operation(name), vec![left, right], ty)
            }
            BinaryOperator::StringConcat => {
                let text = Some(ResolvedType::new(BasicKind::Text));
                let left = self.expr(left, text);
                let right = self.expr(right, text);
                let nullable = self.is_nullable(&left) || self.is_nullable(&right);
                self.node(
                    ExprKind::Operation(name),
                    vec![left, right],
                    text.map(|t| t.with_nullable(nullable)),
                )
            }
            BinaryOperator::BitwiseAnd
            | BinaryOperator::BitwiseOr
            | BinaryOperator::BitwiseXor
            | BinaryOperator::PGBitwiseShiftLeft
            | BinaryOperator::PGBitwiseShiftRight => {
                let int = Some(ResolvedType::new(BasicKind::Int));
                let left = self.expr(left, int);
                let right = self.expr(right, int);
                let nullable = self.is_nullable(&left) || self.is_nullable(&right);
                self.node(
                    ExprKind::Operation(name),
                    vec![left, right],
                    int.map(|t| t.with_nullable(nullable)),
                )
            }
            _ => {
                let (left, right) = self.operands(left, right, None);
                self.node(ExprKind::Operation(name), vec![left, right], None)
            }
        }
    }

    fn case(
        &mut self,
        operand: Option<&Expr>,
        conditions: &[Expr],
        results: &[Expr],
        else_result: Option<&Expr>,
        hint: Option<ResolvedType>,
    ) -> ResolvedExpr {
        let mut children = Vec::new();
        let condition_hint = match operand {
            Some(operand) => {
                let operand = self.expr(operand, None);
                let ty = self.type_of(&operand);
                children.push(operand);
                ty
            }
            None => Some(ResolvedType::boolean()),
        };

        let mut branches = Vec::new();
        for (condition, result) in conditions.iter().zip(results) {
            let condition = self.expr(condition, condition_hint);
            children.push(condition);
            let result = self.expr(result, hint);
            branches.push(children.len());
            children.push(result);
        }
        if let Some(else_result) = else_result {
            let result = self.expr(else_result, hint);
            branches.push(children.len());
            children.push(result);
        }

        let branch_types: Vec<Option<ResolvedType>> =
            branches.iter().map(|&i| self.type_of(&children[i])).collect();
        let nullable =
            else_result.is_none() || branch_types.iter().any(|t| t.map_or(true, |t| t.nullable));
        let ty = branch_types
            .iter()
            .flatten()
            .find(|t| t.basic != BasicKind::NullType)
            .map(|t| t.with_nullable(nullable));

        for &idx in &branches {
            self.backfill(&children[idx], ty);
        }

        self.node(ExprKind::Operation("CASE".to_string()), children, ty)
    }

    fn function(
        &mut self,
        func: &sqlparser::ast::Function,
        hint: Option<ResolvedType>,
    ) -> ResolvedExpr {
        let name = object_name(&func.name).to_lowercase();

        let mut children = match &func.args {
            FunctionArguments::List(list) => self.function_arg_exprs(&list.args),
            FunctionArguments::Subquery(query) => vec![self.subquery(query)],
            FunctionArguments::None => Vec::new(),
        };

        let arg_types: Vec<Option<ResolvedType>> =
            children.iter().map(|c| self.type_of(c)).collect();
        let mut ty = functions::return_type(&name, &arg_types);

        let text = Some(ResolvedType::new(BasicKind::Text));
        match name.as_str() {
            "coalesce" | "ifnull" | "nullif" | "min" | "max" => {
                ty = ty.or(hint);
                for child in &children {
                    self.backfill(child, ty.map(|t| t.with_nullable(true)));
                }
            }
            "lower" | "upper" | "trim" | "ltrim" | "rtrim" | "replace" | "instr" | "length"
            | "like" | "glob" | "date" | "time" | "datetime" | "julianday" | "strftime" => {
                for child in &children {
                    self.backfill(child, text);
                }
            }
            "substr" | "substring" => {
                for (idx, child) in children.iter().enumerate() {
                    let arg = if idx == 0 {
                        text
                    } else {
                        Some(ResolvedType::new(BasicKind::Int))
                    };
                    self.backfill(child, arg);
                }
            }
            _ => {}
        }

        if let Some(filter) = &func.filter {
            let filter = self.expr(filter, Some(ResolvedType::boolean()));
            children.push(filter);
        }
        if let Some(WindowType::WindowSpec(spec)) = &func.over {
            for expr in &spec.partition_by {
                let expr = self.expr(expr, None);
                children.push(expr);
            }
            for order in &spec.order_by {
                let expr = self.expr(&order.expr, None);
                children.push(expr);
            }
        }

        self.node(ExprKind::Function(name), children, ty)
    }

    fn function_arg_exprs(&mut self, args: &[FunctionArg]) -> Vec<ResolvedExpr> {
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                | FunctionArg::Named {
                    arg: FunctionArgExpr::Expr(e),
                    ..
                }
                | FunctionArg::ExprNamed {
                    arg: FunctionArgExpr::Expr(e),
                    ..
                } => resolved.push(self.expr(e, None)),
                // count(*) and friends
                _ => {}
            }
        }
        resolved
    }

    /// Scalar subquery; its type is its first column's, made nullable
    fn subquery(&mut self, query: &Query) -> ResolvedExpr {
        let saved_aliases = std::mem::take(&mut self.select_aliases);
        let query = self.query(query);
        self.select_aliases = saved_aliases;

        let ty = query
            .columns
            .first()
            .and_then(|c| self.types.get(&c.id).copied())
            .map(|t| t.with_nullable(true));
        self.node(ExprKind::Subquery(Box::new(query)), Vec::new(), ty)
    }

    fn literal(&mut self, value: &Value, hint: Option<ResolvedType>) -> ResolvedExpr {
        let ty = match value {
            Value::Placeholder(text) => return self.variable(text, hint),
            Value::Number(n, _) => {
                if n.to_string().contains(['.', 'e', 'E']) {
                    ResolvedType::new(BasicKind::Real)
                } else {
                    ResolvedType::new(BasicKind::Int)
                }
            }
            Value::HexStringLiteral(_) => ResolvedType::new(BasicKind::Blob),
            Value::Boolean(_) => ResolvedType::boolean(),
            Value::Null => ResolvedType::null(),
            _ => ResolvedType::new(BasicKind::Text),
        };
        self.node(ExprKind::Literal, Vec::new(), Some(ty))
    }

    /// Expression kinds without typing rules: keep the parameters inside them
    /// so numbering still sees every occurrence.
    fn opaque(&mut self, expr: &Expr) -> ResolvedExpr {
        let mut placeholders = Vec::new();
        let _ = visit_expressions(expr, |e| {
            if let Expr::Value(Value::Placeholder(text)) = e {
                placeholders.push(text.clone());
            }
            ControlFlow::<()>::Continue(())
        });
        let children = placeholders
            .iter()
            .map(|text| self.variable(text, None))
            .collect();
        tracing::trace!(expr = %expr, "expression left untyped");
        self.node(ExprKind::Operation("EXPR".to_string()), children, None)
    }
}

/// Type of an arithmetic result
fn arithmetic(left: Option<ResolvedType>, right: Option<ResolvedType>) -> Option<ResolvedType> {
    match (left, right) {
        (Some(l), Some(r)) => {
            let basic = if l.basic == BasicKind::Real || r.basic == BasicKind::Real {
                BasicKind::Real
            } else if l.basic == BasicKind::NullType || r.basic == BasicKind::NullType {
                BasicKind::NullType
            } else {
                BasicKind::Int
            };
            Some(ResolvedType::new(basic).with_nullable(l.nullable || r.nullable))
        }
        (Some(t), None) | (None, Some(t)) => Some(t.without_hint().with_nullable(true)),
        (None, None) => None,
    }
}

/// Column type of a compound query: left side, nullability widened by the
/// right. A right side of unknown type may produce NULL.
fn widen(left: Option<ResolvedType>, right: Option<ResolvedType>) -> Option<ResolvedType> {
    match (left, right) {
        (Some(l), Some(r)) if l.basic == BasicKind::NullType => Some(r.with_nullable(true)),
        (Some(l), Some(r)) => Some(l.with_nullable(l.nullable || r.nullable)),
        (Some(l), None) => Some(l.with_nullable(true)),
        (None, _) => None,
    }
}

/// Name SQLite gives an unaliased result column
fn column_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(idents) => idents
            .last()
            .map(|i| i.value.clone())
            .unwrap_or_else(|| expr.to_string()),
        _ => expr.to_string(),
    }
}

/// Column names of a query body, read off the syntax alone
fn infer_column_names(set_expr: &SetExpr) -> Vec<String> {
    match set_expr {
        SetExpr::SetOperation { left, .. } => infer_column_names(left),
        SetExpr::Query(query) => infer_column_names(&query.body),
        SetExpr::Select(select) => select
            .projection
            .iter()
            .filter_map(|item| match item {
                SelectItem::UnnamedExpr(expr) => Some(column_name(expr)),
                SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
                // Wildcards cannot be expanded without resolving
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn alias_columns(alias: Option<&TableAlias>) -> Vec<String> {
    alias
        .map(|a| a.columns.iter().map(|c| c.name.value.clone()).collect())
        .unwrap_or_default()
}

fn rename(mut columns: Vec<SourceColumn>, declared: &[String]) -> Vec<SourceColumn> {
    for (column, name) in columns.iter_mut().zip(declared) {
        column.name = name.clone();
    }
    columns
}

/// Unqualified object name (schema prefixes are not modelled)
fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Last segment of a possibly qualified, possibly quoted name
fn plain_name(text: &str) -> String {
    text.rsplit('.')
        .next()
        .unwrap_or(text)
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_string()
}

fn is_rowid(name: &str) -> bool {
    ["rowid", "oid", "_rowid_"]
        .iter()
        .any(|r| r.eq_ignore_ascii_case(name))
}

fn statement_keyword(stmt: &Statement) -> String {
    let text = stmt.to_string();
    let mut words = text.split_whitespace();
    match words.next() {
        Some(first) if matches!(first.to_uppercase().as_str(), "CREATE" | "DROP" | "ALTER") => {
            format!("{} {}", first, words.next().unwrap_or_default()).to_uppercase()
        }
        Some(first) => first.to_uppercase(),
        None => "UNKNOWN".to_string(),
    }
}

/// Find a similar column name (for suggestions)
fn find_similar_column<'n>(columns: impl Iterator<Item = &'n str>, name: &str) -> Option<String> {
    let name_lower = name.to_lowercase();
    let mut best_match: Option<(usize, &str)> = None;

    for col_name in columns {
        let distance = levenshtein_distance(&name_lower, &col_name.to_lowercase());

        // Only suggest if reasonably similar (distance <= 3)
        if distance <= 3 && best_match.map_or(true, |(best, _)| distance < best) {
            best_match = Some((distance, col_name));
        }
    }

    best_match.map(|(_, name)| name.to_string())
}

/// Simple Levenshtein distance implementation
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
