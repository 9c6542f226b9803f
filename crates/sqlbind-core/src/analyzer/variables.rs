//! Bound parameter extraction

use super::query::FoundVariable;
use crate::engine::tree::{walk_expr, walk_statement, ExprKind, ResolvedExpr, VariableRef, Visitor};
use crate::engine::AnalysisContext;
use crate::types::to_logical;

/// Collect the query's parameters, one per slot, numbered from 1.
///
/// References are ordered by the slot the engine assigned them. Walking them
/// with a counter that starts at 0, a reference whose slot equals the counter
/// repeats the previous parameter and is skipped; any other reference bumps
/// the counter and becomes the next parameter.
pub fn extract_variables(context: &AnalysisContext) -> Vec<FoundVariable> {
    let mut collector = VariableCollector::default();
    walk_statement(&mut collector, context.root());

    let mut references = collector.references;
    references.sort_by_key(|(variable, _)| variable.resolved_index);

    let mut counter = 0;
    let mut found = Vec::new();
    for (variable, expr) in references {
        if variable.resolved_index == counter {
            continue;
        }
        counter += 1;
        found.push(FoundVariable {
            index: counter,
            name: variable.kind.name().map(str::to_string),
            column_type: to_logical(context.type_of(expr)),
        });
    }
    found
}

#[derive(Default)]
struct VariableCollector<'t> {
    references: Vec<(&'t VariableRef, &'t ResolvedExpr)>,
}

impl<'t> Visitor<'t> for VariableCollector<'t> {
    fn visit_expr(&mut self, expr: &'t ResolvedExpr) {
        if let ExprKind::Variable(variable) = &expr.kind {
            self.references.push((variable, expr));
        }
        walk_expr(self, expr);
    }
}
