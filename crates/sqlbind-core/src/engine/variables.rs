//! Bound parameter numbering
//!
//! Slots follow SQLite: `?` takes the next index after the largest one used
//! so far, `?NNN` takes NNN, and a named parameter reuses the slot of its
//! first occurrence.

use std::collections::HashMap;

use super::tree::{for_each_expr_mut, ExprId, ExprKind, ResolvedStatement, VariableKind};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::types::ResolvedType;

/// Largest parameter index SQLite accepts
pub(crate) const MAX_VARIABLE_NUMBER: usize = 32766;

/// Assign every parameter occurrence its slot, then give untyped
/// occurrences the type of the first typed occurrence of the same slot.
pub(crate) fn assign_indices(
    root: &mut ResolvedStatement,
    types: &mut HashMap<ExprId, ResolvedType>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut max = 0usize;
    let mut named: HashMap<String, usize> = HashMap::new();
    let mut occurrences: Vec<(usize, ExprId)> = Vec::new();

    for_each_expr_mut(root, &mut |expr| {
        let id = expr.id;
        let ExprKind::Variable(variable) = &mut expr.kind else {
            return;
        };

        let requested = match &variable.kind {
            VariableKind::Anonymous => max + 1,
            VariableKind::Numbered(n) => *n,
            named_kind @ VariableKind::Named { .. } => {
                let spelling = named_kind.spelling().unwrap_or_default();
                match named.get(&spelling) {
                    Some(&index) => index,
                    None => {
                        named.insert(spelling, max + 1);
                        max + 1
                    }
                }
            }
        };

        // Slot 0 is never bound, so out-of-range parameters drop out of extraction
        let index = if (1..=MAX_VARIABLE_NUMBER).contains(&requested) {
            requested
        } else {
            diagnostics.push(out_of_range(&variable.kind, requested));
            0
        };

        max = max.max(index);
        variable.resolved_index = index;
        occurrences.push((index, id));
    });

    let mut slot_types: HashMap<usize, ResolvedType> = HashMap::new();
    for (index, id) in &occurrences {
        if let Some(ty) = types.get(id) {
            slot_types.entry(*index).or_insert(*ty);
        }
    }
    for (index, id) in occurrences {
        if let Some(ty) = slot_types.get(&index) {
            types.entry(id).or_insert(*ty);
        }
    }
}

fn out_of_range(kind: &VariableKind, requested: usize) -> Diagnostic {
    let written = match kind {
        VariableKind::Anonymous => "?".to_string(),
        VariableKind::Numbered(n) => format!("?{}", n),
        VariableKind::Named { .. } => kind.spelling().unwrap_or_default(),
    };
    let message = if requested == 0 {
        format!("Parameter index {} is out of range", written)
    } else {
        format!(
            "Parameter {} needs slot {}, beyond the limit of {}",
            written, requested, MAX_VARIABLE_NUMBER
        )
    };
    Diagnostic::error(DiagnosticKind::InvalidParameter, message).with_help(format!(
        "Parameter indices run from 1 to {}",
        MAX_VARIABLE_NUMBER
    ))
}
