// crates/artifact-gateway-core/src/core/condition.rs
// ============================================================================
// Module: Guard Conditions
// Description: Evaluation of step guard expressions against the runtime tree.
// Purpose: Decide whether a flow step runs, failing closed on unknown syntax.
// Dependencies: crate::core::{path, value}
// ============================================================================

//! ## Overview
//! The guard grammar has four productions, tried in order: bare-path
//! truthiness (`$a.b`), equality (`left == right`), inequality
//! (`left != right`), and negation (`!$a.b`). The right-hand side of a
//! comparison is a literal compared against the display string of the
//! resolved left-hand path; surrounding double quotes are trimmed, so
//! `x != admin` and `x != "admin"` are the same condition. The literal
//! `null` compares against null itself. An empty expression is true and
//! unrecognized syntax is an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::path::resolve;
use crate::core::value::to_display_string;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Guard evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The expression matched no production of the grammar.
    #[error("unsupported condition: {0}")]
    Unsupported(String),
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a guard expression against the runtime tree.
///
/// # Errors
///
/// Returns [`ConditionError`] when the expression matches no production of
/// the guard grammar.
pub fn eval_condition(expr: &str, rt: &Value) -> Result<bool, ConditionError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Ok(true);
    }

    // Bare rooted path: true iff it resolves to a non-null value.
    if expr.starts_with('$') && !expr.contains("==") && !expr.contains("!=") {
        return Ok(!resolve(rt, expr).is_null());
    }

    if let Some((left, right)) = expr.split_once("==") {
        return Ok(compare(rt, left, right));
    }

    if let Some((left, right)) = expr.split_once("!=") {
        return Ok(!compare(rt, left, right));
    }

    // Negated truthiness: null and boolean false are both falsy.
    if let Some(path) = expr.strip_prefix('!') {
        let value = resolve(rt, path);
        return Ok(value.is_null() || *value == Value::Bool(false));
    }

    Err(ConditionError::Unsupported(expr.to_string()))
}

/// Compares a resolved left-hand path against a right-hand literal.
///
/// The literal `null` matches a null resolution; any other literal matches
/// the display string of the resolved value after quote trimming. Inequality
/// is the exact negation of this predicate.
fn compare(rt: &Value, left: &str, right: &str) -> bool {
    let resolved = resolve(rt, left.trim());
    let right = right.trim();
    if right == "null" {
        return resolved.is_null();
    }
    to_display_string(resolved) == right.trim_matches('"')
}
