// crates/artifact-gateway-core/src/core/path.rs
// ============================================================================
// Module: Path Expressions
// Description: Rooted path resolution and assignment over the runtime tree.
// Purpose: Resolve `$a.b.c` expressions without panicking on missing data.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Path expressions address locations in the per-request runtime tree. A
//! leading `$` marks a rooted path; segments are separated by `.`. Resolution
//! is total: any missing or non-object intermediate yields null, and a stored
//! JSON null is indistinguishable from an absent key. Assignment creates
//! intermediate objects as needed, replacing non-object intermediates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Shared null returned for unresolved paths.
static NULL: Value = Value::Null;

/// Splits a path expression into segments, stripping a leading `$`.
#[must_use]
pub fn split_path(expr: &str) -> Vec<&str> {
    expr.strip_prefix('$').unwrap_or(expr).split('.').collect()
}

/// Resolves a path expression against the runtime tree.
///
/// Returns a reference to null when any segment is missing or the current
/// node is not an object.
#[must_use]
pub fn resolve<'rt>(rt: &'rt Value, expr: &str) -> &'rt Value {
    let mut current = rt;
    for segment in split_path(expr) {
        match current {
            Value::Object(map) => {
                current = map.get(segment).unwrap_or(&NULL);
            }
            _ => return &NULL,
        }
    }
    current
}

/// Resolves a step argument into a concrete value.
///
/// Strings beginning with `$` are treated as path expressions; a null
/// resolution falls back to `default`. A missing or null argument also falls
/// back to `default`. Every other value (objects and numbers included) is a
/// literal and passes through unchanged.
#[must_use]
pub fn eval_arg(rt: &Value, arg: Option<&Value>, default: Value) -> Value {
    match arg {
        Some(Value::String(text)) if text.starts_with('$') => {
            let resolved = resolve(rt, text);
            if resolved.is_null() { default } else { resolved.clone() }
        }
        None | Some(Value::Null) => default,
        Some(other) => other.clone(),
    }
}

// ============================================================================
// SECTION: Assignment
// ============================================================================

/// Writes `value` at the location named by `expr`, creating intermediates.
///
/// Intermediate segments that are missing or hold non-object values are
/// replaced with fresh objects. The final segment is overwritten
/// unconditionally.
pub fn set_path(rt: &mut Value, expr: &str, value: Value) {
    let segments = split_path(expr);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = rt;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map.entry((*segment).to_string()).or_insert(Value::Null);
    }
    if !current.is_object() {
        *current = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(map) = current {
        map.insert((*last).to_string(), value);
    }
}
