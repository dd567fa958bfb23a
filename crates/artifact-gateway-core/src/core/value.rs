// crates/artifact-gateway-core/src/core/value.rs
// ============================================================================
// Module: Value Coercion
// Description: Lossy coercions over dynamically typed JSON values.
// Purpose: Give operations a total, panic-free view of flow and request data.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Flow arguments and dataset contents arrive as parsed JSON or YAML and are
//! dynamically typed. The coercions in this module are total: any
//! [`Value`] maps to a string, an integer, or a string list without
//! panicking. Comparisons elsewhere in the engine (`findById`, `checkUnique`,
//! sort keys, condition literals) go through [`to_display_string`], which is
//! therefore the single definition of value equality for the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: String Coercion
// ============================================================================

/// Renders a value as the display string used for comparisons and templates.
///
/// Strings pass through unchanged. Integers render without a decimal point
/// and floats in shortest form (no trailing zeros). Booleans render as
/// `true`/`false`, null as the empty string, and arrays/objects as compact
/// JSON.
#[must_use]
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.to_string()
            } else if let Some(int) = number.as_u64() {
                int.to_string()
            } else {
                number.as_f64().map_or_else(|| number.to_string(), |float| format!("{float}"))
            }
        }
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

/// Returns the value as a string slice when it is a string, otherwise `""`.
///
/// This is the argument accessor for names that must be literal strings
/// (dataset names, field names, output paths).
#[must_use]
pub fn as_str_or_empty(value: Option<&Value>) -> &str {
    value.and_then(Value::as_str).unwrap_or("")
}

// ============================================================================
// SECTION: Numeric Coercion
// ============================================================================

/// Coerces a value to an integer.
///
/// Numbers truncate toward zero; strings parse as base-10 integers; anything
/// else (including unparseable strings) coerces to zero.
#[must_use]
pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int
            } else if let Some(float) = number.as_f64() {
                float as i64
            } else {
                0
            }
        }
        Value::String(text) => text.parse().unwrap_or(0),
        _ => 0,
    }
}

// ============================================================================
// SECTION: Collection Coercion
// ============================================================================

/// Coerces a value to a list of strings via [`to_display_string`].
///
/// Arrays map element-wise; null yields an empty list; any other scalar
/// yields a single-element list.
#[must_use]
pub fn to_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(to_display_string).collect(),
        Some(other) => vec![to_display_string(other)],
    }
}

/// Clamps an integer into the inclusive range `[low, high]`.
#[must_use]
pub const fn clamp(value: i64, low: i64, high: i64) -> i64 {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}
