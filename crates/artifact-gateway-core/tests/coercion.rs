// crates/artifact-gateway-core/tests/coercion.rs
// ============================================================================
// Module: Coercion Tests
// Description: Tests for the lossy value coercions.
// Purpose: Pin display rendering, integer coercion, and list lifting.
// Dependencies: artifact-gateway-core, serde_json
// ============================================================================

//! ## Overview
//! Coercions must be total and deterministic: every JSON value renders to a
//! display string, an integer, or a string list without panicking.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions."
)]

use artifact_gateway_core::clamp;
use artifact_gateway_core::to_display_string;
use artifact_gateway_core::to_int;
use artifact_gateway_core::to_string_list;
use serde_json::Value;
use serde_json::json;

#[test]
fn display_renders_numbers_minimally() {
    assert_eq!(to_display_string(&json!(1)), "1");
    assert_eq!(to_display_string(&json!(-7)), "-7");
    assert_eq!(to_display_string(&json!(1.5)), "1.5");
    // Floats with integral values drop the decimal point.
    let float: Value = serde_json::from_str("1.0").unwrap();
    assert_eq!(to_display_string(&float), "1");
}

#[test]
fn display_renders_scalars_and_composites() {
    assert_eq!(to_display_string(&json!("text")), "text");
    assert_eq!(to_display_string(&json!(true)), "true");
    assert_eq!(to_display_string(&json!(false)), "false");
    assert_eq!(to_display_string(&Value::Null), "");
    assert_eq!(to_display_string(&json!({"a": 1})), "{\"a\":1}");
    assert_eq!(to_display_string(&json!([1, 2])), "[1,2]");
}

#[test]
fn integers_truncate_and_parse() {
    assert_eq!(to_int(&json!(5)), 5);
    assert_eq!(to_int(&json!(3.9)), 3);
    assert_eq!(to_int(&json!("42")), 42);
    assert_eq!(to_int(&json!("not a number")), 0);
    assert_eq!(to_int(&json!(true)), 0);
    assert_eq!(to_int(&Value::Null), 0);
}

#[test]
fn string_lists_lift_scalars() {
    assert_eq!(to_string_list(Some(&json!(["a", 1]))), vec!["a".to_string(), "1".to_string()]);
    assert_eq!(to_string_list(Some(&json!("solo"))), vec!["solo".to_string()]);
    assert_eq!(to_string_list(None), Vec::<String>::new());
    assert_eq!(to_string_list(Some(&Value::Null)), Vec::<String>::new());
}

#[test]
fn clamp_bounds_both_ends() {
    assert_eq!(clamp(0, 1, 100), 1);
    assert_eq!(clamp(250, 1, 100), 100);
    assert_eq!(clamp(20, 1, 100), 20);
}
