// crates/artifact-gateway-core/tests/operations.rs
// ============================================================================
// Module: Operation Tests
// Description: Tests for the query, validation, and response operations.
// Purpose: Pin pagination, lookup, uniqueness, and schema validation rules.
// Dependencies: artifact-gateway-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises individual operations through the registry with an in-memory
//! dataset store: filtering and pagination laws, identifier lookup,
//! uniqueness conflicts, body validation messages, and response composition.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions."
)]

use std::sync::Arc;

use artifact_gateway_core::InMemoryDatasetStore;
use artifact_gateway_core::OpOutput;
use artifact_gateway_core::OpRegistry;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

fn registry() -> OpRegistry {
    OpRegistry::with_builtin_ops(Arc::new(InMemoryDatasetStore::new()))
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().expect("args literal must be an object").clone()
}

fn items_rt() -> Value {
    json!({
        "request": { "query": {}, "body": {} },
        "ctx": {
            "data": [
                { "id": "1", "name": "alpha" },
                { "id": "2", "name": "echo" },
                { "id": "3", "name": "gamma" },
            ],
        },
    })
}

fn expect_value(output: OpOutput) -> Value {
    match output {
        OpOutput::Value(value) => value,
        other => panic!("expected value output, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Filter and Paginate
// ============================================================================

#[test]
fn filter_returns_full_page_when_list_fits() {
    let ops = registry();
    let mut rt = items_rt();
    let output = ops
        .dispatch(
            "filterAndPaginate",
            &args(json!({ "source": "$ctx.data", "page": 1, "size": 10 })),
            &mut rt,
        )
        .expect("filter should succeed");
    let result = expect_value(output);

    assert_eq!(result["total"], json!(3));
    assert_eq!(result["page"], json!(1));
    assert_eq!(result["size"], json!(10));
    assert_eq!(result["items"].as_array().expect("items array").len(), 3);
}

#[test]
fn filter_matches_case_insensitive_substrings() {
    let ops = registry();
    let mut rt = items_rt();
    let output = ops
        .dispatch(
            "filterAndPaginate",
            &args(json!({
                "source": "$ctx.data",
                "q": "A",
                "fields": ["name"],
                "page": 1,
                "size": 10,
            })),
            &mut rt,
        )
        .expect("filter should succeed");
    let result = expect_value(output);

    assert_eq!(result["total"], json!(2));
    let names: Vec<&str> = result["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["alpha", "gamma"]);
}

#[test]
fn filter_is_idempotent() {
    let ops = registry();
    let mut rt = items_rt();
    let call_args = args(json!({
        "source": "$ctx.data",
        "q": "a",
        "fields": ["name"],
        "page": 1,
        "size": 2,
    }));

    let first = expect_value(ops.dispatch("filterAndPaginate", &call_args, &mut rt).expect("first"));
    let second =
        expect_value(ops.dispatch("filterAndPaginate", &call_args, &mut rt).expect("second"));
    assert_eq!(first, second);
}

#[test]
fn filter_clamps_page_and_size() {
    let ops = registry();
    let mut rt = items_rt();
    let output = ops
        .dispatch(
            "filterAndPaginate",
            &args(json!({ "source": "$ctx.data", "page": 0, "size": 500 })),
            &mut rt,
        )
        .expect("filter should succeed");
    let result = expect_value(output);
    assert_eq!(result["page"], json!(1));
    assert_eq!(result["size"], json!(100));
}

#[test]
fn filter_past_the_end_reports_zero_total() {
    let ops = registry();
    let mut rt = items_rt();
    let output = ops
        .dispatch(
            "filterAndPaginate",
            &args(json!({ "source": "$ctx.data", "page": 9, "size": 10 })),
            &mut rt,
        )
        .expect("filter should succeed");
    let result = expect_value(output);
    assert_eq!(result, json!({ "items": [], "page": 9, "size": 10, "total": 0 }));
}

#[test]
fn filter_sorts_by_display_strings() {
    let ops = registry();
    let mut rt = json!({
        "request": {},
        "ctx": {
            "data": [
                { "id": "a", "rank": 10 },
                { "id": "b", "rank": 9 },
                { "id": "c", "rank": 2 },
            ],
        },
    });
    let output = ops
        .dispatch(
            "filterAndPaginate",
            &args(json!({ "source": "$ctx.data", "sort": "rank" })),
            &mut rt,
        )
        .expect("filter should succeed");
    let result = expect_value(output);
    // Numeric ranks order lexicographically through their rendered form.
    let ids: Vec<&str> = result["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["a", "c", "b"]);
}

#[test]
fn filter_sort_descending_reverses() {
    let ops = registry();
    let mut rt = items_rt();
    let output = ops
        .dispatch(
            "filterAndPaginate",
            &args(json!({ "source": "$ctx.data", "sort": "name:desc" })),
            &mut rt,
        )
        .expect("filter should succeed");
    let result = expect_value(output);
    let names: Vec<&str> = result["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["gamma", "echo", "alpha"]);
}

#[test]
fn filter_requires_a_list_source() {
    let ops = registry();
    let mut rt = json!({ "request": {}, "ctx": { "data": { "not": "a list" } } });
    let err = ops
        .dispatch("filterAndPaginate", &args(json!({ "source": "$ctx.data" })), &mut rt)
        .expect_err("non-list source must fail");
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "filterAndPaginate source must be array");
}

// ============================================================================
// SECTION: Lookup and Uniqueness
// ============================================================================

#[test]
fn find_by_id_resolves_paths_and_literals() {
    let ops = registry();
    let mut rt = items_rt();
    if let Value::Object(request) = &mut rt["request"] {
        request.insert("params".to_string(), json!({ "id": "2" }));
    }

    let by_path = expect_value(
        ops.dispatch(
            "findById",
            &args(json!({ "source": "$ctx.data", "id": "$request.params.id" })),
            &mut rt,
        )
        .expect("lookup by path"),
    );
    assert_eq!(by_path["name"], json!("echo"));

    let by_literal = expect_value(
        ops.dispatch("findById", &args(json!({ "source": "$ctx.data", "id": "3" })), &mut rt)
            .expect("lookup by literal"),
    );
    assert_eq!(by_literal["name"], json!("gamma"));
}

#[test]
fn find_by_id_misses_yield_null() {
    let ops = registry();
    let mut rt = items_rt();
    let output = ops
        .dispatch("findById", &args(json!({ "source": "$ctx.data", "id": "nope" })), &mut rt)
        .expect("lookup");
    assert_eq!(expect_value(output), Value::Null);
}

#[test]
fn check_unique_flags_duplicates_with_409() {
    let ops = registry();
    let mut rt = items_rt();
    let err = ops
        .dispatch(
            "checkUnique",
            &args(json!({ "source": "$ctx.data", "field": "name", "value": "echo" })),
            &mut rt,
        )
        .expect_err("duplicate must conflict");
    assert_eq!(err.status, 409);
    assert_eq!(err.message, "duplicate value 'echo' for field 'name'");
}

#[test]
fn check_unique_honors_exclude_id() {
    let ops = registry();
    let mut rt = items_rt();
    ops.dispatch(
        "checkUnique",
        &args(json!({
            "source": "$ctx.data",
            "field": "name",
            "value": "echo",
            "excludeId": "2",
        })),
        &mut rt,
    )
    .expect("excluded record must not conflict");
}

#[test]
fn check_unique_passes_on_fresh_values() {
    let ops = registry();
    let mut rt = items_rt();
    ops.dispatch(
        "checkUnique",
        &args(json!({ "source": "$ctx.data", "field": "name", "value": "zulu" })),
        &mut rt,
    )
    .expect("fresh value passes");
}

// ============================================================================
// SECTION: Body Validation
// ============================================================================

#[test]
fn validate_body_reports_missing_required_fields() {
    let ops = registry();
    let mut rt = json!({ "request": { "body": {} }, "ctx": {} });
    let err = ops
        .dispatch(
            "validateBody",
            &args(json!({
                "schema": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } },
                },
            })),
            &mut rt,
        )
        .expect_err("empty body must fail validation");
    assert_eq!(err.status, 400);
    assert!(err.message.starts_with("validation failed: "), "got: {}", err.message);
    assert!(err.message.contains("name"), "got: {}", err.message);
}

#[test]
fn validate_body_accepts_conforming_bodies() {
    let ops = registry();
    let mut rt = json!({ "request": { "body": { "name": "ok" } }, "ctx": {} });
    ops.dispatch(
        "validateBody",
        &args(json!({
            "schema": {
                "type": "object",
                "required": ["name"],
                "properties": { "name": { "type": "string" } },
            },
        })),
        &mut rt,
    )
    .expect("conforming body passes");
}

#[test]
fn validate_body_without_schema_is_a_no_op() {
    let ops = registry();
    let mut rt = json!({ "request": { "body": {} }, "ctx": {} });
    ops.dispatch("validateBody", &Map::new(), &mut rt).expect("missing schema passes");
}

// ============================================================================
// SECTION: Identifier Assignment
// ============================================================================

#[test]
fn assign_id_uses_prefix_and_never_collides() {
    let ops = registry();
    let mut rt = json!({ "request": {}, "ctx": {} });

    let first = expect_value(
        ops.dispatch("assignId", &args(json!({ "prefix": "u_" })), &mut rt).expect("first id"),
    );
    let second = expect_value(
        ops.dispatch("assignId", &args(json!({ "prefix": "u_" })), &mut rt).expect("second id"),
    );

    let first = first.as_str().expect("id string");
    let second = second.as_str().expect("id string");
    assert!(first.starts_with("u_"));
    assert_ne!(first, second);
}

#[test]
fn assign_id_defaults_its_prefix() {
    let ops = registry();
    let mut rt = json!({ "request": {}, "ctx": {} });
    let id = expect_value(ops.dispatch("assignId", &Map::new(), &mut rt).expect("id"));
    assert!(id.as_str().expect("id string").starts_with("id_"));
}

// ============================================================================
// SECTION: Respond and Dispatch
// ============================================================================

#[test]
fn respond_composes_status_headers_and_body() {
    let ops = registry();
    let mut rt = json!({ "request": {}, "ctx": { "result": { "ok": true } } });
    let output = ops
        .dispatch(
            "respond",
            &args(json!({
                "status": 201,
                "headers": { "x-flow": "$ctx.result.ok" },
                "bodyFrom": "$ctx.result",
            })),
            &mut rt,
        )
        .expect("respond");

    let OpOutput::Respond(response) = output else {
        panic!("expected respond output");
    };
    assert_eq!(response.status, 201);
    assert_eq!(response.headers.get("x-flow").map(String::as_str), Some("true"));
    assert_eq!(response.body, json!({ "ok": true }));
}

#[test]
fn respond_defaults_to_empty_object_body() {
    let ops = registry();
    let mut rt = json!({ "request": {}, "ctx": {} });
    let output = ops.dispatch("respond", &Map::new(), &mut rt).expect("respond");
    let OpOutput::Respond(response) = output else {
        panic!("expected respond output");
    };
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({}));
}

#[test]
fn unknown_operations_are_reported_by_name() {
    let ops = registry();
    let mut rt = json!({ "request": {}, "ctx": {} });
    let err = ops.dispatch("teleport", &Map::new(), &mut rt).expect_err("unknown op");
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "unknown op: teleport");
}
