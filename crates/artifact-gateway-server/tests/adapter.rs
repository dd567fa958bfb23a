// crates/artifact-gateway-server/tests/adapter.rs
// ============================================================================
// Module: Request Adapter Tests
// Description: Tests for ExecRequest construction and override application.
// Purpose: Validate snapshot copying, body parsing, and override semantics.
// Dependencies: artifact-gateway-{core,server}, axum, serde_json
// ============================================================================

//! ## Overview
//! Exercises the adapter with raw header maps and query strings: constructed
//! requests own their data, bodies parse with the empty/null/object rules,
//! and the override header replaces, merges, deletes, and ignores fields
//! exactly as specified, including the query/headers null asymmetry.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions."
)]

use std::collections::BTreeMap;

use artifact_gateway_core::ExecRequest;
use artifact_gateway_server::adapter::AdapterError;
use artifact_gateway_server::adapter::apply_request_overrides;
use artifact_gateway_server::adapter::build_exec_request;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use serde_json::json;

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn construction_copies_headers_and_query() {
    let mut headers = HeaderMap::new();
    headers.append("x-test", HeaderValue::from_static("value"));

    let req = build_exec_request(
        "POST",
        "/v1/test/:id",
        BTreeMap::from([("id".to_string(), "123".to_string())]),
        "foo=bar&foo=baz",
        &headers,
        b"",
    )
    .expect("build request");

    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/v1/test/:id");
    assert_eq!(req.params.get("id").map(String::as_str), Some("123"));
    assert_eq!(req.query.get("foo"), Some(&vec!["bar".to_string(), "baz".to_string()]));
    assert_eq!(req.headers.get("x-test"), Some(&vec!["value".to_string()]));

    // Mutating the source header map must not affect the built request.
    headers.append("x-test", HeaderValue::from_static("other"));
    assert_eq!(req.headers.get("x-test"), Some(&vec!["value".to_string()]));
}

#[test]
fn bodies_parse_with_empty_and_null_defaults() {
    let headers = HeaderMap::new();
    let build = |body: &[u8]| {
        build_exec_request("POST", "/t", BTreeMap::new(), "", &headers, body)
    };

    assert!(build(b"").expect("empty").body.is_empty());
    assert!(build(b"  \n\t ").expect("whitespace").body.is_empty());
    assert!(build(b"null").expect("null literal").body.is_empty());

    let object = build(b"{\"key\":\"value\"}").expect("object");
    assert_eq!(object.body.get("key"), Some(&json!("value")));

    let err = build(b"[1,2]").expect_err("arrays are not bodies");
    assert!(matches!(err, AdapterError::Body(_)));
    let err = build(b"{ not json").expect_err("malformed json");
    assert!(matches!(err, AdapterError::Body(_)));
}

#[test]
fn override_header_applies_during_construction() {
    let mut headers = HeaderMap::new();
    headers.append(
        "x-artifact-request",
        HeaderValue::from_static("{\"method\":\"PUT\",\"body\":{\"injected\":true}}"),
    );

    let req = build_exec_request("GET", "/t", BTreeMap::new(), "", &headers, b"")
        .expect("build request");
    assert_eq!(req.method, "PUT");
    assert_eq!(req.body.get("injected"), Some(&json!(true)));
}

// ============================================================================
// SECTION: Override Semantics
// ============================================================================

fn base_request() -> ExecRequest {
    let mut req = ExecRequest {
        method: "GET".to_string(),
        path: "/test".to_string(),
        ..ExecRequest::default()
    };
    req.params.insert("existing".to_string(), "1".to_string());
    req.query.insert("q".to_string(), vec!["a".to_string()]);
    req.headers.insert("x-test".to_string(), vec!["value".to_string()]);
    req
}

#[test]
fn overrides_replace_method_path_and_maps() {
    let mut req = base_request();
    let payload = json!({
        "method": "POST",
        "path": "/other",
        "params": { "new": 2 },
        "query": { "q": ["b"] },
        "headers": { "x-test": ["override"] },
        "body": { "key": "value" },
        "dataset": { "items": [] },
    });

    apply_request_overrides(&mut req, &payload.to_string()).expect("apply overrides");

    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/other");
    // Parameter values coerce to strings.
    assert_eq!(req.params.get("new").map(String::as_str), Some("2"));
    assert_eq!(req.params.get("existing").map(String::as_str), Some("1"));
    assert_eq!(req.query.get("q"), Some(&vec!["b".to_string()]));
    assert_eq!(req.headers.get("x-test"), Some(&vec!["override".to_string()]));
    assert_eq!(req.body.get("key"), Some(&json!("value")));
    assert_eq!(req.dataset.get("items"), Some(&json!([])));
}

#[test]
fn override_scalars_normalize_to_string_lists() {
    let mut req = base_request();
    apply_request_overrides(&mut req, "{\"query\":{\"limit\":25}}").expect("apply overrides");
    assert_eq!(req.query.get("limit"), Some(&vec!["25".to_string()]));
}

#[test]
fn null_query_values_delete_while_null_headers_are_ignored() {
    let mut req = base_request();
    let payload = json!({
        "query": { "q": null },
        "headers": { "x-test": null },
    });

    apply_request_overrides(&mut req, &payload.to_string()).expect("apply overrides");

    assert!(!req.query.contains_key("q"));
    // The header keeps its original value.
    assert_eq!(req.headers.get("x-test"), Some(&vec!["value".to_string()]));
}

#[test]
fn empty_method_and_path_do_not_replace() {
    let mut req = base_request();
    apply_request_overrides(&mut req, "{\"method\":\"\",\"path\":\"\"}").expect("apply overrides");
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/test");
}

#[test]
fn non_object_fields_are_rejected() {
    let mut req = base_request();
    let err = apply_request_overrides(&mut req, "{\"query\": []}").expect_err("bad query shape");
    assert_eq!(err.to_string(), "query must be an object");

    let err = apply_request_overrides(&mut req, "{\"body\": 5}").expect_err("bad body shape");
    assert_eq!(err.to_string(), "body must be an object");
}

#[test]
fn null_payloads_and_fields_are_no_ops() {
    let mut req = base_request();
    apply_request_overrides(&mut req, "null").expect("null payload");
    apply_request_overrides(&mut req, "{\"params\": null}").expect("null field");
    assert_eq!(req, base_request());
}

#[test]
fn malformed_payloads_are_rejected() {
    let mut req = base_request();
    let err = apply_request_overrides(&mut req, "{ nope").expect_err("malformed payload");
    assert!(matches!(err, AdapterError::OverrideParse(_)));

    let err = apply_request_overrides(&mut req, "[1]").expect_err("non-object payload");
    assert!(matches!(err, AdapterError::OverrideParse(_)));
}
