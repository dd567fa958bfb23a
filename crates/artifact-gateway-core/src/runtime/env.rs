// crates/artifact-gateway-core/src/runtime/env.rs
// ============================================================================
// Module: Runtime Environment
// Description: Construction of the per-request runtime tree.
// Purpose: Materialize the `request`/`ctx` tree path expressions evaluate on.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Each execution owns a fresh runtime tree with exactly two roots:
//! `request`, a snapshot of the incoming request, and `ctx`, the mapping
//! step outputs are bound into. Multi-valued query parameters and headers
//! collapse to a scalar when they carry a single value; headers with no
//! values are dropped while empty query parameters keep an empty list.
//! The tree never escapes its request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::core::exec::ExecRequest;

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the runtime tree for one execution of a flow.
#[must_use]
pub fn build_runtime(req: &ExecRequest) -> Value {
    let params: Map<String, Value> = req
        .params
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    json!({
        "request": {
            "method": req.method.clone(),
            "path": req.path.clone(),
            "params": params,
            "query": query_to_simple(&req.query),
            "headers": headers_to_simple(&req.headers),
            "body": Value::Object(req.body.clone()),
            "dataset": Value::Object(req.dataset.clone()),
        },
        "ctx": {},
    })
}

/// Collapses multi-valued query parameters to scalars or lists.
fn query_to_simple(query: &BTreeMap<String, Vec<String>>) -> Value {
    let mut out = Map::new();
    for (key, values) in query {
        out.insert(key.clone(), simple_value(values));
    }
    Value::Object(out)
}

/// Collapses multi-valued headers, dropping headers with no values.
fn headers_to_simple(headers: &BTreeMap<String, Vec<String>>) -> Value {
    let mut out = Map::new();
    for (key, values) in headers {
        if values.is_empty() {
            continue;
        }
        out.insert(key.clone(), simple_value(values));
    }
    Value::Object(out)
}

/// Renders a value list as a scalar when it has exactly one element.
fn simple_value(values: &[String]) -> Value {
    if values.len() == 1 {
        Value::String(values[0].clone())
    } else {
        Value::Array(values.iter().map(|value| Value::String(value.clone())).collect())
    }
}
