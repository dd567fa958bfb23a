// crates/artifact-gateway-server/src/adapter.rs
// ============================================================================
// Module: Request Adapter
// Description: ExecRequest construction from incoming HTTP requests.
// Purpose: Snapshot request data and apply the debug override header.
// Dependencies: artifact-gateway-core, axum, serde_json, url
// ============================================================================

//! ## Overview
//! The adapter copies an incoming request into an [`ExecRequest`]: route
//! template, path parameters, multi-valued query and headers, and the parsed
//! JSON body. All maps own their data, so mutating the source request after
//! construction is never observable. The `X-Artifact-Request` header, when
//! present, carries a JSON object overriding any request field: `method` and
//! `path` accept non-empty strings; `params`, `body`, and `dataset`
//! shallow-merge; `query` values normalize to string lists with null
//! deleting the key; `headers` normalize the same way but null values are
//! ignored rather than deleting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use artifact_gateway_core::ExecRequest;
use artifact_gateway_core::to_display_string;
use axum::http::HeaderMap;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying JSON request overrides, enabled unconditionally.
pub const OVERRIDE_HEADER: &str = "x-artifact-request";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request adaptation errors; all surface as HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The request body was not a JSON object.
    #[error("failed to read request body: {0}")]
    Body(String),
    /// The override header was not a JSON document.
    #[error("invalid X-Artifact-Request header: {0}")]
    OverrideParse(String),
    /// An override field had a non-object shape.
    #[error("{0} must be an object")]
    OverrideShape(&'static str),
}

// ============================================================================
// SECTION: Request Construction
// ============================================================================

/// Builds an [`ExecRequest`] from the pieces of an incoming HTTP request.
///
/// `path` is the registry route template that matched, not the concrete URL.
/// Header names are normalized to lowercase. When the override header is
/// present its overrides are applied before returning.
///
/// # Errors
///
/// Returns [`AdapterError`] when the body or override header is malformed.
pub fn build_exec_request(
    method: &str,
    path: &str,
    params: BTreeMap<String, String>,
    raw_query: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ExecRequest, AdapterError> {
    let mut req = ExecRequest {
        method: method.to_string(),
        path: path.to_string(),
        params,
        query: parse_query(raw_query),
        headers: copy_headers(headers),
        body: parse_body(body)?,
        dataset: Map::new(),
    };

    let override_raw = headers
        .get(OVERRIDE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !override_raw.is_empty() {
        apply_request_overrides(&mut req, override_raw)?;
    }

    Ok(req)
}

/// Parses a raw query string into an ordered multi-valued map.
fn parse_query(raw_query: &str) -> BTreeMap<String, Vec<String>> {
    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(raw_query.as_bytes()) {
        query.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    query
}

/// Deep-copies headers into an owned multi-valued map, dropping empty lists.
fn copy_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut copied: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let rendered = String::from_utf8_lossy(value.as_bytes()).into_owned();
        copied.entry(name.as_str().to_string()).or_default().push(rendered);
    }
    copied
}

/// Parses body bytes as a JSON object.
///
/// Empty and whitespace-only bodies yield an empty object, as does a JSON
/// `null`; any other non-object document is rejected.
fn parse_body(body: &[u8]) -> Result<Map<String, Value>, AdapterError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let parsed: Value =
        serde_json::from_str(&text).map_err(|err| AdapterError::Body(err.to_string()))?;
    match parsed {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(AdapterError::Body("body must be a JSON object".to_string())),
    }
}

// ============================================================================
// SECTION: Override Application
// ============================================================================

/// Applies `X-Artifact-Request` overrides to a built request.
///
/// # Errors
///
/// Returns [`AdapterError`] when the payload is not a JSON document or a
/// map-valued field has a non-object shape.
pub fn apply_request_overrides(req: &mut ExecRequest, raw: &str) -> Result<(), AdapterError> {
    let payload: Value =
        serde_json::from_str(raw).map_err(|err| AdapterError::OverrideParse(err.to_string()))?;
    // A JSON null payload overrides nothing.
    if payload.is_null() {
        return Ok(());
    }
    let Value::Object(payload) = payload else {
        return Err(AdapterError::OverrideParse("payload must be an object".to_string()));
    };

    if let Some(Value::String(method)) = payload.get("method")
        && !method.is_empty()
    {
        req.method = method.clone();
    }
    if let Some(Value::String(path)) = payload.get("path")
        && !path.is_empty()
    {
        req.path = path.clone();
    }

    if let Some(params) = object_field(&payload, "params")? {
        for (key, value) in params {
            req.params.insert(key.clone(), to_display_string(value));
        }
    }

    if let Some(query) = object_field(&payload, "query")? {
        for (key, value) in query {
            match normalize_strings(value) {
                Some(values) => {
                    req.query.insert(key.clone(), values);
                }
                // A null query value deletes the parameter.
                None => {
                    req.query.remove(key);
                }
            }
        }
    }

    if let Some(headers) = object_field(&payload, "headers")? {
        for (key, value) in headers {
            if let Some(values) = normalize_strings(value) {
                req.headers.insert(key.clone(), values);
            }
            // Null header values are ignored, not deletions.
        }
    }

    if let Some(body) = object_field(&payload, "body")? {
        for (key, value) in body {
            req.body.insert(key.clone(), value.clone());
        }
    }

    if let Some(dataset) = object_field(&payload, "dataset")? {
        for (key, value) in dataset {
            req.dataset.insert(key.clone(), value.clone());
        }
    }

    Ok(())
}

/// Returns a named override field as an object, treating null as absent.
fn object_field<'a>(
    payload: &'a Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a Map<String, Value>>, AdapterError> {
    match payload.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(AdapterError::OverrideShape(name)),
    }
}

/// Normalizes an override value to a list of strings; null yields `None`.
fn normalize_strings(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(items.iter().map(to_display_string).collect()),
        other => Some(vec![to_display_string(other)]),
    }
}
