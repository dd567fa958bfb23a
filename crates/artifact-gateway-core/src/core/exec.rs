// crates/artifact-gateway-core/src/core/exec.rs
// ============================================================================
// Module: Execution Request and Response
// Description: Host-facing request and response types for flow execution.
// Purpose: Decouple the engine from any particular HTTP framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The host adapter builds an [`ExecRequest`] from an incoming HTTP request
//! and hands it to the executor; the executor returns an [`ExecResponse`]
//! that the host serializes. `query` and `headers` are multi-valued here and
//! collapsed to scalars-or-lists only when the runtime tree is built.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Canonical request handed to the flow executor.
///
/// # Invariants
/// - `query` and `headers` own their data; mutations of the originating HTTP
///   request must not be observable through them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecRequest {
    /// HTTP method.
    pub method: String,
    /// Route template that matched the request (for example `/v1/users/:id`).
    pub path: String,
    /// Path parameters extracted from the route.
    pub params: BTreeMap<String, String>,
    /// Multi-valued query parameters.
    pub query: BTreeMap<String, Vec<String>>,
    /// Multi-valued request headers, keyed by lowercase name.
    pub headers: BTreeMap<String, Vec<String>>,
    /// Parsed JSON request body; empty object when the body was empty.
    pub body: Map<String, Value>,
    /// Auxiliary dataset values injected by the host or override header.
    pub dataset: Map<String, Value>,
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// Response produced by a flow's `respond` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body value.
    pub body: Value,
}

impl ExecResponse {
    /// Returns the response produced by flows that never respond.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: BTreeMap::new(),
            body: Value::Null,
        }
    }

    /// Serializes the body to JSON bytes for host transmission.
    #[must_use]
    pub fn body_json(&self) -> Vec<u8> {
        serde_json::to_vec(&self.body).unwrap_or_else(|_| b"null".to_vec())
    }
}
