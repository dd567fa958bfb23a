// crates/artifact-gateway-core/src/core/registry.rs
// ============================================================================
// Module: Endpoint Registry
// Description: Registry document enumerating endpoints and their flows.
// Purpose: Provide the immutable startup contract between routes and flows.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The registry is loaded once at startup and never mutated. Each endpoint
//! binds an HTTP verb and route template to a flow file under the
//! repository's `flows/` directory. The effective base path for route
//! registration comes from gateway configuration; the registry's own
//! `basePath` field is carried for introspection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Registry Types
// ============================================================================

/// Endpoint registry loaded from `api/index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    /// Registry document version.
    pub version: String,
    /// Declared base path for the endpoint set.
    #[serde(rename = "basePath")]
    pub base_path: String,
    /// Ordered endpoint definitions.
    pub endpoints: Vec<EndpointDef>,
}

/// A single endpoint definition.
///
/// # Invariants
/// - `method` is an HTTP verb name.
/// - `path` is a route template such as `/users/:id`.
/// - `flow` is a filename relative to the repository `flows/` directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointDef {
    /// Endpoint identifier.
    pub id: String,
    /// HTTP verb.
    pub method: String,
    /// Route template relative to the base path.
    pub path: String,
    /// Flow filename handling this endpoint.
    pub flow: String,
}

// ============================================================================
// SECTION: Path Joining
// ============================================================================

/// Joins a base path and a route template with single-slash normalization.
#[must_use]
pub fn clean_join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        return format!("/{path}");
    }
    format!("{base}/{path}")
}
