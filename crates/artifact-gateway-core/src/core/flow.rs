// crates/artifact-gateway-core/src/core/flow.rs
// ============================================================================
// Module: Flow Documents
// Description: Declarative flow and step definitions executed per request.
// Purpose: Provide stable, serializable types for endpoint flow programs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A flow is an ordered, declarative program describing how one endpoint
//! handles a request: a list of steps, each naming an operation, its
//! arguments, an optional guard, an optional inline recovery action, and an
//! optional output binding. Flows are authored in YAML or JSON; all optional
//! fields default so sparse documents parse. Loaders reject flows whose
//! `steps` list is empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Flow Types
// ============================================================================

/// A declarative flow document.
///
/// # Invariants
/// - `steps` is non-empty once a flow passes loading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Flow {
    /// Document format version.
    pub version: i64,
    /// Human-readable flow name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Ordered list of steps to execute.
    pub steps: Vec<FlowStep>,
}

/// One instruction in a flow.
///
/// # Invariants
/// - `op` names an operation in the operation registry.
/// - `args` values are literals or `$`-rooted path expressions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowStep {
    /// Step identifier used in error reporting.
    pub id: String,
    /// Operation name to dispatch.
    pub op: String,
    /// Operation arguments keyed by argument name.
    pub args: Map<String, Value>,
    /// Optional guard condition; the step is skipped when it is false.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub when: String,
    /// Optional inline action replacing error propagation for this step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_conflict: Option<InlineAction>,
    /// Optional `ctx` key receiving a deep copy of the step result.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub out: String,
}

/// Inline action invoked in place of error propagation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineAction {
    /// Operation name; only `respond` is meaningful.
    pub op: String,
    /// Operation arguments keyed by argument name.
    pub args: Map<String, Value>,
}
