// crates/artifact-gateway-core/src/core/record.rs
// ============================================================================
// Module: Dataset Records
// Description: Identifier matching and patch semantics for dataset records.
// Purpose: Keep record identity and merge rules identical across stores.
// Dependencies: crate::core::value, serde_json
// ============================================================================

//! ## Overview
//! A dataset is a JSON array whose object elements each carry a string `id`
//! unique within the dataset. Identity comparison goes through the display
//! string coercion so numeric and string ids compare consistently. Patching
//! is a right-biased shallow merge: patch keys overwrite, other keys are
//! preserved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::value::to_display_string;

// ============================================================================
// SECTION: Record Identity
// ============================================================================

/// Returns the display-string identifier of a record, empty when absent.
#[must_use]
pub fn record_id(record: &Map<String, Value>) -> String {
    record.get("id").map(to_display_string).unwrap_or_default()
}

/// Finds the index of the first object record whose `id` matches.
///
/// Non-object elements never match.
#[must_use]
pub fn find_by_id(records: &[Value], id: &str) -> Option<usize> {
    records.iter().position(|item| {
        item.as_object().is_some_and(|record| record_id(record) == id)
    })
}

// ============================================================================
// SECTION: Patching
// ============================================================================

/// Applies a right-biased shallow merge of `patch` into `record`.
pub fn merge_patch(record: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        record.insert(key.clone(), value.clone());
    }
}
