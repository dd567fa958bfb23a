// crates/artifact-gateway-core/src/interfaces/mod.rs
// ============================================================================
// Module: Engine Interfaces
// Description: Backend-agnostic interfaces for datasets and flow documents.
// Purpose: Define the seams between the executor and its storage backends.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The executor reaches the filesystem only through these interfaces. A
//! [`DatasetStore`] owns the persistence and locking discipline for named
//! datasets; a [`FlowSource`] resolves flow filenames into parsed documents.
//! Implementations must be deterministic, must not panic on malformed data,
//! and are shared across request tasks behind `Arc`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::flow::Flow;

// ============================================================================
// SECTION: Dataset Store
// ============================================================================

/// Dataset persistence errors.
///
/// # Invariants
/// - Variants are stable for programmatic status mapping.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the requested identifier exists.
    #[error("record not found")]
    NotFound,
    /// Reading or writing dataset state failed.
    #[error("dataset io error: {0}")]
    Io(String),
    /// Serializing dataset state failed.
    #[error("dataset serialization error: {0}")]
    Serialize(String),
}

/// Named dataset store with serialized mutations.
///
/// # Invariants
/// - Mutations to one dataset are serialized; each holds its dataset lock
///   across the full read-modify-write sequence.
/// - `load` reflects seed data when no state exists but never materializes
///   seeds into state.
pub trait DatasetStore: Send + Sync {
    /// Loads the current contents of a dataset.
    ///
    /// Resolution order: persisted state, then seed data (with `seed`
    /// overriding the conventional seed filename), then an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store itself fails; missing files are
    /// not errors.
    fn load(&self, dataset: &str, seed: Option<&str>) -> Result<Value, StoreError>;

    /// Appends a record to a dataset and persists the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails.
    fn insert(
        &self,
        dataset: &str,
        record: Map<String, Value>,
    ) -> Result<Map<String, Value>, StoreError>;

    /// Shallow-merges a patch into the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches, or another
    /// [`StoreError`] when persistence fails.
    fn update(
        &self,
        dataset: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>, StoreError>;

    /// Removes the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches, or another
    /// [`StoreError`] when persistence fails.
    fn delete(&self, dataset: &str, id: &str) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Flow Source
// ============================================================================

/// Flow loading errors.
#[derive(Debug, Error)]
pub enum FlowLoadError {
    /// The flow file could not be read.
    #[error("read flow {file}: {reason}")]
    Read {
        /// Flow filename as referenced by the registry.
        file: String,
        /// Underlying read failure.
        reason: String,
    },
    /// The flow file parsed as neither YAML nor JSON with non-empty steps.
    #[error("parse flow failed: {0}")]
    Parse(String),
}

/// Resolver from flow filenames to parsed flow documents.
pub trait FlowSource: Send + Sync {
    /// Loads and parses the named flow document.
    ///
    /// # Errors
    ///
    /// Returns [`FlowLoadError`] when the file is unreadable or yields no
    /// steps under either supported format.
    fn load(&self, flow_file: &str) -> Result<Flow, FlowLoadError>;
}
