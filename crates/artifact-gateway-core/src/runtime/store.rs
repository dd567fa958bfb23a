// crates/artifact-gateway-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Stores
// Description: In-memory dataset store and flow source for tests and demos.
// Purpose: Provide deterministic engine backends without filesystem access.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! These implementations keep datasets and flows in process memory behind a
//! mutex. They mirror the persistence semantics of the file-backed store,
//! including the seed fallback that never materializes into state, and are
//! not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Map;
use serde_json::Value;

use crate::core::flow::Flow;
use crate::core::record::find_by_id;
use crate::core::record::merge_patch;
use crate::interfaces::DatasetStore;
use crate::interfaces::FlowLoadError;
use crate::interfaces::FlowSource;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Dataset Store
// ============================================================================

/// In-memory dataset store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDatasetStore {
    /// Mutable state per dataset name.
    state: Arc<Mutex<BTreeMap<String, Vec<Value>>>>,
    /// Seed data per dataset name, returned when no state exists.
    seeds: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl InMemoryDatasetStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs seed contents for a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the seed table is poisoned.
    pub fn set_seed(&self, dataset: &str, contents: Value) -> Result<(), StoreError> {
        self.seeds
            .lock()
            .map_err(|_| StoreError::Io("seed table mutex poisoned".to_string()))?
            .insert(dataset.to_string(), contents);
        Ok(())
    }

    /// Returns the persisted state of a dataset, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state table is poisoned.
    pub fn state_of(&self, dataset: &str) -> Result<Option<Vec<Value>>, StoreError> {
        Ok(self.lock_state()?.get(dataset).cloned())
    }

    fn lock_state(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<Value>>>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Io("state table mutex poisoned".to_string()))
    }
}

impl DatasetStore for InMemoryDatasetStore {
    fn load(&self, dataset: &str, _seed: Option<&str>) -> Result<Value, StoreError> {
        if let Some(records) = self.lock_state()?.get(dataset) {
            return Ok(Value::Array(records.clone()));
        }
        let seeds = self
            .seeds
            .lock()
            .map_err(|_| StoreError::Io("seed table mutex poisoned".to_string()))?;
        if let Some(contents) = seeds.get(dataset) {
            return Ok(contents.clone());
        }
        Ok(Value::Array(Vec::new()))
    }

    fn insert(
        &self,
        dataset: &str,
        record: Map<String, Value>,
    ) -> Result<Map<String, Value>, StoreError> {
        let mut state = self.lock_state()?;
        state.entry(dataset.to_string()).or_default().push(Value::Object(record.clone()));
        Ok(record)
    }

    fn update(
        &self,
        dataset: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>, StoreError> {
        let mut state = self.lock_state()?;
        let records = state.entry(dataset.to_string()).or_default();
        let index = find_by_id(records, id).ok_or(StoreError::NotFound)?;
        let Some(record) = records[index].as_object_mut() else {
            return Err(StoreError::NotFound);
        };
        merge_patch(record, patch);
        Ok(record.clone())
    }

    fn delete(&self, dataset: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock_state()?;
        let records = state.entry(dataset.to_string()).or_default();
        let index = find_by_id(records, id).ok_or(StoreError::NotFound)?;
        records.remove(index);
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Flow Source
// ============================================================================

/// In-memory flow source keyed by flow filename.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFlowSource {
    /// Parsed flows keyed by filename.
    flows: Arc<Mutex<BTreeMap<String, Flow>>>,
}

impl InMemoryFlowSource {
    /// Creates an empty flow source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a flow under the given filename.
    ///
    /// # Errors
    ///
    /// Returns [`FlowLoadError`] when the flow table is poisoned.
    pub fn set_flow(&self, flow_file: &str, flow: Flow) -> Result<(), FlowLoadError> {
        self.flows
            .lock()
            .map_err(|_| FlowLoadError::Read {
                file: flow_file.to_string(),
                reason: "flow table mutex poisoned".to_string(),
            })?
            .insert(flow_file.to_string(), flow);
        Ok(())
    }
}

impl FlowSource for InMemoryFlowSource {
    fn load(&self, flow_file: &str) -> Result<Flow, FlowLoadError> {
        let flows = self.flows.lock().map_err(|_| FlowLoadError::Read {
            file: flow_file.to_string(),
            reason: "flow table mutex poisoned".to_string(),
        })?;
        let Some(flow) = flows.get(flow_file) else {
            return Err(FlowLoadError::Read {
                file: flow_file.to_string(),
                reason: "flow not installed".to_string(),
            });
        };
        if flow.steps.is_empty() {
            return Err(FlowLoadError::Parse(flow_file.to_string()));
        }
        Ok(flow.clone())
    }
}
