// crates/artifact-gateway-store/src/store.rs
// ============================================================================
// Module: File Dataset Store
// Description: Durable DatasetStore backed by per-dataset JSON files.
// Purpose: Persist dataset mutations with serialized read-modify-write.
// Dependencies: artifact-gateway-core, serde_json
// ============================================================================

//! ## Overview
//! Each dataset lives as a pretty-printed JSON array at
//! `<repo>/.runtime/state/<dataset>.json`, seeded on read from
//! `<repo>/data/seed.<dataset>.v1.json` when no state exists. Seed contents
//! are never materialized into the state file; the first mutation persists
//! only what the state file held plus the mutation. A per-dataset lock table
//! serializes every access across its full read-modify-write sequence, so
//! concurrent mutations to one dataset cannot lose updates. Unparseable
//! state is treated as absent rather than failing the mutation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use artifact_gateway_core::DatasetStore;
use artifact_gateway_core::StoreError;
use artifact_gateway_core::find_by_id;
use artifact_gateway_core::merge_patch;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: File Store
// ============================================================================

/// File-backed dataset store rooted at the repository directory.
///
/// # Invariants
/// - All access to one dataset holds that dataset's lock end to end.
/// - State files are rewritten whole with 2-space indentation.
pub struct FsDatasetStore {
    /// Repository root containing `data/` and `.runtime/state/`.
    repo: PathBuf,
    /// Per-dataset locks, created on first use.
    locks: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

impl FsDatasetStore {
    /// Creates a store rooted at the given repository path.
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            locks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the state file path for a dataset.
    #[must_use]
    pub fn state_path(&self, dataset: &str) -> PathBuf {
        self.repo.join(".runtime").join("state").join(format!("{dataset}.json"))
    }

    /// Returns the seed file path for a dataset, honoring an override name.
    #[must_use]
    pub fn seed_path(&self, dataset: &str, seed: Option<&str>) -> PathBuf {
        let name = seed.map_or_else(|| format!("seed.{dataset}.v1.json"), str::to_string);
        self.repo.join("data").join(name)
    }

    /// Acquires the lock handle for a dataset, creating it on first use.
    fn lock_handle(&self, dataset: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut table = self
            .locks
            .lock()
            .map_err(|_| StoreError::Io("dataset lock table poisoned".to_string()))?;
        Ok(Arc::clone(table.entry(dataset.to_string()).or_default()))
    }

    /// Reads the state file as a record list, treating bad state as absent.
    fn read_state_records(&self, dataset: &str) -> Vec<Value> {
        read_json(&self.state_path(dataset))
            .and_then(|contents| match contents {
                Value::Array(records) => Some(records),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Pretty-prints records into the state file, creating parent directories.
    fn write_state_records(&self, dataset: &str, records: &[Value]) -> Result<(), StoreError> {
        let path = self.state_path(dataset);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| StoreError::Io(format!("mkdir {}: {err}", parent.display())))?;
        }
        let rendered = serde_json::to_string_pretty(records)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        fs::write(&path, rendered)
            .map_err(|err| StoreError::Io(format!("write {}: {err}", path.display())))
    }
}

impl DatasetStore for FsDatasetStore {
    fn load(&self, dataset: &str, seed: Option<&str>) -> Result<Value, StoreError> {
        let handle = self.lock_handle(dataset)?;
        let _guard =
            handle.lock().map_err(|_| StoreError::Io("dataset lock poisoned".to_string()))?;

        if let Some(contents) = read_json(&self.state_path(dataset)) {
            return Ok(contents);
        }
        if let Some(contents) = read_json(&self.seed_path(dataset, seed)) {
            return Ok(contents);
        }
        Ok(Value::Array(Vec::new()))
    }

    fn insert(
        &self,
        dataset: &str,
        record: Map<String, Value>,
    ) -> Result<Map<String, Value>, StoreError> {
        let handle = self.lock_handle(dataset)?;
        let _guard =
            handle.lock().map_err(|_| StoreError::Io("dataset lock poisoned".to_string()))?;

        let mut records = self.read_state_records(dataset);
        records.push(Value::Object(record.clone()));
        self.write_state_records(dataset, &records)?;
        Ok(record)
    }

    fn update(
        &self,
        dataset: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>, StoreError> {
        let handle = self.lock_handle(dataset)?;
        let _guard =
            handle.lock().map_err(|_| StoreError::Io("dataset lock poisoned".to_string()))?;

        let mut records = self.read_state_records(dataset);
        let index = find_by_id(&records, id).ok_or(StoreError::NotFound)?;
        let merged = {
            let Some(record) = records[index].as_object_mut() else {
                return Err(StoreError::NotFound);
            };
            merge_patch(record, patch);
            record.clone()
        };
        self.write_state_records(dataset, &records)?;
        Ok(merged)
    }

    fn delete(&self, dataset: &str, id: &str) -> Result<(), StoreError> {
        let handle = self.lock_handle(dataset)?;
        let _guard =
            handle.lock().map_err(|_| StoreError::Io("dataset lock poisoned".to_string()))?;

        let mut records = self.read_state_records(dataset);
        let index = find_by_id(&records, id).ok_or(StoreError::NotFound)?;
        records.remove(index);
        self.write_state_records(dataset, &records)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads and parses a JSON file, mapping any failure to absence.
fn read_json(path: &Path) -> Option<Value> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}
