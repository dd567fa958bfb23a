// crates/artifact-gateway-config/src/loader.rs
// ============================================================================
// Module: Document Loaders
// Description: Registry index and flow document loading from the repository.
// Purpose: Parse startup and per-request documents with format fallback.
// Dependencies: artifact-gateway-core, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! The registry index is strict JSON and loads once at startup; any failure
//! is fatal to the process. Flow documents load from `<repo>/flows/` on every
//! execution: YAML is tried first, then strict JSON, and a document that
//! yields no steps under either format is rejected with `parse flow failed`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use artifact_gateway_core::Flow;
use artifact_gateway_core::FlowLoadError;
use artifact_gateway_core::FlowSource;
use artifact_gateway_core::Registry;
use thiserror::Error;

// ============================================================================
// SECTION: Registry Loading
// ============================================================================

/// Registry loading errors.
#[derive(Debug, Error)]
pub enum RegistryLoadError {
    /// The registry index could not be read.
    #[error("read registry {path}: {reason}")]
    Read {
        /// Path of the registry index.
        path: String,
        /// Underlying read failure.
        reason: String,
    },
    /// The registry index was not valid JSON.
    #[error("parse registry {path}: {reason}")]
    Parse {
        /// Path of the registry index.
        path: String,
        /// Underlying parse failure.
        reason: String,
    },
}

/// Loads the registry index from the given path as strict JSON.
///
/// # Errors
///
/// Returns [`RegistryLoadError`] when the file is unreadable or malformed.
pub fn load_registry(path: &Path) -> Result<Registry, RegistryLoadError> {
    let contents = fs::read_to_string(path).map_err(|err| RegistryLoadError::Read {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|err| RegistryLoadError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

// ============================================================================
// SECTION: Flow Loading
// ============================================================================

/// Flow source reading documents from `<repo>/flows/` on every load.
///
/// # Invariants
/// - No caching: edits to flow files are observed by the next request.
pub struct FsFlowSource {
    /// Repository root containing the `flows/` directory.
    repo: PathBuf,
}

impl FsFlowSource {
    /// Creates a flow source rooted at the given repository path.
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
        }
    }

    /// Returns the on-disk path for a flow filename.
    #[must_use]
    pub fn flow_path(&self, flow_file: &str) -> PathBuf {
        self.repo.join("flows").join(flow_file)
    }
}

impl FlowSource for FsFlowSource {
    fn load(&self, flow_file: &str) -> Result<Flow, FlowLoadError> {
        let path = self.flow_path(flow_file);
        let contents = fs::read_to_string(&path).map_err(|err| FlowLoadError::Read {
            file: flow_file.to_string(),
            reason: err.to_string(),
        })?;
        parse_flow(flow_file, &contents)
    }
}

/// Parses flow text as YAML, then strict JSON, requiring non-empty steps.
///
/// # Errors
///
/// Returns [`FlowLoadError::Parse`] when neither format yields steps.
pub fn parse_flow(flow_file: &str, contents: &str) -> Result<Flow, FlowLoadError> {
    if let Ok(flow) = serde_yaml::from_str::<Flow>(contents)
        && !flow.steps.is_empty()
    {
        return Ok(flow);
    }
    if let Ok(flow) = serde_json::from_str::<Flow>(contents)
        && !flow.steps.is_empty()
    {
        return Ok(flow);
    }
    Err(FlowLoadError::Parse(flow_file.to_string()))
}
