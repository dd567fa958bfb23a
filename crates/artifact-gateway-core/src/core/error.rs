// crates/artifact-gateway-core/src/core/error.rs
// ============================================================================
// Module: Engine Errors
// Description: Structured errors carried through flow execution.
// Purpose: Attach HTTP statuses and step identity to every failure path.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every failing operation produces a [`StepError`] with an HTTP status and a
//! human-readable message; the executor stamps the failing step's identifier
//! before surfacing it. Cancellation is not an HTTP condition and travels as
//! its own [`ExecError`] variant so the host can choose a status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Step Errors
// ============================================================================

/// Structured failure of a single flow step.
///
/// # Invariants
/// - `status` is the HTTP status the host should surface.
/// - `step_id` is set by the executor when the failing step is known.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StepError {
    /// Identifier of the failing step, when known.
    pub step_id: Option<String>,
    /// HTTP status to surface.
    pub status: u16,
    /// Human-readable failure message.
    pub message: String,
}

impl StepError {
    /// Creates a step error with the given status.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            step_id: None,
            status,
            message: message.into(),
        }
    }

    /// Creates an internal (status 500) step error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// Returns the error stamped with the given step identifier.
    #[must_use]
    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }
}

// ============================================================================
// SECTION: Execution Errors
// ============================================================================

/// Terminal outcome of a failed flow execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The request's cancellation handle fired between steps.
    #[error("flow execution cancelled")]
    Cancelled,
    /// A step failed and no inline action recovered it.
    #[error(transparent)]
    Step(#[from] StepError),
}
