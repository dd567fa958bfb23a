// crates/artifact-gateway-core/src/runtime/executor.rs
// ============================================================================
// Module: Flow Executor
// Description: Ordered step execution with guards, recovery, and cancellation.
// Purpose: Run one flow per request as the single canonical execution path.
// Dependencies: crate::{core, interfaces, runtime}, tokio-util
// ============================================================================

//! ## Overview
//! The executor walks a flow's steps in order over a runtime tree it owns for
//! the duration of the request. Before each step it honors the request's
//! cancellation handle; a present guard can skip the step; dispatch failures
//! route through the step's inline conflict action when one is declared,
//! otherwise they terminate the request with the step identity attached.
//! Step results bind into `ctx` as deep copies, and a `respond` operation
//! short-circuits with its response. A flow that runs to completion without
//! responding yields 204.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::core::condition::eval_condition;
use crate::core::error::ExecError;
use crate::core::error::StepError;
use crate::core::exec::ExecRequest;
use crate::core::exec::ExecResponse;
use crate::core::flow::FlowStep;
use crate::interfaces::DatasetStore;
use crate::interfaces::FlowSource;
use crate::runtime::env::build_runtime;
use crate::runtime::ops::OpOutput;
use crate::runtime::ops::OpRegistry;
use crate::runtime::ops::build_response;

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Flow executor shared across request tasks.
///
/// # Invariants
/// - The runtime tree built for a request never escapes that request.
/// - Observable effects of one execution occur in step order.
pub struct FlowExecutor {
    /// Flow document resolver.
    flows: Arc<dyn FlowSource>,
    /// Operation registry, fully populated at construction.
    ops: OpRegistry,
}

impl FlowExecutor {
    /// Creates an executor with the built-in operation set.
    #[must_use]
    pub fn new(flows: Arc<dyn FlowSource>, store: Arc<dyn DatasetStore>) -> Self {
        Self {
            flows,
            ops: OpRegistry::with_builtin_ops(store),
        }
    }

    /// Creates an executor with a caller-provided operation registry.
    #[must_use]
    pub fn with_ops(flows: Arc<dyn FlowSource>, ops: OpRegistry) -> Self {
        Self {
            flows,
            ops,
        }
    }

    /// Executes the named flow against the request.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Cancelled`] when the cancellation handle fires
    /// between steps, or [`ExecError::Step`] when a step fails without an
    /// inline recovery.
    pub fn run(
        &self,
        cancel: &CancellationToken,
        flow_file: &str,
        req: &ExecRequest,
    ) -> Result<ExecResponse, ExecError> {
        let flow = self
            .flows
            .load(flow_file)
            .map_err(|err| StepError::internal(format!("failed to load flow: {err}")))?;

        let mut rt = build_runtime(req);

        for step in &flow.steps {
            if cancel.is_cancelled() {
                return Err(ExecError::Cancelled);
            }

            if !step.when.is_empty() {
                match eval_condition(&step.when, &rt) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        let failure = StepError::internal(format!("when eval failed: {err}"))
                            .with_step(step.id.clone());
                        return handle_error(step, failure).map_err(ExecError::Step);
                    }
                }
            }

            let output = match self.ops.dispatch(&step.op, &step.args, &mut rt) {
                Ok(output) => output,
                Err(err) => {
                    return handle_error(step, err).map_err(ExecError::Step);
                }
            };

            match output {
                OpOutput::Respond(response) => return Ok(response),
                OpOutput::Value(value) => {
                    if !step.out.is_empty() {
                        bind_output(&mut rt, &step.out, value);
                    }
                }
                OpOutput::None => {
                    if !step.out.is_empty() {
                        bind_output(&mut rt, &step.out, Value::Null);
                    }
                }
            }
        }

        Ok(ExecResponse::no_content())
    }
}

// ============================================================================
// SECTION: Error Routing
// ============================================================================

/// Routes a step failure through its inline conflict action, when declared.
///
/// A `respond` conflict action renders against a synthesized
/// `{error: {message, status}}` runtime and recovers the request; anything
/// else re-raises the failure stamped with the step identity.
fn handle_error(step: &FlowStep, err: StepError) -> Result<ExecResponse, StepError> {
    if let Some(action) = &step.on_conflict
        && action.op == "respond"
    {
        let error_rt = json!({
            "error": {
                "message": err.message,
                "status": err.status,
            }
        });
        return Ok(build_response(&action.args, &error_rt));
    }
    Err(err.with_step(step.id.clone()))
}

/// Binds a step result under its `ctx` key.
///
/// The bound value is owned by the runtime tree; operations hand back
/// independent copies, so later mutations of the request body or dataset
/// contents cannot leak into `ctx`.
fn bind_output(rt: &mut Value, out: &str, value: Value) {
    if let Some(ctx) = rt.get_mut("ctx").and_then(Value::as_object_mut) {
        ctx.insert(out.to_string(), value);
    }
}
