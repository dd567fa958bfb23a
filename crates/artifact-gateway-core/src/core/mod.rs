// crates/artifact-gateway-core/src/core/mod.rs
// ============================================================================
// Module: Core Types
// Description: Canonical gateway types and total value utilities.
// Purpose: Provide stable building blocks for the flow execution engine.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types define flow and registry documents, execution requests and
//! responses, structured errors, and the value/path/condition utilities the
//! runtime evaluates against. These types are the canonical source of truth
//! for any derived API surface.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod condition;
pub mod error;
pub mod exec;
pub mod flow;
pub mod path;
pub mod record;
pub mod registry;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::ConditionError;
pub use condition::eval_condition;
pub use error::ExecError;
pub use error::StepError;
pub use exec::ExecRequest;
pub use exec::ExecResponse;
pub use flow::Flow;
pub use flow::FlowStep;
pub use flow::InlineAction;
pub use path::eval_arg;
pub use path::resolve;
pub use path::set_path;
pub use path::split_path;
pub use record::find_by_id;
pub use record::merge_patch;
pub use record::record_id;
pub use registry::EndpointDef;
pub use registry::Registry;
pub use registry::clean_join;
pub use value::as_str_or_empty;
pub use value::clamp;
pub use value::to_display_string;
pub use value::to_int;
pub use value::to_string_list;
