// crates/artifact-gateway-core/src/runtime/ops.rs
// ============================================================================
// Module: Operation Library
// Description: Typed implementations of the flow operation primitives.
// Purpose: Route step dispatch by operation name with structured errors.
// Dependencies: crate::{core, interfaces}, jsonschema, serde_json, time
// ============================================================================

//! ## Overview
//! Operations are the primitives a flow composes: dataset access, filtering
//! and pagination, lookups, body validation, uniqueness checks, identifier
//! assignment, mutations, and response construction. Each operation receives
//! its raw argument map plus mutable access to the runtime tree and returns
//! an [`OpOutput`] or a [`StepError`] carrying the HTTP status to surface.
//! Dispatch goes through an [`OpRegistry`] keyed by operation name;
//! registration happens once at engine construction and lookup failures
//! report the unknown name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::StepError;
use crate::core::exec::ExecResponse;
use crate::core::path::eval_arg;
use crate::core::path::resolve;
use crate::core::path::set_path;
use crate::core::record::record_id;
use crate::core::value::as_str_or_empty;
use crate::core::value::clamp;
use crate::core::value::to_display_string;
use crate::core::value::to_int;
use crate::core::value::to_string_list;
use crate::interfaces::DatasetStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Dispatch Types
// ============================================================================

/// Result of a successfully executed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutput {
    /// A value available for `out` binding.
    Value(Value),
    /// An immediate response that ends the flow.
    Respond(ExecResponse),
    /// No result; an `out` binding stores null.
    None,
}

/// A single operation implementation.
pub trait OpHandler: Send + Sync {
    /// Executes the operation against the runtime tree.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] with the HTTP status the failure should surface.
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError>;
}

/// Error returned when an operation name is registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation already registered: {0}")]
pub struct DuplicateOpError(pub String);

/// Operation registry keyed by operation name.
///
/// # Invariants
/// - Operation names are unique within the registry.
/// - Registration is complete before the first dispatch.
pub struct OpRegistry {
    /// Operation implementations keyed by name.
    ops: BTreeMap<String, Box<dyn OpHandler>>,
}

impl OpRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in operation registered.
    #[must_use]
    pub fn with_builtin_ops(store: Arc<dyn DatasetStore>) -> Self {
        let mut registry = Self::new();
        registry.insert("loadDataset", LoadDatasetOp::new(Arc::clone(&store)));
        registry.insert("filterAndPaginate", FilterAndPaginateOp);
        registry.insert("findById", FindByIdOp);
        registry.insert("validateBody", ValidateBodyOp);
        registry.insert("checkUnique", CheckUniqueOp);
        registry.insert("assignId", AssignIdOp);
        registry.insert("insertRecord", InsertRecordOp::new(Arc::clone(&store)));
        registry.insert("updateRecord", UpdateRecordOp::new(Arc::clone(&store)));
        registry.insert("deleteRecord", DeleteRecordOp::new(store));
        registry.insert("now", NowOp);
        registry.insert("set", SetOp);
        registry.insert("respond", RespondOp);
        registry
    }

    /// Registers an additional operation under the given name.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateOpError`] when the name is already registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl OpHandler + 'static,
    ) -> Result<(), DuplicateOpError> {
        let name = name.into();
        if self.ops.contains_key(&name) {
            return Err(DuplicateOpError(name));
        }
        self.ops.insert(name, Box::new(handler));
        Ok(())
    }

    /// Dispatches a step to the operation with the given name.
    ///
    /// # Errors
    ///
    /// Returns `unknown op` for unregistered names, otherwise the
    /// operation's own [`StepError`].
    pub fn dispatch(
        &self,
        op: &str,
        args: &Map<String, Value>,
        rt: &mut Value,
    ) -> Result<OpOutput, StepError> {
        let Some(handler) = self.ops.get(op) else {
            return Err(StepError::internal(format!("unknown op: {op}")));
        };
        handler.apply(args, rt)
    }

    /// Infallible insert used for built-in registration.
    fn insert(&mut self, name: &str, handler: impl OpHandler + 'static) {
        self.ops.insert(name.to_string(), Box::new(handler));
    }
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Dataset Operations
// ============================================================================

/// Loads a dataset through the store's state/seed/empty resolution.
pub struct LoadDatasetOp {
    /// Dataset store backing the operation.
    store: Arc<dyn DatasetStore>,
}

impl LoadDatasetOp {
    /// Creates the operation over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
        }
    }
}

impl OpHandler for LoadDatasetOp {
    fn apply(&self, args: &Map<String, Value>, _rt: &mut Value) -> Result<OpOutput, StepError> {
        let dataset = as_str_or_empty(args.get("dataset"));
        if dataset.is_empty() {
            return Err(StepError::internal("loadDataset requires dataset"));
        }
        let seed = match as_str_or_empty(args.get("seed")) {
            "" => None,
            name => Some(name),
        };
        let contents = self
            .store
            .load(dataset, seed)
            .map_err(|err| StepError::internal(format!("failed to load dataset: {err}")))?;
        Ok(OpOutput::Value(contents))
    }
}

// ============================================================================
// SECTION: Query Operations
// ============================================================================

/// Filters, sorts, and paginates a list addressed by a path expression.
pub struct FilterAndPaginateOp;

impl OpHandler for FilterAndPaginateOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let source = resolve(rt, as_str_or_empty(args.get("source")));
        let Some(items) = source.as_array() else {
            return Err(StepError::internal("filterAndPaginate source must be array"));
        };

        let page = to_int(&eval_arg(rt, args.get("page"), json!(1))).max(1);
        let size = clamp(to_int(&eval_arg(rt, args.get("size"), json!(20))), 1, 100);
        let query = eval_arg(rt, args.get("q"), json!(""));
        let query = query.as_str().unwrap_or("").to_lowercase();
        let fields = to_string_list(args.get("fields"));
        let sort = eval_arg(rt, args.get("sort"), json!(""));
        let sort = sort.as_str().unwrap_or("");

        // Non-object elements are dropped even when no query is given.
        let mut filtered: Vec<&Map<String, Value>> = items
            .iter()
            .filter_map(Value::as_object)
            .filter(|record| matches_query(record, &query, &fields))
            .collect();

        if !sort.is_empty() {
            let mut parts = sort.splitn(2, ':');
            let key = parts.next().unwrap_or("").to_string();
            let descending = parts.next().is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
            filtered.sort_by(|left, right| {
                let left_key = to_display_string(left.get(&key).unwrap_or(&Value::Null));
                let right_key = to_display_string(right.get(&key).unwrap_or(&Value::Null));
                if descending { right_key.cmp(&left_key) } else { left_key.cmp(&right_key) }
            });
        }

        let total = filtered.len() as i64;
        let start = (page - 1).saturating_mul(size);
        if start >= total {
            return Ok(OpOutput::Value(json!({
                "items": [],
                "page": page,
                "size": size,
                "total": 0,
            })));
        }
        let end = (start + size).min(total);
        let window: Vec<Value> = filtered[start as usize..end as usize]
            .iter()
            .map(|record| Value::Object((*record).clone()))
            .collect();

        Ok(OpOutput::Value(json!({
            "items": window,
            "page": page,
            "size": size,
            "total": total,
        })))
    }
}

/// Returns true when the record matches the lowercase substring query.
fn matches_query(record: &Map<String, Value>, query: &str, fields: &[String]) -> bool {
    if query.is_empty() {
        return true;
    }
    fields.iter().any(|field| {
        record
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_lowercase().contains(query))
    })
}

/// Finds the first record in a list whose `id` matches the argument.
pub struct FindByIdOp;

impl OpHandler for FindByIdOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let source = resolve(rt, as_str_or_empty(args.get("source")));
        let Some(items) = source.as_array() else {
            return Err(StepError::internal("findById source must be array"));
        };
        let target = to_display_string(&eval_arg(rt, args.get("id"), Value::Null));

        let found = items
            .iter()
            .filter_map(Value::as_object)
            .find(|record| record_id(record) == target)
            .map(|record| Value::Object(record.clone()))
            .unwrap_or(Value::Null);
        Ok(OpOutput::Value(found))
    }
}

// ============================================================================
// SECTION: Validation Operations
// ============================================================================

/// Validates the request body against a literal JSON Schema argument.
pub struct ValidateBodyOp;

impl OpHandler for ValidateBodyOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let Some(schema) = args.get("schema") else {
            return Ok(OpOutput::None);
        };
        if schema.is_null() {
            return Ok(OpOutput::None);
        }

        let body = resolve(rt, "$request.body");
        let body = if body.is_null() { json!({}) } else { body.clone() };

        let validator = jsonschema::validator_for(schema).map_err(|err| {
            StepError::internal(format!("schema validation setup failed: {err}"))
        })?;
        let details: Vec<String> = validator
            .iter_errors(&body)
            .map(|err| format!("{err} ({})", format_instance_location(&err.instance_path.to_string())))
            .collect();
        if details.is_empty() {
            return Ok(OpOutput::None);
        }
        Err(StepError::new(400, format!("validation failed: {}", details.join(", "))))
    }
}

/// Renders a JSON-pointer instance location as a dotted field name.
fn format_instance_location(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "(root)".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

/// Asserts that no record in a list duplicates a field value.
pub struct CheckUniqueOp;

impl OpHandler for CheckUniqueOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let source = resolve(rt, as_str_or_empty(args.get("source")));
        let Some(items) = source.as_array() else {
            // A non-list source asserts nothing.
            return Ok(OpOutput::None);
        };
        let field = as_str_or_empty(args.get("field")).to_string();
        let value = to_display_string(&eval_arg(rt, args.get("value"), json!("")));
        let exclude = to_display_string(&eval_arg(rt, args.get("excludeId"), json!("")));

        for record in items.iter().filter_map(Value::as_object) {
            if !exclude.is_empty() && record_id(record) == exclude {
                continue;
            }
            let existing = to_display_string(record.get(&field).unwrap_or(&Value::Null));
            if existing == value {
                return Err(StepError::new(
                    409,
                    format!("duplicate value '{value}' for field '{field}'"),
                ));
            }
        }
        Ok(OpOutput::None)
    }
}

// ============================================================================
// SECTION: Mutation Operations
// ============================================================================

/// Assigns a fresh prefixed identifier from a monotonic nanosecond clock.
pub struct AssignIdOp;

/// Last identifier timestamp handed out, for monotonicity across calls.
static LAST_ID_NANOS: AtomicI64 = AtomicI64::new(0);

impl OpHandler for AssignIdOp {
    fn apply(&self, args: &Map<String, Value>, _rt: &mut Value) -> Result<OpOutput, StepError> {
        let prefix = match as_str_or_empty(args.get("prefix")) {
            "" => "id_",
            given => given,
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX));
        let stamp = next_monotonic_nanos(now);
        Ok(OpOutput::Value(Value::String(format!("{prefix}{stamp}"))))
    }
}

/// Returns a strictly increasing nanosecond stamp at or after `now`.
fn next_monotonic_nanos(now: i64) -> i64 {
    let mut observed = LAST_ID_NANOS.load(Ordering::Relaxed);
    loop {
        let next = observed.saturating_add(1).max(now);
        match LAST_ID_NANOS.compare_exchange_weak(
            observed,
            next,
            Ordering::SeqCst,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(current) => observed = current,
        }
    }
}

/// Appends a record to a dataset.
pub struct InsertRecordOp {
    /// Dataset store backing the operation.
    store: Arc<dyn DatasetStore>,
}

impl InsertRecordOp {
    /// Creates the operation over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
        }
    }
}

impl OpHandler for InsertRecordOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let dataset = as_str_or_empty(args.get("dataset")).to_string();
        if dataset.is_empty() {
            return Err(StepError::internal("insertRecord requires dataset name"));
        }
        let record = eval_arg(rt, args.get("record"), Value::Null);
        if record.is_null() {
            return Err(StepError::internal("insertRecord requires record data"));
        }
        let Value::Object(record) = record else {
            return Err(StepError::internal("record must be an object"));
        };

        let inserted = self
            .store
            .insert(&dataset, record)
            .map_err(|err| StepError::internal(format!("failed to save record: {err}")))?;
        Ok(OpOutput::Value(Value::Object(inserted)))
    }
}

/// Shallow-merges a patch into the record with the given id.
pub struct UpdateRecordOp {
    /// Dataset store backing the operation.
    store: Arc<dyn DatasetStore>,
}

impl UpdateRecordOp {
    /// Creates the operation over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
        }
    }
}

impl OpHandler for UpdateRecordOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let dataset = as_str_or_empty(args.get("dataset")).to_string();
        if dataset.is_empty() {
            return Err(StepError::internal("updateRecord requires dataset name"));
        }
        let id = to_display_string(&eval_arg(rt, args.get("id"), json!("")));
        if id.is_empty() {
            return Err(StepError::internal("updateRecord requires record id"));
        }
        let patch = eval_arg(rt, args.get("patch"), Value::Null);
        let Value::Object(patch) = patch else {
            return Err(StepError::internal("patch must be an object"));
        };

        let merged = self.store.update(&dataset, &id, &patch).map_err(|err| match err {
            StoreError::NotFound => StepError::new(404, "record not found"),
            other => StepError::internal(format!("failed to update record: {other}")),
        })?;
        Ok(OpOutput::Value(Value::Object(merged)))
    }
}

/// Removes the record with the given id from a dataset.
pub struct DeleteRecordOp {
    /// Dataset store backing the operation.
    store: Arc<dyn DatasetStore>,
}

impl DeleteRecordOp {
    /// Creates the operation over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
        }
    }
}

impl OpHandler for DeleteRecordOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let dataset = as_str_or_empty(args.get("dataset")).to_string();
        if dataset.is_empty() {
            return Err(StepError::internal("deleteRecord requires dataset name"));
        }
        let id = to_display_string(&eval_arg(rt, args.get("id"), json!("")));
        if id.is_empty() {
            return Err(StepError::internal("deleteRecord requires record id"));
        }

        self.store.delete(&dataset, &id).map_err(|err| match err {
            StoreError::NotFound => StepError::new(404, "record not found"),
            other => StepError::internal(format!("failed to delete record: {other}")),
        })?;
        Ok(OpOutput::None)
    }
}

// ============================================================================
// SECTION: Utility Operations
// ============================================================================

/// Returns the current UTC timestamp at second precision.
pub struct NowOp;

impl OpHandler for NowOp {
    fn apply(&self, _args: &Map<String, Value>, _rt: &mut Value) -> Result<OpOutput, StepError> {
        let stamp = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .map_err(|err| StepError::internal(format!("timestamp construction failed: {err}")))?
            .format(&Rfc3339)
            .map_err(|err| StepError::internal(format!("timestamp format failed: {err}")))?;
        Ok(OpOutput::Value(Value::String(stamp)))
    }
}

/// Writes a value at an arbitrary runtime path.
pub struct SetOp;

impl OpHandler for SetOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        let path = as_str_or_empty(args.get("path")).to_string();
        if path.is_empty() {
            return Err(StepError::internal("set requires path"));
        }
        let value = eval_arg(rt, args.get("value"), Value::Null);
        set_path(rt, &path, value);
        Ok(OpOutput::None)
    }
}

/// Short-circuits the flow with a composed response.
pub struct RespondOp;

impl OpHandler for RespondOp {
    fn apply(&self, args: &Map<String, Value>, rt: &mut Value) -> Result<OpOutput, StepError> {
        Ok(OpOutput::Respond(build_response(args, rt)))
    }
}

/// Builds a response from `respond` arguments against a runtime tree.
///
/// Also used for inline conflict actions, where the runtime is a synthesized
/// `{error: {message, status}}` tree.
#[must_use]
pub fn build_response(args: &Map<String, Value>, rt: &Value) -> ExecResponse {
    let status = to_int(&eval_arg(rt, args.get("status"), json!(200)));
    let status = u16::try_from(status).unwrap_or(500);

    let mut headers = BTreeMap::new();
    if let Some(Value::Object(given)) = args.get("headers") {
        for (name, expr) in given {
            let rendered = to_display_string(&eval_arg(rt, Some(expr), json!("")));
            headers.insert(name.clone(), rendered);
        }
    }

    let body = match (args.get("bodyFrom"), args.get("body")) {
        (Some(Value::String(expr)), _) if expr.starts_with('$') => resolve(rt, expr).clone(),
        (_, Some(Value::Object(literal))) => Value::Object(literal.clone()),
        _ => json!({}),
    };

    ExecResponse {
        status,
        headers,
        body,
    }
}
