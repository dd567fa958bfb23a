// crates/artifact-gateway-server/src/lib.rs
// ============================================================================
// Module: Artifact Gateway Server Library
// Description: Registry-driven HTTP routing over the flow executor.
// Purpose: Register endpoint routes, adapt requests, and serialize responses.
// Dependencies: artifact-gateway-{config,core}, axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! Routes are registered dynamically from the endpoint registry: each
//! endpoint's route template joins the configured base path, translates to
//! the router's `{param}` syntax, and dispatches its flow through the shared
//! executor. The repository directory is additionally served read-only under
//! `/repo`. Engine step errors surface as `{"error": message}` with their
//! captured status; adapter failures are 400 and cancellation is 503.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapter;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Component;
use std::path::Path as FsPath;
use std::path::PathBuf;
use std::sync::Arc;

use artifact_gateway_config::GatewaySettings;
use artifact_gateway_core::EndpointDef;
use artifact_gateway_core::ExecError;
use artifact_gateway_core::ExecResponse;
use artifact_gateway_core::FlowExecutor;
use artifact_gateway_core::Registry;
use artifact_gateway_core::clean_join;
use axum::Router;
use axum::body::Body;
use axum::extract::Path;
use axum::extract::RawPathParams;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::MethodFilter;
use axum::routing::get;
use axum::routing::on;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::adapter::AdapterError;
use crate::adapter::build_exec_request;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted request body size in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Router Construction
// ============================================================================

/// Shared per-process gateway state.
#[derive(Clone)]
pub struct GatewayState {
    /// Flow executor shared across requests.
    pub executor: Arc<FlowExecutor>,
    /// Cancellation handle fired on shutdown.
    pub cancel: CancellationToken,
}

/// Router construction errors.
#[derive(Debug, Error)]
pub enum RouterBuildError {
    /// An endpoint declared an HTTP verb the router cannot register.
    #[error("endpoint {endpoint}: unsupported method {method}")]
    UnsupportedMethod {
        /// Endpoint identifier.
        endpoint: String,
        /// Offending method name.
        method: String,
    },
}

/// Builds the gateway router from the registry.
///
/// # Errors
///
/// Returns [`RouterBuildError`] when an endpoint declares an unknown verb.
pub fn build_router(
    settings: &GatewaySettings,
    registry: &Registry,
    state: GatewayState,
) -> Result<Router, RouterBuildError> {
    let mut router = Router::new();

    for endpoint in &registry.endpoints {
        let template = clean_join(&settings.base_path, &endpoint.path);
        let route = to_router_path(&template);
        let filter = method_filter(endpoint)?;
        let endpoint_state = EndpointState {
            gateway: state.clone(),
            template: Arc::from(template.as_str()),
            flow_file: Arc::from(endpoint.flow.as_str()),
        };
        router = router.route(
            &route,
            on(filter, move |params: RawPathParams, request: Request| {
                let endpoint_state = endpoint_state.clone();
                async move { handle_endpoint(endpoint_state, params, request).await }
            }),
        );
        tracing::info!(
            method = %endpoint.method,
            path = %template,
            flow = %endpoint.flow,
            "registered route"
        );
    }

    let repo_root = settings.repo_path.clone();
    router = router.route("/repo/{*path}", get(serve_repo_file).with_state(repo_root));

    Ok(router)
}

/// Per-endpoint routing state captured at registration.
#[derive(Clone)]
struct EndpointState {
    /// Shared gateway state.
    gateway: GatewayState,
    /// Route template as written in the registry (with `:param` segments).
    template: Arc<str>,
    /// Flow filename handling this endpoint.
    flow_file: Arc<str>,
}

/// Translates `:param` route templates to the router's `{param}` syntax.
fn to_router_path(template: &str) -> String {
    template
        .split('/')
        .map(|segment| {
            segment.strip_prefix(':').map_or_else(
                || segment.to_string(),
                |name| format!("{{{name}}}"),
            )
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves an endpoint's verb to a routing method filter.
fn method_filter(endpoint: &EndpointDef) -> Result<MethodFilter, RouterBuildError> {
    match endpoint.method.to_ascii_uppercase().as_str() {
        "GET" => Ok(MethodFilter::GET),
        "POST" => Ok(MethodFilter::POST),
        "PUT" => Ok(MethodFilter::PUT),
        "PATCH" => Ok(MethodFilter::PATCH),
        "DELETE" => Ok(MethodFilter::DELETE),
        "HEAD" => Ok(MethodFilter::HEAD),
        "OPTIONS" => Ok(MethodFilter::OPTIONS),
        other => Err(RouterBuildError::UnsupportedMethod {
            endpoint: endpoint.id.clone(),
            method: other.to_string(),
        }),
    }
}

// ============================================================================
// SECTION: Endpoint Handling
// ============================================================================

/// Adapts one HTTP request, executes its flow, and serializes the result.
async fn handle_endpoint(
    state: EndpointState,
    params: RawPathParams,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("read body failed: {err}"));
        }
    };

    let param_map: BTreeMap<String, String> = params
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    let exec_req = match build_exec_request(
        parts.method.as_str(),
        &state.template,
        param_map,
        parts.uri.query().unwrap_or(""),
        &parts.headers,
        &bytes,
    ) {
        Ok(req) => req,
        Err(err) => return adapter_error_response(&err),
    };

    match state.gateway.executor.run(&state.gateway.cancel, &state.flow_file, &exec_req) {
        Ok(response) => exec_response(&response),
        Err(ExecError::Cancelled) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "request cancelled")
        }
        Err(ExecError::Step(step)) => {
            tracing::warn!(
                step = step.step_id.as_deref().unwrap_or(""),
                status = step.status,
                "flow step failed: {}",
                step.message
            );
            let status = StatusCode::from_u16(step.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, &step.message)
        }
    }
}

/// Serializes an engine response, defaulting the JSON content type.
fn exec_response(response: &ExecResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut http_response = if status == StatusCode::NO_CONTENT {
        Response::new(Body::empty())
    } else {
        Response::new(Body::from(response.body_json()))
    };
    *http_response.status_mut() = status;

    let headers = http_response.headers_mut();
    for (name, value) in &response.headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            continue;
        };
        headers.insert(name, value);
    }
    if !headers.contains_key(CONTENT_TYPE) && status != StatusCode::NO_CONTENT {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    http_response
}

/// Maps an adapter failure to its 400 response.
fn adapter_error_response(err: &AdapterError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

/// Renders `{"error": message}` with the given status.
fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({ "error": message });
    (status, [(CONTENT_TYPE, "application/json")], body.to_string()).into_response()
}

// ============================================================================
// SECTION: Repository Serving
// ============================================================================

/// Serves a file from the repository directory, rejecting traversal.
async fn serve_repo_file(State(root): State<PathBuf>, Path(rest): Path<String>) -> Response {
    let relative = FsPath::new(&rest);
    let traversal_free = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !traversal_free {
        return error_response(StatusCode::BAD_REQUEST, "invalid repository path");
    }

    let full = root.join(relative);
    match tokio::fs::read(&full).await {
        Ok(contents) => {
            let mut response = Response::new(Body::from(contents));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(content_type_for(&full)),
            );
            response
        }
        Err(_) => error_response(StatusCode::NOT_FOUND, "file not found"),
    }
}

/// Maps a file extension to a response content type.
fn content_type_for(path: &FsPath) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "html" => "text/html; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
