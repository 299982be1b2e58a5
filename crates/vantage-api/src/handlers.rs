//! REST API handlers.
//!
//! Each handler reads/writes via the injected `ResourceStore` and
//! returns JSON responses. Destination handlers take their namespace
//! from `ApiState`, never from the path; source handlers address the
//! whole cluster through path parameters.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vantage_store::{
    DestinationRequest, NamespaceSelection, SourceKey, SourcePatch, StoreError, WorkloadKind,
};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

/// Map a store failure onto an HTTP status.
pub(crate) fn store_error(e: &StoreError) -> Response {
    let status = match e {
        StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Connect(_) | StoreError::Backend(_) => StatusCode::BAD_GATEWAY,
        StoreError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&e.to_string(), status)
}

/// Parse the opaque kind path parameter; the route table passes it
/// through unvalidated.
fn parse_source_key(namespace: String, kind: &str, name: String) -> Result<SourceKey, Response> {
    match kind.parse::<WorkloadKind>() {
        Ok(kind) => Ok(SourceKey {
            namespace,
            kind,
            name,
        }),
        Err(msg) => Err(error_response(&msg, StatusCode::BAD_REQUEST)),
    }
}

// ── Namespaces ────────────────────────────────────────────────────

/// GET /api/namespaces
pub async fn list_namespaces(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_namespaces().await {
        Ok(namespaces) => ApiResponse::ok(namespaces).into_response(),
        Err(e) => store_error(&e),
    }
}

/// POST /api/namespaces
pub async fn persist_namespaces(
    State(state): State<ApiState>,
    Json(selection): Json<HashMap<String, bool>>,
) -> impl IntoResponse {
    let selections: Vec<NamespaceSelection> = selection
        .into_iter()
        .map(|(name, selected)| NamespaceSelection { name, selected })
        .collect();
    match state.store.persist_namespaces(&selections).await {
        Ok(()) => ApiResponse::ok("persisted").into_response(),
        Err(e) => store_error(&e),
    }
}

// ── Sources ───────────────────────────────────────────────────────

/// GET /api/sources
pub async fn list_sources(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_sources().await {
        Ok(sources) => ApiResponse::ok(sources).into_response(),
        Err(e) => store_error(&e),
    }
}

/// GET /api/sources/namespace/{namespace}/kind/{kind}/name/{name}
pub async fn get_source(
    State(state): State<ApiState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let key = match parse_source_key(namespace, &kind, name) {
        Ok(key) => key,
        Err(resp) => return resp,
    };
    match state.store.get_source(&key).await {
        Ok(Some(source)) => ApiResponse::ok(source).into_response(),
        Ok(None) => error_response("source not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

/// PATCH /api/sources/namespace/{namespace}/kind/{kind}/name/{name}
pub async fn patch_source(
    State(state): State<ApiState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
    Json(patch): Json<SourcePatch>,
) -> impl IntoResponse {
    let key = match parse_source_key(namespace, &kind, name) {
        Ok(key) => key,
        Err(resp) => return resp,
    };
    match state.store.patch_source(&key, &patch).await {
        Ok(Some(source)) => ApiResponse::ok(source).into_response(),
        Ok(None) => error_response("source not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/sources/namespace/{namespace}/kind/{kind}/name/{name}
///
/// Unmanages the source; the underlying workload is untouched.
pub async fn delete_source(
    State(state): State<ApiState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let key = match parse_source_key(namespace, &kind, name) {
        Ok(key) => key,
        Err(resp) => return resp,
    };
    match state.store.delete_source(&key).await {
        Ok(true) => ApiResponse::ok("unmanaged").into_response(),
        Ok(false) => error_response("source not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

// ── Applications ──────────────────────────────────────────────────

/// GET /api/applications/{namespace}
pub async fn list_applications(
    State(state): State<ApiState>,
    Path(namespace): Path<String>,
) -> impl IntoResponse {
    match state.store.list_applications(&namespace).await {
        Ok(apps) => ApiResponse::ok(apps).into_response(),
        Err(e) => store_error(&e),
    }
}

// ── Config ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum InstallationStatus {
    New,
    Finished,
}

#[derive(Serialize)]
struct ConfigResponse {
    installation: InstallationStatus,
}

/// GET /api/config
///
/// Installation is "new" until the first destination exists.
pub async fn get_config(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_destinations(&state.namespace).await {
        Ok(destinations) => {
            let installation = if destinations.is_empty() {
                InstallationStatus::New
            } else {
                InstallationStatus::Finished
            };
            ApiResponse::ok(ConfigResponse { installation }).into_response()
        }
        Err(e) => store_error(&e),
    }
}

// ── Destination types ─────────────────────────────────────────────

/// GET /api/destination-types
pub async fn list_destination_types(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.catalog.list()).into_response()
}

/// GET /api/destination-types/{type}
pub async fn get_destination_type(
    State(state): State<ApiState>,
    Path(type_name): Path<String>,
) -> impl IntoResponse {
    match state.catalog.get(&type_name) {
        Some(spec) => ApiResponse::ok(spec).into_response(),
        None => error_response("destination type not found", StatusCode::NOT_FOUND),
    }
}

// ── Destinations ──────────────────────────────────────────────────

/// GET /api/destinations
pub async fn list_destinations(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_destinations(&state.namespace).await {
        Ok(destinations) => ApiResponse::ok(destinations).into_response(),
        Err(e) => store_error(&e),
    }
}

/// GET /api/destinations/{id}
pub async fn get_destination(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_destination(&state.namespace, &id).await {
        Ok(Some(dest)) => ApiResponse::ok(dest).into_response(),
        Ok(None) => error_response("destination not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

/// POST /api/destinations
pub async fn create_destination(
    State(state): State<ApiState>,
    Json(req): Json<DestinationRequest>,
) -> impl IntoResponse {
    match state.store.create_destination(&state.namespace, req).await {
        Ok(dest) => (StatusCode::CREATED, ApiResponse::ok(dest)).into_response(),
        Err(e) => store_error(&e),
    }
}

/// PUT /api/destinations/{id}
pub async fn update_destination(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<DestinationRequest>,
) -> impl IntoResponse {
    match state
        .store
        .update_destination(&state.namespace, &id, req)
        .await
    {
        Ok(Some(dest)) => ApiResponse::ok(dest).into_response(),
        Ok(None) => error_response("destination not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/destinations/{id}
pub async fn delete_destination(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_destination(&state.namespace, &id).await {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("destination not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}
