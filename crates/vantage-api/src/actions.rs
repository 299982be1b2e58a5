//! Pipeline action handlers.
//!
//! AddClusterInfo is the only action type exposed at this layer. Like
//! destinations, actions are implicitly scoped to the configured
//! namespace; ids are the only addressing the URL carries.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vantage_store::{AddClusterInfo, AddClusterInfoRequest};

use crate::ApiState;
use crate::handlers::{ApiResponse, error_response, store_error};

const ADD_CLUSTER_INFO: &str = "AddClusterInfo";

/// An action together with its type discriminator, as listed by the
/// cross-type endpoint.
#[derive(Serialize)]
struct ActionEnvelope {
    #[serde(rename = "type")]
    action_type: &'static str,
    spec: AddClusterInfo,
}

/// GET /api/actions
pub async fn list_actions(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_cluster_info_actions(&state.namespace).await {
        Ok(actions) => {
            let envelopes: Vec<ActionEnvelope> = actions
                .into_iter()
                .map(|spec| ActionEnvelope {
                    action_type: ADD_CLUSTER_INFO,
                    spec,
                })
                .collect();
            ApiResponse::ok(envelopes).into_response()
        }
        Err(e) => store_error(&e),
    }
}

/// GET /api/actions/types/AddClusterInfo
pub async fn list_add_cluster_info(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_cluster_info_actions(&state.namespace).await {
        Ok(actions) => ApiResponse::ok(actions).into_response(),
        Err(e) => store_error(&e),
    }
}

/// GET /api/actions/types/AddClusterInfo/{id}
pub async fn get_add_cluster_info(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state
        .store
        .get_cluster_info_action(&state.namespace, &id)
        .await
    {
        Ok(Some(action)) => ApiResponse::ok(action).into_response(),
        Ok(None) => not_found(),
        Err(e) => store_error(&e),
    }
}

/// POST /api/actions/types/AddClusterInfo
pub async fn create_add_cluster_info(
    State(state): State<ApiState>,
    Json(req): Json<AddClusterInfoRequest>,
) -> impl IntoResponse {
    match state
        .store
        .create_cluster_info_action(&state.namespace, req)
        .await
    {
        Ok(action) => (StatusCode::CREATED, ApiResponse::ok(action)).into_response(),
        Err(e) => store_error(&e),
    }
}

/// PUT /api/actions/types/AddClusterInfo/{id}
pub async fn update_add_cluster_info(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<AddClusterInfoRequest>,
) -> impl IntoResponse {
    match state
        .store
        .update_cluster_info_action(&state.namespace, &id, req)
        .await
    {
        Ok(Some(action)) => ApiResponse::ok(action).into_response(),
        Ok(None) => not_found(),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/actions/types/AddClusterInfo/{id}
pub async fn delete_add_cluster_info(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state
        .store
        .delete_cluster_info_action(&state.namespace, &id)
        .await
    {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => not_found(),
        Err(e) => store_error(&e),
    }
}

fn not_found() -> Response {
    error_response("action not found", StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vantage_store::{
        ClusterAttribute, DestinationCatalog, MemoryStore, ResourceStore, Signal,
    };

    fn test_state() -> (ApiState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = ApiState {
            store: store.clone(),
            catalog: Arc::new(DestinationCatalog::load().unwrap()),
            namespace: "vantage-system".to_string(),
        };
        (state, store)
    }

    fn test_request() -> AddClusterInfoRequest {
        AddClusterInfoRequest {
            action_name: Some("cluster metadata".to_string()),
            notes: None,
            signals: vec![Signal::Traces, Signal::Logs],
            disabled: false,
            cluster_attributes: vec![ClusterAttribute {
                attribute_name: "cluster.name".to_string(),
                attribute_value: "prod-eu".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn create_then_get_action() {
        let (state, store) = test_state();

        let resp = create_add_cluster_info(State(state.clone()), Json(test_request()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let actions = store
            .list_cluster_info_actions("vantage-system")
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);

        let resp = get_add_cluster_info(State(state), Path(actions[0].id.clone()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn update_missing_action_is_not_found() {
        let (state, _) = test_state();
        let resp = update_add_cluster_info(
            State(state),
            Path("aci-missing".to_string()),
            Json(test_request()),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_action_twice() {
        let (state, store) = test_state();
        let created = store
            .create_cluster_info_action("vantage-system", test_request())
            .await
            .unwrap();

        let resp = delete_add_cluster_info(State(state.clone()), Path(created.id.clone()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = delete_add_cluster_info(State(state), Path(created.id))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cross_type_listing_wraps_specs() {
        let (state, store) = test_state();
        store
            .create_cluster_info_action("vantage-system", test_request())
            .await
            .unwrap();

        let resp = list_actions(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
