//! vantage-api — REST API and SPA serving for the Vantage console.
//!
//! Provides axum route handlers for managing sources, destinations,
//! actions, and namespace selection, and serves the embedded web app
//! with root-document fallback for client-side routes.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/namespaces` | List namespaces with selection state |
//! | POST | `/api/namespaces` | Persist namespace selection set |
//! | GET | `/api/sources` | List all managed sources |
//! | GET/DELETE/PATCH | `/api/sources/namespace/:ns/kind/:kind/name/:name` | One source |
//! | GET | `/api/applications/:namespace` | Instrumentation candidates |
//! | GET | `/api/config` | Installation status snapshot |
//! | GET | `/api/destination-types` | Destination-type catalog |
//! | GET | `/api/destination-types/:type` | One type's field schema |
//! | GET/POST | `/api/destinations` | List / create destinations |
//! | GET/PUT/DELETE | `/api/destinations/:id` | One destination |
//! | GET | `/api/actions` | List all actions |
//! | GET/POST | `/api/actions/types/AddClusterInfo` | List / create AddClusterInfo |
//! | GET/PUT/DELETE | `/api/actions/types/AddClusterInfo/:id` | One AddClusterInfo |
//!
//! Everything else — unknown paths, unknown methods on known paths —
//! is served by the SPA fallback.

pub mod actions;
pub mod assets;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vantage_store::{DestinationCatalog, ResourceStore};

/// Shared state for API handlers.
///
/// The namespace is the one fixed scope every destination and action
/// operation runs in; it is injected here at startup so handlers never
/// reach for ambient configuration.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ResourceStore>,
    pub catalog: Arc<DestinationCatalog>,
    pub namespace: String,
}

/// Build the complete router (REST API + SPA fallback).
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route(
            "/namespaces",
            get(handlers::list_namespaces).post(handlers::persist_namespaces),
        )
        .route("/sources", get(handlers::list_sources))
        .route(
            "/sources/namespace/{namespace}/kind/{kind}/name/{name}",
            get(handlers::get_source)
                .delete(handlers::delete_source)
                .patch(handlers::patch_source),
        )
        .route("/applications/{namespace}", get(handlers::list_applications))
        .route("/config", get(handlers::get_config))
        .route("/destination-types", get(handlers::list_destination_types))
        .route("/destination-types/{type}", get(handlers::get_destination_type))
        .route(
            "/destinations",
            get(handlers::list_destinations).post(handlers::create_destination),
        )
        .route(
            "/destinations/{id}",
            get(handlers::get_destination)
                .put(handlers::update_destination)
                .delete(handlers::delete_destination),
        )
        .route("/actions", get(actions::list_actions))
        .route(
            "/actions/types/AddClusterInfo",
            get(actions::list_add_cluster_info).post(actions::create_add_cluster_info),
        )
        .route(
            "/actions/types/AddClusterInfo/{id}",
            get(actions::get_add_cluster_info)
                .put(actions::update_add_cluster_info)
                .delete(actions::delete_add_cluster_info),
        )
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        // Unmatched paths and unmatched methods both belong to the SPA:
        // the web app owns every route the API does not.
        .fallback(assets::serve_spa)
        .method_not_allowed_fallback(assets::serve_spa)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
