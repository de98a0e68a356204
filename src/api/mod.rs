//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; health, the property
//! catalog and the WebSocket live at the root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "netpool-gateway API",
        description = "Network inventory pools with rule-derived and curated membership.",
    ),
    tags(
        (name = "Pools", description = "Pool definitions and event log"),
        (name = "Membership", description = "Pool membership, static assignment and recompute"),
        (name = "Inventory", description = "Devices, links and bulk import"),
        (name = "System", description = "Health and property catalog"),
    ),
    paths(
        handlers::pool::create_pool,
        handlers::pool::list_pools,
        handlers::pool::get_pool,
        handlers::pool::update_pool,
        handlers::pool::delete_pool,
        handlers::pool::get_membership,
        handlers::pool::set_membership,
        handlers::pool::recompute_pool,
        handlers::pool::recompute_all,
        handlers::pool::pool_events,
        handlers::inventory::list_devices,
        handlers::inventory::create_device,
        handlers::inventory::get_device,
        handlers::inventory::update_device,
        handlers::inventory::delete_device,
        handlers::inventory::list_links,
        handlers::inventory::create_link,
        handlers::inventory::get_link,
        handlers::inventory::update_link,
        handlers::inventory::delete_link,
        handlers::inventory::import_inventory,
        handlers::system::health_handler,
        handlers::system::properties_handler,
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: REST, WebSocket, docs and HTTP layers.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = build_router().route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
