//! System endpoints: health check and property catalog.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::{CustomProperty, ObjectClass};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    pools: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, pool count and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pools: state.membership_service.registry().len().await,
        }),
    )
}

/// Matchable properties per object class.
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyCatalogResponse {
    /// Device properties usable in pool rules.
    pub device: Vec<String>,
    /// Link properties usable in pool rules.
    pub link: Vec<String>,
    /// Declared custom device properties.
    pub custom: BTreeMap<String, CustomProperty>,
}

/// `GET /config/properties` — List matchable properties.
#[utoipa::path(
    get,
    path = "/config/properties",
    tag = "System",
    summary = "List matchable properties",
    description = "Returns the property names pool rules may reference for devices and links, including configured custom device properties.",
    responses(
        (status = 200, description = "Property catalog", body = PropertyCatalogResponse),
    )
)]
pub async fn properties_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.membership_service.catalog();
    let names = |class| {
        catalog
            .properties(class)
            .into_iter()
            .map(str::to_string)
            .collect()
    };
    Json(PropertyCatalogResponse {
        device: names(ObjectClass::Device),
        link: names(ObjectClass::Link),
        custom: catalog.custom().clone(),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/properties", get(properties_handler))
}
