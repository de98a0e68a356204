//! Pool handlers: definition CRUD, membership, recompute and event log.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};

use crate::api::dto::{
    CreatePoolResponse, EventListResponse, EventQueryParams, MembershipResponse,
    PaginationParams, PoolDetailResponse, PoolListParams, PoolListResponse,
    SetMembershipRequest,
};
use crate::app_state::AppState;
use crate::domain::{PoolDefinition, PoolId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::RecomputeReport;

/// `POST /pools` — Create a pool.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid rules or a duplicate name.
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a pool",
    description = "Creates a static or dynamic pool. Dynamic pools are populated from the current inventory before the response is sent.",
    request_body = PoolDefinition,
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Invalid rules", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    Json(req): Json<PoolDefinition>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = state.membership_service.create_pool(req).await?;
    let pool = state.membership_service.get_pool(pool_id).await?;

    let response = CreatePoolResponse {
        pool_id,
        name: pool.name().to_string(),
        is_static: pool.is_static(),
        summary: pool.membership.summary(),
        created_at: pool.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /pools` — List pools with pagination and optional static filter.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns a paginated list of pools ordered by name, optionally only static or only dynamic ones.",
    params(PoolListParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PoolListResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PoolListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let summaries = state.membership_service.list_pools(params.is_static).await;
    let pagination = PaginationParams {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(20),
    };
    let (data, pagination) = pagination.paginate(summaries);
    Ok(Json(PoolListResponse { data, pagination }))
}

/// `GET /pools/{id}` — Get pool details.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool details",
    description = "Returns the pool definition, rules and membership summary.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Pool details", body = PoolDetailResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool = state
        .membership_service
        .get_pool(PoolId::from_uuid(id))
        .await?;
    Ok(Json(PoolDetailResponse::from(pool)))
}

/// `PUT /pools/{id}` — Replace a pool definition.
///
/// # Errors
///
/// Returns [`GatewayError`] if the pool is missing, the rules are invalid,
/// or the recompute fails.
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Update a pool",
    description = "Replaces name, description, static flag and rules. Dynamic pools are recomputed.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    request_body = PoolDefinition,
    responses(
        (status = 200, description = "Updated pool", body = PoolDetailResponse),
        (status = 400, description = "Invalid rules", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    )
)]
pub async fn update_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PoolDefinition>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::from_uuid(id);
    state.membership_service.update_pool(pool_id, req).await?;
    let pool = state.membership_service.get_pool(pool_id).await?;
    Ok(Json(PoolDetailResponse::from(pool)))
}

/// `DELETE /pools/{id}` — Remove a pool.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Delete a pool",
    description = "Removes a pool with its membership and emits a PoolRemoved event.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 204, description = "Pool deleted"),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn delete_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .membership_service
        .remove_pool(PoolId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /pools/{id}/membership` — Current members.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/membership",
    tag = "Membership",
    summary = "Get pool membership",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Member devices and links", body = MembershipResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_membership(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::from_uuid(id);
    let membership = state.membership_service.get_membership(pool_id).await?;
    Ok(Json(MembershipResponse::new(pool_id, membership)))
}

/// `PUT /pools/{id}/membership` — Assign members to a static pool.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotStatic`] for dynamic pools and
/// [`GatewayError::ObjectNotFound`] for unknown IDs.
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}/membership",
    tag = "Membership",
    summary = "Set static pool membership",
    description = "Replaces the members of a static pool. Every ID must name an existing object of the right class.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    request_body = SetMembershipRequest,
    responses(
        (status = 200, description = "New membership", body = MembershipResponse),
        (status = 404, description = "Pool or object not found", body = ErrorResponse),
        (status = 409, description = "Pool is dynamic", body = ErrorResponse),
    )
)]
pub async fn set_membership(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SetMembershipRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::from_uuid(id);
    let membership = state
        .membership_service
        .set_membership(
            pool_id,
            req.devices.into_iter().collect::<BTreeSet<_>>(),
            req.links.into_iter().collect::<BTreeSet<_>>(),
        )
        .await?;
    Ok(Json(MembershipResponse::new(pool_id, membership)))
}

/// `POST /pools/{id}/recompute` — Recompute one pool.
///
/// # Errors
///
/// Returns [`GatewayError`] if the pool is missing, its rules are broken,
/// or the commit fails. The previous membership is kept on error.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/recompute",
    tag = "Membership",
    summary = "Recompute a pool",
    description = "Re-derives a dynamic pool's membership from the current inventory. Static pools are returned unchanged.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Recomputed membership", body = MembershipResponse),
        (status = 400, description = "Broken rules", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 500, description = "Commit failed", body = ErrorResponse),
    )
)]
pub async fn recompute_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::from_uuid(id);
    state.membership_service.recompute_pool(pool_id).await?;
    let membership = state.membership_service.get_membership(pool_id).await?;
    Ok(Json(MembershipResponse::new(pool_id, membership)))
}

/// `POST /pools/recompute` — Recompute every pool.
#[utoipa::path(
    post,
    path = "/api/v1/pools/recompute",
    tag = "Membership",
    summary = "Recompute all pools",
    description = "Recomputes every pool concurrently and reports the pools that succeeded and the pools that failed with their errors.",
    responses(
        (status = 200, description = "Per-pool outcome", body = RecomputeReport),
    )
)]
pub async fn recompute_all(State(state): State<AppState>) -> impl IntoResponse {
    let outcomes = state.membership_service.recompute_all().await;
    Json(RecomputeReport::from(&outcomes))
}

/// `GET /pools/{id}/events` — Logged events of a pool.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] for unknown pools and
/// [`GatewayError::PersistenceError`] if the log cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/events",
    tag = "Pools",
    summary = "Pool event log",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
        EventQueryParams,
    ),
    responses(
        (status = 200, description = "Events, oldest first", body = EventListResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn pool_events(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<EventQueryParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::from_uuid(id);
    state.membership_service.get_pool(pool_id).await?;
    let after = params
        .after
        .unwrap_or_else(|| Utc::now() - Duration::hours(24));
    let data = state.store.events_after(after, Some(pool_id)).await?;
    Ok(Json(EventListResponse { data }))
}

/// Pool management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/recompute", post(recompute_all))
        .route(
            "/pools/{id}",
            get(get_pool).put(update_pool).delete(delete_pool),
        )
        .route(
            "/pools/{id}/membership",
            get(get_membership).put(set_membership),
        )
        .route("/pools/{id}/recompute", post(recompute_pool))
        .route("/pools/{id}/events", get(pool_events))
}
