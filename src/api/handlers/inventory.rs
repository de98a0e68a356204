//! Device and link handlers plus bulk import.
//!
//! Every mutation answers with the stored object and the outcome of the
//! pool membership update it triggered. A failed update does not turn the
//! response into an error: the object change is committed either way.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    DeleteObjectResponse, DeviceResponse, ImportRequest, LinkResponse, ObjectListResponse,
    PaginationParams, PoolSyncStatus, SuppressParams,
};
use crate::app_state::AppState;
use crate::domain::{ObjectClass, ObjectId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{DeviceSpec, ImportReport, LinkPatch, LinkSpec, PropertyPatch};

async fn list_objects(
    state: &AppState,
    class: ObjectClass,
    params: &PaginationParams,
) -> Result<ObjectListResponse, GatewayError> {
    let objects = state.inventory_service.list(class).await?;
    let (data, pagination) = params.paginate(objects);
    Ok(ObjectListResponse { data, pagination })
}

async fn delete_object(
    state: &AppState,
    class: ObjectClass,
    id: uuid::Uuid,
) -> Result<DeleteObjectResponse, GatewayError> {
    let synced = state
        .inventory_service
        .delete_object(class, ObjectId::from_uuid(id))
        .await?;
    Ok(DeleteObjectResponse {
        pool_sync: PoolSyncStatus::from(&synced.pool_sync),
        object: synced.value,
    })
}

/// `GET /devices` — List devices.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "Inventory",
    summary = "List devices",
    params(PaginationParams),
    responses(
        (status = 200, description = "Devices ordered by name", body = ObjectListResponse),
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(
        list_objects(&state, ObjectClass::Device, &params).await?,
    ))
}

/// `POST /devices` — Create a device.
///
/// # Errors
///
/// Returns [`GatewayError`] on a duplicate name or an invalid property.
#[utoipa::path(
    post,
    path = "/api/v1/devices",
    tag = "Inventory",
    summary = "Create a device",
    description = "Stores a device and adds it to every dynamic pool it matches, unless `suppress_pool_sync` is set.",
    params(SuppressParams),
    request_body = DeviceSpec,
    responses(
        (status = 201, description = "Device created", body = DeviceResponse),
        (status = 400, description = "Invalid property", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    )
)]
pub async fn create_device(
    State(state): State<AppState>,
    Query(params): Query<SuppressParams>,
    Json(req): Json<DeviceSpec>,
) -> Result<impl IntoResponse, GatewayError> {
    let synced = state
        .inventory_service
        .create_device(req, params.suppress_pool_sync)
        .await?;
    let response = DeviceResponse {
        pool_sync: PoolSyncStatus::from(&synced.pool_sync),
        device: synced.value,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /devices/{id}` — Get a device.
///
/// # Errors
///
/// Returns [`GatewayError::ObjectNotFound`] if the device does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}",
    tag = "Inventory",
    summary = "Get a device",
    params(
        ("id" = uuid::Uuid, Path, description = "Device UUID"),
    ),
    responses(
        (status = 200, description = "Device", body = crate::domain::Device),
        (status = 404, description = "Device not found", body = ErrorResponse),
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let device = state
        .inventory_service
        .device(ObjectId::from_uuid(id))
        .await?;
    Ok(Json(device))
}

/// `PATCH /devices/{id}` — Change device properties.
///
/// # Errors
///
/// Returns [`GatewayError`] if the device is missing or the patch invalid.
#[utoipa::path(
    patch,
    path = "/api/v1/devices/{id}",
    tag = "Inventory",
    summary = "Update a device",
    description = "Applies a property-name to value map. Renaming a device also refreshes its links.",
    params(
        ("id" = uuid::Uuid, Path, description = "Device UUID"),
        SuppressParams,
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Device updated", body = DeviceResponse),
        (status = 400, description = "Invalid property", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
    )
)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<SuppressParams>,
    Json(patch): Json<PropertyPatch>,
) -> Result<impl IntoResponse, GatewayError> {
    let synced = state
        .inventory_service
        .update_device(ObjectId::from_uuid(id), patch, params.suppress_pool_sync)
        .await?;
    Ok(Json(DeviceResponse {
        pool_sync: PoolSyncStatus::from(&synced.pool_sync),
        device: synced.value,
    }))
}

/// `DELETE /devices/{id}` — Delete a device and its links.
///
/// # Errors
///
/// Returns [`GatewayError::ObjectNotFound`] if the device does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/devices/{id}",
    tag = "Inventory",
    summary = "Delete a device",
    params(
        ("id" = uuid::Uuid, Path, description = "Device UUID"),
    ),
    responses(
        (status = 200, description = "Device deleted", body = DeleteObjectResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
    )
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(delete_object(&state, ObjectClass::Device, id).await?))
}

/// `GET /links` — List links.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/links",
    tag = "Inventory",
    summary = "List links",
    params(PaginationParams),
    responses(
        (status = 200, description = "Links ordered by name", body = ObjectListResponse),
    )
)]
pub async fn list_links(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(list_objects(&state, ObjectClass::Link, &params).await?))
}

/// `POST /links` — Create a link.
///
/// # Errors
///
/// Returns [`GatewayError`] on unknown endpoints, a duplicate name or an
/// invalid property.
#[utoipa::path(
    post,
    path = "/api/v1/links",
    tag = "Inventory",
    summary = "Create a link",
    description = "Stores a link between two devices given by ID or name.",
    params(SuppressParams),
    request_body = LinkSpec,
    responses(
        (status = 201, description = "Link created", body = LinkResponse),
        (status = 400, description = "Invalid endpoint or property", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    )
)]
pub async fn create_link(
    State(state): State<AppState>,
    Query(params): Query<SuppressParams>,
    Json(req): Json<LinkSpec>,
) -> Result<impl IntoResponse, GatewayError> {
    let synced = state
        .inventory_service
        .create_link(req, params.suppress_pool_sync)
        .await?;
    let response = LinkResponse {
        pool_sync: PoolSyncStatus::from(&synced.pool_sync),
        link: synced.value,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /links/{id}` — Get a link.
///
/// # Errors
///
/// Returns [`GatewayError::ObjectNotFound`] if the link does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/links/{id}",
    tag = "Inventory",
    summary = "Get a link",
    params(
        ("id" = uuid::Uuid, Path, description = "Link UUID"),
    ),
    responses(
        (status = 200, description = "Link", body = crate::domain::Link),
        (status = 404, description = "Link not found", body = ErrorResponse),
    )
)]
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let link = state
        .inventory_service
        .link(ObjectId::from_uuid(id))
        .await?;
    Ok(Json(link))
}

/// `PATCH /links/{id}` — Change link endpoints or properties.
///
/// # Errors
///
/// Returns [`GatewayError`] if the link is missing or the patch invalid.
#[utoipa::path(
    patch,
    path = "/api/v1/links/{id}",
    tag = "Inventory",
    summary = "Update a link",
    params(
        ("id" = uuid::Uuid, Path, description = "Link UUID"),
        SuppressParams,
    ),
    request_body = LinkPatch,
    responses(
        (status = 200, description = "Link updated", body = LinkResponse),
        (status = 400, description = "Invalid endpoint or property", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse),
    )
)]
pub async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<SuppressParams>,
    Json(patch): Json<LinkPatch>,
) -> Result<impl IntoResponse, GatewayError> {
    let synced = state
        .inventory_service
        .update_link(ObjectId::from_uuid(id), patch, params.suppress_pool_sync)
        .await?;
    Ok(Json(LinkResponse {
        pool_sync: PoolSyncStatus::from(&synced.pool_sync),
        link: synced.value,
    }))
}

/// `DELETE /links/{id}` — Delete a link.
///
/// # Errors
///
/// Returns [`GatewayError::ObjectNotFound`] if the link does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/links/{id}",
    tag = "Inventory",
    summary = "Delete a link",
    params(
        ("id" = uuid::Uuid, Path, description = "Link UUID"),
    ),
    responses(
        (status = 200, description = "Link deleted", body = DeleteObjectResponse),
        (status = 404, description = "Link not found", body = ErrorResponse),
    )
)]
pub async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(delete_object(&state, ObjectClass::Link, id).await?))
}

/// `POST /inventory/import` — Bulk import.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/import",
    tag = "Inventory",
    summary = "Import devices and links",
    description = "Creates or updates objects by name without per-object pool updates, then recomputes every pool once.",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import outcome", body = ImportReport),
    )
)]
pub async fn import_inventory(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> impl IntoResponse {
    Json(
        state
            .inventory_service
            .bulk_import(req.devices, req.links)
            .await,
    )
}

/// Inventory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices).post(create_device))
        .route(
            "/devices/{id}",
            get(get_device).patch(update_device).delete(delete_device),
        )
        .route("/links", get(list_links).post(create_link))
        .route(
            "/links/{id}",
            get(get_link).patch(update_link).delete(delete_link),
        )
        .route("/inventory/import", post(import_inventory))
}
