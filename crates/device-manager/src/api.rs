use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use domain::device::{DeviceGroupId, DeviceId, Location, ManagedDevice};
use domain::device_group::ManagedDeviceGroup;
use domain::latency::Latency;
use domain::request::{
    AddDeviceGroupRequest, DeviceLabelRequest, RegisterDeviceRequest, RegisterDeviceResponse,
    RegisterLatencyRequest, UpdateDeviceGroupRequest, UpdateDeviceRequest,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/device-groups", post(add_device_group))
        .route("/api/organizations/{org}/device-groups", get(list_device_groups))
        .route(
            "/api/organizations/{org}/device-groups/{group}",
            get(get_device_group)
                .put(update_device_group)
                .delete(remove_device_group),
        )
        .route("/api/devices", post(register_device))
        .route(
            "/api/organizations/{org}/device-groups/{group}/devices",
            get(list_devices),
        )
        .route(
            "/api/organizations/{org}/device-groups/{group}/devices/{device}",
            get(get_device).put(update_device).delete(remove_device),
        )
        .route(
            "/api/organizations/{org}/device-groups/{group}/devices/{device}/labels",
            post(add_labels).delete(remove_labels),
        )
        .route("/api/latencies", post(register_latency))
        .route(
            "/api/organizations/{org}/device-groups/{group}/latencies",
            get(group_latencies),
        )
        .route(
            "/api/organizations/{org}/device-groups/{group}/devices/{device}/latencies",
            get(device_latencies),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

// --- Device groups ---

async fn add_device_group(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddDeviceGroupRequest>,
) -> ApiResult<(StatusCode, Json<ManagedDeviceGroup>)> {
    let group = state
        .devices
        .add_device_group(&state.context(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn list_device_groups(
    State(state): State<Arc<AppState>>,
    Path(org): Path<String>,
) -> ApiResult<Json<Vec<ManagedDeviceGroup>>> {
    let groups = state
        .devices
        .list_device_groups(&state.context(), &org)
        .await?;
    Ok(Json(groups))
}

async fn get_device_group(
    State(state): State<Arc<AppState>>,
    Path((org, group)): Path<(String, String)>,
) -> ApiResult<Json<ManagedDeviceGroup>> {
    let group = state
        .devices
        .get_device_group(&state.context(), &DeviceGroupId::new(org, group))
        .await?;
    Ok(Json(group))
}

#[derive(Debug, Deserialize)]
struct UpdateDeviceGroupBody {
    #[serde(default)]
    update_enabled: bool,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    update_device_connectivity: bool,
    #[serde(default)]
    default_device_connectivity: bool,
}

async fn update_device_group(
    State(state): State<Arc<AppState>>,
    Path((org, group)): Path<(String, String)>,
    Json(body): Json<UpdateDeviceGroupBody>,
) -> ApiResult<Json<ManagedDeviceGroup>> {
    let request = UpdateDeviceGroupRequest {
        organization_id: org,
        device_group_id: group,
        update_enabled: body.update_enabled,
        enabled: body.enabled,
        update_device_connectivity: body.update_device_connectivity,
        default_device_connectivity: body.default_device_connectivity,
    };
    let group = state
        .devices
        .update_device_group(&state.context(), request)
        .await?;
    Ok(Json(group))
}

async fn remove_device_group(
    State(state): State<Arc<AppState>>,
    Path((org, group)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .devices
        .remove_device_group(&state.context(), &DeviceGroupId::new(org, group))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Devices ---

async fn register_device(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterDeviceRequest>,
) -> ApiResult<(StatusCode, Json<RegisterDeviceResponse>)> {
    let response = state
        .devices
        .register_device(&state.context(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_devices(
    State(state): State<Arc<AppState>>,
    Path((org, group)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ManagedDevice>>> {
    let devices = state
        .devices
        .list_devices(&state.context(), &DeviceGroupId::new(org, group))
        .await?;
    Ok(Json(devices))
}

async fn get_device(
    State(state): State<Arc<AppState>>,
    Path((org, group, device)): Path<(String, String, String)>,
) -> ApiResult<Json<ManagedDevice>> {
    let device = state
        .devices
        .get_device(&state.context(), &DeviceId::new(org, group, device))
        .await?;
    Ok(Json(device))
}

#[derive(Debug, Deserialize)]
struct UpdateDeviceBody {
    enabled: bool,
    #[serde(default)]
    location: Option<Location>,
}

async fn update_device(
    State(state): State<Arc<AppState>>,
    Path((org, group, device)): Path<(String, String, String)>,
    Json(body): Json<UpdateDeviceBody>,
) -> ApiResult<Json<ManagedDevice>> {
    let request = UpdateDeviceRequest {
        organization_id: org,
        device_group_id: group,
        device_id: device,
        enabled: body.enabled,
        location: body.location,
    };
    let device = state
        .devices
        .update_device(&state.context(), request)
        .await?;
    Ok(Json(device))
}

async fn remove_device(
    State(state): State<Arc<AppState>>,
    Path((org, group, device)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    state
        .devices
        .remove_device(&state.context(), &DeviceId::new(org, group, device))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct LabelsBody {
    labels: HashMap<String, String>,
}

fn label_request(
    org: String,
    group: String,
    device: String,
    body: LabelsBody,
) -> DeviceLabelRequest {
    DeviceLabelRequest {
        organization_id: org,
        device_group_id: group,
        device_id: device,
        labels: body.labels,
    }
}

async fn add_labels(
    State(state): State<Arc<AppState>>,
    Path((org, group, device)): Path<(String, String, String)>,
    Json(body): Json<LabelsBody>,
) -> ApiResult<StatusCode> {
    state
        .devices
        .add_label_to_device(&state.context(), label_request(org, group, device, body))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_labels(
    State(state): State<Arc<AppState>>,
    Path((org, group, device)): Path<(String, String, String)>,
    Json(body): Json<LabelsBody>,
) -> ApiResult<StatusCode> {
    state
        .devices
        .remove_label_from_device(&state.context(), label_request(org, group, device, body))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Latency ---

async fn register_latency(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterLatencyRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .latencies
        .register_latency(&state.context(), request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn device_latencies(
    State(state): State<Arc<AppState>>,
    Path((org, group, device)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<Latency>>> {
    let latencies = state
        .latencies
        .device_latencies(&state.context(), &DeviceId::new(org, group, device))
        .await?;
    Ok(Json(latencies))
}

async fn group_latencies(
    State(state): State<Arc<AppState>>,
    Path((org, group)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Latency>>> {
    let latencies = state
        .latencies
        .group_latencies(&state.context(), &DeviceGroupId::new(org, group))
        .await?;
    Ok(Json(latencies))
}
