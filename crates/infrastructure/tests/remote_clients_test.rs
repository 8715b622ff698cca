use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use domain::application_catalog::{AppDescriptor, PortAccess, SecurityRule};
use domain::device::{DeviceGroupId, DeviceId, DeviceLabelUpdate};
use domain::{ApplicationCatalog, CredentialService, DeviceCatalog, ErrorKind};
use infrastructure::remote::{
    DEFAULT_TIMEOUT, HttpApplicationCatalog, HttpCredentialService, HttpDeviceCatalog, RestClient,
};
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<String>>>;

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn rest(service: &'static str, addr: SocketAddr) -> RestClient {
    RestClient::new(service, &format!("http://{addr}"), DEFAULT_TIMEOUT).unwrap()
}

// --- Fake application catalog ---

async fn list_descriptors(Path(org): Path<String>) -> Json<Value> {
    Json(json!([
        {
            "organization_id": org,
            "app_descriptor_id": "app-1",
            "name": "thermostat",
            "rules": [
                { "rule_id": "r-1", "access": "DEVICE_GROUP", "device_group_ids": ["dg-1"] },
                { "rule_id": "r-2", "access": "PUBLIC" }
            ]
        }
    ]))
}

#[tokio::test]
async fn test_app_descriptors_are_decoded() {
    let router = Router::new().route(
        "/organizations/{org}/app-descriptors",
        get(list_descriptors),
    );
    let addr = spawn(router).await;
    let catalog = HttpApplicationCatalog::new(rest("application catalog", addr));

    let descriptors = catalog.list_app_descriptors("org-1").await.unwrap();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(
        descriptors[0],
        AppDescriptor {
            organization_id: "org-1".to_string(),
            app_descriptor_id: "app-1".to_string(),
            name: "thermostat".to_string(),
            rules: vec![
                SecurityRule {
                    rule_id: "r-1".to_string(),
                    access: PortAccess::DeviceGroup,
                    device_group_ids: vec!["dg-1".to_string()],
                },
                SecurityRule {
                    rule_id: "r-2".to_string(),
                    access: PortAccess::Public,
                    device_group_ids: Vec::new(),
                },
            ],
        }
    );
    assert!(descriptors[0].references_device_group("dg-1"));
}

// --- Fake credential service ---

async fn login(Json(body): Json<Value>) -> StatusCode {
    match body["device_group_api_key"].as_str() {
        Some("group-key") => StatusCode::OK,
        Some("revoked-key") => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn remove_device_credentials(
    State(seen): State<Seen>,
    Path((org, group, device)): Path<(String, String, String)>,
) -> StatusCode {
    seen.lock().unwrap().push(format!("{org}/{group}/{device}"));
    if device == "gone" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn group_credentials_unavailable() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "authx is restarting")
}

fn credential_router(seen: Seen) -> Router {
    Router::new()
        .route("/login/device-group", post(login))
        .route(
            "/device-groups/{org}/{group}",
            get(group_credentials_unavailable),
        )
        .route(
            "/device-groups/{org}/{group}/devices/{device}",
            delete(remove_device_credentials),
        )
        .with_state(seen)
}

#[tokio::test]
async fn test_login_rejection_is_a_client_error() {
    let addr = spawn(credential_router(Seen::default())).await;
    let credentials = HttpCredentialService::new(rest("authx", addr));

    credentials
        .device_group_login("org-1", "group-key")
        .await
        .unwrap();
    let err = credentials
        .device_group_login("org-1", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    let err = credentials
        .device_group_login("org-1", "revoked-key")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_delete_of_missing_credentials_succeeds() {
    let seen = Seen::default();
    let addr = spawn(credential_router(seen.clone())).await;
    let credentials = HttpCredentialService::new(rest("authx", addr));

    credentials
        .remove_device_credentials(&DeviceId::new("org-1", "dg-1", "sensor-1"))
        .await
        .unwrap();
    credentials
        .remove_device_credentials(&DeviceId::new("org-1", "dg-1", "gone"))
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["org-1/dg-1/sensor-1", "org-1/dg-1/gone"]
    );
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let addr = spawn(credential_router(Seen::default())).await;
    let credentials = HttpCredentialService::new(rest("authx", addr));

    let err = credentials
        .get_device_group_credentials(&DeviceGroupId::new("org-1", "dg-1"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("authx is restarting"));
}

// --- Fake device catalog ---

async fn list_devices(Path((org, group)): Path<(String, String)>) -> Json<Value> {
    Json(json!([
        { "organization_id": org, "device_group_id": group, "device_id": "d0", "register_since": 1700000000 },
        { "organization_id": org, "device_group_id": group, "device_id": "d1", "register_since": 1700000100,
          "labels": { "zone": "north" } }
    ]))
}

async fn update_device(
    Path((org, group, device)): Path<(String, String, String)>,
    Json(update): Json<DeviceLabelUpdate>,
) -> Json<Value> {
    let labels = if update.add_labels {
        update.labels
    } else {
        HashMap::new()
    };
    Json(json!({
        "organization_id": org,
        "device_group_id": group,
        "device_id": device,
        "register_since": 1700000000,
        "labels": labels,
    }))
}

#[tokio::test]
async fn test_catalog_lists_and_updates_devices() {
    let router = Router::new()
        .route(
            "/organizations/{org}/device-groups/{group}/devices",
            get(list_devices),
        )
        .route(
            "/organizations/{org}/device-groups/{group}/devices/{device}",
            axum::routing::patch(update_device),
        );
    let addr = spawn(router).await;
    let catalog = HttpDeviceCatalog::new(rest("device catalog", addr));

    let devices = catalog
        .list_devices(&DeviceGroupId::new("org-1", "dg-1"))
        .await
        .unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1].labels.get("zone").map(String::as_str), Some("north"));
    assert!(devices[0].labels.is_empty());

    let updated = catalog
        .update_device(DeviceLabelUpdate {
            organization_id: "org-1".to_string(),
            device_group_id: "dg-1".to_string(),
            device_id: "d0".to_string(),
            add_labels: true,
            remove_labels: false,
            labels: HashMap::from([("rack".to_string(), "7".to_string())]),
        })
        .await
        .unwrap();
    assert_eq!(updated.labels.get("rack").map(String::as_str), Some("7"));
}

// --- Transport failures ---

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let catalog = HttpDeviceCatalog::new(rest("device catalog", addr));
    let err = catalog
        .get_device(&DeviceId::new("org-1", "dg-1", "d0"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[tokio::test]
async fn test_slow_service_times_out_as_unavailable() {
    let router = Router::new().route(
        "/organizations/{org}/app-descriptors",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    );
    let addr = spawn(router).await;
    let client = RestClient::new(
        "application catalog",
        &format!("http://{addr}"),
        Duration::from_millis(200),
    )
    .unwrap();

    let err = HttpApplicationCatalog::new(client)
        .list_app_descriptors("org-1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}
