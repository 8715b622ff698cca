use std::sync::Arc;
use std::time::Duration;

use application::{DeviceManager, LatencyManager, StatusAggregator};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use device_manager::api::create_router;
use device_manager::state::AppState;
use domain::application_catalog::{AppDescriptor, MockApplicationCatalog, PortAccess, SecurityRule};
use domain::credentials::MockCredentialService;
use domain::device::{Device, DeviceCredentials, DeviceId, MockDeviceCatalog};
use domain::latency::LivenessPolicy;
use domain::DomainError;
use infrastructure::InMemoryLatencyStore;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Collaborators {
    credentials: MockCredentialService,
    catalog: MockDeviceCatalog,
    applications: MockApplicationCatalog,
}

impl Collaborators {
    fn new() -> Self {
        Self {
            credentials: MockCredentialService::new(),
            catalog: MockDeviceCatalog::new(),
            applications: MockApplicationCatalog::new(),
        }
    }

    fn app(self) -> Router {
        create_router(self.state())
    }

    fn state(self) -> Arc<AppState> {
        let store = Arc::new(InMemoryLatencyStore::new());
        let status = StatusAggregator::new(
            store.clone(),
            LivenessPolicy::new(Duration::from_secs(180)),
        );
        let devices = DeviceManager::new(
            Arc::new(self.credentials),
            Arc::new(self.catalog),
            Arc::new(self.applications),
            store.clone(),
            status,
        );
        let state = AppState::new(
            devices,
            LatencyManager::new(store),
            Duration::from_secs(5),
            Duration::from_secs(30),
        );
        Arc::new(state)
    }
}

fn device(id: &DeviceId) -> Device {
    Device::new(
        id.organization_id.clone(),
        id.device_group_id.clone(),
        id.device_id.clone(),
        1_700_000_000,
    )
}

fn credentials(id: &DeviceId) -> DeviceCredentials {
    DeviceCredentials {
        organization_id: id.organization_id.clone(),
        device_group_id: id.device_group_id.clone(),
        device_id: id.device_id.clone(),
        enabled: true,
        device_api_key: "device-key".to_string(),
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const DEVICE_URI: &str = "/api/organizations/org-1/device-groups/dg-1/devices/sensor-1";
const GROUP_URI: &str = "/api/organizations/org-1/device-groups/dg-1";

#[tokio::test]
async fn test_health() {
    let response = Collaborators::new()
        .app()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_device_is_online_after_ping() {
    let mut collaborators = Collaborators::new();
    collaborators
        .catalog
        .expect_get_device()
        .returning(|id| Ok(device(id)));
    collaborators
        .credentials
        .expect_get_device_credentials()
        .returning(|id| Ok(credentials(id)));
    let app = collaborators.app();

    let response = app
        .clone()
        .oneshot(empty_request("GET", DEVICE_URI))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["device_status"], "OFFLINE");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/latencies",
            json!({
                "organization_id": "org-1",
                "device_group_id": "dg-1",
                "device_id": "sensor-1",
                "latency": 25
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", DEVICE_URI))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["device_status"], "ONLINE");
    assert_eq!(body["device_api_key"], "device-key");
}

#[tokio::test]
async fn test_non_positive_latency_is_bad_request() {
    let response = Collaborators::new()
        .app()
        .oneshot(json_request(
            "POST",
            "/api/latencies",
            json!({
                "organization_id": "org-1",
                "device_group_id": "dg-1",
                "device_id": "sensor-1",
                "latency": 0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let mut collaborators = Collaborators::new();
    collaborators
        .catalog
        .expect_get_device()
        .returning(|id| Err(DomainError::NotFound(id.to_string())));

    let response = collaborators
        .app()
        .oneshot(empty_request("GET", DEVICE_URI))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_group_key_is_unauthorized() {
    let mut collaborators = Collaborators::new();
    collaborators
        .credentials
        .expect_device_group_login()
        .times(1)
        .returning(|_, _| Err(DomainError::Unauthenticated("authx: bad key".to_string())));
    collaborators.catalog.expect_add_device().never();

    let response = collaborators
        .app()
        .oneshot(json_request(
            "POST",
            "/api/devices",
            json!({
                "organization_id": "org-1",
                "device_group_id": "dg-1",
                "device_id": "sensor-1",
                "device_group_api_key": "wrong",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_linked_group_removal_is_precondition_failed() {
    let mut collaborators = Collaborators::new();
    collaborators
        .applications
        .expect_list_app_descriptors()
        .times(1)
        .returning(|org| {
            Ok(vec![AppDescriptor {
                organization_id: org.to_string(),
                app_descriptor_id: "app-1".to_string(),
                name: "thermostat".to_string(),
                rules: vec![SecurityRule {
                    rule_id: "r-1".to_string(),
                    access: PortAccess::DeviceGroup,
                    device_group_ids: vec!["dg-1".to_string()],
                }],
            }])
        });
    collaborators
        .credentials
        .expect_update_device_group_credentials()
        .never();

    let response = collaborators
        .app()
        .oneshot(empty_request("DELETE", GROUP_URI))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "FAILED_PRECONDITION");
    assert_eq!(body["stage"], "precondition");
}

#[tokio::test]
async fn test_partial_group_removal_reports_stage() {
    let mut collaborators = Collaborators::new();
    collaborators
        .applications
        .expect_list_app_descriptors()
        .returning(|_| Ok(Vec::new()));
    collaborators
        .credentials
        .expect_update_device_group_credentials()
        .times(1)
        .returning(|_| Ok(()));
    collaborators.catalog.expect_list_devices().returning(|group| {
        Ok(vec![
            device(&group.device("d0")),
            device(&group.device("d1")),
        ])
    });
    collaborators
        .credentials
        .expect_remove_device_credentials()
        .returning(|id| {
            if id.device_id == "d1" {
                Err(DomainError::unavailable("authx down"))
            } else {
                Ok(())
            }
        });
    collaborators
        .catalog
        .expect_remove_device()
        .withf(|id: &DeviceId| id.device_id == "d0")
        .times(1)
        .returning(|_| Ok(()));
    collaborators
        .credentials
        .expect_remove_device_group_credentials()
        .never();
    collaborators.catalog.expect_remove_device_group().never();

    let response = collaborators
        .app()
        .oneshot(empty_request("DELETE", GROUP_URI))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["stage"], "remove_device");
    assert_eq!(body["index"], 1);
    assert_eq!(body["device_id"], "d1");
    assert_eq!(body["step"], "credentials");
}

#[tokio::test]
async fn test_group_removal_stops_once_server_cancels_requests() {
    let mut collaborators = Collaborators::new();
    collaborators
        .applications
        .expect_list_app_descriptors()
        .returning(|_| Ok(Vec::new()));
    collaborators
        .credentials
        .expect_update_device_group_credentials()
        .never();
    let state = collaborators.state();
    state.cancel_in_flight();

    let response = create_router(state)
        .oneshot(empty_request("DELETE", GROUP_URI))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "CANCELLED");
    assert_eq!(body["stage"], "precondition");
}

#[tokio::test]
async fn test_latency_history_is_not_implemented() {
    let response = Collaborators::new()
        .app()
        .oneshot(empty_request("GET", &format!("{DEVICE_URI}/latencies")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_group_update_requires_a_flag() {
    let response = Collaborators::new()
        .app()
        .oneshot(json_request("PUT", GROUP_URI, json!({ "enabled": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
