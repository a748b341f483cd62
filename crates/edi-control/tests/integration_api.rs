//! Integration tests for the HTTP API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::TestControl;
use edi_control::api::{router, AppState, ErrorResponse};
use edi_control::{DeploymentView, ErrorKind, InspectReport};
use tower::ServiceExt;

fn make_app(control: &TestControl) -> Router {
    router(AppState {
        service: Arc::clone(&control.service),
        request_timeout: Duration::from_secs(30),
    })
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("failed to parse body")
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

#[tokio::test]
async fn deploy_and_inspect_over_http() {
    let control = TestControl::new();
    control.enclave("production");
    control.seed_image("img1", "demo", "1.0");
    let app = make_app(&control);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/enclaves/production/models",
            serde_json::json!({"image": "img1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let view: DeploymentView = body_json(response).await;
    assert_eq!(view.model_id, "demo");
    assert_eq!(view.model_version, "1.0");
    assert_eq!(view.desired_replicas, 1);
    assert_eq!(view.enclave, "production");

    let response = app
        .oneshot(empty_request("GET", "/enclaves/production/models"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: InspectReport = body_json(response).await;
    assert_eq!(report.len(), 1);
    assert_eq!(report.get("demo").expect("demo missing").image, "img1");
}

#[tokio::test]
async fn duplicate_deploy_conflicts() {
    let control = TestControl::new();
    control.enclave("production");
    control.seed_image("img1", "demo", "1.0");
    let app = make_app(&control);

    let request = || {
        json_request(
            "POST",
            "/enclaves/production/models",
            serde_json::json!({"image": "img1"}),
        )
    };

    let response = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.kind, ErrorKind::DuplicateDeployment);
    assert!(error.error.contains("Duplicating model id and version"));
    assert!(error.error.contains("id=demo"));
    assert!(error.error.contains("version=1.0"));
}

#[tokio::test]
async fn invalid_scale_is_bad_request() {
    let control = TestControl::new();
    control.enclave("production");
    let app = make_app(&control);

    let response = app
        .oneshot(json_request(
            "POST",
            "/enclaves/production/models",
            serde_json::json!({"image": "img1", "scale": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.kind, ErrorKind::InvalidScale);
    assert!(error.error.contains("should be greater than 0"));
}

#[tokio::test]
async fn unresolvable_image_is_bad_request() {
    let control = TestControl::new();
    control.enclave("production");
    let app = make_app(&control);

    let response = app
        .oneshot(json_request(
            "POST",
            "/enclaves/production/models",
            serde_json::json!({"image": "img1test"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.kind, ErrorKind::ImageResolution);
    assert_eq!(error.error, "Can't get image labels for img1test");
}

#[tokio::test]
async fn scale_endpoint_updates_and_rejects() {
    let control = TestControl::new();
    control.enclave("production");
    control.seed_image("img1", "demo", "1.0");
    let app = make_app(&control);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/enclaves/production/models",
            serde_json::json!({"image": "img1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/enclaves/production/models/demo/scale",
            serde_json::json!({"scale": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated: Vec<DeploymentView> = body_json(response).await;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].desired_replicas, 2);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/enclaves/production/models/absent/scale",
            serde_json::json!({"scale": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.kind, ErrorKind::ModelNotFound);
    assert_eq!(error.error, "No one model can be found");
}

#[tokio::test]
async fn undeploy_endpoint_is_idempotent() {
    let control = TestControl::new();
    control.enclave("production");
    control.seed_image("img1", "demo", "1.0");
    let app = make_app(&control);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/enclaves/production/models",
            serde_json::json!({"image": "img1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/enclaves/production/models/demo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let removed: Vec<DeploymentView> = body_json(response).await;
    assert_eq!(removed.len(), 1);

    let response = app
        .oneshot(empty_request("DELETE", "/enclaves/production/models/demo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let removed: Vec<DeploymentView> = body_json(response).await;
    assert!(removed.is_empty());
}

#[tokio::test]
async fn undeploy_specific_version_via_query() {
    let control = TestControl::new();
    control.enclave("production");
    control.seed_image("img-v1", "demo", "1.0");
    control.seed_image("img-v2", "demo", "2.0");
    let app = make_app(&control);

    for image in ["img-v1", "img-v2"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/enclaves/production/models",
                serde_json::json!({"image": image}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(empty_request(
            "DELETE",
            "/enclaves/production/models/demo?version=1.0",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let removed: Vec<DeploymentView> = body_json(response).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].model_version, "1.0");

    let response = app
        .oneshot(empty_request("GET", "/enclaves/production/models"))
        .await
        .unwrap();
    let report: InspectReport = body_json(response).await;
    assert_eq!(report.len(), 1);
    assert!(report.find("demo", "2.0").is_some());
}

#[tokio::test]
async fn inspect_empty_versus_unreachable() {
    let control = TestControl::new();
    control.enclave("production");
    let app = make_app(&control);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/enclaves/production/models"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: InspectReport = body_json(response).await;
    assert!(report.is_empty());

    let response = app
        .oneshot(empty_request("GET", "/enclaves/vanished/models"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.kind, ErrorKind::Connection);
    assert!(error.error.contains("Failed to connect"));
}

#[tokio::test]
async fn inspect_filter_by_model_id() {
    let control = TestControl::new();
    control.enclave("production");
    control.seed_image("img1", "demo", "1.0");
    control.seed_image("img2", "other", "1.0");
    let app = make_app(&control);

    for image in ["img1", "img2"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/enclaves/production/models",
                serde_json::json!({"image": image}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(empty_request(
            "GET",
            "/enclaves/production/models?model_id=other",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: InspectReport = body_json(response).await;
    assert_eq!(report.len(), 1);
    assert!(report.get("other").is_some());
}
