//! API integration tests driving the router directly.
//!
//! Model files are not present in the test environment, so `/analyze`
//! exercises the fetch and error paths; detector behavior is covered by
//! unit tests in `argus-vision`.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use image::{ImageOutputFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use argus_api::{create_router, ApiConfig, AppState};
use argus_fetch::{SnapshotClient, SnapshotClientConfig};
use argus_vision::{Analyzer, FaceDetectorConfig, ObjectDetectorConfig};

fn test_app() -> axum::Router {
    let analyzer = Analyzer::new(
        ObjectDetectorConfig {
            model_path: "/nonexistent/yolo.onnx".to_string(),
            ..Default::default()
        },
        FaceDetectorConfig {
            locator_model_path: "/nonexistent/locator.onnx".to_string(),
            encoder_model_path: "/nonexistent/encoder.onnx".to_string(),
            ..Default::default()
        },
    );
    let state = AppState {
        config: ApiConfig::default(),
        snapshots: Arc::new(SnapshotClient::new(SnapshotClientConfig::default()).unwrap()),
        analyzer: Arc::new(analyzer),
    };
    create_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn jpeg_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([90, 120, 40]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageOutputFormat::Jpeg(90)).unwrap();
    buffer.into_inner()
}

#[tokio::test]
async fn health_returns_ok() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn ptz_always_not_implemented() {
    let response = test_app()
        .oneshot(post_json(
            "/ptz",
            json!({ "camera": { "lastSnapshotUrl": "http://cam/1.jpg" }, "params": { "pan": 10 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "not_implemented");
}

#[tokio::test]
async fn snapshot_without_uri_is_400() {
    let response = test_app()
        .oneshot(post_json("/snapshot", json!({ "camera": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["detail"], "No snapshot URI available for camera");
}

#[tokio::test]
async fn snapshot_returns_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/snap.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(jpeg_bytes(), "image/jpeg"))
        .mount(&server)
        .await;

    let response = test_app()
        .oneshot(post_json(
            "/snapshot",
            json!({ "camera": { "lastSnapshotUrl": format!("{}/snap.jpg", server.uri()) } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let data_url = body["dataUrl"].as_str().unwrap();
    assert!(data_url.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn snapshot_upstream_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/snap.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = test_app()
        .oneshot(post_json(
            "/snapshot",
            json!({ "camera": { "lastSnapshotUrl": format!("{}/snap.jpg", server.uri()) } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn analyze_maps_upstream_404_to_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/snap.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = test_app()
        .oneshot(post_json(
            "/analyze",
            json!({
                "cameraId": "cam-1",
                "snapshotUri": format!("{}/snap.jpg", server.uri())
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn analyze_with_missing_model_is_500() {
    // Fetch succeeds, then lazy object-detector init fails
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/snap.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(jpeg_bytes(), "image/jpeg"))
        .mount(&server)
        .await;

    let response = test_app()
        .oneshot(post_json(
            "/analyze",
            json!({
                "cameraId": "cam-1",
                "snapshotUri": format!("{}/snap.jpg", server.uri())
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
