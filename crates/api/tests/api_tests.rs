// Image submission API tests

use api::{create_router, AppState, PROCESSING_ERROR};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use frame_source::VideoFrame;
use perception::{Detection, DetectionError, ObjectDetector};
use pipeline::AssistConfig;
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

struct FixedDetector(Vec<Detection>);

impl ObjectDetector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        Ok(self.0.clone())
    }
}

struct BrokenDetector;

impl ObjectDetector for BrokenDetector {
    fn name(&self) -> &str {
        "broken"
    }

    fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        Err(DetectionError::Inference("session lost".into()))
    }
}

fn router(detector: Arc<dyn ObjectDetector>) -> Router {
    let state = Arc::new(AppState::new(detector, &AssistConfig::default()));
    create_router(state, None)
}

fn scene_detector() -> Arc<dyn ObjectDetector> {
    Arc::new(FixedDetector(vec![
        // frame is 64x64
        Detection::new("chair", 0.55, [1.0, 40.0, 8.0, 50.0]),
        Detection::new("person", 0.92, [28.0, 10.0, 36.0, 60.0]),
        Detection::new("cup", 0.1, [0.0, 0.0, 5.0, 5.0]),
    ]))
}

/// Noisy 64x64 PNG, well above the minimum payload size
fn noisy_png() -> Vec<u8> {
    let mut seed: u32 = 12345;
    let img = image::RgbImage::from_fn(64, 64, |_, _| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let b = (seed >> 16) as u8;
        image::Rgb([b, b.wrapping_mul(3), b.wrapping_add(91)])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn post(uri: &str, content_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = router(scene_detector())
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["detector"], "fixed");
}

#[tokio::test]
async fn test_detect_image() {
    let response = router(scene_detector())
        .oneshot(post("/api/v1/detect", "image/png", noisy_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["width"], 64);
    assert_eq!(json["count"], 2);
    assert_eq!(json["descriptions"][0], "Object 1: person (92.0%)");
    assert_eq!(json["descriptions"][1], "Object 2: chair (55.0%)");
    assert_eq!(json["objects"][0]["label"], "person");
    assert_eq!(json["objects"][0]["center"][0], 32.0);
    assert_eq!(json["objects"][0]["size"][1], 50.0);
}

#[tokio::test]
async fn test_rejects_non_image_content_type() {
    let response = router(scene_detector())
        .oneshot(post("/api/v1/detect", "text/plain", noisy_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("text/plain"));
}

#[tokio::test]
async fn test_rejects_tiny_payload() {
    let response = router(scene_detector())
        .oneshot(post("/api/v1/detect", "image/jpeg", vec![0xFF; 200]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("too small"));
}

#[tokio::test]
async fn test_rejects_undecodable_image() {
    let response = router(scene_detector())
        .oneshot(post("/api/v1/detect", "image/jpeg", vec![0x42; 4096]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detector_failure_is_500() {
    let response = router(Arc::new(BrokenDetector))
        .oneshot(post("/api/v1/detect", "image/png", noisy_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], PROCESSING_ERROR);
}

#[tokio::test]
async fn test_realtime_frame() {
    let response = router(scene_detector())
        .oneshot(post("/api/v1/realtime/frame", "image/png", noisy_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["detections"].as_array().unwrap().len(), 2);
    assert_eq!(json["detections"][0]["zone"]["horizontal"], "center");
    assert_eq!(json["detections"][0]["zone"]["in_danger_zone"], true);
    assert_eq!(json["detections"][1]["zone"]["horizontal"], "left");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_realtime_frame_error_in_body() {
    let response = router(Arc::new(BrokenDetector))
        .oneshot(post("/api/v1/realtime/frame", "image/png", noisy_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], PROCESSING_ERROR);
    assert!(json.get("detections").is_none());
}

#[tokio::test]
async fn test_metrics_without_exporter() {
    let response = router(scene_detector())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
