//! Image submission routes

pub mod detect;
pub mod realtime;

use axum::http::{header, HeaderMap};
use frame_source::{decode_image, InputError};
use metrics::counter;
use perception::{by_confidence_desc, Detection, ZoneClassifier, ZoneTag};
use serde::Serialize;

use crate::{ApiError, AppState};

/// One detected object with its position
#[derive(Debug, Clone, Serialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32,
    /// x1, y1, x2, y2 in pixels
    pub bbox: [f32; 4],
    pub center: [f32; 2],
    /// Width and height in pixels
    pub size: [f32; 2],
    pub zone: ZoneTag,
}

impl DetectedObject {
    fn new(det: &Detection, zone: ZoneTag) -> Self {
        Self {
            label: det.label.clone(),
            confidence: det.confidence,
            bbox: [det.bbox.x1, det.bbox.y1, det.bbox.x2, det.bbox.y2],
            center: [det.bbox.center_x(), det.bbox.center_y()],
            size: [det.bbox.width(), det.bbox.height()],
            zone,
        }
    }
}

/// Accepted detections of one submitted image, highest confidence first
#[derive(Debug, Clone)]
pub struct Analysis {
    pub width: u32,
    pub height: u32,
    pub detections: Vec<Detection>,
    pub objects: Vec<DetectedObject>,
}

/// Require an `image/*` content type
pub fn check_content_type(headers: &HeaderMap) -> Result<(), InputError> {
    let value = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if value.starts_with("image/") {
        Ok(())
    } else {
        Err(InputError::UnsupportedContentType(if value.is_empty() {
            "missing".to_string()
        } else {
            value.to_string()
        }))
    }
}

/// Reject empty and implausibly small payloads before decoding
pub fn check_size(body: &[u8], min: usize) -> Result<(), InputError> {
    if body.is_empty() {
        Err(InputError::Empty)
    } else if body.len() < min {
        Err(InputError::TooSmall {
            size: body.len(),
            min,
        })
    } else {
        Ok(())
    }
}

/// Decode, detect and zone one image off the async runtime
pub async fn analyze(state: &AppState, body: Vec<u8>) -> Result<Analysis, ApiError> {
    let result = run_analysis(state, body).await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    counter!("detection_requests_total", "outcome" => outcome).increment(1);
    result
}

async fn run_analysis(state: &AppState, body: Vec<u8>) -> Result<Analysis, ApiError> {
    check_size(&body, state.settings.min_image_bytes)?;

    let stage = state.detection.clone();
    let classifier: ZoneClassifier = state.classifier.clone();

    tokio::task::spawn_blocking(move || -> Result<Analysis, ApiError> {
        let frame = decode_image(&body)?;
        let mut detections = stage.detect(&frame)?;
        detections.sort_by(by_confidence_desc);

        let objects = detections
            .iter()
            .map(|d| DetectedObject::new(d, classifier.classify(d, frame.width, frame.height)))
            .collect();

        Ok(Analysis {
            width: frame.width,
            height: frame.height,
            detections,
            objects,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("detection task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            check_content_type(&headers),
            Err(InputError::UnsupportedContentType("missing".into()))
        );

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(check_content_type(&headers).is_err());

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
        assert!(check_content_type(&headers).is_ok());
    }

    #[test]
    fn test_size_limits() {
        assert_eq!(check_size(&[], 1024), Err(InputError::Empty));
        assert_eq!(
            check_size(&[0u8; 100], 1024),
            Err(InputError::TooSmall { size: 100, min: 1024 })
        );
        assert!(check_size(&[0u8; 1024], 1024).is_ok());
    }
}
