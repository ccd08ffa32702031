//! Single-image detection

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::{analyze, check_content_type, DetectedObject};
use crate::{ApiError, AppState};

/// Response for the detect endpoint
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub success: bool,
    pub width: u32,
    pub height: u32,
    pub count: usize,
    /// "Object n: label (pct%)" for the most confident objects
    pub descriptions: Vec<String>,
    pub objects: Vec<DetectedObject>,
}

/// Detect objects in a raw `image/*` body
pub async fn detect_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DetectResponse>, ApiError> {
    check_content_type(&headers)?;

    let analysis = analyze(&state, body.to_vec()).await?;
    let descriptions = scene::detection_list(&analysis.detections, state.settings.max_descriptions);
    info!(
        "Detected {} objects in {}x{} image",
        analysis.objects.len(),
        analysis.width,
        analysis.height
    );

    Ok(Json(DetectResponse {
        success: true,
        width: analysis.width,
        height: analysis.height,
        count: analysis.objects.len(),
        descriptions,
        objects: analysis.objects,
    }))
}
