//! Per-frame detection for streaming clients
//!
//! Frames arrive either as individual POSTs or as binary WebSocket
//! messages; each gets one `FrameResult`.

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::{analyze, check_content_type, DetectedObject};
use crate::{ApiError, AppState};

/// Outcome of one streamed frame
#[derive(Debug, Serialize)]
pub struct FrameResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<DetectedObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameResult {
    fn from_result(result: Result<Vec<DetectedObject>, ApiError>) -> Self {
        match result {
            Ok(objects) => Self {
                success: true,
                detections: Some(objects),
                error: None,
            },
            Err(e) => {
                debug!("Frame rejected: {}", e);
                Self {
                    success: false,
                    detections: None,
                    error: Some(e.public_message()),
                }
            }
        }
    }
}

async fn process_frame(state: &AppState, body: Vec<u8>) -> FrameResult {
    FrameResult::from_result(analyze(state, body).await.map(|a| a.objects))
}

/// Process one frame; failures are reported in the body, not the status
pub async fn post_frame(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<FrameResult> {
    if let Err(e) = check_content_type(&headers) {
        return Json(FrameResult::from_result(Err(e.into())));
    }
    Json(process_frame(&state, body.to_vec()).await)
}

/// WebSocket stream: binary messages are frames, replies are JSON text
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("Realtime client connected");
    let mut frames = 0u64;

    while let Some(Ok(msg)) = socket.recv().await {
        let reply = match msg {
            Message::Binary(data) => {
                frames += 1;
                process_frame(&state, data).await
            }
            Message::Close(_) => break,
            // pings are answered by axum; text is not a frame
            _ => continue,
        };

        let json = serde_json::to_string(&reply).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }

    info!("Realtime client disconnected after {} frames", frames);
}
