//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use frame_source::InputError;
use perception::DetectionError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message returned for every server-side failure
pub const PROCESSING_ERROR: &str = "Error processing the image";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Input(_) => StatusCode::BAD_REQUEST,
            ApiError::Detection(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; server-side detail stays in the log
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Input(e) => e.to_string(),
            ApiError::Detection(_) | ApiError::Internal(_) => PROCESSING_ERROR.to_string(),
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Input(_) => "rejected",
            ApiError::Detection(_) | ApiError::Internal(_) => "failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if !matches!(self, ApiError::Input(_)) {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            success: false,
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
