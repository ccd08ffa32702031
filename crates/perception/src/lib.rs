//! Perception for the Vision Assistant
//!
//! Turns raw per-frame object detections into spatial meaning:
//! - Detection normalization and confidence filtering
//! - Zone classification (left/center/right, near/far, danger zone)
//! - Priority obstacle ranking for frontal warnings
//! - ONNX (YOLO) detector adapter

pub mod config;
pub mod detection;
pub mod labels;
pub mod obstacle;
pub mod yolo;
pub mod zone;

pub use config::{DetectorConfig, ObstacleConfig, ZoneConfig};
pub use detection::{
    accept, by_confidence_desc, non_max_suppression, BoundingBox, Detection, DetectionStage,
    NullDetector, ObjectDetector,
};
pub use obstacle::{Obstacle, ObstacleRanker};
pub use yolo::YoloDetector;
pub use zone::{Depth, DistanceTier, Horizontal, ZoneClassifier, ZoneTag};

use thiserror::Error;

/// Detector failures
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid frame format")]
    InvalidFrame,
}
