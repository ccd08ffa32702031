//! Vision Assistant Pipeline
//!
//! Real-time loop from camera frames to spoken warnings:
//! - Layered configuration (defaults, TOML file, `VISION_*` environment)
//! - Mode profiles: scene description, obstacle warning, or both
//! - Rate-limited speech and transcript output, optional OCR

pub mod config;
mod logging;
pub mod ocr;
pub mod orchestrator;

pub use config::{
    ApiConfig, AssistConfig, LoggingConfig, ModeProfile, ModeProfiles, OcrConfig, PipelineConfig,
    PipelineMode,
};
pub use logging::init_logging;
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use orchestrator::{FrameReport, Orchestrator, PipelineState, PipelineStats, StopReason};

use std::sync::Arc;

use alerting::{CommandSpeechSink, LogSpeechSink, SinkError, SpeechSink, VoiceConfig};
use frame_source::CaptureError;
use perception::{DetectionError, DetectorConfig, NullDetector, ObjectDetector, YoloDetector};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline is not idle (state {0:?})")]
    NotIdle(PipelineState),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// YOLO detector when a model is configured, otherwise the null detector
pub fn build_detector(config: &DetectorConfig) -> Result<Arc<dyn ObjectDetector>, DetectionError> {
    match &config.model_path {
        Some(_) => Ok(Arc::new(YoloDetector::load(config)?)),
        None => Ok(Arc::new(NullDetector::new())),
    }
}

/// Spoken output, or log-only output when voice is disabled
pub fn build_speech(config: &VoiceConfig) -> Box<dyn SpeechSink> {
    if config.enabled {
        Box::new(CommandSpeechSink::new(config))
    } else {
        Box::new(LogSpeechSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_detector_without_model() {
        let detector = build_detector(&DetectorConfig::default()).unwrap();
        assert_eq!(detector.name(), "null");
    }

    #[test]
    fn test_build_detector_missing_model() {
        let config = DetectorConfig {
            model_path: Some("/no/such/model.onnx".into()),
            ..Default::default()
        };
        assert!(matches!(build_detector(&config), Err(DetectionError::ModelLoad(_))));
    }
}
