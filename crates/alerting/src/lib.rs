//! Alerting System
//!
//! Rate-limited announcements and the sinks that deliver them:
//! - Per-kind cooldowns so repeated detections do not spam the user
//! - Speech output (text-to-speech command or log-only)
//! - Text output (JSON-lines transcript)

mod announcement;
mod limiter;
mod sink;

pub use announcement::{Announcement, AnnouncementKind};
pub use limiter::{AnnouncementConfig, AnnouncementLimiter};
pub use sink::{
    CommandSpeechSink, LogSpeechSink, SpeechSink, TextSink, TranscriptWriter, VoiceConfig,
};

use thiserror::Error;

/// Output failures (speech, OCR, transcript)
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Speech output failed: {0}")]
    Speech(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Output closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
