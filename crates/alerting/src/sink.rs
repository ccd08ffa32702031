//! Speech and text output sinks

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{Announcement, AnnouncementKind, SinkError};

/// Speaks announcement text.
///
/// `speak` returns once playback has finished, so the caller does not
/// queue a new message while the previous one is still being spoken.
#[async_trait]
pub trait SpeechSink: Send {
    async fn speak(&mut self, text: &str) -> Result<(), SinkError>;
}

/// Displays or records announcement text.
pub trait TextSink: Send {
    fn show(&mut self, announcement: &Announcement) -> Result<(), SinkError>;

    /// Flush and release the underlying writer
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Text-to-speech command settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Speak through `program`; when false announcements are only logged
    pub enabled: bool,
    /// TTS executable, receives the text as its last argument
    pub program: String,
    /// Arguments placed before the text
    pub args: Vec<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "espeak".to_string(),
            args: vec!["-s".to_string(), "150".to_string(), "-a".to_string(), "180".to_string()],
        }
    }
}

/// Speaks by running an external TTS program and waiting for it to exit
pub struct CommandSpeechSink {
    program: String,
    args: Vec<String>,
}

impl CommandSpeechSink {
    pub fn new(config: &VoiceConfig) -> Self {
        info!("Speech output via {} {:?}", config.program, config.args);
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl SpeechSink for CommandSpeechSink {
    async fn speak(&mut self, text: &str) -> Result<(), SinkError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SinkError::Speech(format!("failed to start {}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(SinkError::Speech(format!("{} exited with {}", self.program, status)))
        }
    }
}

/// Writes spoken text to the log only
#[derive(Debug, Default)]
pub struct LogSpeechSink;

#[async_trait]
impl SpeechSink for LogSpeechSink {
    async fn speak(&mut self, text: &str) -> Result<(), SinkError> {
        info!(target: "speech", "{}", text);
        Ok(())
    }
}

#[derive(Serialize)]
struct TranscriptLine<'a> {
    timestamp: DateTime<Utc>,
    kind: AnnouncementKind,
    frame: u64,
    text: &'a str,
}

/// Appends every announcement to a JSON-lines file
pub struct TranscriptWriter {
    writer: Option<BufWriter<File>>,
    lines: usize,
}

impl TranscriptWriter {
    /// Create (or truncate) the transcript at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        info!("Writing announcement transcript to {}", path.display());
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    /// Lines written so far
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl TextSink for TranscriptWriter {
    fn show(&mut self, announcement: &Announcement) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        let line = TranscriptLine {
            timestamp: Utc::now(),
            kind: announcement.kind,
            frame: announcement.frame,
            text: &announcement.text,
        };
        serde_json::to_writer(&mut *writer, &line)?;
        writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        match self.writer.take() {
            Some(mut writer) => {
                writer.flush()?;
                debug!("Transcript closed after {} lines", self.lines);
                Ok(())
            }
            None => {
                warn!("Transcript already closed");
                Err(SinkError::Closed)
            }
        }
    }
}

impl Drop for TranscriptWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
