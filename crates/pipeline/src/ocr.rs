//! Text recognition for scene descriptions

use std::io::Cursor;
use std::process::Stdio;

use alerting::SinkError;
use async_trait::async_trait;
use frame_source::VideoFrame;
use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::OcrConfig;

/// Reads printed text in a frame
#[async_trait]
pub trait TextRecognizer: Send {
    /// Recognized text, possibly empty
    async fn recognize(&mut self, frame: &VideoFrame) -> Result<String, SinkError>;
}

/// Runs `tesseract stdin stdout` on a grayscale PNG of the frame
pub struct TesseractRecognizer {
    program: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            program: config.program.clone(),
            language: config.language.clone(),
        }
    }
}

fn encode_grayscale_png(frame: &VideoFrame) -> Result<Vec<u8>, SinkError> {
    let gray = DynamicImage::ImageLuma8(frame.to_grayscale());
    let mut png = Cursor::new(Vec::new());
    gray.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| SinkError::Recognition(format!("PNG encoding failed: {}", e)))?;
    Ok(png.into_inner())
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&mut self, frame: &VideoFrame) -> Result<String, SinkError> {
        let png = encode_grayscale_png(frame)?;

        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SinkError::Recognition(format!("failed to start {}: {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(SinkError::Recognition(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        debug!("OCR on frame {}: {} chars", frame.sequence, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_encoding() {
        let frame = VideoFrame::blank(32, 16, 0);
        let png = encode_grayscale_png(&frame).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[tokio::test]
    async fn test_missing_program_is_recognition_error() {
        let mut ocr = TesseractRecognizer::new(&OcrConfig {
            program: "/nonexistent/ocr-binary".into(),
            language: "eng".into(),
        });
        let result = ocr.recognize(&VideoFrame::blank(8, 8, 0)).await;
        assert!(matches!(result, Err(SinkError::Recognition(_))));
    }
}
