//! Frame Sources for the Vision Assistant
//!
//! Provides decoded frames to the perception pipeline:
//! - Encoded image intake (JPEG/PNG uploads, stream frames)
//! - Directory replay of recorded image sequences
//! - In-memory sources for the real-time API and tests

pub mod frame;
pub mod sequence;

pub use frame::{decode_image, VideoFrame};
pub use sequence::{ImageSequenceSource, MemorySource};

use thiserror::Error;

/// Rejections of submitted image data.
///
/// Never retried: the caller has to send a different payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Image too small: {size} bytes (minimum {min})")]
    TooSmall { size: usize, min: usize },

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Image could not be decoded: {0}")]
    Decode(String),
}

/// Frame acquisition errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Failed to read frame {index}: {source}")]
    Read {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame {index} rejected: {source}")]
    Input {
        index: usize,
        #[source]
        source: InputError,
    },

    #[error("Source already released")]
    Released,
}

/// A pull-based supplier of decoded frames.
///
/// `Ok(None)` means the source is exhausted; that is a normal end of stream,
/// not an error.
pub trait FrameSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Acquire the next frame. May block on I/O.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError>;

    /// Release held resources. Called once by the owner when it stops.
    fn release(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        (**self).next_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}
