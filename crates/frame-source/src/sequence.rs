//! Replay and in-memory frame sources

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::frame::{decode_image, VideoFrame};
use crate::{CaptureError, FrameSource};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Replays a directory of still images as a video stream.
///
/// Files are visited in lexical order, so `frame_0001.jpg`-style dumps
/// from a camera or `ffmpeg -i walk.mp4 frame_%04d.jpg` replay in order.
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    released: bool,
}

impl ImageSequenceSource {
    /// Index the image files in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| CaptureError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        files.sort();

        info!("Opened image sequence {} ({} frames)", dir.display(), files.len());

        Ok(Self {
            dir,
            files,
            cursor: 0,
            released: false,
        })
    }

    /// Number of frames left to replay
    pub fn remaining(&self) -> usize {
        self.files.len().saturating_sub(self.cursor)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> &str {
        self.dir.to_str().unwrap_or("image-sequence")
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }

        let index = self.cursor;
        let Some(path) = self.files.get(index) else {
            return Ok(None);
        };
        self.cursor += 1;

        let bytes = std::fs::read(path).map_err(|source| CaptureError::Read { index, source })?;
        let frame = decode_image(&bytes).map_err(|source| CaptureError::Input { index, source })?;
        debug!("Read frame {} from {}", index, path.display());

        Ok(Some(frame.with_sequence(index as u64)))
    }

    fn release(&mut self) {
        if !self.released {
            info!("Releasing image sequence {}", self.dir.display());
            self.released = true;
            self.files.clear();
        }
    }
}

/// Frames held in memory, handed out in push order.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<VideoFrame>,
    next_sequence: u64,
    released: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame; sequence numbers are assigned on push
    pub fn push(&mut self, frame: VideoFrame) {
        let frame = frame.with_sequence(self.next_sequence);
        self.next_sequence += 1;
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FromIterator<VideoFrame> for MemorySource {
    fn from_iter<I: IntoIterator<Item = VideoFrame>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for frame in iter {
            source.push(frame);
        }
        source
    }
}

impl FrameSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.released = true;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_memory_source_order() {
        let mut source: MemorySource = (0..3).map(|_| VideoFrame::blank(2, 2, 99)).collect();
        assert_eq!(source.len(), 3);

        let seqs: Vec<u64> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|f| f.sequence)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_memory_source_release() {
        let mut source: MemorySource = std::iter::once(VideoFrame::blank(2, 2, 0)).collect();
        source.release();
        assert!(source.is_released());
        assert!(matches!(source.next_frame(), Err(CaptureError::Released)));
    }

    #[test]
    fn test_image_sequence_replays_sorted_images() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 200u8), ("a.png", 100u8)] {
            RgbImage::from_pixel(3, 2, image::Rgb([shade, shade, shade]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.get_pixel(0, 0), Some([100, 100, 100]));

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.get_pixel(2, 1), Some([200, 200, 200]));

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_image_sequence_reports_corrupt_frame() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert!(matches!(
            source.next_frame(),
            Err(CaptureError::Input { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            ImageSequenceSource::open("/definitely/not/here"),
            Err(CaptureError::Open(_))
        ));
    }
}
