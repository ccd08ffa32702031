//! Video frame types and decoding

use image::{GrayImage, RgbImage};

use crate::InputError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame sequence number
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// Solid black frame, mostly useful for fakes and tests.
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        let len = width as usize * height as usize * 3;
        Self::new(vec![0; len], width, height, sequence)
    }

    /// Replace the sequence number
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Borrow the pixels as an `image` buffer.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Convert to an 8-bit grayscale image
    pub fn to_grayscale(&self) -> GrayImage {
        let mut gray = Vec::with_capacity(self.width as usize * self.height as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[0] as f32 * 0.299
                   + pixel[1] as f32 * 0.587
                   + pixel[2] as f32 * 0.114) as u8;
            gray.push(y);
        }
        gray.resize(self.width as usize * self.height as usize, 0);
        GrayImage::from_raw(self.width, self.height, gray)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

/// Decode an encoded image (JPEG, PNG, ...) into an RGB frame
pub fn decode_image(bytes: &[u8]) -> Result<VideoFrame, InputError> {
    if bytes.is_empty() {
        return Err(InputError::Empty);
    }

    let img = image::load_from_memory(bytes).map_err(|e| InputError::Decode(e.to_string()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    Ok(VideoFrame::new(rgb.into_raw(), width, height, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let img = RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30]));
        let frame = decode_image(&encode_png(&img)).unwrap();

        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 4);
        assert_eq!(frame.get_pixel(7, 3), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(8, 0), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image(&[]), Err(InputError::Empty)));
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(InputError::Decode(_))
        ));
    }

    #[test]
    fn test_grayscale() {
        let frame = VideoFrame::new(vec![255, 255, 255, 0, 0, 0], 2, 1, 0);
        let gray = frame.to_grayscale();
        assert_eq!(gray.dimensions(), (2, 1));
        assert!(gray.get_pixel(0, 0)[0] >= 254);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_blank_frame_round_trips_to_image() {
        let frame = VideoFrame::blank(4, 3, 9);
        let img = frame.to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(frame.sequence, 9);
    }
}
