//! Spatial zone classification
//!
//! Pure geometry on the bounding box: no model is involved, and the same
//! box in the same frame size always yields the same tag.

use serde::{Deserialize, Serialize};

use crate::config::ZoneConfig;
use crate::detection::Detection;

/// Horizontal position of an object's centre
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizontal {
    Left,
    #[default]
    Center,
    Right,
}

impl Horizontal {
    /// Spoken form used in scene descriptions
    pub fn phrase(&self) -> &'static str {
        match self {
            Horizontal::Left => "on the left",
            Horizontal::Center => "in the center",
            Horizontal::Right => "on the right",
        }
    }
}

/// Whether the object's lower edge reaches the bottom band of the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Near,
    #[default]
    Far,
}

/// Proximity of an object inside the danger zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceTier {
    #[serde(rename = "very close")]
    VeryClose,
    #[serde(rename = "close")]
    Close,
}

impl DistanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceTier::VeryClose => "very close",
            DistanceTier::Close => "close",
        }
    }
}

/// Zone of one detection within one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneTag {
    pub horizontal: Horizontal,
    pub depth: Depth,
    /// Inside the frontal band and near: directly in the user's path
    pub in_danger_zone: bool,
    /// Only set when `in_danger_zone` is true
    pub distance: Option<DistanceTier>,
}

/// Maps bounding boxes to zones using the configured geometry
#[derive(Debug, Clone, Default)]
pub struct ZoneClassifier {
    config: ZoneConfig,
}

impl ZoneClassifier {
    pub fn new(config: ZoneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Classify a detection within a `frame_width` x `frame_height` frame.
    ///
    /// Degenerate frames (zero width or height) are never in the danger zone.
    pub fn classify(&self, detection: &Detection, frame_width: u32, frame_height: u32) -> ZoneTag {
        if frame_width == 0 || frame_height == 0 {
            return ZoneTag::default();
        }

        let width = frame_width as f32;
        let height = frame_height as f32;
        let x_center = detection.bbox.center_x();

        let horizontal = if x_center < self.config.left_bound * width {
            Horizontal::Left
        } else if x_center > self.config.right_bound * width {
            Horizontal::Right
        } else {
            Horizontal::Center
        };

        let x_relative = x_center / width;
        let y_relative = detection.bbox.y2 / height;

        let near = y_relative > self.config.danger_threshold;
        let in_front = self.config.front_min < x_relative && x_relative < self.config.front_max;
        let in_danger_zone = in_front && near;

        let distance = in_danger_zone.then(|| {
            if y_relative > self.config.very_close_threshold {
                DistanceTier::VeryClose
            } else {
                DistanceTier::Close
            }
        });

        ZoneTag {
            horizontal,
            depth: if near { Depth::Near } else { Depth::Far },
            in_danger_zone,
            distance,
        }
    }
}
