//! Perception configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Spatial zone geometry, as fractions of the frame size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Objects centred left of this fraction of the width are "left"
    pub left_bound: f32,

    /// Objects centred right of this fraction of the width are "right"
    pub right_bound: f32,

    /// Lower edge of the frontal band used for danger detection
    pub front_min: f32,

    /// Upper edge of the frontal band used for danger detection
    pub front_max: f32,

    /// Lower-edge ratio (y2 / height) above which an object is near
    pub danger_threshold: f32,

    /// Lower-edge ratio above which a near object is "very close"
    pub very_close_threshold: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            left_bound: 0.33,
            right_bound: 0.66,
            front_min: 0.4,
            front_max: 0.6,
            danger_threshold: 0.7,
            very_close_threshold: 0.85,
        }
    }
}

/// Obstacle priority ordering.
///
/// "trash can" and "pole" are not COCO classes; they only match with a
/// labels file that has them (Open Images, for instance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Labels worth an urgent warning, most dangerous first
    pub priority_labels: Vec<String>,

    /// Detector label -> priority label, for models that name a class
    /// differently ("dining table" in COCO is "table" here)
    pub label_aliases: BTreeMap<String, String>,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            priority_labels: [
                "person",
                "bicycle",
                "car",
                "motorcycle",
                "trash can",
                "chair",
                "table",
                "pole",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            label_aliases: BTreeMap::from([("dining table".to_string(), "table".to_string())]),
        }
    }
}

/// Object detector model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// ONNX model path; without one the null detector is used
    pub model_path: Option<String>,

    /// Class names, one per line; defaults to the COCO names
    pub labels_path: Option<String>,

    /// Square model input size in pixels
    pub input_size: u32,

    /// Candidates below this score are dropped before NMS
    pub min_score: f32,

    /// IoU above which overlapping boxes of one class are merged
    pub iou_threshold: f32,

    /// Maximum detections returned per frame
    pub max_detections: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            labels_path: None,
            input_size: 640,
            min_score: 0.1,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}
