//! Detection records and the detector capability

use std::cmp::Ordering;
use std::sync::Arc;

use frame_source::VideoFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::DetectionError;

/// Axis-aligned box in pixel coordinates, `x1 <= x2` and `y1 <= y2`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Build a box, reordering corners given in any order
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y1 + self.y2) / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over union
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Mirror horizontally within a frame of the given width
    pub fn mirrored(&self, frame_width: f32) -> Self {
        Self::new(frame_width - self.x2, self.y1, frame_width - self.x1, self.y2)
    }
}

/// One object instance found in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label
    pub label: String,

    /// Detection confidence in [0, 1]
    pub confidence: f32,

    /// Bounding box in pixel coordinates
    pub bbox: BoundingBox,
}

impl Detection {
    /// Normalize a raw detector output into a detection record.
    ///
    /// Corners are reordered and confidence is clamped to [0, 1];
    /// a NaN confidence becomes 0 so it can never pass a threshold.
    pub fn new(label: impl Into<String>, confidence: f32, bbox: [f32; 4]) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            label: label.into(),
            confidence,
            bbox: BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
        }
    }

    /// Same detection as seen in a horizontally flipped frame
    pub fn mirrored(&self, frame_width: u32) -> Self {
        Self {
            label: self.label.clone(),
            confidence: self.confidence,
            bbox: self.bbox.mirrored(frame_width as f32),
        }
    }
}

/// Keep only detections strictly above `threshold`
pub fn accept(detections: &[Detection], threshold: f32) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| d.confidence > threshold)
        .cloned()
        .collect()
}

/// Order by confidence, highest first; stable for equal scores
pub fn by_confidence_desc(a: &Detection, b: &Detection) -> Ordering {
    b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(Ordering::Equal)
}

/// Greedy per-class non-maximum suppression
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(by_confidence_desc);

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let overlaps = kept
            .iter()
            .any(|k| k.label == det.label && k.bbox.iou(&det.bbox) > iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}

/// Opaque object detection capability.
///
/// Implementations return every object they find; confidence filtering
/// is applied by the caller.
pub trait ObjectDetector: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &str;

    /// Run detection on a decoded frame
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError>;
}

/// Detector used when no model is configured: sees nothing.
pub struct NullDetector;

impl NullDetector {
    pub fn new() -> Self {
        warn!("No detector model configured. Every frame will report zero objects.");
        Self
    }
}

impl Default for NullDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectDetector for NullDetector {
    fn name(&self) -> &str {
        "null"
    }

    fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        Ok(Vec::new())
    }
}

/// A detector paired with its acceptance threshold
#[derive(Clone)]
pub struct DetectionStage {
    detector: Arc<dyn ObjectDetector>,
    threshold: f32,
}

impl DetectionStage {
    pub fn new(detector: Arc<dyn ObjectDetector>, threshold: f32) -> Self {
        Self { detector, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn detector(&self) -> &Arc<dyn ObjectDetector> {
        &self.detector
    }

    /// Detect objects and drop everything at or below the threshold
    pub fn detect(&self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        let raw = self.detector.detect(frame)?;
        let accepted = accept(&raw, self.threshold);
        debug!(
            "{}: {} of {} detections above {:.2}",
            self.detector.name(),
            accepted.len(),
            raw.len(),
            self.threshold
        );
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Fixed(Vec<Detection>);

    impl ObjectDetector for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl ObjectDetector for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
            Err(DetectionError::Inference("tensor shape mismatch".into()))
        }
    }

    #[test]
    fn test_normalizes_raw_detection() {
        let det = Detection::new("chair", 1.7, [50.0, 80.0, 10.0, 20.0]);
        assert_eq!(det.confidence, 1.0);
        assert_eq!(det.bbox, BoundingBox::new(10.0, 20.0, 50.0, 80.0));
        assert_eq!(det.bbox.x1, 10.0);
        assert_eq!(det.bbox.y2, 80.0);

        assert_eq!(Detection::new("x", f32::NAN, [0.0; 4]).confidence, 0.0);
    }

    #[test]
    fn test_mirrored() {
        let det = Detection::new("person", 0.9, [0.0, 0.0, 50.0, 50.0]);
        let flipped = det.mirrored(640);
        assert_eq!(flipped.bbox, BoundingBox::new(590.0, 0.0, 640.0, 50.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let dets = vec![
            Detection::new("a", 0.35, [0.0; 4]),
            Detection::new("b", 0.36, [0.0; 4]),
        ];
        let kept = accept(&dets, 0.35);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "b");
    }

    #[test]
    fn test_stage_filters() {
        let stage = DetectionStage::new(
            Arc::new(Fixed(vec![
                Detection::new("person", 0.9, [0.0; 4]),
                Detection::new("dog", 0.1, [0.0; 4]),
            ])),
            0.2,
        );
        let dets = stage.detect(&VideoFrame::blank(4, 4, 0)).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "person");
    }

    #[test]
    fn test_stage_propagates_failure() {
        let stage = DetectionStage::new(Arc::new(Broken), 0.2);
        assert!(matches!(
            stage.detect(&VideoFrame::blank(4, 4, 0)),
            Err(DetectionError::Inference(_))
        ));
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(a.iou(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn test_nms_keeps_best_per_class() {
        let dets = vec![
            Detection::new("person", 0.6, [0.0, 0.0, 10.0, 10.0]),
            Detection::new("person", 0.9, [1.0, 0.0, 11.0, 10.0]),
            Detection::new("chair", 0.5, [1.0, 0.0, 11.0, 10.0]),
        ];
        let kept = non_max_suppression(dets, 0.45);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].label, "chair");
    }

    proptest! {
        #[test]
        fn prop_nothing_at_or_below_threshold_survives(
            confs in prop::collection::vec(0.0f32..=1.0, 0..50),
            threshold in 0.0f32..=1.0,
        ) {
            let dets: Vec<Detection> = confs
                .iter()
                .map(|&c| Detection::new("obj", c, [0.0, 0.0, 1.0, 1.0]))
                .collect();
            let kept = accept(&dets, threshold);

            prop_assert!(kept.iter().all(|d| d.confidence > threshold));
            prop_assert_eq!(kept.len(), confs.iter().filter(|&&c| c > threshold).count());
        }
    }
}
