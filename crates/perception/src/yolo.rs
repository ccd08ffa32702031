//! YOLO object detector on tract-onnx
//!
//! Expects a YOLOv8-style export: input `[1, 3, S, S]` RGB in 0..1,
//! output `[1, 4 + classes, candidates]` with centre/size boxes in input
//! pixels followed by per-class scores.

use frame_source::VideoFrame;
use image::imageops::FilterType;
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::config::DetectorConfig;
use crate::detection::{non_max_suppression, Detection, ObjectDetector};
use crate::labels::{coco_labels, load_labels};
use crate::DetectionError;

/// ONNX YOLO detector
pub struct YoloDetector {
    model: TypedRunnableModel<TypedModel>,
    labels: Vec<String>,
    input_size: u32,
    min_score: f32,
    iou_threshold: f32,
    max_detections: usize,
}

impl YoloDetector {
    /// Load the model named by `config.model_path`
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectionError> {
        let path = config
            .model_path
            .as_deref()
            .ok_or_else(|| DetectionError::ModelLoad("no model path configured".into()))?;
        let size = config.input_size as usize;

        info!("Loading detection model from {} ({}x{})", path, size, size);

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| DetectionError::ModelLoad(format!("{}: {}", path, e)))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| DetectionError::ModelLoad(e.to_string()))?
            .into_optimized()
            .map_err(|e| DetectionError::ModelLoad(e.to_string()))?
            .into_runnable()
            .map_err(|e| DetectionError::ModelLoad(e.to_string()))?;

        let labels = match &config.labels_path {
            Some(p) => load_labels(p)?,
            None => coco_labels(),
        };

        Ok(Self {
            model,
            labels,
            input_size: config.input_size,
            min_score: config.min_score,
            iou_threshold: config.iou_threshold,
            max_detections: config.max_detections,
        })
    }

    fn build_input(&self, frame: &VideoFrame) -> Result<Tensor, DetectionError> {
        let img = frame.to_rgb_image().ok_or(DetectionError::InvalidFrame)?;
        let size = self.input_size;
        let resized = image::imageops::resize(&img, size, size, FilterType::Triangle);

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        Ok(input.into_tensor())
    }
}

impl ObjectDetector for YoloDetector {
    fn name(&self) -> &str {
        "yolo-onnx"
    }

    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(DetectionError::InvalidFrame);
        }

        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| DetectionError::Inference("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let scale = (
            frame.width as f32 / self.input_size as f32,
            frame.height as f32 / self.input_size as f32,
        );
        let candidates = decode_predictions(&view, &self.labels, self.min_score, scale)?;
        let found = candidates.len();

        let mut detections = non_max_suppression(candidates, self.iou_threshold);
        detections.truncate(self.max_detections);
        debug!("{} candidates, {} after NMS", found, detections.len());

        Ok(detections)
    }
}

/// Decode a `[1, 4 + classes, candidates]` prediction tensor.
///
/// Boxes are scaled from model input pixels back to frame pixels by
/// `scale = (sx, sy)`.
pub fn decode_predictions(
    view: &tract_ndarray::ArrayViewD<'_, f32>,
    labels: &[String],
    min_score: f32,
    scale: (f32, f32),
) -> Result<Vec<Detection>, DetectionError> {
    let shape = view.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
        return Err(DetectionError::Inference(format!(
            "unexpected output shape {:?}",
            shape
        )));
    }

    let num_classes = shape[1] - 4;
    let (sx, sy) = scale;
    let mut detections = Vec::new();

    for i in 0..shape[2] {
        let mut best = (0usize, f32::NEG_INFINITY);
        for class in 0..num_classes {
            let score = view[[0, 4 + class, i]];
            if score > best.1 {
                best = (class, score);
            }
        }

        let (class_id, score) = best;
        if score <= min_score {
            continue;
        }

        let cx = view[[0, 0, i]];
        let cy = view[[0, 1, i]];
        let w = view[[0, 2, i]];
        let h = view[[0, 3, i]];

        let label = labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class {}", class_id));

        detections.push(Detection::new(
            label,
            score,
            [
                (cx - w / 2.0) * sx,
                (cy - h / 2.0) * sy,
                (cx + w / 2.0) * sx,
                (cy + h / 2.0) * sy,
            ],
        ));
    }

    Ok(detections)
}
