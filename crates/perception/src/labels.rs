//! Class label tables

use std::path::Path;

use crate::DetectionError;

/// COCO class names in model output order
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Load class names from a file with one label per line
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>, DetectionError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| DetectionError::ModelLoad(format!("labels {}: {}", path.display(), e)))?;
    Ok(parse_labels(&text))
}

fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// The built-in COCO table as owned strings
pub fn coco_labels() -> Vec<String> {
    COCO_LABELS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_lines() {
        let labels = parse_labels("person\n\n  trash can \nchair\n");
        assert_eq!(labels, vec!["person", "trash can", "chair"]);
    }

    #[test]
    fn test_coco_order() {
        let labels = coco_labels();
        assert_eq!(labels[0], "person");
        assert_eq!(labels[56], "chair");
        assert_eq!(labels.len(), 80);
    }
}
