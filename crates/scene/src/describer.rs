//! Scene describer

use std::collections::BTreeMap;

use perception::{by_confidence_desc, Detection, ZoneClassifier, ZoneTag};
use serde::{Deserialize, Serialize};

/// Spoken when a frame has no accepted detections
pub const NO_OBJECTS_MESSAGE: &str = "No objects detected";

/// Highest-confidence objects that get a positional clause
pub const MAX_POSITIONAL_CLAUSES: usize = 3;

/// Per-frame aggregate used for general descriptions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSummary {
    /// Objects per label, in label order
    pub counts: BTreeMap<String, usize>,
    /// Up to three detections, highest confidence first
    pub top_detections: Vec<Detection>,
}

impl SceneSummary {
    /// Summarize already-filtered detections
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut counts = BTreeMap::new();
        for det in detections {
            *counts.entry(det.label.clone()).or_insert(0) += 1;
        }

        let mut top_detections = detections.to_vec();
        top_detections.sort_by(by_confidence_desc);
        top_detections.truncate(MAX_POSITIONAL_CLAUSES);

        Self {
            counts,
            top_detections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Describe this summary, zoning objects in a `width` x `height` frame
    pub fn describe(&self, classifier: &ZoneClassifier, width: u32, height: u32) -> String {
        describe(&self.counts, &self.top_detections, |d| {
            classifier.classify(d, width, height)
        })
    }
}

/// Compose a description from label counts and top detections.
///
/// Output depends only on the inputs: `{"person": 2}` always reads
/// "In the scene there are: 2 persons."
pub fn describe<F>(
    counts: &BTreeMap<String, usize>,
    top_detections: &[Detection],
    zone_of: F,
) -> String
where
    F: Fn(&Detection) -> ZoneTag,
{
    if counts.is_empty() {
        return NO_OBJECTS_MESSAGE.to_string();
    }

    let listed: Vec<String> = counts
        .iter()
        .map(|(label, &count)| {
            if count > 1 {
                format!("{} {}s", count, label)
            } else {
                format!("{} {}", count, label)
            }
        })
        .collect();

    let mut sentences = vec![format!("In the scene there are: {}.", listed.join(", "))];

    for det in top_detections.iter().take(MAX_POSITIONAL_CLAUSES) {
        let zone = zone_of(det);
        sentences.push(format!("There is a {} {}.", det.label, zone.horizontal.phrase()));
    }

    sentences.join(" ")
}

/// Numbered "Object n: label (pct%)" lines for the `limit` most
/// confident detections
pub fn detection_list(detections: &[Detection], limit: usize) -> Vec<String> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(by_confidence_desc);

    sorted
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, d)| format!("Object {}: {} ({:.1}%)", i + 1, d.label, d.confidence * 100.0))
        .collect()
}
