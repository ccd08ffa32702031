//! Priority obstacle ranking

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ObstacleConfig;
use crate::detection::Detection;
use crate::zone::{DistanceTier, ZoneClassifier, ZoneTag};

/// A prioritized detection inside the danger zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub detection: Detection,

    /// Position of the label in the priority list (0 = most dangerous)
    pub priority_rank: usize,

    pub distance: DistanceTier,

    pub zone: ZoneTag,
}

impl Obstacle {
    /// Spoken warning for this obstacle
    pub fn warning(&self) -> String {
        format!("Watch out: {} {}", self.detection.label, self.distance.as_str())
    }
}

/// Filters detections to frontal priority obstacles, most dangerous first
#[derive(Debug, Clone)]
pub struct ObstacleRanker {
    classifier: ZoneClassifier,
    priority_labels: Vec<String>,
    label_aliases: BTreeMap<String, String>,
}

impl ObstacleRanker {
    pub fn new(classifier: ZoneClassifier, config: &ObstacleConfig) -> Self {
        Self {
            classifier,
            priority_labels: config.priority_labels.clone(),
            label_aliases: config.label_aliases.clone(),
        }
    }

    /// Index of `label` (or the label it is aliased to) in the priority
    /// list, `None` if not prioritized
    pub fn priority_index(&self, label: &str) -> Option<usize> {
        let label = self.label_aliases.get(label).map_or(label, String::as_str);
        self.priority_labels.iter().position(|l| l == label)
    }

    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    /// Rank detections for a `frame_width` x `frame_height` frame.
    ///
    /// Output is sorted by priority index ascending, then confidence
    /// descending. The sort is stable, so full ties keep detector order.
    pub fn rank(
        &self,
        detections: &[Detection],
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<Obstacle> {
        let mut obstacles: Vec<Obstacle> = detections
            .iter()
            .filter_map(|det| {
                let priority_rank = self.priority_index(&det.label)?;
                let zone = self.classifier.classify(det, frame_width, frame_height);
                let distance = zone.distance.filter(|_| zone.in_danger_zone)?;
                Some(Obstacle {
                    detection: det.clone(),
                    priority_rank,
                    distance,
                    zone,
                })
            })
            .collect();

        obstacles.sort_by(|a, b| {
            a.priority_rank.cmp(&b.priority_rank).then_with(|| {
                b.detection
                    .confidence
                    .partial_cmp(&a.detection.confidence)
                    .unwrap_or(Ordering::Equal)
            })
        });

        if !obstacles.is_empty() {
            debug!(
                "{} obstacle(s) ahead, top: {} ({:.2})",
                obstacles.len(),
                obstacles[0].detection.label,
                obstacles[0].detection.confidence
            );
        }

        obstacles
    }
}

impl Default for ObstacleRanker {
    fn default() -> Self {
        Self::new(ZoneClassifier::default(), &ObstacleConfig::default())
    }
}
