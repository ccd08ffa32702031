//! Announcement records

use serde::{Deserialize, Serialize};

/// Announcement category; each kind has its own cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    /// Urgent frontal obstacle warning
    Obstacle,
    /// General scene description
    Scene,
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementKind::Obstacle => "obstacle",
            AnnouncementKind::Scene => "scene",
        }
    }
}

/// A message ready to be spoken and shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub kind: AnnouncementKind,
    pub text: String,
    /// Sequence number of the frame that triggered it
    pub frame: u64,
}

impl Announcement {
    pub fn obstacle(text: impl Into<String>, frame: u64) -> Self {
        Self {
            kind: AnnouncementKind::Obstacle,
            text: text.into(),
            frame,
        }
    }

    pub fn scene(text: impl Into<String>, frame: u64) -> Self {
        Self {
            kind: AnnouncementKind::Scene,
            text: text.into(),
            frame,
        }
    }
}
