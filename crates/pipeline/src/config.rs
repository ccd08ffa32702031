//! Assistant configuration
//!
//! Layered with the `config` crate: struct defaults, then an optional
//! TOML file, then `VISION_*` environment variables
//! (`VISION_ZONES__DANGER_THRESHOLD=0.75`).

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use alerting::{AnnouncementConfig, VoiceConfig};
use config::{Config, Environment, File};
use perception::{DetectorConfig, ObstacleConfig, ZoneConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigError;

/// Slowest accepted loop rate: one frame every 100 s
pub const MIN_TARGET_FPS: f64 = 0.01;

/// What the pipeline announces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Periodic general scene descriptions only
    Describe,
    /// Frontal obstacle warnings only
    Obstacle,
    /// Obstacle warnings plus scene descriptions with OCR
    #[default]
    Assist,
}

impl PipelineMode {
    pub fn announces_obstacles(&self) -> bool {
        matches!(self, PipelineMode::Obstacle | PipelineMode::Assist)
    }

    pub fn announces_scene(&self) -> bool {
        matches!(self, PipelineMode::Describe | PipelineMode::Assist)
    }
}

/// Per-mode tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Detections at or below this confidence are ignored
    pub confidence_threshold: f32,
    /// Target loop iterations per second
    pub target_fps: f64,
    /// Read text in the frame when describing the scene
    pub ocr: bool,
}

/// Profiles for every mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeProfiles {
    pub describe: ModeProfile,
    pub obstacle: ModeProfile,
    pub assist: ModeProfile,
}

impl Default for ModeProfiles {
    fn default() -> Self {
        Self {
            describe: ModeProfile {
                confidence_threshold: 0.3,
                target_fps: 1.0,
                ocr: false,
            },
            obstacle: ModeProfile {
                confidence_threshold: 0.35,
                target_fps: 15.0,
                ocr: false,
            },
            assist: ModeProfile {
                confidence_threshold: 0.2,
                target_fps: 1.0,
                ocr: true,
            },
        }
    }
}

impl ModeProfiles {
    pub fn get(&self, mode: PipelineMode) -> &ModeProfile {
        match mode {
            PipelineMode::Describe => &self.describe,
            PipelineMode::Obstacle => &self.obstacle,
            PipelineMode::Assist => &self.assist,
        }
    }
}

/// OCR command settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub program: String,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            program: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

/// Real-time loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    pub profiles: ModeProfiles,
    /// Floor for the pacing sleep (milliseconds)
    pub min_sleep_ms: u64,
    /// Flip detections horizontally before classification
    pub mirror_frames: bool,
    /// Directory of frames to replay
    pub source_dir: Option<String>,
    /// JSON-lines transcript of announcements
    pub transcript_path: Option<String>,
    pub voice: VoiceConfig,
    pub ocr: OcrConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            profiles: ModeProfiles::default(),
            min_sleep_ms: 10,
            mirror_frames: false,
            source_dir: None,
            transcript_path: None,
            voice: VoiceConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Profile of the active mode
    pub fn profile(&self) -> &ModeProfile {
        self.profiles.get(self.mode)
    }

    /// Threshold applied before obstacle ranking, in every mode
    pub fn obstacle_threshold(&self) -> f32 {
        self.profiles.obstacle.confidence_threshold
    }

    /// Time budget of one loop iteration, capped at the budget of
    /// `MIN_TARGET_FPS` for rates that were never validated
    pub fn frame_budget(&self) -> Duration {
        let slowest = Duration::from_secs_f64(1.0 / MIN_TARGET_FPS);
        Duration::try_from_secs_f64(1.0 / self.profile().target_fps)
            .map_or(slowest, |budget| budget.min(slowest))
    }

    pub fn min_sleep(&self) -> Duration {
        Duration::from_millis(self.min_sleep_ms)
    }
}

/// Image submission API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub addr: String,
    /// Smaller payloads are rejected before decoding
    pub min_image_bytes: usize,
    /// Length of the human-readable description list
    pub max_descriptions: usize,
    pub confidence_threshold: f32,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            min_image_bytes: 1024,
            max_descriptions: 5,
            confidence_threshold: 0.2,
            rate_limit_enabled: true,
            rate_limit_per_second: 2,
            rate_limit_burst: 5,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete assistant configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub detector: DetectorConfig,
    pub zones: ZoneConfig,
    pub obstacles: ObstacleConfig,
    pub announcements: AnnouncementConfig,
    pub pipeline: PipelineConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

impl AssistConfig {
    /// Load and validate, reading `path` if given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("VISION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("obstacles.priority_labels")
                .with_list_parse_key("pipeline.voice.args"),
        );

        let config: AssistConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AssistConfig = Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let z = &self.zones;
        for (name, value) in [
            ("zones.left_bound", z.left_bound),
            ("zones.right_bound", z.right_bound),
            ("zones.front_min", z.front_min),
            ("zones.front_max", z.front_max),
            ("zones.danger_threshold", z.danger_threshold),
            ("zones.very_close_threshold", z.very_close_threshold),
            ("detector.min_score", self.detector.min_score),
            ("detector.iou_threshold", self.detector.iou_threshold),
            ("api.confidence_threshold", self.api.confidence_threshold),
        ] {
            check_fraction(name, value)?;
        }
        if z.left_bound >= z.right_bound {
            return Err(invalid("zones.left_bound must be below zones.right_bound"));
        }
        if z.front_min >= z.front_max {
            return Err(invalid("zones.front_min must be below zones.front_max"));
        }

        for (name, profile) in [
            ("describe", &self.pipeline.profiles.describe),
            ("obstacle", &self.pipeline.profiles.obstacle),
            ("assist", &self.pipeline.profiles.assist),
        ] {
            check_fraction(
                &format!("pipeline.profiles.{}.confidence_threshold", name),
                profile.confidence_threshold,
            )?;
            if !(profile.target_fps.is_finite() && profile.target_fps >= MIN_TARGET_FPS) {
                return Err(invalid(format!(
                    "pipeline.profiles.{}.target_fps must be at least {}",
                    name, MIN_TARGET_FPS
                )));
            }
        }

        let a = &self.announcements;
        if a.scene_cooldown_ms == 0 || a.obstacle_cooldown_ms == 0 {
            return Err(invalid("announcement cooldowns must be non-zero"));
        }

        let labels = &self.obstacles.priority_labels;
        if labels.is_empty() {
            return Err(invalid("obstacles.priority_labels must not be empty"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(invalid(format!("duplicate priority label '{}'", dup)));
        }
        for (from, to) in &self.obstacles.label_aliases {
            if !seen.contains(to.as_str()) {
                return Err(invalid(format!(
                    "label alias '{}' points at '{}', which is not a priority label",
                    from, to
                )));
            }
        }

        if self.detector.input_size == 0 {
            return Err(invalid("detector.input_size must be non-zero"));
        }
        if self.api.max_descriptions == 0 {
            return Err(invalid("api.max_descriptions must be non-zero"));
        }
        let api = &self.api;
        if api.rate_limit_enabled && (api.rate_limit_per_second == 0 || api.rate_limit_burst == 0) {
            return Err(invalid("api rate limit period and burst must be non-zero"));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn check_fraction(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{} must be within [0, 1], got {}", name, value)))
    }
}
