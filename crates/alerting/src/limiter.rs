//! Announcement cooldown

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::AnnouncementKind;

/// Cooldowns between consecutive announcements of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementConfig {
    /// Minimum gap between scene descriptions (milliseconds)
    pub scene_cooldown_ms: u64,
    /// Minimum gap between obstacle warnings (milliseconds)
    pub obstacle_cooldown_ms: u64,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            scene_cooldown_ms: 5000,
            obstacle_cooldown_ms: 2000,
        }
    }
}

impl AnnouncementConfig {
    /// Cooldown that applies to `kind`
    pub fn cooldown(&self, kind: AnnouncementKind) -> Duration {
        match kind {
            AnnouncementKind::Scene => Duration::from_millis(self.scene_cooldown_ms),
            AnnouncementKind::Obstacle => Duration::from_millis(self.obstacle_cooldown_ms),
        }
    }
}

/// Suppresses announcements until the cooldown has elapsed.
///
/// Holds the last announcement time for one kind. It is only
/// read and written by the loop that owns it.
#[derive(Debug, Clone)]
pub struct AnnouncementLimiter {
    cooldown: Duration,
    last_announce: Option<Instant>,
    announce_count: usize,
}

impl AnnouncementLimiter {
    /// Create a limiter; the first announcement is always allowed
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_announce: None,
            announce_count: 0,
        }
    }

    /// Limiter for one kind, using the configured cooldown
    pub fn for_kind(config: &AnnouncementConfig, kind: AnnouncementKind) -> Self {
        Self::new(config.cooldown(kind))
    }

    /// True when strictly more than `cooldown` has passed since the last
    /// recorded announcement
    pub fn should_announce(&self, now: Instant) -> bool {
        match self.last_announce {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed > self.cooldown {
                    true
                } else {
                    debug!(
                        "Announcement suppressed: {}ms of {}ms cooldown elapsed",
                        elapsed.as_millis(),
                        self.cooldown.as_millis()
                    );
                    false
                }
            }
        }
    }

    /// Record an announcement made at `now`
    pub fn record_announcement(&mut self, now: Instant) {
        self.last_announce = Some(now);
        self.announce_count += 1;
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_announce(&self) -> Option<Instant> {
        self.last_announce
    }

    /// Announcements recorded since creation
    pub fn announce_count(&self) -> usize {
        self.announce_count
    }
}
