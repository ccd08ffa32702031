//! Frame pipeline orchestrator
//!
//! Drives one frame source through detection, obstacle ranking and scene
//! description, and delivers rate-limited announcements to the sinks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alerting::{Announcement, AnnouncementKind, AnnouncementLimiter, SpeechSink, TextSink};
use frame_source::{FrameSource, VideoFrame};
use metrics::counter;
use perception::{
    accept, Detection, DetectionError, ObjectDetector, Obstacle, ObstacleRanker, ZoneClassifier,
};
use scene::SceneSummary;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{AssistConfig, ModeProfile, PipelineMode};
use crate::ocr::TextRecognizer;
use crate::PipelineError;

/// Lifecycle of an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Running,
    Stopped(StopReason),
    /// Resources released; terminal
    Terminated,
}

/// Why the loop left `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    SourceExhausted,
    Cancelled,
    SourceFailed,
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub obstacle_announcements: u64,
    pub scene_announcements: u64,
    pub sink_errors: u64,
    pub stop_reason: Option<StopReason>,
}

/// Outcome of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub sequence: u64,
    /// Detection failed; nothing else was evaluated
    pub skipped: bool,
    /// Detections above the active mode's threshold
    pub detections: Vec<Detection>,
    /// Frontal priority obstacles, most dangerous first
    pub obstacles: Vec<Obstacle>,
    /// Announcements actually delivered for this frame
    pub announcements: Vec<Announcement>,
}

/// Owns the per-frame loop and everything it writes to.
///
/// The limiters are only touched from `process_frame`, so no locking is
/// needed even though the sinks are async.
pub struct Orchestrator {
    source: Box<dyn FrameSource>,
    detector: Arc<dyn ObjectDetector>,
    ranker: ObstacleRanker,
    speech: Box<dyn SpeechSink>,
    text: Option<Box<dyn TextSink>>,
    recognizer: Option<Box<dyn TextRecognizer>>,
    obstacle_limiter: AnnouncementLimiter,
    scene_limiter: AnnouncementLimiter,
    mode: PipelineMode,
    profile: ModeProfile,
    obstacle_threshold: f32,
    mirror_frames: bool,
    frame_budget: Duration,
    min_sleep: Duration,
    state: PipelineState,
    stats: PipelineStats,
}

impl Orchestrator {
    pub fn new(
        config: &AssistConfig,
        source: Box<dyn FrameSource>,
        detector: Arc<dyn ObjectDetector>,
        speech: Box<dyn SpeechSink>,
    ) -> Self {
        let classifier = ZoneClassifier::new(config.zones.clone());
        let pipeline = &config.pipeline;

        info!(
            "Orchestrator: mode={:?}, source={}, detector={}, {:.1} fps",
            pipeline.mode,
            source.name(),
            detector.name(),
            pipeline.profile().target_fps
        );

        Self {
            source,
            detector,
            ranker: ObstacleRanker::new(classifier, &config.obstacles),
            speech,
            text: None,
            recognizer: None,
            obstacle_limiter: AnnouncementLimiter::for_kind(
                &config.announcements,
                AnnouncementKind::Obstacle,
            ),
            scene_limiter: AnnouncementLimiter::for_kind(
                &config.announcements,
                AnnouncementKind::Scene,
            ),
            mode: pipeline.mode,
            profile: pipeline.profile().clone(),
            obstacle_threshold: pipeline.obstacle_threshold(),
            mirror_frames: pipeline.mirror_frames,
            frame_budget: pipeline.frame_budget(),
            min_sleep: pipeline.min_sleep(),
            state: PipelineState::Idle,
            stats: PipelineStats::default(),
        }
    }

    /// Also show announcements on a text sink
    pub fn with_text_sink(mut self, sink: Box<dyn TextSink>) -> Self {
        self.text = Some(sink);
        self
    }

    /// Append recognized text to scene descriptions, when the mode reads text
    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Evaluate one frame observed at `now`.
    ///
    /// A detection failure skips the frame without touching either
    /// limiter.
    pub async fn process_frame(&mut self, frame: &VideoFrame, now: Instant) -> FrameReport {
        let mut report = FrameReport {
            sequence: frame.sequence,
            ..Default::default()
        };

        let raw = match self.detect(frame).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Frame {} skipped, detection failed: {}", frame.sequence, e);
                self.stats.frames_skipped += 1;
                counter!("frames_skipped_total").increment(1);
                report.skipped = true;
                return report;
            }
        };
        self.stats.frames_processed += 1;
        counter!("frames_processed_total").increment(1);

        let raw: Vec<Detection> = if self.mirror_frames {
            raw.iter().map(|d| d.mirrored(frame.width)).collect()
        } else {
            raw
        };
        report.detections = accept(&raw, self.profile.confidence_threshold);
        debug!(
            "Frame {}: {} detections, {} accepted",
            frame.sequence,
            raw.len(),
            report.detections.len()
        );

        if self.mode.announces_obstacles() {
            let candidates = accept(&raw, self.obstacle_threshold);
            report.obstacles = self.ranker.rank(&candidates, frame.width, frame.height);

            if let Some(top) = report.obstacles.first() {
                if self.obstacle_limiter.should_announce(now) {
                    let announcement = Announcement::obstacle(top.warning(), frame.sequence);
                    if self.emit(&announcement).await {
                        self.obstacle_limiter.record_announcement(now);
                        self.stats.obstacle_announcements += 1;
                        report.announcements.push(announcement);
                    }
                }
            }
        }

        if self.mode.announces_scene() && self.scene_limiter.should_announce(now) {
            let summary = SceneSummary::from_detections(&report.detections);
            let mut text = summary.describe(self.ranker.classifier(), frame.width, frame.height);
            if let Some(read) = self.read_text(frame).await {
                text.push_str(&format!(" Text reads: {}.", read));
            }

            let announcement = Announcement::scene(text, frame.sequence);
            if self.emit(&announcement).await {
                self.scene_limiter.record_announcement(now);
                self.stats.scene_announcements += 1;
                report.announcements.push(announcement);
            }
        }

        report
    }

    /// Run the detector on the blocking pool; inference is CPU-bound
    async fn detect(&self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
        let detector = Arc::clone(&self.detector);
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || detector.detect(&frame))
            .await
            .map_err(|e| DetectionError::Inference(format!("detector task failed: {}", e)))?
    }

    async fn read_text(&mut self, frame: &VideoFrame) -> Option<String> {
        if !self.profile.ocr {
            return None;
        }
        let recognizer = self.recognizer.as_mut()?;
        match recognizer.recognize(frame).await {
            Ok(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                warn!("OCR failed on frame {}: {}", frame.sequence, e);
                self.stats.sink_errors += 1;
                counter!("sink_errors_total").increment(1);
                None
            }
        }
    }

    /// Speak, then show. True when speech succeeded; the text sink only
    /// sees announcements that were spoken, so both follow the cooldown.
    async fn emit(&mut self, announcement: &Announcement) -> bool {
        if let Err(e) = self.speech.speak(&announcement.text).await {
            warn!("Speech output failed: {}", e);
            self.stats.sink_errors += 1;
            counter!("sink_errors_total").increment(1);
            return false;
        }
        info!("[{}] {}", announcement.kind.as_str(), announcement.text);
        counter!("announcements_total", "kind" => announcement.kind.as_str()).increment(1);

        if let Some(text) = self.text.as_mut() {
            if let Err(e) = text.show(announcement) {
                warn!("Text output failed: {}", e);
                self.stats.sink_errors += 1;
                counter!("sink_errors_total").increment(1);
            }
        }
        true
    }

    /// Run until the source is exhausted, fails, or `shutdown` turns true.
    ///
    /// Each iteration sleeps for what is left of the frame budget, never
    /// less than the configured minimum. Resources are released before
    /// returning.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineStats, PipelineError> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::NotIdle(self.state));
        }
        self.state = PipelineState::Running;
        info!("Pipeline running");

        let reason = loop {
            if *shutdown.borrow() {
                break StopReason::Cancelled;
            }

            let started = tokio::time::Instant::now();
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::SourceExhausted,
                Err(e) => {
                    error!("Frame source {} failed: {}", self.source.name(), e);
                    break StopReason::SourceFailed;
                }
            };

            self.process_frame(&frame, started.into_std()).await;

            let pause = self
                .frame_budget
                .saturating_sub(started.elapsed())
                .max(self.min_sleep);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    // sender gone: nobody can cancel, keep pacing
                    if changed.is_err() {
                        tokio::time::sleep(pause).await;
                    }
                }
            }
        };

        info!(
            "Pipeline stopped ({:?}): {} frames, {} skipped",
            reason, self.stats.frames_processed, self.stats.frames_skipped
        );
        self.state = PipelineState::Stopped(reason);
        self.stats.stop_reason = Some(reason);
        self.terminate();

        Ok(self.stats.clone())
    }

    /// Release the source and close the text sink. Safe to call repeatedly;
    /// only the first call has an effect.
    pub fn terminate(&mut self) {
        if self.state == PipelineState::Terminated {
            return;
        }
        self.source.release();
        if let Some(text) = self.text.as_mut() {
            if let Err(e) = text.close() {
                warn!("Closing text output failed: {}", e);
            }
        }
        self.state = PipelineState::Terminated;
        debug!("Pipeline resources released");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.terminate();
    }
}
