//! Vision Assistant - real-time pipeline entry point
//!
//! Usage: vision-pipeline [config.toml]

use std::path::Path;

use alerting::TranscriptWriter;
use frame_source::ImageSequenceSource;
use pipeline::{
    build_detector, build_speech, init_logging, AssistConfig, Orchestrator, TesseractRecognizer,
};
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1);
    let config = AssistConfig::load(config_path.as_deref().map(Path::new))?;
    init_logging(&config.logging)?;

    info!("=== Vision Assistant v{} ===", env!("CARGO_PKG_VERSION"));

    let source_dir = config
        .pipeline
        .source_dir
        .as_deref()
        .ok_or("pipeline.source_dir is not set")?;
    let source = ImageSequenceSource::open(source_dir)?;
    let detector = build_detector(&config.detector)?;
    let speech = build_speech(&config.pipeline.voice);

    let mut orchestrator = Orchestrator::new(&config, Box::new(source), detector, speech);
    if let Some(path) = &config.pipeline.transcript_path {
        orchestrator = orchestrator.with_text_sink(Box::new(TranscriptWriter::create(path)?));
    }
    if config.pipeline.profile().ocr {
        let ocr = TesseractRecognizer::new(&config.pipeline.ocr);
        orchestrator = orchestrator.with_recognizer(Box::new(ocr));
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current frame");
            let _ = stop_tx.send(true);
        }
    });

    let stats = orchestrator.run(stop_rx).await?;
    info!(
        "Done: {} frames, {} skipped, {} obstacle warnings, {} scene descriptions",
        stats.frames_processed,
        stats.frames_skipped,
        stats.obstacle_announcements,
        stats.scene_announcements
    );

    Ok(())
}
