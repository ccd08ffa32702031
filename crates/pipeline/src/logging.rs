use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::LoggingConfig;

/// Install the global subscriber. Unknown levels fall back to INFO.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SetGlobalDefaultError> {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
