use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::config::{ConfigError, GameConfig};

pub(crate) struct AppWiring {
    pub(crate) config: GameConfig,
}

/// Installs logging and loads the game configuration. Config errors are logged here.
pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Metronome Startup ===");

    let config = GameConfig::from_env().map_err(|err| {
        error!(error = %err, "config_load_failed");
        err
    })?;
    info!(
        bpm = config.bpm,
        note_type = ?config.note_type,
        fps = config.fps,
        width = config.window_width,
        height = config.window_height,
        hit_tolerance_ms = config.hit_tolerance_ms,
        hit_offset_ms = config.hit_offset_ms,
        "game_config"
    );

    Ok(AppWiring { config })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
