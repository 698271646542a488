use std::process::ExitCode;
use std::sync::Arc;

use engine::{run_app, EventSender, MetricsHandle, TracingAudioSink};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::capture::{InputDevice, OnsetCapture};
use super::config::GameConfig;
use super::gameplay;
use super::onset::{spawn_onset_worker, OnsetDetector};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { config } = app;
    let mut capture: Option<OnsetCapture> = None;
    let mut metrics: Option<MetricsHandle> = None;

    let result = run_app(config.loop_config(), Arc::new(TracingAudioSink), |game_loop| {
        let scene = gameplay::populate(game_loop, &config)?;
        info!(
            player = %scene.player,
            metronome = %scene.metronome,
            bonus = %scene.bonus,
            rhythm = %scene.rhythm,
            "scene_actors"
        );
        metrics = Some(game_loop.metrics());
        capture = start_capture(&config, game_loop.event_sender());
        Ok(())
    });

    if let Some(capture) = capture {
        capture.stop();
    }
    if let Some(metrics) = metrics {
        let last = metrics.snapshot();
        info!(
            fps = last.fps,
            frame_time_ms = last.frame_time_ms,
            actor_count = last.actor_count,
            "final_metrics"
        );
    }

    if let Err(err) = result {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// The game stays playable from the keyboard when no microphone can be opened.
fn start_capture(config: &GameConfig, events: EventSender) -> Option<OnsetCapture> {
    let device = match InputDevice::open_default() {
        Ok(device) => device,
        Err(err) => {
            warn!(error = %err, "microphone_unavailable");
            return None;
        }
    };
    let detector = OnsetDetector::new(config.onset);
    let input = match spawn_onset_worker(detector, device.sample_rate(), events) {
        Ok(input) => input,
        Err(err) => {
            warn!(error = %err, "onset_worker_unavailable");
            return None;
        }
    };
    match OnsetCapture::start(&device, input) {
        Ok(capture) => Some(capture),
        Err(err) => {
            warn!(error = %err, "microphone_capture_failed");
            None
        }
    }
}
