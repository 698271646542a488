use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{Color, LoopConfig, Vec2};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_PATH_ENV_VAR: &str = "METRONOME_CONFIG";
pub(crate) const BPM_ENV_VAR: &str = "METRONOME_BPM";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}' at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid config value {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Point {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl From<Point> for Vec2 {
    fn from(point: Point) -> Self {
        Vec2::new(point.x, point.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct OnsetSettings {
    /// Relative energy rise between chunks that counts as an onset.
    pub(crate) threshold: f32,
    pub(crate) silence_db: f32,
    pub(crate) refractory_chunks: u32,
}

impl Default for OnsetSettings {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            silence_db: -40.0,
            refractory_chunks: 4,
        }
    }
}

/// Length of the notes the player is asked to play; the metronome clicks once per note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub(crate) enum NoteType {
    #[default]
    #[serde(rename = "quarter")]
    Quarter,
    #[serde(rename = "8th")]
    Eighth,
    #[serde(rename = "16th")]
    Sixteenth,
}

impl NoteType {
    pub(crate) fn per_beat(self) -> u32 {
        match self {
            Self::Quarter => 1,
            Self::Eighth => 2,
            Self::Sixteenth => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) bpm: u32,
    pub(crate) note_type: NoteType,
    pub(crate) fps: u32,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) camera_offset: Point,
    pub(crate) player_start: Point,
    pub(crate) bonus_spawn: Point,
    pub(crate) bonus_every_beats: u32,
    pub(crate) hit_tolerance_ms: f64,
    pub(crate) perfect_ms: f64,
    pub(crate) good_ms: f64,
    /// Added to every hit time before judging; compensates input latency.
    pub(crate) hit_offset_ms: f64,
    pub(crate) onset: OnsetSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bpm: 180,
            note_type: NoteType::Quarter,
            fps: 60,
            window_width: 640,
            window_height: 480,
            camera_offset: Point { x: 0.0, y: -200.0 },
            player_start: Point { x: 0.0, y: 0.0 },
            bonus_spawn: Point { x: 0.0, y: -100.0 },
            bonus_every_beats: 8,
            hit_tolerance_ms: 30.0,
            perfect_ms: 5.0,
            good_ms: 10.0,
            hit_offset_ms: 0.0,
            onset: OnsetSettings::default(),
        }
    }
}

impl GameConfig {
    /// Reads the optional JSON file named by `METRONOME_CONFIG`, then applies
    /// `METRONOME_BPM`.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_PATH_ENV_VAR).map(PathBuf::from);
        let bpm_override = env::var(BPM_ENV_VAR).ok();
        Self::load(path.as_deref(), bpm_override.as_deref())
    }

    pub(crate) fn load(
        path: Option<&Path>,
        bpm_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        if let Some(raw) = bpm_override {
            config.bpm = parse_positive(BPM_ENV_VAR, raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_json(path, &raw)
    }

    fn parse_json(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                field,
                source: error.into_inner(),
            }
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bpm == 0 {
            return Err(invalid("bpm", "must be greater than zero"));
        }
        if self.bonus_every_beats == 0 {
            return Err(invalid("bonus_every_beats", "must be greater than zero"));
        }
        if !(self.hit_tolerance_ms.is_finite() && self.hit_tolerance_ms > 0.0) {
            return Err(invalid("hit_tolerance_ms", "must be a positive number"));
        }
        if !(0.0..=self.good_ms).contains(&self.perfect_ms) {
            return Err(invalid(
                "perfect_ms",
                format!("expected 0..={}, got {}", self.good_ms, self.perfect_ms),
            ));
        }
        if self.good_ms > self.hit_tolerance_ms {
            return Err(invalid(
                "good_ms",
                format!(
                    "expected at most hit_tolerance_ms ({}), got {}",
                    self.hit_tolerance_ms, self.good_ms
                ),
            ));
        }
        if self.note_interval_ms() <= 2.0 * self.hit_tolerance_ms {
            return Err(invalid(
                "hit_tolerance_ms",
                format!(
                    "windows of adjacent notes overlap at {} bpm ({:.1}ms per note)",
                    self.bpm,
                    self.note_interval_ms()
                ),
            ));
        }
        if !self.hit_offset_ms.is_finite() || self.hit_offset_ms.abs() >= self.note_interval_ms() {
            return Err(invalid(
                "hit_offset_ms",
                format!(
                    "expected less than one note ({:.1}ms) either way, got {}",
                    self.note_interval_ms(),
                    self.hit_offset_ms
                ),
            ));
        }
        Ok(())
    }

    pub(crate) fn beat_interval_ms(&self) -> f64 {
        60_000.0 / f64::from(self.bpm)
    }

    pub(crate) fn note_interval_ms(&self) -> f64 {
        self.beat_interval_ms() / f64::from(self.note_type.per_beat())
    }

    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            title: "Metronome".to_string(),
            width: self.window_width,
            height: self.window_height,
            target_fps: self.fps,
            clear_color: Color::WHITE,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = GameConfig::load(None, None).expect("defaults");
        assert_eq!(config, GameConfig::default());
        assert!((config.beat_interval_ms() - 333.333).abs() < 0.001);
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let file = config_file(r#"{ "bpm": 120, "camera_offset": { "x": 5.0, "y": -10.0 } }"#);

        let config = GameConfig::load(Some(file.path()), None).expect("load");

        assert_eq!(config.bpm, 120);
        assert_eq!(config.camera_offset, Point { x: 5.0, y: -10.0 });
        assert_eq!(config.bonus_every_beats, 8);
        assert_eq!(config.onset, OnsetSettings::default());
    }

    #[test]
    fn env_bpm_wins_over_file() {
        let file = config_file(r#"{ "bpm": 120 }"#);

        let config = GameConfig::load(Some(file.path()), Some(" 90 ")).expect("load");

        assert_eq!(config.bpm, 90);
    }

    #[test]
    fn invalid_env_bpm_is_rejected() {
        let err = GameConfig::load(None, Some("fast")).expect_err("invalid");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: BPM_ENV_VAR,
                ..
            }
        ));

        let err = GameConfig::load(None, Some("0")).expect_err("zero");
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn parse_error_reports_field_path() {
        let file = config_file(r#"{ "onset": { "threshold": "high" } }"#);

        let err = GameConfig::load(Some(file.path()), None).expect_err("bad type");

        let ConfigError::Parse { field, .. } = &err else {
            panic!("expected parse error, got {err}");
        };
        assert_eq!(field, "onset.threshold");
        assert!(err.to_string().contains("onset.threshold"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let file = config_file(r#"{ "tempo": 100 }"#);
        let err = GameConfig::load(Some(file.path()), None).expect_err("unknown");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unreadable_path_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.json");

        let err = GameConfig::load(Some(&missing), None).expect_err("missing");

        assert!(matches!(err, ConfigError::Read { path, .. } if path == missing));
    }

    #[test]
    fn judgement_windows_must_nest() {
        let file = config_file(r#"{ "perfect_ms": 12.0, "good_ms": 10.0 }"#);
        let err = GameConfig::load(Some(file.path()), None).expect_err("perfect > good");
        assert!(matches!(err, ConfigError::Invalid { field: "perfect_ms", .. }));

        let file = config_file(r#"{ "good_ms": 40.0 }"#);
        let err = GameConfig::load(Some(file.path()), None).expect_err("good > tolerance");
        assert!(matches!(err, ConfigError::Invalid { field: "good_ms", .. }));
    }

    #[test]
    fn tolerance_must_fit_between_beats() {
        let err = GameConfig::load(None, Some("1200")).expect_err("50ms beats");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "hit_tolerance_ms",
                ..
            }
        ));
    }

    #[test]
    fn note_type_subdivides_the_beat() {
        let file = config_file(r#"{ "bpm": 120, "note_type": "16th" }"#);

        let config = GameConfig::load(Some(file.path()), None).expect("load");

        assert_eq!(config.note_type, NoteType::Sixteenth);
        assert_eq!(config.beat_interval_ms(), 500.0);
        assert_eq!(config.note_interval_ms(), 125.0);
        let defaults = GameConfig::default();
        assert_eq!(defaults.note_interval_ms(), defaults.beat_interval_ms());
    }

    #[test]
    fn subdivision_that_squeezes_the_windows_is_rejected() {
        let file = config_file(r#"{ "bpm": 300, "note_type": "16th" }"#);

        let err = GameConfig::load(Some(file.path()), None).expect_err("50ms notes");

        assert!(matches!(err, ConfigError::Invalid { field: "hit_tolerance_ms", .. }));
        let file = config_file(r#"{ "note_type": "32nd" }"#);
        let err = GameConfig::load(Some(file.path()), None).expect_err("unknown note type");
        assert!(matches!(err, ConfigError::Parse { field, .. } if field == "note_type"));
    }

    #[test]
    fn hit_offset_must_stay_within_one_note() {
        let file = config_file(r#"{ "hit_offset_ms": -25.5 }"#);
        let config = GameConfig::load(Some(file.path()), None).expect("load");
        assert_eq!(config.hit_offset_ms, -25.5);

        let file = config_file(r#"{ "hit_offset_ms": 400.0 }"#);
        let err = GameConfig::load(Some(file.path()), None).expect_err("offset past the next note");
        assert!(matches!(err, ConfigError::Invalid { field: "hit_offset_ms", .. }));
    }

    #[test]
    fn loop_config_mirrors_window_settings() {
        let config = GameConfig {
            fps: 30,
            window_width: 320,
            window_height: 200,
            ..GameConfig::default()
        };

        let loop_config = config.loop_config();

        assert_eq!(loop_config.target_fps, 30);
        assert_eq!((loop_config.width, loop_config.height), (320, 200));
    }
}
