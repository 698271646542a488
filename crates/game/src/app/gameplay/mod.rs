mod bonus;
mod metronome;
mod player;
mod rhythm_actor;

use engine::{ActorId, Camera, GameLoop, LoopError, SoundId, Vec2};
use tracing::info;

use super::config::GameConfig;
use super::rhythm::JudgeWindows;
pub(crate) use bonus::BonusActor;
pub(crate) use metronome::{BonusSchedule, MetronomeActor};
pub(crate) use player::PlayerActor;
pub(crate) use rhythm_actor::RhythmActor;

pub(crate) const CLICK_SOUND: SoundId = SoundId("metronome");
pub(crate) const COIN_SOUND: SoundId = SoundId("coin");

/// Custom event posted by the metronome on every click, one per note.
pub(crate) const BEAT_EVENT: &str = "beat";
/// Custom event for a played note, from the onset worker.
pub(crate) const HIT_EVENT: &str = "hit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Beat {
    pub(crate) index: u64,
    /// Metronome time of the click; independent of when the event is dispatched.
    pub(crate) at_ms: u64,
}

/// A played note. Keyboard hits carry neither level nor pitch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Hit {
    pub(crate) level_db: Option<f32>,
    pub(crate) midi_note: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SceneActors {
    pub(crate) player: ActorId,
    pub(crate) metronome: ActorId,
    pub(crate) bonus: ActorId,
    pub(crate) rhythm: ActorId,
}

/// Builds the demo scene: a player the camera follows, a metronome that schedules
/// bonuses, one bonus already in place, and the rhythm scorer.
pub(crate) fn populate(
    game_loop: &mut GameLoop,
    config: &GameConfig,
) -> Result<SceneActors, LoopError> {
    let interval_ms = config.note_interval_ms();
    let bonus_spawn = Vec2::from(config.bonus_spawn);

    let player_start = Vec2::from(config.player_start);
    let player = game_loop.add_actor(|id| PlayerActor::new(id, player_start))?;
    // the metronome counts notes; bonuses stay on whole beats
    let schedule = BonusSchedule {
        every_beats: u64::from(config.bonus_every_beats) * u64::from(config.note_type.per_beat()),
        spawn_at: bonus_spawn,
        collector: player,
    };
    let metronome = game_loop.add_actor(|id| MetronomeActor::new(id, interval_ms, schedule))?;
    let bonus = game_loop.add_actor(|id| BonusActor::new(id, bonus_spawn, player))?;
    let windows = JudgeWindows {
        tolerance_ms: config.hit_tolerance_ms,
        perfect_ms: config.perfect_ms,
        good_ms: config.good_ms,
    };
    let rhythm = game_loop.add_actor(|id| {
        Ok(RhythmActor::new(id, interval_ms, windows).with_hit_offset(config.hit_offset_ms))
    })?;

    let mut camera = Camera::new(game_loop.viewport_size(), player_start)
        .with_relative_offset(Vec2::from(config.camera_offset));
    camera.lock_target(player)?;
    game_loop.install_camera(camera);

    info!(
        bpm = config.bpm,
        note_type = ?config.note_type,
        note_interval_ms = interval_ms,
        bonus_every_beats = config.bonus_every_beats,
        "scene_populated"
    );
    Ok(SceneActors {
        player,
        metronome,
        bonus,
        rhythm,
    })
}
