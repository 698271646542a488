use engine::{Actor, ActorCore, ActorId, Event, EventHandleable, FrameContext, Key, Updateable};
use tracing::{debug, info};

use super::{Beat, Hit, BEAT_EVENT, COIN_SOUND, HIT_EVENT};
use crate::app::rhythm::{JudgeWindows, Judgement, RhythmJudge, RhythmStats};

/// Scores hits from the onset worker and the space bar against the metronome's beats.
pub(crate) struct RhythmActor {
    core: ActorCore,
    judge: RhythmJudge,
    elapsed_ms: u64,
    hit_offset_ms: f64,
}

impl RhythmActor {
    pub(crate) fn new(id: ActorId, note_interval_ms: f64, windows: JudgeWindows) -> Self {
        Self {
            core: ActorCore::new(id),
            judge: RhythmJudge::new(note_interval_ms, windows),
            elapsed_ms: 0,
            hit_offset_ms: 0.0,
        }
    }

    pub(crate) fn with_hit_offset(mut self, hit_offset_ms: f64) -> Self {
        self.hit_offset_ms = hit_offset_ms;
        self
    }

    pub(crate) fn stats(&self) -> RhythmStats {
        self.judge.stats()
    }

    fn register_hit(&mut self, source: &'static str, hit: Hit, ctx: &FrameContext<'_>) {
        let hit_ms = self.elapsed_ms as f64 + self.hit_offset_ms;
        match self.judge.judge(hit_ms) {
            Judgement::Hit {
                side,
                tier,
                error_ms,
            } => {
                ctx.play(COIN_SOUND);
                info!(
                    source,
                    level_db = ?hit.level_db,
                    midi_note = ?hit.midi_note,
                    ?side,
                    ?tier,
                    error_ms,
                    "note_hit"
                );
            }
            Judgement::Repeat { error_ms } => debug!(source, error_ms, "note_repeat"),
            Judgement::Between {
                prev_interval_ms,
                next_interval_ms,
            } => debug!(source, prev_interval_ms, next_interval_ms, "note_between"),
        }
    }
}

impl Updateable for RhythmActor {
    fn update(&mut self, ctx: &FrameContext<'_>, delta_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        self.core.update(ctx, delta_ms);
    }
}

impl EventHandleable for RhythmActor {
    fn handle_event(&mut self, event: &Event, ctx: &FrameContext<'_>) {
        match event {
            Event::Custom(custom) if custom.name() == BEAT_EVENT => {
                let Some(beat) = custom.payload::<Beat>() else {
                    return;
                };
                if self.judge.note_passed(beat.at_ms as f64) {
                    info!(
                        beat = beat.index,
                        misses = self.judge.stats().misses,
                        prev_note_ms = self.judge.prev_note_ms(),
                        next_note_ms = self.judge.next_note_ms(),
                        "note_missed"
                    );
                }
            }
            Event::Custom(custom) if custom.name() == HIT_EVENT => {
                let hit = custom.payload::<Hit>().copied().unwrap_or_default();
                self.register_hit("onset", hit, ctx);
            }
            Event::KeyDown(Key::Space) => self.register_hit("keyboard", Hit::default(), ctx),
            _ => {}
        }
    }
}

impl Drop for RhythmActor {
    fn drop(&mut self) {
        let stats = self.stats();
        info!(
            hits = stats.hits(),
            perfect = stats.perfect,
            good = stats.good,
            ok = stats.ok,
            repeats = stats.repeats,
            between = stats.between,
            misses = stats.misses,
            "rhythm_summary"
        );
    }
}

impl Actor for RhythmActor {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn debug_name(&self) -> &'static str {
        "rhythm"
    }

    fn as_updateable(&mut self) -> Option<&mut dyn Updateable> {
        Some(self)
    }

    fn as_event_handler(&mut self) -> Option<&mut dyn EventHandleable> {
        Some(self)
    }
}
