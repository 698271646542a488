use engine::{
    Actor, ActorCore, ActorId, ActorState, Component, ComponentKind, Event, FrameContext,
    Updateable, Vec2,
};
use tracing::debug;

use super::{BonusActor, Beat, BEAT_EVENT, CLICK_SOUND};

pub(crate) const METRONOME: ComponentKind = ComponentKind::new("metronome");

/// Clicks once per beat and announces it with a `Beat` event.
#[derive(Debug, Clone)]
pub(crate) struct MetronomeComponent {
    interval_ms: f64,
    since_click_ms: f64,
    elapsed_ms: u64,
    beats: u64,
}

impl MetronomeComponent {
    pub(crate) fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            since_click_ms: 0.0,
            elapsed_ms: 0,
            beats: 0,
        }
    }

    pub(crate) fn beats(&self) -> u64 {
        self.beats
    }
}

impl Component for MetronomeComponent {
    fn kind(&self) -> ComponentKind {
        METRONOME
    }

    fn update(&mut self, owner: &ActorState, ctx: &FrameContext<'_>, delta_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        self.since_click_ms += delta_ms as f64;
        if self.since_click_ms < self.interval_ms {
            return;
        }
        self.since_click_ms = 0.0;
        self.beats += 1;
        ctx.play(CLICK_SOUND);
        debug!(actor = %owner.id, beat = self.beats, at_ms = self.elapsed_ms, "beat");
        ctx.post(Event::custom(
            BEAT_EVENT,
            Beat {
                index: self.beats,
                at_ms: self.elapsed_ms,
            },
        ));
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BonusSchedule {
    pub(crate) every_beats: u64,
    pub(crate) spawn_at: Vec2,
    /// The only actor whose touch collects a spawned bonus.
    pub(crate) collector: ActorId,
}

pub(crate) struct MetronomeActor {
    core: ActorCore,
    schedule: BonusSchedule,
    bonuses_requested: u64,
}

impl MetronomeActor {
    pub(crate) fn new(
        id: ActorId,
        interval_ms: f64,
        schedule: BonusSchedule,
    ) -> Result<Self, engine::ActorError> {
        let mut core = ActorCore::new(id);
        core.add_component(MetronomeComponent::new(interval_ms))?;
        Ok(Self {
            core,
            schedule,
            bonuses_requested: 0,
        })
    }

    pub(crate) fn beats(&self) -> u64 {
        self.core
            .component::<MetronomeComponent>(METRONOME)
            .map_or(0, MetronomeComponent::beats)
    }

    fn request_bonus(&mut self, ctx: &FrameContext<'_>) {
        let BonusSchedule {
            spawn_at,
            collector,
            ..
        } = self.schedule;
        self.bonuses_requested += 1;
        debug!(
            actor = %self.core.id(),
            bonuses_requested = self.bonuses_requested,
            "bonus_requested"
        );
        ctx.post(Event::spawn("bonus", move |id| {
            Ok(Box::new(BonusActor::new(id, spawn_at, collector)?) as Box<dyn Actor>)
        }));
    }
}

impl Updateable for MetronomeActor {
    fn update(&mut self, ctx: &FrameContext<'_>, delta_ms: u64) {
        let before = self.beats();
        self.core.update(ctx, delta_ms);
        let after = self.beats();
        if after > before && after % self.schedule.every_beats.max(1) == 0 {
            self.request_bonus(ctx);
        }
    }
}

impl Actor for MetronomeActor {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn debug_name(&self) -> &'static str {
        "metronome"
    }

    fn as_updateable(&mut self) -> Option<&mut dyn Updateable> {
        Some(self)
    }
}
