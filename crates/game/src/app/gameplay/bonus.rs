use engine::{
    Actor, ActorCore, ActorError, ActorId, Camera, Collisionable, Color, DoubleActorWrapper,
    Drawable, Event, EventHandleable, FrameContext, Rect, RenderSurface, SpriteComponent, Vec2,
};
use tracing::info;

use super::COIN_SOUND;

pub(crate) const BONUS_SIZE: Vec2 = Vec2::new(24.0, 24.0);
const BONUS_COLOR: Color = Color::rgb(235, 190, 30);

/// Coin picked up by touching it.
///
/// Collisions keep firing while the pair overlaps and the destruct only lands a frame
/// later, so the first qualifying collision flips `collected` and the actor stops being
/// collisionable; later events are ignored.
pub(crate) struct BonusActor {
    core: ActorCore,
    collector: ActorId,
    collected: bool,
}

impl BonusActor {
    pub(crate) fn new(id: ActorId, position: Vec2, collector: ActorId) -> Result<Self, ActorError> {
        let mut core = ActorCore::with_position(id, position);
        core.add_component(SpriteComponent::new(BONUS_SIZE, BONUS_COLOR))?;
        Ok(Self {
            core,
            collector,
            collected: false,
        })
    }
}

impl Drawable for BonusActor {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        if !self.collected {
            self.core.draw(surface, camera);
        }
    }
}

impl Collisionable for BonusActor {
    fn collision_rect(&self) -> Rect {
        Rect::from_position_size(self.core.position(), BONUS_SIZE)
    }
}

impl EventHandleable for BonusActor {
    fn handle_event(&mut self, event: &Event, ctx: &FrameContext<'_>) {
        let Event::ActorCollision(collision) = event else {
            return;
        };
        if self.collected || collision.other(self.core.id()) != Some(self.collector) {
            return;
        }
        self.collected = true;
        ctx.play(COIN_SOUND);
        ctx.post(Event::destruct(self.core.id()));
        info!(
            actor = %self.core.id(),
            collector = %self.collector,
            rect = ?collision.collision_rect(),
            "bonus_collected"
        );
    }
}

impl Actor for BonusActor {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn debug_name(&self) -> &'static str {
        "bonus"
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_collisionable(&self) -> Option<&dyn Collisionable> {
        if self.collected {
            None
        } else {
            Some(self)
        }
    }

    fn as_event_handler(&mut self) -> Option<&mut dyn EventHandleable> {
        Some(self)
    }
}
