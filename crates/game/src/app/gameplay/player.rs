use engine::{
    Actor, ActorCore, ActorError, ActorId, Camera, Collisionable, Color, Drawable, Event,
    EventHandleable, FrameContext, Key, Rect, RenderSurface, SpriteComponent, Vec2,
};

pub(crate) const PLAYER_SIZE: Vec2 = Vec2::new(32.0, 32.0);
pub(crate) const PLAYER_STEP: f32 = 8.0;
const PLAYER_COLOR: Color = Color::rgb(40, 90, 220);

/// Arrow-key controlled square the camera follows.
pub(crate) struct PlayerActor {
    core: ActorCore,
}

impl PlayerActor {
    pub(crate) fn new(id: ActorId, position: Vec2) -> Result<Self, ActorError> {
        let mut core = ActorCore::with_position(id, position);
        core.add_component(SpriteComponent::new(PLAYER_SIZE, PLAYER_COLOR))?;
        Ok(Self { core })
    }
}

fn step_for(key: Key) -> Option<Vec2> {
    match key {
        Key::Up => Some(Vec2::new(0.0, -PLAYER_STEP)),
        Key::Down => Some(Vec2::new(0.0, PLAYER_STEP)),
        Key::Left => Some(Vec2::new(-PLAYER_STEP, 0.0)),
        Key::Right => Some(Vec2::new(PLAYER_STEP, 0.0)),
        Key::Space | Key::Other => None,
    }
}

impl Drawable for PlayerActor {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        self.core.draw(surface, camera);
    }
}

impl Collisionable for PlayerActor {
    fn collision_rect(&self) -> Rect {
        Rect::from_position_size(self.core.position(), PLAYER_SIZE)
    }
}

impl EventHandleable for PlayerActor {
    fn handle_event(&mut self, event: &Event, _ctx: &FrameContext<'_>) {
        if let Event::KeyDown(key) = event {
            if let Some(step) = step_for(*key) {
                self.core.translate(step);
            }
        }
    }
}

impl Actor for PlayerActor {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn debug_name(&self) -> &'static str {
        "player"
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_collisionable(&self) -> Option<&dyn Collisionable> {
        Some(self)
    }

    fn as_event_handler(&mut self) -> Option<&mut dyn EventHandleable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use engine::{EventBus, RecordingAudioSink};

    use super::*;

    #[test]
    fn arrow_keys_move_by_one_step_and_other_keys_do_nothing() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let audio = RecordingAudioSink::default();
        let ctx = FrameContext::new(&sender, &audio, 0);
        let mut player = PlayerActor::new(ActorId(0), Vec2::ZERO).expect("player");

        for key in [Key::Up, Key::Up, Key::Right, Key::Space, Key::Other] {
            player.handle_event(&Event::KeyDown(key), &ctx);
        }

        assert_eq!(player.position(), Vec2::new(PLAYER_STEP, -2.0 * PLAYER_STEP));
        assert_eq!(
            player.collision_rect(),
            Rect::new(PLAYER_STEP, -2.0 * PLAYER_STEP, 32.0, 32.0)
        );
    }
}
