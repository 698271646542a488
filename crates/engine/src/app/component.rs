use std::any::Any;
use std::fmt;

use super::actor::{ActorState, FrameContext};
use super::camera::Camera;
use super::rendering::{Color, RenderSurface};
use super::{Rect, Vec2};

/// Tag keying an actor's component slots. One instance per kind per actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKind(&'static str);

impl ComponentKind {
    pub const SPRITE: ComponentKind = ComponentKind("sprite");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A behavior unit owned by exactly one actor.
///
/// The owner is not stored in the component; its read-only view is handed in on
/// every call, so a component can never reach the owner's component set.
pub trait Component: AsAny + 'static {
    fn kind(&self) -> ComponentKind;

    fn update(&mut self, owner: &ActorState, ctx: &FrameContext<'_>, delta_ms: u64);

    fn as_drawable(&self) -> Option<&dyn DrawableComponent> {
        None
    }
}

impl dyn Component {
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

pub trait DrawableComponent {
    /// Called every frame; the component decides whether anything is painted.
    fn draw(&self, owner: &ActorState, surface: &mut dyn RenderSurface, camera: &Camera);
}

/// Solid rectangle anchored at the owner's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteComponent {
    size: Vec2,
    offset: Vec2,
    color: Color,
}

impl SpriteComponent {
    pub fn new(size: Vec2, color: Color) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
            color,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn world_rect(&self, owner_position: Vec2) -> Rect {
        Rect::from_position_size(owner_position + self.offset, self.size)
    }
}

impl Component for SpriteComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::SPRITE
    }

    fn update(&mut self, _owner: &ActorState, _ctx: &FrameContext<'_>, _delta_ms: u64) {}

    fn as_drawable(&self) -> Option<&dyn DrawableComponent> {
        Some(self)
    }
}

impl DrawableComponent for SpriteComponent {
    fn draw(&self, owner: &ActorState, surface: &mut dyn RenderSurface, camera: &Camera) {
        let world_rect = self.world_rect(owner.position);
        if !camera.is_rect_visible(&world_rect) {
            return;
        }
        let screen_position = camera.world_to_screen(world_rect.position());
        surface.fill_rect(
            Rect::from_position_size(screen_position, world_rect.size()),
            self.color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ActorId, FrameBuffer};

    const GREEN: Color = Color::rgb(0, 200, 0);

    fn owner_at(x: f32, y: f32) -> ActorState {
        ActorState {
            id: ActorId(1),
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn sprite_world_rect_follows_owner_and_offset() {
        let sprite =
            SpriteComponent::new(Vec2::new(4.0, 2.0), GREEN).with_offset(Vec2::new(-2.0, -1.0));
        assert_eq!(
            sprite.world_rect(Vec2::new(10.0, 10.0)),
            Rect::new(8.0, 9.0, 4.0, 2.0)
        );
    }

    #[test]
    fn sprite_draws_translated_to_screen_space() {
        let camera = Camera::new(Vec2::new(16.0, 16.0), Vec2::new(100.0, 100.0));
        let sprite = SpriteComponent::new(Vec2::new(2.0, 2.0), GREEN);
        let mut surface = FrameBuffer::new(16, 16);
        surface.fill(Color::WHITE);

        sprite.draw(&owner_at(105.0, 103.0), &mut surface, &camera);

        assert_eq!(surface.pixel(5, 3), Some(GREEN));
        assert_eq!(surface.pixel(6, 4), Some(GREEN));
        assert_eq!(surface.pixel(7, 3), Some(Color::WHITE));
    }

    #[test]
    fn sprite_outside_viewport_is_skipped() {
        let camera = Camera::new(Vec2::new(16.0, 16.0), Vec2::ZERO);
        let sprite = SpriteComponent::new(Vec2::new(2.0, 2.0), GREEN);
        let mut surface = FrameBuffer::new(16, 16);
        surface.fill(Color::WHITE);

        sprite.draw(&owner_at(-50.0, 0.0), &mut surface, &camera);

        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(surface.pixel(x, y), Some(Color::WHITE));
            }
        }
    }

    #[test]
    fn boxed_component_downcasts_to_concrete_type() {
        let boxed: Box<dyn Component> = Box::new(SpriteComponent::new(Vec2::new(1.0, 1.0), GREEN));
        let sprite = boxed
            .as_ref()
            .downcast_ref::<SpriteComponent>()
            .expect("sprite");
        assert_eq!(sprite.color(), GREEN);
        assert_eq!(boxed.kind(), ComponentKind::SPRITE);
    }
}
