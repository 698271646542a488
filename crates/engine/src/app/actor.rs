use std::fmt;

use thiserror::Error;

use super::audio::{AudioSink, SoundId};
use super::camera::Camera;
use super::component::{Component, ComponentKind};
use super::event::{Event, EventSender};
use super::rendering::RenderSurface;
use super::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct ActorIdAllocator {
    next: u64,
}

impl ActorIdAllocator {
    pub fn allocate(&mut self) -> ActorId {
        let id = ActorId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActorError {
    #[error("{actor} already has a '{kind}' component")]
    DuplicateComponent { actor: ActorId, kind: ComponentKind },
    #[error("{actor} has no '{kind}' component")]
    MissingComponent { actor: ActorId, kind: ComponentKind },
}

/// Read-only view of an actor handed to its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub id: ActorId,
    pub position: Vec2,
}

/// Services available to actors and components while the loop runs a phase.
pub struct FrameContext<'a> {
    events: &'a EventSender,
    audio: &'a dyn AudioSink,
    frame_index: u64,
}

impl<'a> FrameContext<'a> {
    pub fn new(events: &'a EventSender, audio: &'a dyn AudioSink, frame_index: u64) -> Self {
        Self {
            events,
            audio,
            frame_index,
        }
    }

    /// Enqueues `event`; it is delivered no earlier than the next frame's dispatch.
    pub fn post(&self, event: Event) {
        self.events.post(event);
    }

    pub fn play(&self, sound: SoundId) {
        self.audio.play(sound);
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// Identity, position and the insertion-ordered component slots shared by all actors.
pub struct ActorCore {
    id: ActorId,
    position: Vec2,
    components: Vec<Box<dyn Component>>,
}

impl ActorCore {
    pub fn new(id: ActorId) -> Self {
        Self::with_position(id, Vec2::ZERO)
    }

    pub fn with_position(id: ActorId, position: Vec2) -> Self {
        Self {
            id,
            position,
            components: Vec::new(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn state(&self) -> ActorState {
        ActorState {
            id: self.id,
            position: self.position,
        }
    }

    pub fn add_component<C: Component>(&mut self, component: C) -> Result<(), ActorError> {
        self.add_boxed_component(Box::new(component))
    }

    pub fn add_boxed_component(&mut self, component: Box<dyn Component>) -> Result<(), ActorError> {
        let kind = component.kind();
        if self.has_component(kind) {
            return Err(ActorError::DuplicateComponent {
                actor: self.id,
                kind,
            });
        }
        self.components.push(component);
        Ok(())
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.slot_index(kind).is_some()
    }

    pub fn get_component(&self, kind: ComponentKind) -> Option<&(dyn Component + 'static)> {
        self.slot_index(kind).map(|index| self.components[index].as_ref())
    }

    pub fn get_component_mut(
        &mut self,
        kind: ComponentKind,
    ) -> Option<&mut (dyn Component + 'static)> {
        let index = self.slot_index(kind)?;
        Some(self.components[index].as_mut())
    }

    /// Typed lookup; `None` when the slot is empty or holds another type.
    pub fn component<T: Component>(&self, kind: ComponentKind) -> Option<&T> {
        self.get_component(kind)?.downcast_ref::<T>()
    }

    pub fn component_mut<T: Component>(&mut self, kind: ComponentKind) -> Option<&mut T> {
        self.get_component_mut(kind)?.downcast_mut::<T>()
    }

    pub fn remove_component(
        &mut self,
        kind: ComponentKind,
    ) -> Result<Box<dyn Component>, ActorError> {
        let index = self
            .slot_index(kind)
            .ok_or(ActorError::MissingComponent {
                actor: self.id,
                kind,
            })?;
        Ok(self.components.remove(index))
    }

    pub fn component_kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.iter().map(|component| component.kind())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn update(&mut self, ctx: &FrameContext<'_>, delta_ms: u64) {
        let owner = self.state();
        for component in &mut self.components {
            component.update(&owner, ctx, delta_ms);
        }
    }

    pub fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        let owner = self.state();
        for component in &self.components {
            if let Some(drawable) = component.as_drawable() {
                drawable.draw(&owner, surface, camera);
            }
        }
    }

    fn slot_index(&self, kind: ComponentKind) -> Option<usize> {
        self.components
            .iter()
            .position(|component| component.kind() == kind)
    }
}

impl fmt::Debug for ActorCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorCore")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("components", &self.component_kinds().collect::<Vec<_>>())
            .finish()
    }
}

pub trait Updateable {
    fn update(&mut self, ctx: &FrameContext<'_>, delta_ms: u64);
}

pub trait Drawable {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera);
}

pub trait Collisionable {
    fn collision_rect(&self) -> Rect;
}

pub trait EventHandleable {
    /// Receives every broadcast event; kinds the actor does not care about are ignored.
    fn handle_event(&mut self, event: &Event, ctx: &FrameContext<'_>);
}

/// What the game loop holds. Capabilities are queried per phase; an actor that answers
/// `None` sits that phase out.
pub trait Actor {
    fn core(&self) -> &ActorCore;

    fn id(&self) -> ActorId {
        self.core().id()
    }

    fn position(&self) -> Vec2 {
        self.core().position()
    }

    fn debug_name(&self) -> &'static str {
        "actor"
    }

    fn as_updateable(&mut self) -> Option<&mut dyn Updateable> {
        None
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }

    fn as_collisionable(&self) -> Option<&dyn Collisionable> {
        None
    }

    fn as_event_handler(&mut self) -> Option<&mut dyn EventHandleable> {
        None
    }
}
