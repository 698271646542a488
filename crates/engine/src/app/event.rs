use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{trace, warn};
use winit::keyboard::KeyCode;

use super::actor::{Actor, ActorError, ActorId};
use super::Rect;

static EVENT_QUEUE_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_event_queue_poison_once(operation: &'static str) {
    if EVENT_QUEUE_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "event queue lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Other,
}

#[derive(Debug)]
pub enum RawEvent {
    Quit,
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    Resized { width: u32, height: u32 },
    User(Event),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Quit,
    KeyDown,
    ActorSpawn,
    ActorDestruct,
    ActorCollision,
    Custom,
}

#[derive(Debug)]
pub enum Event {
    Quit,
    KeyDown(Key),
    ActorSpawn(ActorSpawnRequest),
    ActorDestruct(ActorDestructEvent),
    ActorCollision(ActorCollisionEvent),
    Custom(CustomEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Quit => EventKind::Quit,
            Event::KeyDown(_) => EventKind::KeyDown,
            Event::ActorSpawn(_) => EventKind::ActorSpawn,
            Event::ActorDestruct(_) => EventKind::ActorDestruct,
            Event::ActorCollision(_) => EventKind::ActorCollision,
            Event::Custom(_) => EventKind::Custom,
        }
    }

    pub fn destruct(actor: ActorId) -> Self {
        Event::ActorDestruct(ActorDestructEvent::new(actor))
    }

    pub fn spawn<F>(label: &'static str, factory: F) -> Self
    where
        F: FnOnce(ActorId) -> Result<Box<dyn Actor>, ActorError> + Send + 'static,
    {
        Event::ActorSpawn(ActorSpawnRequest::new(label, factory))
    }

    pub fn custom<T: Any + Send + Sync>(name: &'static str, payload: T) -> Self {
        Event::Custom(CustomEvent::new(name, payload))
    }
}

pub type ActorFactory = Box<dyn FnOnce(ActorId) -> Result<Box<dyn Actor>, ActorError> + Send>;

pub struct ActorSpawnRequest {
    label: &'static str,
    factory: ActorFactory,
}

impl ActorSpawnRequest {
    pub fn new<F>(label: &'static str, factory: F) -> Self
    where
        F: FnOnce(ActorId) -> Result<Box<dyn Actor>, ActorError> + Send + 'static,
    {
        Self {
            label,
            factory: Box::new(factory),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn build(self, id: ActorId) -> Result<Box<dyn Actor>, ActorError> {
        (self.factory)(id)
    }
}

impl fmt::Debug for ActorSpawnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSpawnRequest")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

pub trait SingleActorWrapper {
    fn actor(&self) -> ActorId;
}

pub trait DoubleActorWrapper {
    fn actors(&self) -> (ActorId, ActorId);

    fn concerns(&self, actor: ActorId) -> bool {
        let (first, second) = self.actors();
        first == actor || second == actor
    }

    /// `None` when `actor` is not part of the pair.
    fn other(&self, actor: ActorId) -> Option<ActorId> {
        let (first, second) = self.actors();
        if first == actor {
            Some(second)
        } else if second == actor {
            Some(first)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorDestructEvent {
    actor: ActorId,
}

impl ActorDestructEvent {
    pub fn new(actor: ActorId) -> Self {
        Self { actor }
    }
}

impl SingleActorWrapper for ActorDestructEvent {
    fn actor(&self) -> ActorId {
        self.actor
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorCollisionEvent {
    first: ActorId,
    second: ActorId,
    collision_rect: Rect,
}

impl ActorCollisionEvent {
    pub fn between(first: (ActorId, Rect), second: (ActorId, Rect)) -> Option<Self> {
        let collision_rect = first.1.clip(&second.1)?;
        Some(Self {
            first: first.0,
            second: second.0,
            collision_rect,
        })
    }

    pub fn collision_rect(&self) -> Rect {
        self.collision_rect
    }
}

impl DoubleActorWrapper for ActorCollisionEvent {
    fn actors(&self) -> (ActorId, ActorId) {
        (self.first, self.second)
    }
}

#[derive(Clone)]
pub struct CustomEvent {
    name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
}

impl CustomEvent {
    pub fn new<T: Any + Send + Sync>(name: &'static str, payload: T) -> Self {
        Self {
            name,
            payload: Arc::new(payload),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEvent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventSender {
    pending: Arc<Mutex<VecDeque<Event>>>,
}

impl EventSender {
    pub fn post(&self, event: Event) {
        trace!(kind = ?event.kind(), "event_posted");
        self.lock_pending().push_back(event);
    }

    fn take_pending(&self) -> VecDeque<Event> {
        std::mem::take(&mut *self.lock_pending())
    }

    fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<Event>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_event_queue_poison_once("lock");
                poisoned.into_inner()
            }
        }
    }
}

/// Posted events are buffered and only handed out by the next `drain_translated`, so
/// anything posted while a frame's events are handled shows up one frame later.
#[derive(Debug, Default)]
pub struct EventBus {
    sender: EventSender,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn post(&self, event: Event) {
        self.sender.post(event);
    }

    pub fn pending_len(&self) -> usize {
        self.sender.pending_len()
    }

    /// Translates one frame of raw platform events. Events posted since the previous
    /// drain come first, in post order, followed by the raw events in arrival order.
    pub fn drain_translated<I>(&self, raw_events: I) -> Vec<Event>
    where
        I: IntoIterator<Item = RawEvent>,
    {
        let posted = self.sender.take_pending();
        posted
            .into_iter()
            .map(RawEvent::User)
            .chain(raw_events)
            .filter_map(translate_raw_event)
            .collect()
    }
}

fn translate_raw_event(raw: RawEvent) -> Option<Event> {
    match raw {
        RawEvent::Quit => Some(Event::Quit),
        RawEvent::KeyDown(code) => Some(Event::KeyDown(translate_key(code))),
        RawEvent::User(event) => Some(event),
        RawEvent::KeyUp(_) | RawEvent::Resized { .. } => None,
    }
}

fn translate_key(code: KeyCode) -> Key {
    match code {
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::Space => Key::Space,
        _ => Key::Other,
    }
}
