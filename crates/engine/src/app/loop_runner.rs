use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::error::{EventLoopError, OsError};

use super::actor::{Actor, ActorError, ActorId, ActorIdAllocator, FrameContext};
use super::audio::AudioSink;
use super::camera::{Camera, CameraError};
use super::clock::{FrameClock, SystemClock};
use super::collision::post_collisions;
use super::event::{ActorSpawnRequest, Event, EventBus, EventSender, RawEvent, SingleActorWrapper};
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::platform::{Platform, WinitPlatform};
use super::rendering::{Color, RenderError, RenderSurface};
use super::Vec2;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// `0` leaves the frame rate uncapped.
    pub target_fps: u32,
    pub clear_color: Color,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            title: "Metronome".to_string(),
            width: 640,
            height: 480,
            target_fps: 60,
            clear_color: Color::WHITE,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            width: non_zero_or(self.width, defaults.width),
            height: non_zero_or(self.height, defaults.height),
            max_frame_delta: normalize_non_zero_duration(
                self.max_frame_delta,
                defaults.max_frame_delta,
            ),
            metrics_log_interval: normalize_non_zero_duration(
                self.metrics_log_interval,
                defaults.metrics_log_interval,
            ),
            ..self
        }
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("game loop used before setup completed")]
    NotStarted,
    #[error(transparent)]
    Actor(#[from] ActorError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("actor factory returned {actual} instead of the allocated {expected}")]
    ForeignActorId { expected: ActorId, actual: ActorId },
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize render surface: {0}")]
    CreateSurface(#[source] PixelsError),
    #[error("game loop failed: {0}")]
    Loop(#[from] LoopError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Setup,
    Running,
    Stopped,
}

/// The actor list is only mutated while events are dispatched.
pub struct GameLoop {
    config: LoopConfig,
    clock: Box<dyn FrameClock>,
    audio: Arc<dyn AudioSink>,
    bus: EventBus,
    sender: EventSender,
    ids: ActorIdAllocator,
    actors: Vec<Box<dyn Actor>>,
    camera: Option<Camera>,
    state: LoopState,
    frame_index: u64,
    metrics_handle: MetricsHandle,
    metrics: MetricsAccumulator,
    last_frame_instant: Instant,
}

impl GameLoop {
    pub fn new(config: LoopConfig, clock: Box<dyn FrameClock>, audio: Arc<dyn AudioSink>) -> Self {
        let config = config.normalized();
        let bus = EventBus::new();
        let sender = bus.sender();
        let metrics = MetricsAccumulator::new(config.metrics_log_interval);
        Self {
            config,
            clock,
            audio,
            bus,
            sender,
            ids: ActorIdAllocator::default(),
            actors: Vec::new(),
            camera: None,
            state: LoopState::Setup,
            frame_index: 0,
            metrics_handle: MetricsHandle::default(),
            metrics,
            last_frame_instant: Instant::now(),
        }
    }

    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn post_event(&self, event: Event) {
        self.bus.post(event);
    }

    pub fn add_actor<A, F>(&mut self, factory: F) -> Result<ActorId, LoopError>
    where
        A: Actor + 'static,
        F: FnOnce(ActorId) -> Result<A, ActorError>,
    {
        let id = self.ids.allocate();
        let actor = factory(id)?;
        self.push_actor(id, Box::new(actor))?;
        info!(actor = %id, actor_count = self.actors.len(), "actor_added");
        Ok(id)
    }

    pub fn install_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Result<&Camera, LoopError> {
        self.camera.as_ref().ok_or(LoopError::NotStarted)
    }

    pub fn camera_mut(&mut self) -> Result<&mut Camera, LoopError> {
        self.camera.as_mut().ok_or(LoopError::NotStarted)
    }

    pub fn viewport_size(&self) -> Vec2 {
        Vec2::new(self.config.width as f32, self.config.height as f32)
    }

    pub fn actor(&self, id: ActorId) -> Option<&dyn Actor> {
        self.actors
            .iter()
            .find(|actor| actor.id() == id)
            .map(|actor| actor.as_ref())
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|actor| actor.id()).collect()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn metrics(&self) -> MetricsHandle {
        self.metrics_handle.clone()
    }

    /// Without an installed camera, an unlocked one at the origin is used.
    pub fn begin(&mut self) {
        if self.state != LoopState::Setup {
            return;
        }
        if self.camera.is_none() {
            self.camera = Some(Camera::new(self.viewport_size(), Vec2::ZERO));
        }
        self.state = LoopState::Running;
        self.last_frame_instant = Instant::now();
        info!(
            target_fps = self.config.target_fps,
            width = self.config.width,
            height = self.config.height,
            max_frame_delta_ms = self.config.max_frame_delta.as_millis() as u64,
            metrics_log_interval_ms = self.config.metrics_log_interval.as_millis() as u64,
            actor_count = self.actors.len(),
            "loop_config"
        );
    }

    pub fn start<P>(&mut self, platform: &mut P) -> Result<(), LoopError>
    where
        P: Platform + ?Sized,
    {
        self.begin();
        let result = loop {
            let raw_events = platform.poll_raw_events();
            match self.step(raw_events, platform.surface_mut()) {
                Ok(FrameOutcome::Continue) => {}
                Ok(FrameOutcome::Stopped) => break Ok(()),
                Err(error) => break Err(error),
            }
        };
        self.teardown();
        result
    }

    /// One frame. Once `Quit` has been dispatched the rest of the frame is skipped and
    /// every later call is a no-op.
    pub fn step(
        &mut self,
        raw_events: Vec<RawEvent>,
        surface: &mut dyn RenderSurface,
    ) -> Result<FrameOutcome, LoopError> {
        match self.state {
            LoopState::Setup => return Err(LoopError::NotStarted),
            LoopState::Stopped => return Ok(FrameOutcome::Stopped),
            LoopState::Running => {}
        }

        let dispatched = self.dispatch_events(raw_events)?;
        if self.state == LoopState::Stopped {
            return Ok(FrameOutcome::Stopped);
        }

        self.update_actors();
        self.update_camera();
        let collisions = post_collisions(&self.actors, &self.sender);
        self.clock.tick(self.config.target_fps);
        self.render(surface)?;

        self.record_metrics(dispatched, collisions);
        self.frame_index = self.frame_index.saturating_add(1);
        Ok(FrameOutcome::Continue)
    }

    fn dispatch_events(&mut self, raw_events: Vec<RawEvent>) -> Result<usize, LoopError> {
        let events = self.bus.drain_translated(raw_events);
        let dispatched = events.len();
        for event in events {
            match event {
                Event::Quit => {
                    if self.state == LoopState::Running {
                        info!(frame = self.frame_index, "shutdown_requested");
                    }
                    self.state = LoopState::Stopped;
                }
                Event::ActorDestruct(destruct) => self.remove_actor(destruct.actor()),
                Event::ActorSpawn(request) => self.spawn_actor(request)?,
                other => self.broadcast(&other),
            }
        }
        Ok(dispatched)
    }

    fn broadcast(&mut self, event: &Event) {
        let ctx = FrameContext::new(&self.sender, self.audio.as_ref(), self.frame_index);
        for actor in &mut self.actors {
            if let Some(handler) = actor.as_event_handler() {
                handler.handle_event(event, &ctx);
            }
        }
    }

    fn spawn_actor(&mut self, request: ActorSpawnRequest) -> Result<(), LoopError> {
        let id = self.ids.allocate();
        let label = request.label();
        let actor = request.build(id)?;
        self.push_actor(id, actor)?;
        info!(actor = %id, label, actor_count = self.actors.len(), "actor_spawned");
        Ok(())
    }

    fn push_actor(&mut self, expected: ActorId, actor: Box<dyn Actor>) -> Result<(), LoopError> {
        let actual = actor.id();
        if actual != expected {
            return Err(LoopError::ForeignActorId { expected, actual });
        }
        self.actors.push(actor);
        Ok(())
    }

    fn remove_actor(&mut self, id: ActorId) {
        let Some(index) = self.actors.iter().position(|actor| actor.id() == id) else {
            warn!(actor = %id, "destruct_unknown_actor");
            return;
        };
        let actor = self.actors.remove(index);
        info!(
            actor = %id,
            name = actor.debug_name(),
            actor_count = self.actors.len(),
            "actor_destructed"
        );
    }

    fn update_actors(&mut self) {
        let delta_ms = self.clock.last_delta_ms();
        let ctx = FrameContext::new(&self.sender, self.audio.as_ref(), self.frame_index);
        for actor in &mut self.actors {
            if let Some(updateable) = actor.as_updateable() {
                updateable.update(&ctx, delta_ms);
            }
        }
    }

    fn update_camera(&mut self) {
        let Some(camera) = self.camera.as_mut() else {
            return;
        };
        let actors = &self.actors;
        camera.update(|target| {
            actors
                .iter()
                .find(|actor| actor.id() == target)
                .map(|actor| actor.position())
        });
    }

    fn render(&mut self, surface: &mut dyn RenderSurface) -> Result<(), LoopError> {
        let camera = self.camera.as_ref().ok_or(LoopError::NotStarted)?;
        surface.fill(self.config.clear_color);
        for actor in &self.actors {
            if let Some(drawable) = actor.as_drawable() {
                drawable.draw(surface, camera);
            }
        }
        surface.present()?;
        Ok(())
    }

    fn record_metrics(&mut self, dispatched: usize, collisions: usize) {
        let now = Instant::now();
        let frame_dt = now.saturating_duration_since(self.last_frame_instant);
        self.last_frame_instant = now;

        self.metrics.record_frame(frame_dt);
        self.metrics.record_events(dispatched);
        self.metrics.record_collisions(collisions);
        if let Some(snapshot) = self.metrics.maybe_snapshot(now, self.actors.len()) {
            self.metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                frame_time_ms = snapshot.frame_time_ms,
                events_per_second = snapshot.events_per_second,
                collisions_per_second = snapshot.collisions_per_second,
                actor_count = snapshot.actor_count,
                "loop_metrics"
            );
        }
    }

    fn teardown(&mut self) {
        self.state = LoopState::Stopped;
        info!(
            frames = self.frame_index,
            actor_count = self.actors.len(),
            "shutdown"
        );
        for actor in self.actors.drain(..) {
            debug!(actor = %actor.id(), name = actor.debug_name(), "actor_dropped");
        }
    }
}

pub fn run_app<F>(config: LoopConfig, audio: Arc<dyn AudioSink>, setup: F) -> Result<(), AppError>
where
    F: FnOnce(&mut GameLoop) -> Result<(), LoopError>,
{
    let config = config.normalized();
    let mut platform = WinitPlatform::new(&config)?;
    let clock = SystemClock::new(config.max_frame_delta);
    let mut game_loop = GameLoop::new(config, Box::new(clock), audio);
    setup(&mut game_loop)?;
    game_loop.start(&mut platform)?;
    Ok(())
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn non_zero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 {
        fallback
    } else {
        value
    }
}
