mod actor;
mod audio;
mod camera;
mod clock;
mod collision;
mod component;
mod event;
mod geometry;
mod loop_runner;
mod metrics;
mod platform;
mod rendering;

pub use actor::{
    Actor, ActorCore, ActorError, ActorId, ActorIdAllocator, ActorState, Collisionable, Drawable,
    EventHandleable, FrameContext, Updateable,
};
pub use audio::{AudioSink, RecordingAudioSink, SoundId, TracingAudioSink};
pub use camera::{Camera, CameraError};
pub use clock::{FrameClock, ManualClock, SystemClock};
pub use collision::{detect_collisions, post_collisions};
pub use component::{AsAny, Component, ComponentKind, DrawableComponent, SpriteComponent};
pub use event::{
    ActorCollisionEvent, ActorDestructEvent, ActorFactory, ActorSpawnRequest, CustomEvent,
    DoubleActorWrapper, Event, EventBus, EventKind, EventSender, Key, RawEvent,
    SingleActorWrapper,
};
pub use geometry::{Rect, Vec2};
pub use loop_runner::{run_app, AppError, FrameOutcome, GameLoop, LoopConfig, LoopError};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use platform::{HeadlessPlatform, Platform, WinitPlatform};
pub use rendering::{Color, FrameBuffer, PixelsSurface, RenderError, RenderSurface};
