pub mod app;

pub use app::{
    detect_collisions, post_collisions, run_app, Actor, ActorCollisionEvent, ActorCore,
    ActorDestructEvent, ActorError, ActorFactory, ActorId, ActorIdAllocator, ActorSpawnRequest,
    ActorState, AppError, AsAny, AudioSink, Camera, CameraError, Collisionable, Color, Component,
    ComponentKind, CustomEvent, DoubleActorWrapper, Drawable, DrawableComponent, Event, EventBus,
    EventHandleable, EventKind, EventSender, FrameBuffer, FrameClock, FrameContext, FrameOutcome,
    GameLoop, HeadlessPlatform, Key, LoopConfig, LoopError, LoopMetricsSnapshot, ManualClock,
    MetricsHandle, PixelsSurface, Platform, RawEvent, RecordingAudioSink, Rect, RenderError,
    RenderSurface, SingleActorWrapper, SoundId, SpriteComponent, SystemClock, TracingAudioSink,
    Updateable, Vec2, WinitPlatform,
};

/// Raw key codes for scripting `RawEvent`s without a direct winit dependency.
pub use winit::keyboard::KeyCode;
