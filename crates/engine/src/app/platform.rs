use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use super::event::RawEvent;
use super::loop_runner::{AppError, LoopConfig};
use super::rendering::{FrameBuffer, PixelsSurface, RenderSurface};

/// Source of raw input plus the surface frames are rendered to.
pub trait Platform {
    /// Everything that arrived since the previous call, in arrival order.
    fn poll_raw_events(&mut self) -> Vec<RawEvent>;

    fn surface_mut(&mut self) -> &mut dyn RenderSurface;
}

pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    surface: PixelsSurface,
    exited: bool,
}

impl WinitPlatform {
    pub fn new(config: &LoopConfig) -> Result<Self, AppError> {
        let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(config.title.clone())
                .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
                .build(&event_loop)
                .map_err(AppError::CreateWindow)?,
        );
        let surface = PixelsSurface::new(Arc::clone(&window)).map_err(AppError::CreateSurface)?;

        Ok(Self {
            event_loop,
            window,
            surface,
            exited: false,
        })
    }
}

impl Platform for WinitPlatform {
    fn poll_raw_events(&mut self) -> Vec<RawEvent> {
        if self.exited {
            return vec![RawEvent::Quit];
        }

        let window_id = self.window.id();
        let mut raw_events = Vec::new();
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _target| {
                let WinitEvent::WindowEvent { window_id: id, event } = event else {
                    return;
                };
                if id != window_id {
                    return;
                }
                if let Some(raw) = translate_window_event(event) {
                    raw_events.push(raw);
                }
            });

        if let PumpStatus::Exit(code) = status {
            info!(code, reason = "event_loop_exit", "shutdown_requested");
            self.exited = true;
            raw_events.push(RawEvent::Quit);
        }

        for raw in &raw_events {
            if let RawEvent::Resized { width, height } = *raw {
                if let Err(error) = self.surface.resize(width, height) {
                    warn!(error = %error, width, height, "surface_resize_failed");
                    self.exited = true;
                }
            }
        }
        if self.exited && !raw_events.iter().any(|raw| matches!(raw, RawEvent::Quit)) {
            raw_events.push(RawEvent::Quit);
        }

        raw_events
    }

    fn surface_mut(&mut self) -> &mut dyn RenderSurface {
        &mut self.surface
    }
}

fn translate_window_event(event: WindowEvent) -> Option<RawEvent> {
    match event {
        WindowEvent::CloseRequested => {
            info!(reason = "window_close", "shutdown_requested");
            Some(RawEvent::Quit)
        }
        WindowEvent::Resized(size) => Some(RawEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::KeyboardInput { event, .. } => translate_key_event(&event),
        _ => None,
    }
}

fn translate_key_event(event: &KeyEvent) -> Option<RawEvent> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    match (event.state, code) {
        (ElementState::Pressed, KeyCode::Escape) => {
            info!(reason = "escape_key", "shutdown_requested");
            Some(RawEvent::Quit)
        }
        (ElementState::Pressed, code) => Some(RawEvent::KeyDown(code)),
        (ElementState::Released, code) => Some(RawEvent::KeyUp(code)),
    }
}

/// Scripted platform for tests and headless runs. Each poll hands out the next scripted
/// frame; once the script is exhausted every poll yields `Quit`.
#[derive(Debug)]
pub struct HeadlessPlatform {
    frames: VecDeque<Vec<RawEvent>>,
    surface: FrameBuffer,
    polls: u64,
}

impl HeadlessPlatform {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frames: VecDeque::new(),
            surface: FrameBuffer::new(width, height),
            polls: 0,
        }
    }

    pub fn with_frames<I>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = Vec<RawEvent>>,
    {
        self.frames.extend(frames);
        self
    }

    /// Queues `count` frames without raw input.
    pub fn with_idle_frames(mut self, count: usize) -> Self {
        self.frames.extend((0..count).map(|_| Vec::new()));
        self
    }

    pub fn surface(&self) -> &FrameBuffer {
        &self.surface
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl Platform for HeadlessPlatform {
    fn poll_raw_events(&mut self) -> Vec<RawEvent> {
        self.polls = self.polls.saturating_add(1);
        self.frames
            .pop_front()
            .unwrap_or_else(|| vec![RawEvent::Quit])
    }

    fn surface_mut(&mut self) -> &mut dyn RenderSurface {
        &mut self.surface
    }
}
