use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::Rect;

use super::frame_buffer::{fill_rect_rgba, fill_rgba};
use super::{Color, RenderError, RenderSurface};

/// Window-backed surface: the actor draw calls rasterize into the pixels frame, which is
/// uploaded on `present`.
pub struct PixelsSurface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl PixelsSurface {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .map_err(RenderError::Resize)?;
        self.pixels
            .resize_buffer(width, height)
            .map_err(RenderError::Resize)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }
}

impl RenderSurface for PixelsSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Color) {
        fill_rgba(self.pixels.frame_mut(), color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (width, height) = (self.width, self.height);
        fill_rect_rgba(self.pixels.frame_mut(), width, height, rect, color);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.window.pre_present_notify();
        self.pixels.render().map_err(RenderError::Present)
    }
}
