mod frame_buffer;
mod renderer;

use thiserror::Error;

use crate::app::Rect;

pub use frame_buffer::FrameBuffer;
pub use renderer::PixelsSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn rgba(self) -> [u8; 4] {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to resize render surface: {0}")]
    Resize(#[source] pixels::TextureError),
    #[error("failed to present frame: {0}")]
    Present(#[source] pixels::Error),
}

/// Screen-space drawing target. Rects passed to `fill_rect` are already camera-relative.
pub trait RenderSurface {
    fn size(&self) -> (u32, u32);
    fn fill(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn present(&mut self) -> Result<(), RenderError>;
}
