use crate::app::Rect;

use super::{Color, RenderError, RenderSurface};

/// CPU-side RGBA frame, used headless and as the raster backend of the window surface.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    presented_frames: u64,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
            presented_frames: 0,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(Color(rgba))
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }
}

impl RenderSurface for FrameBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Color) {
        fill_rgba(&mut self.rgba, color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        fill_rect_rgba(&mut self.rgba, self.width, self.height, rect, color);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.presented_frames = self.presented_frames.saturating_add(1);
        Ok(())
    }
}

pub(super) fn fill_rgba(frame: &mut [u8], color: Color) {
    let rgba = color.rgba();
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&rgba);
    }
}

pub(super) fn fill_rect_rgba(frame: &mut [u8], width: u32, height: u32, rect: Rect, color: Color) {
    if rect.is_empty() {
        return;
    }
    let left = (rect.left().round() as i32).max(0);
    let top = (rect.top().round() as i32).max(0);
    let right = (rect.right().round() as i32).min(width as i32);
    let bottom = (rect.bottom().round() as i32).min(height as i32);
    let rgba = color.rgba();

    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, width as usize, x, y, rgba);
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
