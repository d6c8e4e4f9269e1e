use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Presentation seam. The engine only sequences draw calls; whatever sits
/// behind this trait does the pixel work.
pub trait RenderTarget {
    fn draw_rect(&mut self, rect: Rect, color: Color);
    fn draw_sprite(&mut self, texture: &str, source: Rect, dest: Rect);
}
