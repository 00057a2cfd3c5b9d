use anyhow::Result;

use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::texture::PixelBuffer;

/// Backend-issued identifier of a GPU texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TextureHandle(pub(crate) u64);

impl TextureHandle {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Renderer-agnostic draw command, recorded into the back buffer in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Solid axis-aligned rectangle.
    Quad { rect: Rect, color: Color },

    /// Solid segment of the given thickness, centered on `from → to`.
    Line {
        from: Vec2,
        to: Vec2,
        thickness: f32,
        color: Color,
    },

    /// Texture stretched over `rect`, modulated by `tint`.
    Textured {
        texture: TextureHandle,
        rect: Rect,
        tint: Color,
    },
}

/// Windowing + graphics capability behind a `DisplaySurface`.
///
/// Implementations own the rendering context. The surface is the only caller
/// and enforces lifecycle rules (closed surface, released textures) before
/// any method here runs.
pub trait DisplayBackend {
    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Clears the back buffer and drops commands recorded since the last swap.
    fn clear(&mut self, color: Color);

    /// Records a draw command into the back buffer.
    fn draw(&mut self, cmd: DrawCmd);

    /// Uploads `image`; returns once the data is resident.
    fn create_texture(&mut self, image: &PixelBuffer) -> Result<TextureHandle>;

    /// Replaces the contents (and possibly the size) of a live texture.
    fn update_texture(&mut self, texture: TextureHandle, image: &PixelBuffer) -> Result<()>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Presents the back buffer. Under vsync this blocks until the refresh
    /// boundary.
    fn swap_buffers(&mut self) -> Result<()>;

    /// Releases the context and every resource created through it.
    fn shutdown(&mut self);
}
