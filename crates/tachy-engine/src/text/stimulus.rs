use crate::coords::{Rect, Vec2};
use crate::device::DisplaySurface;
use crate::error::Result;
use crate::paint::Color;
use crate::render::draw_stimulus;
use crate::texture::{PixelBuffer, ReleaseOutcome, TextureResource};

use super::font::Font;

/// A rendered line of text, resident on the GPU and drawn centered on a
/// point.
///
/// Owns its texture; call `release` before dropping it.
#[derive(Debug)]
pub struct TextStimulus {
    texture: TextureResource,
    position: Vec2,
}

impl TextStimulus {
    /// Renders `text` with `font` and uploads it.
    pub fn new(
        surface: &mut DisplaySurface,
        font: &Font,
        text: &str,
        size_px: f32,
        color: impl Into<Color>,
        position: Vec2,
    ) -> Result<Self> {
        let image = font.render(text, size_px, color)?;
        Self::from_image(surface, &image, position)
    }

    /// Wraps an already rendered image.
    pub fn from_image(surface: &mut DisplaySurface, image: &PixelBuffer, position: Vec2) -> Result<Self> {
        Ok(Self {
            texture: TextureResource::upload(surface, image)?,
            position,
        })
    }

    /// Re-renders in place. The texture keeps its identity.
    pub fn set_text(
        &mut self,
        surface: &mut DisplaySurface,
        font: &Font,
        text: &str,
        size_px: f32,
        color: impl Into<Color>,
    ) -> Result<()> {
        let image = font.render(text, size_px, color)?;
        self.texture.reupload(surface, &image)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> (u32, u32) {
        self.texture.size()
    }

    /// Destination spanning the text's pixel size around `position`.
    pub fn dest_rect(&self) -> Rect {
        let (w, h) = self.size();
        let (w, h) = (w as f32, h as f32);
        Rect::new(self.position.x - w / 2.0, self.position.y - h / 2.0, w, h)
    }

    /// Draws at one texel per pixel, blended over what is already in the
    /// back buffer.
    pub fn draw(&self, surface: &mut DisplaySurface) -> Result<()> {
        draw_stimulus(surface, &self.texture, self.dest_rect())
    }

    pub fn texture(&self) -> &TextureResource {
        &self.texture
    }

    pub fn release(&mut self, surface: &mut DisplaySurface) -> Result<ReleaseOutcome> {
        self.texture.release(surface)
    }
}
