use std::time::Duration;

use crate::device::{ContextId, DisplaySurface, TextureHandle};
use crate::error::{Result, TachyError};
use crate::time::ClockSample;

use super::pixels::{PixelBuffer, PixelFormat};

/// Outcome of `TextureResource::release`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReleaseOutcome {
    Released,
    /// The texture had been released before; nothing happened.
    AlreadyReleased,
}

/// GPU-resident image owned by the caller.
///
/// Lifecycle: `upload` -> any number of `bind`/`unbind`/`reupload` ->
/// `release`. Every operation other than `release` fails with
/// `ResourceReleased` afterwards. A texture is tied to the surface that
/// created it; using it against another (or a closed) surface fails with
/// `NoActiveContext`.
#[derive(Debug)]
pub struct TextureResource {
    handle: TextureHandle,
    context: ContextId,
    width: u32,
    height: u32,
    format: PixelFormat,
    uploaded_at: ClockSample,
    upload_time: Duration,
    released: bool,
}

impl TextureResource {
    /// Uploads `image` and returns once the data is resident on the GPU.
    pub fn upload(surface: &mut DisplaySurface, image: &PixelBuffer) -> Result<Self> {
        let started = surface.clock().now();
        let (handle, context) = surface.create_texture(image)?;
        let uploaded_at = surface.clock().now();

        log::debug!(
            "uploaded {}x{} {:?} texture {} in {:?}",
            image.width(),
            image.height(),
            image.format(),
            handle.raw(),
            uploaded_at - started
        );

        Ok(Self {
            handle,
            context,
            width: image.width(),
            height: image.height(),
            format: image.format(),
            uploaded_at,
            upload_time: uploaded_at - started,
            released: false,
        })
    }

    /// Validates raw bytes as a `height × width × channels` image and uploads it.
    pub fn upload_pixels(
        surface: &mut DisplaySurface,
        width: u32,
        height: u32,
        channels: usize,
        data: &[u8],
    ) -> Result<Self> {
        let image = PixelBuffer::new(width, height, channels, data.to_vec())?;
        Self::upload(surface, &image)
    }

    /// Replaces the contents, keeping the same identity and bindings.
    pub fn reupload(&mut self, surface: &mut DisplaySurface, image: &PixelBuffer) -> Result<()> {
        self.ensure_live()?;
        let started = surface.clock().now();
        surface.update_texture(self.context, self.handle, image)?;

        self.width = image.width();
        self.height = image.height();
        self.format = image.format();
        self.uploaded_at = surface.clock().now();
        self.upload_time = self.uploaded_at - started;
        Ok(())
    }

    /// Binds to texture unit 0. Subsequent textured draws sample this image.
    pub fn bind(&self, surface: &mut DisplaySurface) -> Result<()> {
        self.bind_unit(surface, 0)
    }

    /// Binds to `unit`, replacing whatever it held.
    pub fn bind_unit(&self, surface: &mut DisplaySurface, unit: usize) -> Result<()> {
        self.ensure_live()?;
        surface.bind_texture(self.context, unit, self.handle)
    }

    /// Clears every unit holding this texture. A no-op when it is not bound.
    pub fn unbind(&self, surface: &mut DisplaySurface) -> Result<()> {
        self.ensure_live()?;
        surface.unbind_texture(self.context, self.handle)
    }

    /// Frees the GPU storage. Releasing twice is a no-op.
    ///
    /// Releasing after the owning surface was closed succeeds: the storage
    /// went away with the context.
    pub fn release(&mut self, surface: &mut DisplaySurface) -> Result<ReleaseOutcome> {
        if self.released {
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        let freed = surface.destroy_texture(self.context, self.handle)?;
        self.released = true;
        if freed {
            log::debug!("released texture {}", self.handle.raw());
        }
        Ok(ReleaseOutcome::Released)
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Time the most recent upload became resident.
    pub fn uploaded_at(&self) -> ClockSample {
        self.uploaded_at
    }

    /// Duration of the most recent upload.
    pub fn upload_time(&self) -> Duration {
        self.upload_time
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.released {
            Err(TachyError::ResourceReleased)
        } else {
            Ok(())
        }
    }
}

impl Drop for TextureResource {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "texture {} ({}x{}) dropped without release",
                self.handle.raw(),
                self.width,
                self.height
            );
        }
    }
}
