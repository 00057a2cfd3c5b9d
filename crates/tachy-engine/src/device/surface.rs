use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{Result, TachyError};
use crate::paint::Color;
use crate::texture::PixelBuffer;
use crate::time::{refresh_period, Clock, FrameLimiter, IntervalStats};

use super::backend::{DisplayBackend, DrawCmd, TextureHandle};
use super::frame::FrameRecord;
use super::init::DisplayConfig;
use super::monitor::{select_monitor, MonitorInfo};

/// Number of texture units a surface exposes.
pub const TEXTURE_UNITS: usize = 8;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Identity of one rendering context. Textures remember the context that
/// created them and are only usable against it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct ContextId(u64);

impl ContextId {
    fn fresh() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Presentation surface bound to one monitor.
///
/// Owns the rendering context, the swap configuration and the ordered
/// sequence of `FrameRecord`s. All operations after `close()` fail with
/// `SurfaceClosed`.
pub struct DisplaySurface {
    /// `None` once closed.
    backend: Option<Box<dyn DisplayBackend>>,
    context: ContextId,
    monitor: MonitorInfo,
    config: DisplayConfig,
    size: (u32, u32),
    clock: Clock,
    limiter: Option<FrameLimiter>,
    frames: Vec<FrameRecord>,
    units: [Option<TextureHandle>; TEXTURE_UNITS],
    live_textures: usize,
}

impl DisplaySurface {
    /// Opens a surface on `config.monitor_index`.
    ///
    /// `open_backend` receives the selected monitor and the config and must
    /// return a context sized to the monitor (or to `config.size`). It is not
    /// called when the index is out of range.
    pub fn create<F>(
        monitors: &[MonitorInfo],
        config: DisplayConfig,
        clock: Clock,
        open_backend: F,
    ) -> Result<Self>
    where
        F: FnOnce(&MonitorInfo, &DisplayConfig) -> anyhow::Result<Box<dyn DisplayBackend>>,
    {
        let monitor = select_monitor(monitors, config.monitor_index)?.clone();
        if let Some(hz) = config.desired_refresh_rate {
            refresh_period(hz)?;
        }
        let limiter = match config.desired_refresh_rate {
            Some(hz) if !config.vsync => Some(FrameLimiter::new(hz)?),
            _ => None,
        };

        let mut backend = open_backend(&monitor, &config)?;
        backend.clear(config.background);
        let size = backend.size();

        log::info!(
            "display surface opened on monitor {} ({}x{} at {},{}), drawable {}x{}, vsync={}, nominal={:?} Hz",
            monitor.index,
            monitor.width,
            monitor.height,
            monitor.x,
            monitor.y,
            size.0,
            size.1,
            config.vsync,
            monitor.nominal_refresh_hz,
        );

        Ok(Self {
            backend: Some(backend),
            context: ContextId::fresh(),
            monitor,
            config,
            size,
            clock,
            limiter,
            frames: Vec::new(),
            units: [None; TEXTURE_UNITS],
            live_textures: 0,
        })
    }

    /// Geometry of the monitor the surface was opened on.
    pub fn geometry(&self) -> &MonitorInfo {
        &self.monitor
    }

    /// Drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn vsync(&self) -> bool {
        self.config.vsync
    }

    /// Refresh rate the OS reports for the monitor. Not a measurement.
    pub fn nominal_refresh_rate(&self) -> Option<f64> {
        self.monitor.nominal_refresh_hz
    }

    pub fn desired_refresh_rate(&self) -> Option<f64> {
        self.config.desired_refresh_rate
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }

    /// Clears the back buffer.
    pub fn fill(&mut self, color: Color) -> Result<()> {
        self.backend_mut()?.clear(color);
        Ok(())
    }

    /// Swaps buffers, blocking under vsync until the refresh boundary, then
    /// stamps and stores a `FrameRecord`.
    ///
    /// Without vsync and with a desired refresh rate the software limiter
    /// paces presents to that rate.
    pub fn present(&mut self) -> Result<FrameRecord> {
        self.backend_mut()?.swap_buffers()?;

        if let Some(limiter) = self.limiter.as_mut() {
            limiter.wait(&self.clock);
        }

        let record = FrameRecord::next(self.frames.last(), self.clock.now());
        self.frames.push(record);

        log::trace!(
            "frame {} presented at {} (interval {:?})",
            record.sequence,
            record.presented_at,
            record.interval
        );

        Ok(record)
    }

    /// Releases the context. Textures created on this surface become unusable.
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        let Some(mut backend) = self.backend.take() else {
            return;
        };

        self.units = [None; TEXTURE_UNITS];
        backend.shutdown();

        if self.live_textures > 0 {
            log::warn!(
                "display surface closed with {} unreleased texture(s)",
                self.live_textures
            );
        }
        log::info!("display surface closed after {} frame(s)", self.frames.len());
    }

    /// Every frame presented so far, oldest first.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Interval between the two most recent presents.
    pub fn last_interval(&self) -> Option<Duration> {
        self.frames.last().and_then(|f| f.interval)
    }

    /// Statistics over every measured interval of this surface.
    pub fn frame_stats(&self) -> Option<IntervalStats> {
        IntervalStats::from_intervals(self.frames.iter().filter_map(|f| f.interval))
    }

    /// Texture bound to `unit`, if any.
    pub fn bound_texture(&self, unit: usize) -> Option<TextureHandle> {
        self.units.get(unit).copied().flatten()
    }

    /// Number of textures created on this surface and not yet released.
    pub fn live_textures(&self) -> usize {
        self.live_textures
    }

    // ── crate-internal: draw + texture plumbing ───────────────────────────

    pub(crate) fn draw(&mut self, cmd: DrawCmd) -> Result<()> {
        self.backend_mut()?.draw(cmd);
        Ok(())
    }

    pub(crate) fn create_texture(
        &mut self,
        image: &PixelBuffer,
    ) -> Result<(TextureHandle, ContextId)> {
        let handle = self.backend_mut()?.create_texture(image)?;
        self.live_textures += 1;
        Ok((handle, self.context))
    }

    pub(crate) fn update_texture(
        &mut self,
        context: ContextId,
        texture: TextureHandle,
        image: &PixelBuffer,
    ) -> Result<()> {
        self.current_backend(context)?.update_texture(texture, image)?;
        Ok(())
    }

    pub(crate) fn bind_texture(
        &mut self,
        context: ContextId,
        unit: usize,
        texture: TextureHandle,
    ) -> Result<()> {
        self.current_backend(context)?;
        let slot = self.units.get_mut(unit).ok_or(TachyError::InvalidUnit {
            unit,
            available: TEXTURE_UNITS,
        })?;
        *slot = Some(texture);
        Ok(())
    }

    /// Puts back a unit occupant saved from `bound_texture`.
    pub(crate) fn restore_unit(&mut self, unit: usize, texture: Option<TextureHandle>) {
        if let Some(slot) = self.units.get_mut(unit) {
            *slot = texture;
        }
    }

    /// Clears every unit currently holding `texture`.
    pub(crate) fn unbind_texture(&mut self, context: ContextId, texture: TextureHandle) -> Result<()> {
        self.current_backend(context)?;
        for slot in self.units.iter_mut().filter(|s| **s == Some(texture)) {
            *slot = None;
        }
        Ok(())
    }

    /// Frees `texture`. Returns `false` when the context was already gone
    /// (the texture died with it).
    pub(crate) fn destroy_texture(&mut self, context: ContextId, texture: TextureHandle) -> Result<bool> {
        if context != self.context {
            return Err(TachyError::NoActiveContext);
        }
        self.live_textures = self.live_textures.saturating_sub(1);

        let Some(backend) = self.backend.as_mut() else {
            return Ok(false);
        };
        for slot in self.units.iter_mut().filter(|s| **s == Some(texture)) {
            *slot = None;
        }
        backend.destroy_texture(texture);
        Ok(true)
    }

    fn backend_mut(&mut self) -> Result<&mut Box<dyn DisplayBackend>> {
        self.backend.as_mut().ok_or(TachyError::SurfaceClosed)
    }

    /// The backend, provided `context` is this surface's live context.
    fn current_backend(&mut self, context: ContextId) -> Result<&mut Box<dyn DisplayBackend>> {
        if context != self.context {
            return Err(TachyError::NoActiveContext);
        }
        self.backend.as_mut().ok_or(TachyError::NoActiveContext)
    }
}

impl Drop for DisplaySurface {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for DisplaySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplaySurface")
            .field("monitor", &self.monitor.index)
            .field("size", &self.size)
            .field("vsync", &self.config.vsync)
            .field("closed", &self.is_closed())
            .field("frames", &self.frames.len())
            .finish_non_exhaustive()
    }
}
