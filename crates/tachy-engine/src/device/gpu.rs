use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use wgpu::SurfaceError;
use winit::window::Window;

use crate::paint::Color;
use crate::render::{GpuTexture, QuadRenderer, RenderCtx, RenderTarget};
use crate::texture::PixelBuffer;

use super::backend::{DisplayBackend, DrawCmd, TextureHandle};
use super::init::GpuInit;

/// wgpu display backend bound to a winit window.
///
/// Owns Instance/Adapter/Device/Queue, the configured surface and the quad
/// renderer. Under `Fifo` the image for the next frame is acquired right
/// after presenting; that acquire blocks until the display releases an image
/// at the vertical blank, which is what makes `swap_buffers` frame-locked.
pub struct WgpuBackend {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    renderer: QuadRenderer,
    textures: HashMap<TextureHandle, GpuTexture>,
    next_texture: u64,

    clear: Color,
    commands: Vec<DrawCmd>,

    /// Image acquired ahead for the next frame.
    pending: Option<wgpu::SurfaceTexture>,
}

impl WgpuBackend {
    /// Creates a GPU context bound to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            present_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tachy-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format =
            choose_surface_format(&caps, prefer_srgb).context("no supported surface formats")?;

        if !caps.present_modes.contains(&present_mode) {
            log::warn!(
                "present mode {present_mode:?} not advertised (supported: {:?}); requesting anyway",
                caps.present_modes
            );
        }

        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);
        log::debug!("surface configured: {format:?}, {present_mode:?}, {}x{}", config.width, config.height);

        let renderer = QuadRenderer::new(&device, format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            textures: HashMap::new(),
            next_texture: 1,
            clear: Color::BLACK,
            commands: Vec::new(),
            pending: None,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Acquires the next swapchain image, reconfiguring once on a lost or
    /// outdated surface.
    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.surface
                    .get_current_texture()
                    .context("failed to acquire frame after reconfigure")
            }
            Err(SurfaceError::OutOfMemory) => {
                log::error!("out of memory acquiring a frame");
                bail!("out of memory acquiring a frame")
            }
            Err(err) => Err(anyhow!("failed to acquire frame: {err}")),
        }
    }
}

impl DisplayBackend for WgpuBackend {
    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn clear(&mut self, color: Color) {
        self.clear = color;
        self.commands.clear();
    }

    fn draw(&mut self, cmd: DrawCmd) {
        self.commands.push(cmd);
    }

    fn create_texture(&mut self, image: &PixelBuffer) -> Result<TextureHandle> {
        let texture = self
            .renderer
            .create_texture(&render_ctx(&self.device, &self.queue, &self.config), image)?;
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, image: &PixelBuffer) -> Result<()> {
        let ctx = render_ctx(&self.device, &self.queue, &self.config);
        let gpu = self
            .textures
            .get_mut(&texture)
            .with_context(|| format!("unknown texture {}", texture.raw()))?;
        self.renderer.update_texture(&ctx, gpu, image)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    fn swap_buffers(&mut self) -> Result<()> {
        let frame = match self.pending.take() {
            Some(frame) => frame,
            None => self.acquire()?,
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tachy frame encoder"),
            });

        let ctx = render_ctx(&self.device, &self.queue, &self.config);
        let mut target = RenderTarget {
            encoder: &mut encoder,
            color_view: &view,
            clear: self.clear,
        };
        self.renderer
            .render(&ctx, &mut target, &self.commands, &self.textures);

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        self.commands.clear();

        // Blocks until the display hands back an image.
        match self.acquire() {
            Ok(next) => self.pending = Some(next),
            Err(err) => log::warn!("acquire-ahead failed, next present will retry: {err:#}"),
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.pending = None;
        self.commands.clear();
        let released = self.textures.len();
        self.textures.clear();
        if let Err(err) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::error!("device poll during shutdown failed: {err}");
        }
        self.window.set_visible(false);
        log::debug!("wgpu backend shut down ({released} texture(s) dropped)");
    }
}

/// Borrows only the fields it needs so the renderer can be borrowed alongside.
fn render_ctx<'a>(
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    config: &wgpu::SurfaceConfiguration,
) -> RenderCtx<'a> {
    RenderCtx {
        device,
        queue,
        target_size: (config.width, config.height),
    }
}

/// Picks a surface format, preferring unorm 8-bit formats so output levels
/// are not gamma-converted.
fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    let preferred: [wgpu::TextureFormat; 2] = if prefer_srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ]
    };

    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}
