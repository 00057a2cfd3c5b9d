use crate::paint::Color;

/// Parameters for opening a display surface.
///
/// Selects the monitor and whether the surface covers it, the refresh rate
/// the experiment expects and how `present()` is paced. The defaults open a
/// vsynced fullscreen surface on monitor 0 cleared to mid gray.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Index into the monitor enumeration.
    pub monitor_index: usize,

    /// Cover the whole monitor. Windowed surfaces are placed at the monitor origin.
    pub fullscreen: bool,

    /// Refresh rate the experiment was designed for, in Hz.
    ///
    /// Used to pick an exclusive fullscreen video mode and, when vsync is
    /// off, as the software pacing rate. The achieved rate can differ; use
    /// the calibrator to measure it.
    pub desired_refresh_rate: Option<f64>,

    /// Block `present()` on the vertical blank.
    pub vsync: bool,

    /// Drawable size override in physical pixels. Defaults to the monitor size.
    pub size: Option<(u32, u32)>,

    /// Clear color applied before the first `fill()`.
    pub background: Color,

    /// Frames the GPU may queue ahead of the display. Forwarded to
    /// `GpuInit::desired_maximum_frame_latency`.
    pub max_frame_latency: u32,

    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            monitor_index: 0,
            fullscreen: true,
            desired_refresh_rate: Some(60.0),
            vsync: true,
            size: None,
            background: Color::GRAY,
            max_frame_latency: 1,
            title: "tachy".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn windowed(mut self) -> Self {
        self.fullscreen = false;
        self
    }

    pub fn with_monitor(mut self, index: usize) -> Self {
        self.monitor_index = index;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_refresh_rate(mut self, hz: Option<f64>) -> Self {
        self.desired_refresh_rate = hz;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

/// Initialization parameters for the wgpu backend.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: stimulus levels must reach the display unconverted.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). Derived from `DisplayConfig::vsync`.
    pub present_mode: wgpu::PresentMode,

    /// Required wgpu features. Quads and sampled textures need none.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// One queued frame keeps the acquire of the next image aligned with the
    /// vertical blank. Drivers may round it up.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    pub fn for_display(config: &DisplayConfig) -> Self {
        Self {
            present_mode: if config.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: config.max_frame_latency.max(1),
            ..Self::default()
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 1,
        }
    }
}
