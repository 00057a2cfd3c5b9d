use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::monitor::{MonitorHandle, VideoModeHandle};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::device::{DisplayConfig, DisplaySurface, GpuInit, MonitorInfo, WgpuBackend};
use crate::input::platform::translate_window_event;
use crate::input::{EventSource, RawInput};
use crate::time::Clock;

/// Pumps allowed for a new window to report a non-zero size.
const MAP_ATTEMPTS: usize = 100;

/// Exclusive video modes must match the desired rate this closely.
const MODE_TOLERANCE_HZ: f64 = 0.5;

/// Owns the winit event loop for a single presentation window.
///
/// The loop is never run; it is pumped without blocking each time events are
/// drained or a platform query needs an `ActiveEventLoop`. Use the platform as
/// the `EventSource` of an `InputCapture` once the surface is open, and close
/// the surface before dropping the capture.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    handler: PumpHandler,
}

impl std::fmt::Debug for WinitPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinitPlatform")
            .field("window", &self.handler.window.as_ref().map(|w| w.id()))
            .field("exited", &self.handler.exited)
            .finish_non_exhaustive()
    }
}

impl WinitPlatform {
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        Ok(Self {
            event_loop,
            handler: PumpHandler::default(),
        })
    }

    /// Enumerates the connected monitors. Index 0 is the primary monitor when
    /// the platform reports one.
    pub fn monitors(&mut self) -> anyhow::Result<Vec<MonitorInfo>> {
        let handles = self.monitor_handles()?;
        Ok(handles
            .iter()
            .enumerate()
            .map(|(index, h)| monitor_info(index, h))
            .collect())
    }

    /// Opens a borderless or exclusive fullscreen window (or a plain window)
    /// on the configured monitor and binds a wgpu backend to it.
    pub fn open_surface(
        &mut self,
        config: DisplayConfig,
        clock: Clock,
    ) -> crate::Result<DisplaySurface> {
        let handles = self.monitor_handles()?;
        let monitors: Vec<MonitorInfo> = handles
            .iter()
            .enumerate()
            .map(|(index, h)| monitor_info(index, h))
            .collect();

        DisplaySurface::create(&monitors, config, clock, |monitor, config| {
            let handle = &handles[monitor.index];
            let window = self.open_window(handle, monitor, config)?;
            let backend = pollster::block_on(WgpuBackend::new(window, GpuInit::for_display(config)))?;
            Ok(Box::new(backend))
        })
    }

    /// The presentation window, once opened.
    pub fn window(&self) -> Option<&Arc<Window>> {
        self.handler.window.as_ref()
    }

    fn monitor_handles(&mut self) -> anyhow::Result<Vec<MonitorHandle>> {
        self.handler.request = Some(Request::Monitors);
        self.pump(Duration::ZERO)?;
        match self.handler.reply.take() {
            Some(Reply::Monitors(handles)) => Ok(handles),
            _ => Err(anyhow!("event loop did not answer the monitor query")),
        }
    }

    fn open_window(
        &mut self,
        handle: &MonitorHandle,
        monitor: &MonitorInfo,
        config: &DisplayConfig,
    ) -> anyhow::Result<Arc<Window>> {
        anyhow::ensure!(self.handler.window.is_none(), "a window is already open");

        let attrs = window_attributes(handle, monitor, config);
        self.handler.request = Some(Request::Window(Box::new(attrs)));
        self.pump(Duration::ZERO)?;

        let window = match self.handler.reply.take() {
            Some(Reply::Window(result)) => result?,
            _ => return Err(anyhow!("event loop did not answer the window request")),
        };

        if config.fullscreen {
            window.set_cursor_visible(false);
        }
        window.focus_window();

        // Some compositors only size the window after the first configure.
        for _ in 0..MAP_ATTEMPTS {
            let size = window.inner_size();
            if size.width > 0 && size.height > 0 {
                break;
            }
            self.pump(Duration::from_millis(10))?;
        }

        log::debug!(
            "window {:?} mapped at {:?}",
            window.id(),
            window.inner_size()
        );
        Ok(window)
    }

    fn pump(&mut self, timeout: Duration) -> anyhow::Result<()> {
        if self.handler.exited {
            return Err(anyhow!("event loop has exited"));
        }
        match self
            .event_loop
            .pump_app_events(Some(timeout), &mut self.handler)
        {
            PumpStatus::Continue => Ok(()),
            PumpStatus::Exit(code) => {
                self.handler.exited = true;
                log::warn!("event loop exited with code {code}");
                Err(anyhow!("event loop exited with code {code}"))
            }
        }
    }
}

impl EventSource for WinitPlatform {
    fn drain(&mut self, out: &mut Vec<RawInput>) {
        if let Err(e) = self.pump(Duration::ZERO) {
            log::trace!("input pump skipped: {e:#}");
        }
        out.append(&mut self.handler.events);
    }
}

enum Request {
    Monitors,
    Window(Box<WindowAttributes>),
}

enum Reply {
    Monitors(Vec<MonitorHandle>),
    Window(anyhow::Result<Arc<Window>>),
}

#[derive(Default)]
struct PumpHandler {
    request: Option<Request>,
    reply: Option<Reply>,
    window: Option<Arc<Window>>,
    events: Vec<RawInput>,
    exited: bool,
}

impl PumpHandler {
    fn serve(&mut self, event_loop: &ActiveEventLoop) {
        let Some(request) = self.request.take() else {
            return;
        };

        let reply = match request {
            Request::Monitors => {
                let primary = event_loop.primary_monitor();
                let mut handles: Vec<MonitorHandle> = event_loop.available_monitors().collect();
                if let Some(primary) = primary {
                    if let Some(pos) = handles.iter().position(|h| *h == primary) {
                        let p = handles.remove(pos);
                        handles.insert(0, p);
                    }
                }
                Reply::Monitors(handles)
            }
            Request::Window(attrs) => {
                let result = event_loop
                    .create_window(*attrs)
                    .map(Arc::new)
                    .context("failed to create window");
                if let Ok(window) = &result {
                    self.window = Some(window.clone());
                }
                Reply::Window(result)
            }
        };

        self.reply = Some(reply);
    }
}

impl ApplicationHandler for PumpHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.serve(event_loop);
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: winit::event::StartCause) {
        self.serve(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }
        if let Some(raw) = translate_window_event(&event) {
            self.events.push(raw);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.serve(event_loop);
    }
}

fn monitor_info(index: usize, handle: &MonitorHandle) -> MonitorInfo {
    let size = handle.size();
    let pos = handle.position();
    let mut info = MonitorInfo::new(index, size.width, size.height, pos.x, pos.y);
    if let Some(name) = handle.name() {
        info = info.with_name(name);
    }
    match handle.refresh_rate_millihertz() {
        Some(mhz) => info.with_refresh(f64::from(mhz) / 1000.0),
        None => info,
    }
}

fn window_attributes(
    handle: &MonitorHandle,
    monitor: &MonitorInfo,
    config: &DisplayConfig,
) -> WindowAttributes {
    let (width, height) = config.size.unwrap_or(monitor.size());

    let attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(width, height))
        .with_position(PhysicalPosition::new(monitor.x, monitor.y))
        .with_resizable(false);

    if !config.fullscreen {
        return attrs;
    }

    let fullscreen = match exclusive_mode(handle, (width, height), config.desired_refresh_rate) {
        Some(mode) => {
            log::info!(
                "exclusive fullscreen {}x{} @ {:.3} Hz",
                width,
                height,
                f64::from(mode.refresh_rate_millihertz()) / 1000.0
            );
            Fullscreen::Exclusive(mode)
        }
        None => {
            log::info!("borderless fullscreen on monitor {}", monitor.index);
            Fullscreen::Borderless(Some(handle.clone()))
        }
    };

    attrs.with_decorations(false).with_fullscreen(Some(fullscreen))
}

/// Deepest video mode with the requested size and a refresh rate within
/// `MODE_TOLERANCE_HZ` of `hz`.
fn exclusive_mode(
    handle: &MonitorHandle,
    size: (u32, u32),
    hz: Option<f64>,
) -> Option<VideoModeHandle> {
    let hz = hz?;
    handle
        .video_modes()
        .filter(|m| {
            let s = m.size();
            (s.width, s.height) == size
        })
        .filter(|m| (f64::from(m.refresh_rate_millihertz()) / 1000.0 - hz).abs() < MODE_TOLERANCE_HZ)
        .max_by_key(|m| m.bit_depth())
}
