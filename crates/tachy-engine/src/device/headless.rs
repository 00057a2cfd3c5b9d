use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::paint::Color;
use crate::texture::{PixelBuffer, PixelFormat};
use crate::time::{refresh_period, Clock, ClockSample};

use super::backend::{DisplayBackend, DrawCmd, TextureHandle};
use super::init::DisplayConfig;
use super::monitor::MonitorInfo;

/// Refresh rate assumed when neither the monitor nor the config name one.
/// One refresh at 60 Hz.
const FALLBACK_REFRESH_INTERVAL: Duration = Duration::from_nanos(16_666_667);

#[derive(Debug, Default)]
struct HeadlessState {
    size: (u32, u32),
    clear: Option<Color>,
    recording: Vec<DrawCmd>,
    last_frame: Vec<DrawCmd>,
    last_clear: Option<Color>,
    presented: u64,
    textures: HashMap<TextureHandle, (u32, u32, PixelFormat)>,
    uploads: u64,
    shut_down: bool,
}

/// Simulated vertical blank.
///
/// Each swap lands on the next boundary at or after the current time. Missed
/// boundaries are skipped, so a late frame waits for the following one.
#[derive(Debug)]
struct VblankModel {
    intervals: Vec<Duration>,
    cursor: usize,
    last: Option<ClockSample>,
}

impl VblankModel {
    fn take_interval(&mut self) -> Duration {
        let d = self.intervals[self.cursor % self.intervals.len()];
        self.cursor += 1;
        d
    }

    fn next_boundary(&mut self, now: ClockSample) -> ClockSample {
        let mut target = match self.last {
            Some(last) => last + self.take_interval(),
            None => now + self.take_interval(),
        };
        while target < now {
            target = target + self.take_interval();
        }
        self.last = Some(target);
        target
    }
}

/// Display backend without a window or GPU.
///
/// Records draw commands, keeps texture bookkeeping and, under vsync, blocks
/// `swap_buffers` on a simulated refresh through the injected clock. Paired
/// with a manual clock it makes frame timing fully deterministic.
pub struct HeadlessBackend {
    clock: Clock,
    vblank: Option<VblankModel>,
    state: Rc<RefCell<HeadlessState>>,
    next_texture: u64,
}

/// Read-only view into a `HeadlessBackend` after it has been moved into a
/// surface.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    /// Backend of the given size whose swaps return immediately.
    pub fn new(size: (u32, u32), clock: Clock) -> Self {
        let state = HeadlessState {
            size,
            ..HeadlessState::default()
        };
        Self {
            clock,
            vblank: None,
            state: Rc::new(RefCell::new(state)),
            next_texture: 1,
        }
    }

    /// Backend configured the way a real context would be for `monitor`.
    ///
    /// Under vsync the simulated refresh runs at the monitor's nominal rate,
    /// falling back to the desired rate and then to 60 Hz. Rates with no
    /// representable period are skipped.
    pub fn open(monitor: &MonitorInfo, config: &DisplayConfig, clock: Clock) -> Self {
        let size = config.size.unwrap_or(monitor.size());
        let backend = Self::new(size, clock);
        if !config.vsync {
            return backend;
        }

        let interval = [monitor.nominal_refresh_hz, config.desired_refresh_rate]
            .into_iter()
            .flatten()
            .find_map(|hz| refresh_period(hz).ok())
            .unwrap_or(FALLBACK_REFRESH_INTERVAL);
        backend.with_refresh_interval(interval)
    }

    /// Simulates vsync at a fixed refresh interval.
    pub fn with_refresh_interval(self, interval: Duration) -> Self {
        self.with_interval_pattern(vec![interval])
    }

    /// Simulates vsync with refresh intervals cycling through `intervals`.
    ///
    /// An empty pattern, or one with a zero entry, disables the simulation.
    pub fn with_interval_pattern(mut self, intervals: Vec<Duration>) -> Self {
        self.vblank = if intervals.is_empty() || intervals.iter().any(Duration::is_zero) {
            None
        } else {
            Some(VblankModel {
                intervals,
                cursor: 0,
                last: None,
            })
        };
        self
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Rc::clone(&self.state),
        }
    }
}

impl DisplayBackend for HeadlessBackend {
    fn size(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    fn clear(&mut self, color: Color) {
        let mut st = self.state.borrow_mut();
        st.clear = Some(color);
        st.recording.clear();
    }

    fn draw(&mut self, cmd: DrawCmd) {
        self.state.borrow_mut().recording.push(cmd);
    }

    fn create_texture(&mut self, image: &PixelBuffer) -> Result<TextureHandle> {
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;

        let mut st = self.state.borrow_mut();
        st.textures
            .insert(handle, (image.width(), image.height(), image.format()));
        st.uploads += 1;
        Ok(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, image: &PixelBuffer) -> Result<()> {
        let mut st = self.state.borrow_mut();
        let Some(entry) = st.textures.get_mut(&texture) else {
            bail!("unknown texture {}", texture.raw());
        };
        *entry = (image.width(), image.height(), image.format());
        st.uploads += 1;
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.state.borrow_mut().textures.remove(&texture);
    }

    fn swap_buffers(&mut self) -> Result<()> {
        if self.state.borrow().shut_down {
            bail!("headless context already shut down");
        }

        if let Some(vblank) = self.vblank.as_mut() {
            let target = vblank.next_boundary(self.clock.now());
            self.clock.sleep_until(target);
        }

        let mut st = self.state.borrow_mut();
        st.last_frame = std::mem::take(&mut st.recording);
        st.last_clear = st.clear;
        st.presented += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut st = self.state.borrow_mut();
        st.shut_down = true;
        st.textures.clear();
        st.recording.clear();
    }
}

impl HeadlessProbe {
    /// Number of completed swaps.
    pub fn presented(&self) -> u64 {
        self.state.borrow().presented
    }

    /// Commands of the most recently presented frame, in draw order.
    pub fn last_frame(&self) -> Vec<DrawCmd> {
        self.state.borrow().last_frame.clone()
    }

    /// Commands recorded since the last swap.
    pub fn recording(&self) -> Vec<DrawCmd> {
        self.state.borrow().recording.clone()
    }

    /// Clear color of the most recently presented frame.
    pub fn last_clear(&self) -> Option<Color> {
        self.state.borrow().last_clear
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn texture_info(&self, texture: TextureHandle) -> Option<(u32, u32, PixelFormat)> {
        self.state.borrow().textures.get(&texture).copied()
    }

    /// Total uploads, including re-uploads.
    pub fn uploads(&self) -> u64 {
        self.state.borrow().uploads
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.borrow().shut_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;

    const MS: Duration = Duration::from_millis(1);

    // ── vblank model ──────────────────────────────────────────────────────

    #[test]
    fn swaps_land_on_successive_boundaries() {
        let (clock, _manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock.clone()).with_refresh_interval(10 * MS);

        backend.swap_buffers().unwrap();
        assert_eq!(clock.now(), ClockSample::ZERO + 10 * MS);
        backend.swap_buffers().unwrap();
        assert_eq!(clock.now(), ClockSample::ZERO + 20 * MS);
    }

    #[test]
    fn late_swap_waits_for_following_boundary() {
        let (clock, manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock.clone()).with_refresh_interval(10 * MS);

        backend.swap_buffers().unwrap();
        manual.advance(14 * MS);
        backend.swap_buffers().unwrap();
        assert_eq!(clock.now(), ClockSample::ZERO + 30 * MS);
    }

    #[test]
    fn interval_pattern_cycles() {
        let (clock, _manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock.clone())
            .with_interval_pattern(vec![10 * MS, 12 * MS]);

        let mut stamps = Vec::new();
        for _ in 0..4 {
            backend.swap_buffers().unwrap();
            stamps.push(clock.now().as_nanos() / 1_000_000);
        }
        assert_eq!(stamps, vec![10, 22, 32, 44]);
    }

    #[test]
    fn open_skips_rates_without_a_usable_period() {
        let (clock, _manual) = Clock::manual();
        let monitor = MonitorInfo::new(0, 640, 480, 0, 0).with_refresh(1e-20);
        let config = DisplayConfig::default().with_refresh_rate(Some(100.0));
        let mut backend = HeadlessBackend::open(&monitor, &config, clock.clone());
        backend.swap_buffers().unwrap();
        assert_eq!(clock.now(), ClockSample::ZERO + 10 * MS);

        let (clock, _manual) = Clock::manual();
        let config = DisplayConfig::default().with_refresh_rate(Some(1e-20));
        let mut backend = HeadlessBackend::open(&monitor, &config, clock.clone());
        backend.swap_buffers().unwrap();
        assert_eq!(clock.now(), ClockSample::ZERO + FALLBACK_REFRESH_INTERVAL);
    }

    #[test]
    fn no_vsync_does_not_advance_time() {
        let (clock, _manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock.clone());
        backend.swap_buffers().unwrap();
        assert_eq!(clock.now(), ClockSample::ZERO);
    }

    // ── recording ─────────────────────────────────────────────────────────

    #[test]
    fn clear_drops_recorded_commands_and_swap_publishes_frame() {
        let (clock, _manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock);
        let probe = backend.probe();
        let quad = DrawCmd::Quad {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: Color::WHITE,
        };

        backend.draw(quad.clone());
        backend.clear(Color::BLACK);
        assert!(probe.recording().is_empty());

        backend.draw(quad.clone());
        backend.swap_buffers().unwrap();
        assert_eq!(probe.last_frame(), vec![quad]);
        assert_eq!(probe.last_clear(), Some(Color::BLACK));
        assert_eq!(probe.presented(), 1);
    }

    #[test]
    fn texture_bookkeeping() {
        let (clock, _manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock);
        let probe = backend.probe();
        let image = PixelBuffer::filled(2, 3, &[9]).unwrap();

        let t = backend.create_texture(&image).unwrap();
        assert_eq!(probe.texture_info(t), Some((2, 3, PixelFormat::Luminance8)));

        backend.destroy_texture(t);
        assert_eq!(probe.live_textures(), 0);
        assert!(backend.update_texture(t, &image).is_err());
    }

    #[test]
    fn swap_after_shutdown_fails() {
        let (clock, _manual) = Clock::manual();
        let mut backend = HeadlessBackend::new((4, 4), clock);
        backend.shutdown();
        assert!(backend.swap_buffers().is_err());
    }
}
