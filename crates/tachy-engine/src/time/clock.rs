use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic timestamp in nanoseconds since the clock origin.
///
/// Frame records and input events carry samples from the same `Clock`, so
/// subtracting one from the other yields a reaction time directly.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockSample(u64);

impl ClockSample {
    pub const ZERO: ClockSample = ClockSample(0);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1e9
    }

    /// Elapsed time since `earlier`, zero if `earlier` is later.
    #[inline]
    pub fn saturating_duration_since(self, earlier: ClockSample) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    #[inline]
    pub fn checked_duration_since(self, earlier: ClockSample) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_nanos)
    }
}

impl Add<Duration> for ClockSample {
    type Output = ClockSample;

    #[inline]
    fn add(self, rhs: Duration) -> ClockSample {
        let nanos = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        ClockSample(self.0.saturating_add(nanos))
    }
}

impl Sub for ClockSample {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: ClockSample) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Display for ClockSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// A monotonic time source.
///
/// Implementations must never return a sample smaller than one returned
/// earlier.
pub trait ClockSource: fmt::Debug + Send + Sync {
    fn now(&self) -> ClockSample;

    /// Blocks until `now() >= deadline`.
    ///
    /// The default sleeps coarsely while more than `SPIN_THRESHOLD` remains,
    /// then spins for the final stretch.
    fn sleep_until(&self, deadline: ClockSample) {
        loop {
            let now = self.now();
            if now >= deadline {
                return;
            }
            let remaining = deadline - now;
            if remaining > SPIN_THRESHOLD {
                std::thread::sleep(remaining - SPIN_THRESHOLD / 2);
            } else {
                std::hint::spin_loop();
            }
        }
    }
}

/// Remaining time under which `sleep_until` stops trusting the OS scheduler.
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// `Instant`-backed clock. Its origin is the moment of construction.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Converts an `Instant` captured elsewhere into this clock's timebase.
    pub fn sample_at(&self, instant: Instant) -> ClockSample {
        let nanos = instant.saturating_duration_since(self.origin).as_nanos();
        ClockSample(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn now(&self) -> ClockSample {
        self.sample_at(Instant::now())
    }
}

/// Clock that only moves when told to.
///
/// `sleep_until` jumps straight to the deadline, which makes simulated vsync
/// and frame limiting deterministic.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(by)));
    }

    /// Moves the clock forward to `at`. Earlier targets are ignored.
    pub fn advance_to(&self, at: ClockSample) {
        self.nanos.fetch_max(at.as_nanos(), Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> ClockSample {
        ClockSample(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep_until(&self, deadline: ClockSample) {
        self.advance_to(deadline);
    }
}

/// Shared handle to the process timebase.
///
/// Cloning is cheap; every clone reads the same source.
#[derive(Debug, Clone)]
pub struct Clock {
    source: Arc<dyn ClockSource>,
}

impl Clock {
    /// Clock backed by `Instant`, origin at the call.
    pub fn monotonic() -> Self {
        Self { source: Arc::new(MonotonicClock::new()) }
    }

    pub fn from_source(source: Arc<dyn ClockSource>) -> Self {
        Self { source }
    }

    /// Creates a manual clock and returns the control handle alongside it.
    pub fn manual() -> (Self, Arc<ManualClock>) {
        let manual = Arc::new(ManualClock::new());
        (Self { source: manual.clone() }, manual)
    }

    #[inline]
    pub fn now(&self) -> ClockSample {
        self.source.now()
    }

    #[inline]
    pub fn sleep_until(&self, deadline: ClockSample) {
        self.source.sleep_until(deadline)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::monotonic()
    }
}
