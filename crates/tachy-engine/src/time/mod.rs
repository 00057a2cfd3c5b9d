//! Time subsystem.
//!
//! One `Clock` is shared by the display surface and input capture so frame
//! timestamps and response timestamps live in the same timebase.
//! - `Clock` / `ClockSample`: the shared monotonic timebase
//! - `FrameLimiter`: software pacing when vsync is off
//! - `IntervalStats`: mean / jitter over recorded intervals

mod clock;
mod limiter;
mod stats;

pub use clock::{Clock, ClockSample, ClockSource, ManualClock, MonotonicClock};
pub use limiter::{refresh_period, FrameLimiter};
pub use stats::IntervalStats;
