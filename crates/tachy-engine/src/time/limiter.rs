use std::time::Duration;

use super::clock::{Clock, ClockSample};
use crate::error::{Result, TachyError};

/// Length of one refresh at `rate_hz`.
///
/// Fails for non-positive or non-finite rates and for rates so low that the
/// period overflows `Duration`.
pub fn refresh_period(rate_hz: f64) -> Result<Duration> {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Err(TachyError::InvalidConfig(format!(
            "refresh rate must be positive and finite, got {rate_hz}"
        )));
    }
    Duration::try_from_secs_f64(1.0 / rate_hz)
        .map_err(|err| TachyError::InvalidConfig(format!("refresh rate {rate_hz} Hz: {err}")))
}

/// Software frame pacing for surfaces running without vsync.
///
/// Each `wait` blocks until one period has elapsed since the previous
/// deadline. When the caller is already late the schedule is rebased on the
/// current time instead of bursting frames to catch up.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    period: Duration,
    next_deadline: Option<ClockSample>,
    late_frames: u64,
}

impl FrameLimiter {
    /// Creates a limiter for `rate_hz`. See [`refresh_period`] for the
    /// rates that are rejected.
    pub fn new(rate_hz: f64) -> Result<Self> {
        Ok(Self {
            period: refresh_period(rate_hz)?,
            next_deadline: None,
            late_frames: 0,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of waits that found the deadline already passed.
    pub fn late_frames(&self) -> u64 {
        self.late_frames
    }

    /// Forgets the schedule; the next `wait` returns immediately.
    pub fn reset(&mut self) {
        self.next_deadline = None;
    }

    /// Blocks until the next deadline and returns the time it woke up.
    pub fn wait(&mut self, clock: &Clock) -> ClockSample {
        let now = clock.now();

        let Some(deadline) = self.next_deadline else {
            self.next_deadline = Some(now + self.period);
            return now;
        };

        if now < deadline {
            clock.sleep_until(deadline);
            self.next_deadline = Some(deadline + self.period);
            return clock.now();
        }

        // Tolerate scheduler noise below half a period before counting a miss.
        if now - deadline > self.period / 2 {
            self.late_frames += 1;
            log::trace!(
                "frame limiter missed deadline by {:?} (period {:?})",
                now - deadline,
                self.period
            );
        }
        self.next_deadline = Some(now + self.period);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_rates() {
        for hz in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(FrameLimiter::new(hz), Err(TachyError::InvalidConfig(_))));
        }
    }

    #[test]
    fn tiny_rate_is_an_error_not_a_panic() {
        assert!(matches!(refresh_period(1e-20), Err(TachyError::InvalidConfig(_))));
        assert!(matches!(FrameLimiter::new(1e-20), Err(TachyError::InvalidConfig(_))));
    }

    #[test]
    fn period_is_reciprocal_of_rate() {
        assert_eq!(refresh_period(100.0).unwrap(), Duration::from_millis(10));
        assert_eq!(FrameLimiter::new(50.0).unwrap().period(), Duration::from_millis(20));
    }

    #[test]
    fn first_wait_does_not_block() {
        let (clock, _manual) = Clock::manual();
        let mut limiter = FrameLimiter::new(100.0).unwrap();
        assert_eq!(limiter.wait(&clock), ClockSample::ZERO);
    }

    #[test]
    fn waits_one_period_between_frames() {
        let (clock, _manual) = Clock::manual();
        let mut limiter = FrameLimiter::new(100.0).unwrap();

        limiter.wait(&clock);
        let t1 = limiter.wait(&clock);
        let t2 = limiter.wait(&clock);

        assert_eq!(t1.as_nanos(), 10_000_000);
        assert_eq!(t2.as_nanos(), 20_000_000);
        assert_eq!(limiter.late_frames(), 0);
    }

    #[test]
    fn late_frame_rebases_schedule() {
        let (clock, manual) = Clock::manual();
        let mut limiter = FrameLimiter::new(100.0).unwrap();

        limiter.wait(&clock);
        manual.advance(Duration::from_millis(35));
        let late = limiter.wait(&clock);
        assert_eq!(late.as_nanos(), 35_000_000);
        assert_eq!(limiter.late_frames(), 1);

        let next = limiter.wait(&clock);
        assert_eq!(next.as_nanos(), 45_000_000);
    }

    #[test]
    fn reset_forgets_deadline() {
        let (clock, manual) = Clock::manual();
        let mut limiter = FrameLimiter::new(50.0).unwrap();
        limiter.wait(&clock);
        limiter.reset();
        manual.advance(Duration::from_millis(1));
        assert_eq!(limiter.wait(&clock).as_nanos(), 1_000_000);
    }
}
