//! Refresh-rate calibration.
//!
//! Presents a run of empty frames and measures the achieved inter-present
//! interval. Frame-count conversions must use the measured value: the nominal
//! rate the OS reports and the rate an experiment asked for are both hints.

use std::time::Duration;

use crate::device::DisplaySurface;
use crate::error::{Result, TachyError};
use crate::time::{ClockSample, IntervalStats};

/// Minimum usable intervals for a calibration result.
pub const MIN_USABLE_INTERVALS: usize = 2;

/// Deviations above this are worth a warning.
const DEVIATION_WARN_HZ: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationConfig {
    /// Leading intervals discarded while the swap chain settles.
    pub warmup_frames: usize,

    /// Presents used by `RefreshCalibrator::run`.
    pub sample_count: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 5,
            sample_count: 50,
        }
    }
}

/// Result of one calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefreshCalibration {
    /// Mean inter-present interval.
    pub observed_interval_seconds: f64,

    /// Population standard deviation of the intervals.
    pub jitter_seconds: f64,

    /// Intervals the statistics were computed from.
    pub samples: usize,

    /// Intervals dropped as warm-up or as duplicate timestamps.
    pub discarded: usize,

    pub desired_refresh_rate: Option<f64>,
    pub nominal_refresh_rate: Option<f64>,
}

impl RefreshCalibration {
    pub fn observed_rate_hz(&self) -> f64 {
        if self.observed_interval_seconds > 0.0 {
            1.0 / self.observed_interval_seconds
        } else {
            0.0
        }
    }

    /// Observed minus requested rate. `None` when no rate was requested.
    pub fn deviation_hz(&self) -> Option<f64> {
        self.desired_refresh_rate
            .map(|desired| self.observed_rate_hz() - desired)
    }

    pub fn observed_interval(&self) -> Duration {
        Duration::from_secs_f64(self.observed_interval_seconds.max(0.0))
    }

    /// Frames needed to cover `seconds`, rounded to the nearest frame.
    pub fn frames_for_duration(&self, seconds: f64) -> u64 {
        if self.observed_interval_seconds <= 0.0 || seconds <= 0.0 {
            return 0;
        }
        (seconds / self.observed_interval_seconds).round() as u64
    }

    /// Whole frames in one cycle of a `cycles_per_second` flicker. Never zero.
    pub fn frames_per_cycle(&self, cycles_per_second: f64) -> u64 {
        if cycles_per_second <= 0.0 {
            return 1;
        }
        ((self.observed_rate_hz() / cycles_per_second).floor() as u64).max(1)
    }
}

/// Measures the achieved refresh cadence of a surface.
#[derive(Debug, Clone, Default)]
pub struct RefreshCalibrator {
    config: CalibrationConfig,
}

impl RefreshCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// `measure` with the configured sample count.
    pub fn run(&self, surface: &mut DisplaySurface) -> Result<RefreshCalibration> {
        self.measure(surface, self.config.sample_count)
    }

    /// Presents `sample_count` empty frames and summarizes the intervals
    /// between them.
    ///
    /// `sample_count` presents yield `sample_count - 1` intervals, of which
    /// the first `warmup_frames` are discarded. Fails with
    /// `InsufficientSamples` before presenting anything when fewer than two
    /// would remain.
    pub fn measure(
        &self,
        surface: &mut DisplaySurface,
        sample_count: usize,
    ) -> Result<RefreshCalibration> {
        let warmup = self.config.warmup_frames;
        let expected = sample_count.saturating_sub(1).saturating_sub(warmup);
        if expected < MIN_USABLE_INTERVALS {
            return Err(TachyError::InsufficientSamples {
                usable: expected,
                required: MIN_USABLE_INTERVALS,
            });
        }
        if surface.is_closed() {
            return Err(TachyError::SurfaceClosed);
        }

        let mut stamps: Vec<ClockSample> = Vec::with_capacity(sample_count);
        for _ in 0..sample_count {
            stamps.push(surface.present()?.presented_at);
        }

        let intervals: Vec<Duration> = stamps
            .windows(2)
            .skip(warmup)
            .map(|w| w[1].saturating_duration_since(w[0]))
            .collect();
        let measured = intervals.len();

        // Duplicate timestamps say nothing about the cadence.
        let stats = IntervalStats::from_intervals(intervals.into_iter().filter(|d| !d.is_zero()));
        let usable = stats.map_or(0, |s| s.count);
        let stats = match stats {
            Some(s) if s.count >= MIN_USABLE_INTERVALS => s,
            _ => {
                return Err(TachyError::InsufficientSamples {
                    usable,
                    required: MIN_USABLE_INTERVALS,
                });
            }
        };

        let calibration = RefreshCalibration {
            observed_interval_seconds: stats.mean,
            jitter_seconds: stats.std_dev,
            samples: stats.count,
            discarded: warmup + (measured - stats.count),
            desired_refresh_rate: surface.desired_refresh_rate(),
            nominal_refresh_rate: surface.nominal_refresh_rate(),
        };

        log::info!(
            "refresh calibrated: {:.4} Hz ({:.4} ms ± {:.4} ms over {} intervals)",
            calibration.observed_rate_hz(),
            stats.mean_ms(),
            stats.std_dev_ms(),
            calibration.samples
        );
        if let Some(dev) = calibration.deviation_hz() {
            if dev.abs() > DEVIATION_WARN_HZ {
                log::warn!(
                    "observed refresh rate deviates from requested by {dev:+.3} Hz; \
                     use the calibrated value for frame counts"
                );
            }
        }

        Ok(calibration)
    }
}
