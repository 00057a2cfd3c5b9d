use std::time::Duration;

/// Summary statistics over a series of inter-frame intervals, in seconds.
///
/// `std_dev` is the population standard deviation, which is what frame
/// jitter is reported as.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl IntervalStats {
    /// Computes statistics over `intervals`. Returns `None` when empty.
    pub fn from_intervals<I>(intervals: I) -> Option<Self>
    where
        I: IntoIterator<Item = Duration>,
    {
        Self::from_seconds(intervals.into_iter().map(|d| d.as_secs_f64()))
    }

    pub fn from_seconds<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        Some(Self {
            count: values.len(),
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }

    #[inline]
    pub fn mean_ms(&self) -> f64 {
        self.mean * 1e3
    }

    #[inline]
    pub fn std_dev_ms(&self) -> f64 {
        self.std_dev * 1e3
    }

    /// Rate implied by the mean interval; zero when the mean is zero.
    pub fn rate_hz(&self) -> f64 {
        if self.mean > 0.0 { 1.0 / self.mean } else { 0.0 }
    }
}
