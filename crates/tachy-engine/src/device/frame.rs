use std::time::Duration;

use crate::time::ClockSample;

/// Timestamp of one completed `present()`.
///
/// Records are produced once per present and never mutated afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameRecord {
    /// Zero-based position in the surface's frame sequence.
    pub sequence: u64,

    /// Time the swap returned (the refresh boundary under vsync).
    pub presented_at: ClockSample,

    /// Time since the previous record. `None` for the first frame.
    pub interval: Option<Duration>,
}

impl FrameRecord {
    #[inline]
    pub fn interval_secs(&self) -> Option<f64> {
        self.interval.map(|d| d.as_secs_f64())
    }

    /// Builds the record that follows `previous`.
    pub(crate) fn next(previous: Option<&FrameRecord>, presented_at: ClockSample) -> Self {
        match previous {
            Some(prev) => Self {
                sequence: prev.sequence + 1,
                presented_at,
                interval: Some(presented_at - prev.presented_at),
            },
            None => Self {
                sequence: 0,
                presented_at,
                interval: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_has_no_interval() {
        let r = FrameRecord::next(None, ClockSample::from_nanos(5));
        assert_eq!(r.sequence, 0);
        assert_eq!(r.interval, None);
    }

    #[test]
    fn next_record_measures_interval() {
        let a = FrameRecord::next(None, ClockSample::from_nanos(1_000));
        let b = FrameRecord::next(Some(&a), ClockSample::from_nanos(17_667_667));
        assert_eq!(b.sequence, 1);
        assert_eq!(b.interval, Some(Duration::from_nanos(16_666_667)));
        assert!((b.interval_secs().unwrap() - 0.016_666_667).abs() < 1e-12);
    }
}
