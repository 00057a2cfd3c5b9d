use crate::error::{Result, TachyError};

/// One entry of the platform's monitor enumeration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorInfo {
    pub index: usize,
    pub name: Option<String>,
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Top-left corner on the virtual desktop.
    pub x: i32,
    pub y: i32,
    /// Refresh rate reported by the OS, if any. Treat as a hint only.
    pub nominal_refresh_hz: Option<f64>,
}

impl MonitorInfo {
    pub fn new(index: usize, width: u32, height: u32, x: i32, y: i32) -> Self {
        Self {
            index,
            name: None,
            width,
            height,
            x,
            y,
            nominal_refresh_hz: None,
        }
    }

    pub fn with_refresh(mut self, hz: f64) -> Self {
        self.nominal_refresh_hz = Some(hz);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Looks up `index` in an enumeration.
pub fn select_monitor(monitors: &[MonitorInfo], index: usize) -> Result<&MonitorInfo> {
    monitors
        .iter()
        .find(|m| m.index == index)
        .ok_or(TachyError::MonitorNotFound {
            index,
            available: monitors.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Vec<MonitorInfo> {
        vec![
            MonitorInfo::new(0, 1920, 1080, 0, 0),
            MonitorInfo::new(1, 2560, 1440, 1920, -180).with_refresh(144.0),
        ]
    }

    #[test]
    fn selects_every_valid_index() {
        let monitors = pair();
        for m in &monitors {
            let selected = select_monitor(&monitors, m.index).unwrap();
            assert_eq!(selected, m);
        }
    }

    #[test]
    fn out_of_range_index_fails() {
        let err = select_monitor(&pair(), 2).unwrap_err();
        assert!(matches!(err, TachyError::MonitorNotFound { index: 2, available: 2 }));
    }

    #[test]
    fn empty_enumeration_fails() {
        assert!(matches!(
            select_monitor(&[], 0),
            Err(TachyError::MonitorNotFound { index: 0, available: 0 })
        ));
    }
}
