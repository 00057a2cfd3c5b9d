//! Error taxonomy for the engine.
//!
//! Lifecycle violations are reported at the call that commits them. GPU and
//! platform failures surface as `Backend` with their full context chain.

/// Engine error.
#[derive(Debug, thiserror::Error)]
pub enum TachyError {
    /// Requested monitor index is not part of the enumeration.
    #[error("monitor {index} not found ({available} monitor(s) available)")]
    MonitorNotFound { index: usize, available: usize },

    /// Operation on a display surface after `close()`.
    #[error("display surface is closed")]
    SurfaceClosed,

    /// Operation on a texture after `release()`.
    #[error("texture resource has been released")]
    ResourceReleased,

    /// Texture operation without the owning surface's context being current.
    #[error("no active display context for this texture")]
    NoActiveContext,

    /// Pixel buffer rejected before upload.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Malformed destination rectangle or line.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Texture unit index at or beyond the surface's unit count.
    #[error("texture unit {unit} out of range (surface has {available})")]
    InvalidUnit { unit: usize, available: usize },

    /// Draw from a texture unit that holds no texture.
    #[error("no texture bound to unit {unit}")]
    NothingBound { unit: usize },

    /// Option value outside the range the engine can honor, such as a
    /// refresh rate whose period does not fit in a `Duration`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Threshold posterior with no usable mass left.
    #[error("degenerate posterior: {0}")]
    DegeneratePosterior(String),

    /// Font data that could not be parsed.
    #[error("invalid font: {0}")]
    InvalidFont(String),

    /// Calibration run too short to yield interval statistics.
    #[error("calibration needs at least {required} usable intervals, got {usable}")]
    InsufficientSamples { usable: usize, required: usize },

    /// Windowing or graphics capability failure.
    #[error("display backend failure: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for TachyError {
    fn from(err: anyhow::Error) -> Self {
        TachyError::Backend(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, TachyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn backend_errors_keep_context_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("adapter lost"));
        let err: TachyError = inner.context("failed to submit frame").unwrap_err().into();
        let msg = err.to_string();
        assert!(msg.contains("failed to submit frame"));
        assert!(msg.contains("adapter lost"));
    }

    #[test]
    fn monitor_not_found_message_names_index() {
        let err = TachyError::MonitorNotFound { index: 3, available: 2 };
        assert_eq!(err.to_string(), "monitor 3 not found (2 monitor(s) available)");
    }
}
