//! Display device management.
//!
//! This module is responsible for:
//! - monitor enumeration results and selection
//! - the `DisplaySurface` lifecycle (create, fill, present, close)
//! - frame records stamped at each present
//! - the backend capability (`wgpu` + `winit`, or headless)

mod backend;
mod frame;
mod gpu;
mod headless;
mod init;
mod monitor;
mod surface;

pub use backend::{DisplayBackend, DrawCmd, TextureHandle};
pub use frame::FrameRecord;
pub use gpu::WgpuBackend;
pub use headless::{HeadlessBackend, HeadlessProbe};
pub use init::{DisplayConfig, GpuInit};
pub use monitor::{select_monitor, MonitorInfo};
pub use surface::{DisplaySurface, TEXTURE_UNITS};

pub(crate) use surface::ContextId;
