//! Window + platform event loop.
//!
//! Owns the `winit` EventLoop and the presentation window, and wires them to
//! the wgpu backend and the input pipeline.

mod platform;

pub use platform::WinitPlatform;
