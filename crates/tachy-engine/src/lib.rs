//! Tachy engine crate.
//!
//! Frame-locked stimulus presentation and input timestamping for
//! psychophysics experiments. One thread owns the display surface, draws,
//! presents and polls input; every timestamp comes from one shared `Clock`.

pub mod calibrate;
pub mod coords;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod quest;
pub mod render;
pub mod scale;
pub mod session;
pub mod text;
pub mod texture;
pub mod time;
pub mod window;

mod error;

pub use error::{Result, TachyError};
