//! Paint model shared by drawing primitives and renderers.
//!
//! Only flat colors exist: stimuli with structure arrive as textures.

pub mod color;

pub use color::Color;
