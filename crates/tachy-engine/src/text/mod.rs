//! Text stimuli.
//!
//! Strings are laid out and rasterized on the CPU with `fontdue`, then
//! uploaded as RGBA textures and drawn through the textured pipeline with
//! alpha blending.

mod font;
mod stimulus;

pub use font::{blit_coverage, colorize_coverage, Font};
pub use stimulus::TextStimulus;
