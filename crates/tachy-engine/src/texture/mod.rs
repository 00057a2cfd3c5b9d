//! Caller-supplied images and their GPU-resident textures.

mod pixels;
mod resource;

pub use pixels::{PixelBuffer, PixelFormat};
pub use resource::{ReleaseOutcome, TextureResource};
