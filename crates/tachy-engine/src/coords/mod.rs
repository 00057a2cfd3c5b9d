//! Stimulus placement in surface pixels.
//!
//! One unit is one device pixel with the origin at the top-left corner and
//! +Y pointing down. No DPI scaling is applied, so stimulus sizes are exact.

mod rect;
mod vec2;

pub use rect::Rect;
pub use vec2::Vec2;
