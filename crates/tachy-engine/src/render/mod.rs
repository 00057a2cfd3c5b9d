//! Stimulus rendering.
//!
//! Convention:
//! - CPU geometry is in physical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using a viewport uniform.
//! - Everything is drawn as instanced quads: axis-aligned for rectangles and
//!   textures, rotated for lines.

mod common;
mod ctx;
mod gpu_texture;
mod pipeline;
mod primitives;

pub(crate) use ctx::{RenderCtx, RenderTarget};
pub(crate) use gpu_texture::GpuTexture;
pub(crate) use pipeline::QuadRenderer;
pub use primitives::{
    center_rect_on_point, draw_bound, draw_fixation_cross, draw_line, draw_rectangle,
    draw_stimulus,
};
