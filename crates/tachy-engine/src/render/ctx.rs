use crate::paint::Color;

/// Renderer-facing context (device/queue + target size).
pub(crate) struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target_size: (u32, u32), // physical px
}

/// One frame's color target and the clear applied before drawing.
pub(crate) struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub clear: Color,
}

pub(super) fn to_wgpu_color(c: Color) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(c.r),
        g: f64::from(c.g),
        b: f64::from(c.b),
        a: f64::from(c.a),
    }
}
