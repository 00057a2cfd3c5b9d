//! Shared GPU types and the CPU side of quad batching.

use std::collections::HashSet;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::device::{DrawCmd, TextureHandle};

// ── blend ─────────────────────────────────────────────────────────────────

/// Colors are straight (non-premultiplied) alpha.
pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState::ALPHA_BLENDING
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

pub(super) fn viewport_ubo_min_binding_size() -> Option<wgpu::BufferSize> {
    wgpu::BufferSize::new(std::mem::size_of::<ViewportUniform>() as u64)
}

// ── unit quad ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub corner: [f32; 2], // 0..1, doubles as uv
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { corner: [0.0, 0.0] },
    QuadVertex { corner: [1.0, 0.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── instances ─────────────────────────────────────────────────────────────

/// Parallelogram `origin + u * axis_u + v * axis_v` for `u, v` in `0..1`.
///
/// Rectangles use the x and y axes; lines use their direction and normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct QuadInstance {
    pub origin: [f32; 2],
    pub axis_u: [f32; 2],
    pub axis_v: [f32; 2],
    pub color: [f32; 4],
}

impl QuadInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2, // axis_u
        3 => Float32x2, // axis_v
        4 => Float32x4  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum BatchKind {
    Solid,
    Textured(TextureHandle),
}

/// Consecutive instances sharing a pipeline and texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Batch {
    pub kind: BatchKind,
    pub instances: Range<u32>,
}

/// Converts one command into an instance. Degenerate geometry yields `None`.
pub(super) fn quad_instance(cmd: &DrawCmd) -> Option<(BatchKind, QuadInstance)> {
    match *cmd {
        DrawCmd::Quad { rect, color } => {
            let r = rect.sorted();
            if !r.has_area() {
                return None;
            }
            Some((
                BatchKind::Solid,
                QuadInstance {
                    origin: [r.x1, r.y1],
                    axis_u: [r.width(), 0.0],
                    axis_v: [0.0, r.height()],
                    color: color.to_array(),
                },
            ))
        }
        DrawCmd::Line {
            from,
            to,
            thickness,
            color,
        } => {
            let dir = to - from;
            let normal = dir.unit_normal()?;
            if !(thickness > 0.0 && thickness.is_finite()) {
                return None;
            }
            let origin: Vec2 = from - normal * (thickness * 0.5);
            let across = normal * thickness;
            Some((
                BatchKind::Solid,
                QuadInstance {
                    origin: [origin.x, origin.y],
                    axis_u: [dir.x, dir.y],
                    axis_v: [across.x, across.y],
                    color: color.to_array(),
                },
            ))
        }
        DrawCmd::Textured {
            texture,
            rect,
            tint,
        } => {
            if !rect.has_area() {
                return None;
            }
            Some((
                BatchKind::Textured(texture),
                QuadInstance {
                    origin: [rect.x1, rect.y1],
                    axis_u: [rect.width(), 0.0],
                    axis_v: [0.0, rect.height()],
                    color: tint.to_array(),
                },
            ))
        }
    }
}

/// Builds instance data and draw batches in command order.
pub(super) fn build_batches(cmds: &[DrawCmd]) -> (Vec<QuadInstance>, Vec<Batch>) {
    let mut instances = Vec::with_capacity(cmds.len());
    let mut batches: Vec<Batch> = Vec::new();

    for (kind, inst) in cmds.iter().filter_map(quad_instance) {
        let index = instances.len() as u32;
        instances.push(inst);
        match batches.last_mut() {
            Some(batch) if batch.kind == kind => batch.instances.end = index + 1,
            _ => batches.push(Batch {
                kind,
                instances: index..index + 1,
            }),
        }
    }

    (instances, batches)
}

// ── missing textures ──────────────────────────────────────────────────────

/// Freed textures that a draw has referenced. Each handle is reported once.
#[derive(Debug, Default)]
pub(super) struct MissingTextures {
    reported: HashSet<TextureHandle>,
}

impl MissingTextures {
    /// `true` the first time `handle` is seen missing.
    pub(super) fn first_miss(&mut self, handle: TextureHandle) -> bool {
        self.reported.insert(handle)
    }
}
