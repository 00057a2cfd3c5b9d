use std::collections::HashMap;

use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::device::{DrawCmd, TextureHandle};
use crate::texture::PixelBuffer;

use super::common::{
    alpha_blend, build_batches, viewport_ubo_min_binding_size, BatchKind, MissingTextures, QuadInstance,
    QuadVertex, ViewportUniform, QUAD_INDICES, QUAD_VERTICES,
};
use super::ctx::{to_wgpu_color, RenderCtx, RenderTarget};
use super::gpu_texture::GpuTexture;

/// Instanced quad renderer with a solid and a textured pipeline.
///
/// Geometry is in physical pixels (top-left origin, +Y down), converted to
/// NDC in the vertex shader using the viewport uniform. Commands are drawn in
/// recording order; consecutive commands sharing a pipeline and texture go
/// out as one instanced call.
pub(crate) struct QuadRenderer {
    solid: wgpu::RenderPipeline,
    textured: wgpu::RenderPipeline,

    viewport_ubo: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,

    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    missing_textures: MissingTextures,
}

impl QuadRenderer {
    pub(crate) fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let viewport_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tachy viewport bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: viewport_ubo_min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tachy texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let solid = create_pipeline(
            device,
            target_format,
            "solid",
            include_str!("shaders/solid.wgsl"),
            &[&viewport_bgl],
        );
        let textured = create_pipeline(
            device,
            target_format,
            "textured",
            include_str!("shaders/textured.wgsl"),
            &[&viewport_bgl, &texture_bgl],
        );

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tachy viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tachy viewport bind group"),
            layout: &viewport_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        // Linear filtering, clamped at the edges.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tachy texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tachy quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tachy quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            solid,
            textured,
            viewport_ubo,
            viewport_bind_group,
            texture_bgl,
            sampler,
            quad_vbo,
            quad_ibo,
            instance_vbo: None,
            instance_capacity: 0,
            missing_textures: MissingTextures::default(),
        }
    }

    /// Creates a sampled texture holding `image`, ready for textured draws.
    pub(crate) fn create_texture(&self, ctx: &RenderCtx<'_>, image: &PixelBuffer) -> Result<GpuTexture> {
        GpuTexture::create(ctx, &self.texture_bgl, &self.sampler, image)
    }

    /// Replaces a texture's contents, recreating it when the size changed.
    pub(crate) fn update_texture(
        &self,
        ctx: &RenderCtx<'_>,
        texture: &mut GpuTexture,
        image: &PixelBuffer,
    ) -> Result<()> {
        if texture.same_size(image) {
            texture.write(ctx, image)
        } else {
            *texture = self.create_texture(ctx, image)?;
            Ok(())
        }
    }

    /// Clears `target` and draws `cmds` into it in order.
    pub(crate) fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        cmds: &[DrawCmd],
        textures: &HashMap<TextureHandle, GpuTexture>,
    ) {
        let (instances, batches) = build_batches(cmds);

        self.write_viewport_uniform(ctx);
        if !instances.is_empty() {
            self.ensure_instance_capacity(ctx, instances.len());
            if let Some(vbo) = self.instance_vbo.as_ref() {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&instances));
            }
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tachy frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(to_wgpu_color(target.clear)),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        if batches.is_empty() {
            return;
        }

        rpass.set_bind_group(0, &self.viewport_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for batch in batches {
            match batch.kind {
                BatchKind::Solid => {
                    rpass.set_pipeline(&self.solid);
                }
                BatchKind::Textured(handle) => {
                    let Some(texture) = textures.get(&handle) else {
                        if self.missing_textures.first_miss(handle) {
                            log::warn!("textured draw references freed texture {}; skipped", handle.raw());
                        }
                        continue;
                    };
                    rpass.set_pipeline(&self.textured);
                    rpass.set_bind_group(1, &texture.bind_group, &[]);
                }
            }
            rpass.draw_indexed(0..6, 0, batch.instances);
        }
    }

    fn write_viewport_uniform(&self, ctx: &RenderCtx<'_>) {
        let (w, h) = ctx.target_size;
        let u = ViewportUniform {
            viewport: [w.max(1) as f32, h.max(1) as f32],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required_instances: usize) {
        if required_instances <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required_instances.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<QuadInstance>()) as u64;

        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tachy quad instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    target_format: wgpu::TextureFormat,
    name: &str,
    source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(name),
        bind_group_layouts,
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(name),
        layout: Some(&layout),

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout(), QuadInstance::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: Some(alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
