use anyhow::{ensure, Result};

use crate::texture::PixelBuffer;

use super::ctx::RenderCtx;

/// Sampled format of every stimulus texture. Unorm so 8-bit levels reach the
/// shader unconverted.
pub(super) const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// GPU side of a `TextureResource`.
pub(crate) struct GpuTexture {
    texture: wgpu::Texture,
    pub(super) bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

impl GpuTexture {
    /// Creates the texture, copies `image` and waits until the queue is idle.
    pub(super) fn create(
        ctx: &RenderCtx<'_>,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        image: &PixelBuffer,
    ) -> Result<Self> {
        let limit = ctx.device.limits().max_texture_dimension_2d;
        ensure!(
            image.width() <= limit && image.height() <= limit,
            "image {}x{} exceeds the device limit of {limit}",
            image.width(),
            image.height()
        );

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tachy stimulus texture"),
            size: extent(image),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tachy stimulus bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let gpu = Self {
            texture,
            bind_group,
            width: image.width(),
            height: image.height(),
        };
        gpu.write(ctx, image)?;
        Ok(gpu)
    }

    /// Overwrites the contents. The shape must match; callers recreate the
    /// texture on a size change.
    pub(super) fn write(&self, ctx: &RenderCtx<'_>, image: &PixelBuffer) -> Result<()> {
        ensure!(
            self.same_size(image),
            "texture is {}x{}, image is {}x{}",
            self.width,
            self.height,
            image.width(),
            image.height()
        );

        let rgba = image.to_rgba8();
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            extent(image),
        );

        // Upload is synchronous: flush the staged copy and wait for it.
        ctx.queue.submit([]);
        ctx.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| anyhow::anyhow!("waiting for texture upload failed: {e}"))?;
        Ok(())
    }

    pub(super) fn same_size(&self, image: &PixelBuffer) -> bool {
        self.width == image.width() && self.height == image.height()
    }
}

fn extent(image: &PixelBuffer) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    }
}
