//! GPU buffer abstractions
//!
//! Provides wrappers for uniform and readback staging buffers.

use crate::context::WgpuContext;
use bytemuck::Pod;

/// Raw uniform buffer without type information (for dynamic usage).
pub struct RawUniformBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) size: u64,
}

impl RawUniformBuffer {
    /// Create a new raw uniform buffer with specified size.
    pub fn new(ctx: &WgpuContext, size: u64, label: Option<&str>) -> Self {
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self { buffer, size }
    }

    /// Write data to the buffer.
    pub fn write<T: Pod>(&self, ctx: &WgpuContext, data: &T) {
        ctx.queue
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(data));
    }

    /// Get the raw wgpu buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Get the buffer size.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A staging buffer for copying texture contents back to the CPU.
///
/// Rows are padded to `COPY_BYTES_PER_ROW_ALIGNMENT` as required by
/// texture-to-buffer copies; the readback helpers strip the padding.
pub struct ReadbackBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) padded_bytes_per_row: u32,
    pub(crate) unpadded_bytes_per_row: u32,
    pub(crate) rows: u32,
}

impl ReadbackBuffer {
    /// Create a readback buffer for a texture of the given dimensions.
    ///
    /// `bytes_per_texel` is the size of one texel of the source format.
    pub fn new(
        ctx: &WgpuContext,
        width: u32,
        height: u32,
        bytes_per_texel: u32,
        label: Option<&str>,
    ) -> Self {
        let unpadded_bytes_per_row = width * bytes_per_texel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            padded_bytes_per_row,
            unpadded_bytes_per_row,
            rows: height,
        }
    }

    /// Encode a copy from the texture into this buffer.
    pub fn copy_from_texture(&self, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.rows),
                },
            },
            texture.size(),
        );
    }

    /// Map the buffer and return its contents with row padding removed.
    ///
    /// The copy encoded by [`Self::copy_from_texture`] must have been
    /// submitted and completed before calling this.
    pub fn read(&self, ctx: &WgpuContext) -> anyhow::Result<Vec<u8>> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = ctx.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()??;

        let mapped = slice.get_mapped_range();
        let mut data =
            Vec::with_capacity(self.unpadded_bytes_per_row as usize * self.rows as usize);
        for row in mapped.chunks(self.padded_bytes_per_row as usize) {
            data.extend_from_slice(&row[..self.unpadded_bytes_per_row as usize]);
        }
        drop(mapped);
        self.buffer.unmap();

        Ok(data)
    }

    /// Get the raw wgpu buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
