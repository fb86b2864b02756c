//! The contact-shadow compute pass
//!
//! GPU wiring for the resolver: pipeline, bind groups, uniform upload,
//! and the guarded dispatch. The host renderer supplies the depth and
//! normal views (already fully written this frame) and the mask storage
//! view; the pass performs one dispatch per applicable light.

use crate::compute::compute_workgroup_count;
use crate::context::WgpuContext;
use crate::core::{ComputePipelineBuilder, RawUniformBuffer, StorageTexture2D};
use crate::resolver::{ContactShadowConfig, LightDescriptor, ViewDescriptor};
use glam::UVec2;

/// Shader parameter block, mirroring `Params` in the WGSL source.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ContactShadowParams {
    translated_world_to_clip: [[f32; 4]; 4],
    clip_to_translated_world: [[f32; 4]; 4],
    translated_world_to_view: [[f32; 4]; 4],
    light_position_or_direction: [f32; 4],
    buffer_size: [f32; 2],
    inv_buffer_size: [f32; 2],
    viewport_origin: [u32; 2],
    viewport_size: [u32; 2],
    ray_length_scale: f32,
    tolerance_scale: f32,
    surface_bias: f32,
    self_intersect_epsilon: f32,
    max_steps: u32,
    noise_seed: u32,
    tan_half_fov: f32,
    _pad: f32,
}

/// Screen-space contact-shadow compute pass.
pub struct ContactShadowPass {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: RawUniformBuffer,
}

impl ContactShadowPass {
    /// Thread-group edge length; dispatches cover the extent in 8x8
    /// tiles.
    pub const TILE_SIZE: u32 = 8;

    /// Create the pass.
    pub fn new(ctx: &WgpuContext) -> anyhow::Result<Self> {
        let shader = include_str!("../shaders/contact_shadow.wgsl");

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("contact shadow bind group layout"),
                    entries: &[
                        // Depth buffer
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Depth,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        // World normals
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        // Shadow mask output
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::StorageTexture {
                                access: wgpu::StorageTextureAccess::WriteOnly,
                                format: StorageTexture2D::MASK_FORMAT,
                                view_dimension: wgpu::TextureViewDimension::D2,
                            },
                            count: None,
                        },
                        // Shader parameters
                        wgpu::BindGroupLayoutEntry {
                            binding: 3,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline = ComputePipelineBuilder::new(ctx)
            .label("contact shadow pipeline")
            .shader(shader)
            .bind_group_layout(&bind_group_layout)
            .build()?;

        let uniform_buffer = RawUniformBuffer::new(
            ctx,
            std::mem::size_of::<ContactShadowParams>() as u64,
            Some("contact shadow uniform"),
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
        })
    }

    /// Create a bind group over the frame's views.
    pub fn create_bind_group(
        &self,
        ctx: &WgpuContext,
        depth_input: &wgpu::TextureView,
        normal_input: &wgpu::TextureView,
        mask_output: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("contact shadow bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(depth_input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(normal_input),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(mask_output),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.uniform_buffer.buffer().as_entire_binding(),
                },
            ],
        })
    }

    /// Upload the per-frame parameters.
    ///
    /// Shares the descriptor and config types with the CPU reference
    /// resolver, so both paths are driven by the same values.
    pub fn update_uniform(
        &self,
        ctx: &WgpuContext,
        view: &ViewDescriptor,
        light: &LightDescriptor,
        config: &ContactShadowConfig,
    ) {
        let transforms = view.transforms();
        let params = ContactShadowParams {
            translated_world_to_clip: transforms.translated_world_to_clip().to_cols_array_2d(),
            clip_to_translated_world: transforms.clip_to_translated_world().to_cols_array_2d(),
            translated_world_to_view: transforms.translated_world_to_view().to_cols_array_2d(),
            light_position_or_direction: light.as_vec4().to_array(),
            buffer_size: view.buffer_size().as_vec2().to_array(),
            inv_buffer_size: view.inv_buffer_size().to_array(),
            viewport_origin: view.viewport_origin().to_array(),
            viewport_size: view.viewport_size().to_array(),
            ray_length_scale: config.ray_length_scale,
            tolerance_scale: config.tolerance_scale,
            surface_bias: config.surface_bias,
            self_intersect_epsilon: config.self_intersect_epsilon,
            max_steps: config.max_steps,
            noise_seed: view.noise_seed(),
            tan_half_fov: transforms.tan_half_fov(),
            _pad: 0.0,
        };
        self.uniform_buffer.write(ctx, &params);
    }

    /// Encode the dispatch covering `extent` pixels.
    ///
    /// Degenerate extents are skipped rather than dispatched.
    pub fn dispatch(
        &self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        depth_input: &wgpu::TextureView,
        normal_input: &wgpu::TextureView,
        mask_output: &wgpu::TextureView,
        extent: UVec2,
    ) {
        if extent.x == 0 || extent.y == 0 {
            tracing::warn!(
                width = extent.x,
                height = extent.y,
                "skipping contact shadow dispatch for degenerate extent"
            );
            return;
        }

        let bind_group = self.create_bind_group(ctx, depth_input, normal_input, mask_output);

        let groups_x = compute_workgroup_count(extent.x, Self::TILE_SIZE);
        let groups_y = compute_workgroup_count(extent.y, Self::TILE_SIZE);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("contact shadow pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }

    /// Upload parameters and encode the dispatch for one light.
    pub fn resolve(
        &self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &ViewDescriptor,
        light: &LightDescriptor,
        config: &ContactShadowConfig,
        depth_input: &wgpu::TextureView,
        normal_input: &wgpu::TextureView,
        mask_output: &wgpu::TextureView,
    ) {
        self.update_uniform(ctx, view, light, config);
        self.dispatch(
            ctx,
            encoder,
            depth_input,
            normal_input,
            mask_output,
            view.viewport_size(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_layout_matches_wgsl() {
        // Three mat4x4 + vec4 + four vec2 + eight scalars.
        assert_eq!(std::mem::size_of::<ContactShadowParams>(), 272);
        assert_eq!(std::mem::size_of::<ContactShadowParams>() % 16, 0);
    }
}
