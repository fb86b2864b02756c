//! Depth/normal input contract
//!
//! The resolver reads the scene through [`DepthNormalSource`]: scene
//! depth and world-space normal, addressed by screen UV, valid for the
//! opaque geometry rasterized earlier in the frame. The host pipeline
//! guarantees the buffer is fully written before the resolve begins.
//!
//! [`SceneBuffers`] is the CPU implementation, used by the reference
//! resolver, the tests, and the benches. Depth follows the crate's
//! depth-texture convention: [0, 1], 0 at the near plane, cleared to
//! 1.0 where nothing was rasterized.

use crate::space::ScreenUv;
use glam::Vec3;

/// One depth/normal sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthNormalSample {
    /// Device depth in [0, 1], 0 = near plane.
    pub depth: f32,
    /// World-space surface normal.
    pub normal: Vec3,
}

/// Read access to the scene's depth/normal buffer.
pub trait DepthNormalSource {
    /// Point-sample the buffer at a screen UV. Coordinates are clamped
    /// to the edge texel, matching the GPU sampler's address mode.
    fn sample(&self, uv: ScreenUv) -> DepthNormalSample;
}

/// CPU depth/normal buffers.
pub struct SceneBuffers {
    width: u32,
    height: u32,
    depths: Vec<f32>,
    normals: Vec<Vec3>,
}

impl SceneBuffers {
    /// Create cleared buffers: depth 1.0 (nothing rasterized), zero
    /// normals.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            depths: vec![1.0; len],
            normals: vec![Vec3::ZERO; len],
        }
    }

    /// Create buffers filled with a single depth/normal everywhere.
    ///
    /// Models a view-facing plane: perspective depth depends only on
    /// view-space Z, so a plane perpendicular to the view axis has
    /// constant device depth.
    pub fn uniform(width: u32, height: u32, depth: f32, normal: Vec3) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            depths: vec![depth; len],
            normals: vec![normal; len],
        }
    }

    /// Overwrite a pixel rectangle (half-open ranges) with one
    /// depth/normal. Used to drop synthetic occluders into a scene.
    pub fn fill_pixel_rect(
        &mut self,
        x: std::ops::Range<u32>,
        y: std::ops::Range<u32>,
        depth: f32,
        normal: Vec3,
    ) {
        for py in y.start..y.end.min(self.height) {
            for px in x.start..x.end.min(self.width) {
                let i = (py * self.width + px) as usize;
                self.depths[i] = depth;
                self.normals[i] = normal;
            }
        }
    }

    /// Set a single texel.
    pub fn set_texel(&mut self, x: u32, y: u32, depth: f32, normal: Vec3) {
        let i = (y * self.width + x) as usize;
        self.depths[i] = depth;
        self.normals[i] = normal;
    }

    /// Buffer width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    fn texel_index(&self, uv: ScreenUv) -> usize {
        let max_x = (self.width as i64 - 1).max(0);
        let max_y = (self.height as i64 - 1).max(0);
        let x = ((uv.0.x * self.width as f32) as i64).clamp(0, max_x) as u32;
        let y = ((uv.0.y * self.height as f32) as i64).clamp(0, max_y) as u32;
        (y * self.width + x) as usize
    }
}

impl DepthNormalSource for SceneBuffers {
    fn sample(&self, uv: ScreenUv) -> DepthNormalSample {
        let i = self.texel_index(uv);
        DepthNormalSample {
            depth: self.depths[i],
            normal: self.normals[i],
        }
    }
}
