//! The contact-shadow resolver (CPU reference path)
//!
//! Runs the same march as the GPU pass, pixel by pixel, over a
//! [`DepthNormalSource`]. The GPU pass is the per-frame path; this one
//! exists for correctness testing, tuning, and capture tooling, and is
//! the reference the shader is kept in lockstep with.

mod config;
mod march;
mod view;

pub use config::{ConfigError, ContactShadowConfig, Quality};
pub use march::interleaved_gradient_noise;
pub use view::{LightDescriptor, ViewDescriptor};

use crate::gbuffer::DepthNormalSource;
use glam::{uvec2, UVec2};
use rayon::prelude::*;

/// One resolved output texel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowTexel {
    /// Occlusion factor: 0 = in contact shadow, 1 = unoccluded.
    pub occlusion: f32,
    /// The pixel's own scene depth, echoed for downstream composition.
    pub depth: f32,
}

impl ShadowTexel {
    /// Occlusion value of a pixel in contact shadow.
    pub const SHADOWED: f32 = 0.0;
    /// Occlusion value of an unoccluded pixel.
    pub const UNSHADOWED: f32 = 1.0;

    /// A shadowed texel echoing the given scene depth.
    pub fn shadowed(depth: f32) -> Self {
        Self {
            occlusion: Self::SHADOWED,
            depth,
        }
    }

    /// An unshadowed texel echoing the given scene depth.
    pub fn unshadowed(depth: f32) -> Self {
        Self {
            occlusion: Self::UNSHADOWED,
            depth,
        }
    }

    /// The texel as the two-channel wire format.
    pub fn to_array(self) -> [f32; 2] {
        [self.occlusion, self.depth]
    }
}

/// A resolved shadow mask: one `[occlusion, depth]` texel per pixel of
/// the working rectangle, anchored at (0, 0).
pub struct ShadowMask {
    width: u32,
    height: u32,
    texels: Vec<[f32; 2]>,
}

impl ShadowMask {
    /// An empty mask, as produced for degenerate extents.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            texels: Vec::new(),
        }
    }

    /// Mask width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the mask holds no texels.
    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    /// The texel at (x, y).
    pub fn texel(&self, x: u32, y: u32) -> [f32; 2] {
        self.texels[(y * self.width + x) as usize]
    }

    /// The occlusion channel at (x, y).
    pub fn occlusion(&self, x: u32, y: u32) -> f32 {
        self.texel(x, y)[0]
    }

    /// All texels in row order.
    pub fn texels(&self) -> &[[f32; 2]] {
        &self.texels
    }
}

/// The screen-space contact-shadow resolver.
///
/// Owns an immutable [`ContactShadowConfig`]; everything per-frame
/// arrives through the descriptors at resolve time.
pub struct ContactShadowResolver {
    config: ContactShadowConfig,
}

impl ContactShadowResolver {
    /// Create a resolver with the given configuration.
    pub fn new(config: ContactShadowConfig) -> Self {
        Self { config }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &ContactShadowConfig {
        &self.config
    }

    /// Resolve a single pixel of the working rectangle.
    pub fn resolve_pixel<S: DepthNormalSource + ?Sized>(
        &self,
        pixel: UVec2,
        view: &ViewDescriptor,
        light: &LightDescriptor,
        scene: &S,
    ) -> ShadowTexel {
        march::resolve_pixel(&self.config, view, light, scene, pixel)
    }

    /// Resolve the whole working rectangle into a mask.
    ///
    /// Each pixel is independent: rows are resolved in parallel, each
    /// invocation reads only the shared inputs and writes only its own
    /// texel. Degenerate extents are skipped rather than dispatched.
    pub fn resolve<S: DepthNormalSource + Sync + ?Sized>(
        &self,
        view: &ViewDescriptor,
        light: &LightDescriptor,
        scene: &S,
    ) -> ShadowMask {
        let size = view.viewport_size();
        if size.x == 0 || size.y == 0 {
            tracing::debug!(
                width = size.x,
                height = size.y,
                "skipping contact shadow resolve for degenerate extent"
            );
            return ShadowMask::empty();
        }

        let mut texels = vec![[0.0f32; 2]; (size.x * size.y) as usize];
        texels
            .par_chunks_mut(size.x as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, texel) in row.iter_mut().enumerate() {
                    *texel = march::resolve_pixel(
                        &self.config,
                        view,
                        light,
                        scene,
                        uvec2(x as u32, y as u32),
                    )
                    .to_array();
                }
            });

        ShadowMask {
            width: size.x,
            height: size.y,
            texels,
        }
    }
}
