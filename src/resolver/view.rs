//! Per-frame view and light descriptors
//!
//! The host renderer builds these once per frame from its camera and
//! light state; the resolver treats them as read-only.

use crate::space::{ScreenUv, TranslatedWorldPos, ViewTransforms};
use glam::{UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

/// Per-frame view state for one resolve.
#[derive(Debug, Clone, Copy)]
pub struct ViewDescriptor {
    transforms: ViewTransforms,
    viewport_origin: UVec2,
    viewport_size: UVec2,
    buffer_size: UVec2,
    inv_buffer_size: Vec2,
    noise_seed: u32,
}

impl ViewDescriptor {
    /// Number of temporal noise seeds the dither cycles through.
    pub const NOISE_SEED_COUNT: u32 = 8;

    /// Create a view descriptor.
    ///
    /// `viewport_origin`/`viewport_size` select the working rectangle
    /// inside a depth buffer of `buffer_size` texels; the output mask is
    /// anchored at (0, 0) with `viewport_size` extent. `noise_seed` is a
    /// frame counter; only its value modulo [`Self::NOISE_SEED_COUNT`]
    /// enters the dither.
    pub fn new(
        transforms: ViewTransforms,
        viewport_origin: UVec2,
        viewport_size: UVec2,
        buffer_size: UVec2,
        noise_seed: u32,
    ) -> Self {
        Self {
            transforms,
            viewport_origin,
            viewport_size,
            buffer_size,
            inv_buffer_size: Vec2::new(
                1.0 / buffer_size.x.max(1) as f32,
                1.0 / buffer_size.y.max(1) as f32,
            ),
            noise_seed: noise_seed % Self::NOISE_SEED_COUNT,
        }
    }

    /// A view covering a whole buffer with no offset.
    pub fn fullscreen(transforms: ViewTransforms, size: UVec2, noise_seed: u32) -> Self {
        Self::new(transforms, UVec2::ZERO, size, size, noise_seed)
    }

    /// The screen UV of an output pixel's center, including the
    /// viewport offset into the depth buffer.
    pub fn uv_for_pixel(&self, pixel: UVec2) -> ScreenUv {
        let texel = (self.viewport_origin + pixel).as_vec2() + 0.5;
        ScreenUv(texel * self.inv_buffer_size)
    }

    /// The view's coordinate transforms.
    pub fn transforms(&self) -> &ViewTransforms {
        &self.transforms
    }

    /// Working-rectangle origin inside the depth buffer.
    pub fn viewport_origin(&self) -> UVec2 {
        self.viewport_origin
    }

    /// Working-rectangle extent (also the output mask extent).
    pub fn viewport_size(&self) -> UVec2 {
        self.viewport_size
    }

    /// Full depth-buffer resolution.
    pub fn buffer_size(&self) -> UVec2 {
        self.buffer_size
    }

    /// Reciprocal of the depth-buffer resolution.
    pub fn inv_buffer_size(&self) -> Vec2 {
        self.inv_buffer_size
    }

    /// Temporal dither seed, already reduced modulo
    /// [`Self::NOISE_SEED_COUNT`].
    pub fn noise_seed(&self) -> u32 {
        self.noise_seed
    }
}

/// A light, as position-or-direction.
///
/// Directional lights store the direction the light travels with w = 0;
/// local lights store a world position with w = 1, matching the
/// convention used across the host's lighting code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescriptor {
    position_or_direction: Vec4,
}

impl LightDescriptor {
    /// A directional light from its direction of travel.
    pub fn directional(direction: Vec3) -> Self {
        Self {
            position_or_direction: direction.normalize().extend(0.0),
        }
    }

    /// A local (point or spot) light from its world position.
    pub fn local(position: Vec3) -> Self {
        Self {
            position_or_direction: position.extend(1.0),
        }
    }

    /// Whether this is a directional light.
    pub fn is_directional(&self) -> bool {
        self.position_or_direction.w == 0.0
    }

    /// The direction from a surface point toward the light.
    ///
    /// For directional lights this is the negated travel direction; for
    /// local lights, the normalized vector to the light position. Local
    /// positions must already be expressed in translated world space,
    /// the space the resolver marches in.
    pub fn direction_to_light(&self, from: TranslatedWorldPos) -> Vec3 {
        if self.is_directional() {
            -self.position_or_direction.xyz()
        } else {
            (self.position_or_direction.xyz() - from.0).normalize()
        }
    }

    /// The raw position-or-direction value (for GPU upload).
    pub fn as_vec4(&self) -> Vec4 {
        self.position_or_direction
    }
}
