//! Named coordinate spaces
//!
//! The ray march chains several matrix transforms per pixel, and an
//! argument in the wrong space is silently wrong. Each space the
//! resolver touches gets its own newtype, and [`ViewTransforms`]
//! carries the space tags in its method signatures.
//!
//! Spaces:
//!
//! - **World**: absolute scene coordinates.
//! - **Translated world**: world relative to the camera origin. All
//!   resolver math runs here so precision does not degrade far from the
//!   scene origin.
//! - **View**: camera space, -Z forward.
//! - **NDC**: normalized device coordinates, xy in [-1, 1] and depth in
//!   [0, 1] (0 = near).
//! - **Screen UV**: [0, 1]² with the origin at the top-left, matching
//!   texture addressing.

use glam::{Mat4, Vec2, Vec3};

/// A position in absolute world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPos(pub Vec3);

/// A position in camera-relative ("translated") world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslatedWorldPos(pub Vec3);

/// A position in view space (-Z forward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPos(pub Vec3);

/// A position in normalized device coordinates.
///
/// xy in [-1, 1], z is device depth in [0, 1] with 0 at the near plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ndc(pub Vec3);

/// A normalized screen coordinate in [0, 1]², origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenUv(pub Vec2);

impl Ndc {
    /// Build NDC from a screen UV and a device depth.
    pub fn from_uv_depth(uv: ScreenUv, depth: f32) -> Self {
        Self(Vec3::new(
            (uv.0.x - 0.5) * 2.0,
            (0.5 - uv.0.y) * 2.0,
            depth,
        ))
    }

    /// The screen UV of this NDC position (flips Y).
    pub fn uv(&self) -> ScreenUv {
        ScreenUv(Vec2::new(self.0.x * 0.5 + 0.5, self.0.y * -0.5 + 0.5))
    }

    /// The device depth component.
    pub fn depth(&self) -> f32 {
        self.0.z
    }
}

impl ScreenUv {
    /// Whether the coordinate lies strictly inside the screen rectangle.
    ///
    /// Samples on or past the edge are not valid evidence of occlusion.
    pub fn inside_screen(&self) -> bool {
        self.0.x > 0.0 && self.0.x < 1.0 && self.0.y > 0.0 && self.0.y < 1.0
    }
}

/// The transforms between the spaces above for one view.
///
/// Built once per frame from the host camera; immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct ViewTransforms {
    translated_world_to_clip: Mat4,
    clip_to_translated_world: Mat4,
    translated_world_to_view: Mat4,
    view_to_clip: Mat4,
    camera_origin: Vec3,
}

impl ViewTransforms {
    /// Build from a world-space view matrix, a projection matrix, and
    /// the camera origin the translated-world space is anchored to.
    pub fn from_view_proj(view: Mat4, proj: Mat4, camera_origin: Vec3) -> Self {
        // world = translated + origin, so fold the origin translation
        // into the view matrix once.
        let translated_world_to_view = view * Mat4::from_translation(camera_origin);
        let translated_world_to_clip = proj * translated_world_to_view;

        Self {
            translated_world_to_clip,
            clip_to_translated_world: translated_world_to_clip.inverse(),
            translated_world_to_view,
            view_to_clip: proj,
            camera_origin,
        }
    }

    /// Rebase an absolute world position into translated world space.
    pub fn to_translated(&self, p: WorldPos) -> TranslatedWorldPos {
        TranslatedWorldPos(p.0 - self.camera_origin)
    }

    /// Rebase a translated-world position back to absolute world space.
    pub fn to_world(&self, p: TranslatedWorldPos) -> WorldPos {
        WorldPos(p.0 + self.camera_origin)
    }

    /// Project a translated-world position to NDC.
    pub fn project(&self, p: TranslatedWorldPos) -> Ndc {
        Ndc(self.translated_world_to_clip.project_point3(p.0))
    }

    /// Reconstruct the translated-world position of a (UV, depth) sample.
    pub fn unproject(&self, uv: ScreenUv, depth: f32) -> TranslatedWorldPos {
        let ndc = Ndc::from_uv_depth(uv, depth);
        TranslatedWorldPos(self.clip_to_translated_world.project_point3(ndc.0))
    }

    /// Transform a translated-world position into view space.
    pub fn to_view(&self, p: TranslatedWorldPos) -> ViewPos {
        ViewPos(self.translated_world_to_view.transform_point3(p.0))
    }

    /// Linear view-space depth (distance along the view axis) of a
    /// translated-world position.
    pub fn view_depth(&self, p: TranslatedWorldPos) -> f32 {
        -self.to_view(p).0.z
    }

    /// Tangent of half the vertical field of view.
    pub fn tan_half_fov(&self) -> f32 {
        1.0 / self.view_to_clip.col(1).y
    }

    /// The translated-world-to-clip matrix (for GPU upload).
    pub fn translated_world_to_clip(&self) -> Mat4 {
        self.translated_world_to_clip
    }

    /// The clip-to-translated-world matrix (for GPU upload).
    pub fn clip_to_translated_world(&self) -> Mat4 {
        self.clip_to_translated_world
    }

    /// The translated-world-to-view matrix (for GPU upload).
    pub fn translated_world_to_view(&self) -> Mat4 {
        self.translated_world_to_view
    }

    /// The camera origin the translated space is anchored to.
    pub fn camera_origin(&self) -> Vec3 {
        self.camera_origin
    }
}
