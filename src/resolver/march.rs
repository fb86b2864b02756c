//! The screen-space contact-shadow ray march
//!
//! One invocation per output pixel: reconstruct the surface point from
//! the depth buffer, march a short ray toward the light through screen
//! space, and test each sample against the recorded scene depth. Each
//! pixel ends in one of two terminal states, shadowed or unshadowed,
//! and no state is carried across pixels or frames.

use crate::gbuffer::DepthNormalSource;
use crate::resolver::{ContactShadowConfig, LightDescriptor, ShadowTexel, ViewDescriptor};
use crate::space::{ScreenUv, TranslatedWorldPos};
use glam::{UVec2, Vec2};

/// Per-pixel, per-frame dither value in [0, 1).
///
/// Interleaved gradient noise over the pixel coordinate, shifted by the
/// frame seed so the pattern decorrelates temporally as well as
/// spatially.
pub fn interleaved_gradient_noise(pixel: UVec2, seed: u32) -> f32 {
    let p = pixel.as_vec2() + seed as f32 * Vec2::new(47.0, 17.0) * 0.695;
    let f = (0.067_110_56 * p.x + 0.005_837_15 * p.y).fract();
    (52.982_918 * f).fract()
}

/// Resolve one pixel.
pub(crate) fn resolve_pixel<S: DepthNormalSource + ?Sized>(
    config: &ContactShadowConfig,
    view: &ViewDescriptor,
    light: &LightDescriptor,
    scene: &S,
    pixel: UVec2,
) -> ShadowTexel {
    let uv = view.uv_for_pixel(pixel);
    let surface = scene.sample(uv);

    // Cleared depth: nothing was rasterized here, nothing to shade.
    if surface.depth >= 1.0 {
        return ShadowTexel::unshadowed(surface.depth);
    }

    let transforms = view.transforms();
    let origin = transforms.unproject(uv, surface.depth);
    let to_light = light.direction_to_light(origin);

    // A surface facing away from the light is trivially self-shadowed.
    if surface.normal.dot(to_light) <= 0.0 {
        return ShadowTexel::shadowed(surface.depth);
    }

    // Scale the ray with distance so its screen-space footprint stays
    // roughly resolution independent.
    let ray_length =
        config.ray_length_scale * transforms.tan_half_fov() * transforms.view_depth(origin);

    let start = TranslatedWorldPos(origin.0 + surface.normal * config.surface_bias);
    let end = TranslatedWorldPos(start.0 + to_light * ray_length);

    // Project the endpoints once; every step advances by linear
    // interpolation in UV-and-depth space instead of reprojecting.
    let start_ndc = transforms.project(start);
    let end_ndc = transforms.project(end);
    let start_uv = start_ndc.uv().0;
    let end_uv = end_ndc.uv().0;
    let depth_span = end_ndc.depth() - start_ndc.depth();

    let steps = config.max_steps.max(1);
    let tolerance = depth_span.abs() * config.tolerance_scale / steps as f32;
    let jitter = interleaved_gradient_noise(pixel, view.noise_seed()) - 0.5;

    for i in 0..steps {
        let t = (i as f32 + 0.5 + jitter) / steps as f32;
        let sample_uv = ScreenUv(start_uv.lerp(end_uv, t));

        // Off-screen samples cannot be evidence of occlusion; the march
        // ends inconclusive and the pixel resolves unshadowed.
        if !sample_uv.inside_screen() {
            break;
        }

        let expected = start_ndc.depth() + depth_span * t;
        let recorded = scene.sample(sample_uv).depth;

        // The originating surface's own depth is not an occluder.
        if (recorded - surface.depth).abs() < config.self_intersect_epsilon {
            continue;
        }

        // Hit: an opaque surface strictly nearer than the ray point,
        // within the adaptive tolerance band.
        let delta = expected - recorded;
        if delta > 0.0 && delta < tolerance {
            return ShadowTexel::shadowed(surface.depth);
        }
    }

    ShadowTexel::unshadowed(surface.depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbuffer::SceneBuffers;
    use crate::resolver::ContactShadowResolver;
    use crate::space::ViewTransforms;
    use glam::{uvec2, Mat4, Vec3};
    use std::f32::consts::FRAC_PI_2;

    const SIZE: u32 = 128;

    /// Camera at the origin looking down -Z, 90 degree FOV, square
    /// buffer. Device depth of a view-facing plane is constant, so
    /// synthetic scenes reduce to flat fills.
    fn test_view(seed: u32) -> ViewDescriptor {
        let proj = Mat4::perspective_rh(FRAC_PI_2, 1.0, 0.1, 100.0);
        let transforms = ViewTransforms::from_view_proj(Mat4::IDENTITY, proj, Vec3::ZERO);
        ViewDescriptor::fullscreen(transforms, uvec2(SIZE, SIZE), seed)
    }

    /// Device depth of a view-facing plane at view distance `dist`.
    fn plane_depth(view: &ViewDescriptor, dist: f32) -> f32 {
        view.transforms()
            .project(crate::space::TranslatedWorldPos(Vec3::new(0.0, 0.0, -dist)))
            .depth()
    }

    /// Plane at 10 units facing the camera, with a nearer occluder
    /// covering the right half of the screen (columns 65 and up).
    fn occluder_scene(view: &ViewDescriptor) -> SceneBuffers {
        let mut scene = SceneBuffers::uniform(SIZE, SIZE, plane_depth(view, 10.0), Vec3::Z);
        scene.fill_pixel_rect(65..SIZE, 0..SIZE, plane_depth(view, 9.8), Vec3::Z);
        scene
    }

    /// Light whose march direction runs screen-right and toward the
    /// camera: to-light = normalize(1, 0, 1).
    fn raking_light() -> LightDescriptor {
        LightDescriptor::directional(Vec3::new(-1.0, 0.0, -1.0))
    }

    #[test]
    fn test_backfacing_pixels_are_shadowed_regardless_of_buffer() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        // Light travelling +Z: to-light is -Z, behind the plane.
        let light = LightDescriptor::directional(Vec3::Z);

        for scene in [
            SceneBuffers::uniform(SIZE, SIZE, plane_depth(&view, 10.0), Vec3::Z),
            occluder_scene(&view),
        ] {
            let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &light, &scene);
            assert_eq!(texel.occlusion, ShadowTexel::SHADOWED);
            assert_eq!(texel.depth, scene.sample(view.uv_for_pixel(uvec2(64, 64))).depth);
        }
    }

    #[test]
    fn test_bare_plane_is_unshadowed_everywhere() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        let depth = plane_depth(&view, 10.0);
        let scene = SceneBuffers::uniform(SIZE, SIZE, depth, Vec3::Z);
        // Light travelling along the plane normal: to-light = +Z.
        let light = LightDescriptor::directional(Vec3::NEG_Z);

        let mask = resolver.resolve(&view, &light, &scene);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let texel = mask.texel(x, y);
                assert_eq!(texel[0], ShadowTexel::UNSHADOWED, "pixel ({x}, {y})");
                assert_eq!(texel[1], depth);
            }
        }
    }

    #[test]
    fn test_occluder_within_ray_length_shadows() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        let scene = occluder_scene(&view);

        let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &raking_light(), &scene);
        assert_eq!(texel.occlusion, ShadowTexel::SHADOWED);
    }

    #[test]
    fn test_occluder_beyond_ray_length_does_not_shadow() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        // Same geometry, but the occluder sits at 8.5 units: more than a
        // full ray length (1 unit here) above the 10-unit plane.
        let mut scene = SceneBuffers::uniform(SIZE, SIZE, plane_depth(&view, 10.0), Vec3::Z);
        scene.fill_pixel_rect(65..SIZE, 0..SIZE, plane_depth(&view, 8.5), Vec3::Z);

        let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &raking_light(), &scene);
        assert_eq!(texel.occlusion, ShadowTexel::UNSHADOWED);
    }

    #[test]
    fn test_identical_inputs_are_bit_identical() {
        let view = test_view(3);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        let scene = occluder_scene(&view);
        let light = raking_light();

        let a = resolver.resolve(&view, &light, &scene);
        let b = resolver.resolve(&view, &light, &scene);

        assert_eq!(a.width(), b.width());
        for (ta, tb) in a.texels().iter().zip(b.texels()) {
            assert_eq!(ta[0].to_bits(), tb[0].to_bits());
            assert_eq!(ta[1].to_bits(), tb[1].to_bits());
        }
    }

    #[test]
    fn test_own_depth_never_occludes() {
        // Coarse buffer, a march that runs away from the camera while
        // barely moving in UV: every sample lands on the shading pixel's
        // own texel and reads its own depth back. Without the
        // self-intersection epsilon the early steps would all sit inside
        // the tolerance band.
        let proj = Mat4::perspective_rh(FRAC_PI_2, 1.0, 0.1, 100.0);
        let transforms = ViewTransforms::from_view_proj(Mat4::IDENTITY, proj, Vec3::ZERO);
        let to_light = Vec3::new(0.1, 0.0, -1.0).normalize();
        let light = LightDescriptor::directional(-to_light);
        let scene = SceneBuffers::uniform(8, 8, 0.5, to_light);

        for tolerance_scale in [0.5, 1.0, 2.0, 4.0, 8.0] {
            let config = ContactShadowConfig::default()
                .with_surface_bias(0.0)
                .with_tolerance_scale(tolerance_scale);
            let resolver = ContactShadowResolver::new(config);
            for seed in 0..ViewDescriptor::NOISE_SEED_COUNT {
                let view = ViewDescriptor::fullscreen(transforms, uvec2(8, 8), seed);
                let texel = resolver.resolve_pixel(uvec2(4, 4), &view, &light, &scene);
                assert_eq!(
                    texel.occlusion,
                    ShadowTexel::UNSHADOWED,
                    "scale {tolerance_scale}, seed {seed}"
                );
            }
        }
    }

    #[test]
    fn test_seed_changes_jitter_but_not_classification() {
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        let light = raking_light();

        for seed in 0..ViewDescriptor::NOISE_SEED_COUNT {
            let view = test_view(seed);

            // Unambiguous occluder: shadowed under every seed.
            let scene = occluder_scene(&view);
            let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &light, &scene);
            assert_eq!(texel.occlusion, ShadowTexel::SHADOWED, "seed {seed}");

            // No occluder at all: unshadowed under every seed.
            let bare = SceneBuffers::uniform(SIZE, SIZE, plane_depth(&view, 10.0), Vec3::Z);
            let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &light, &bare);
            assert_eq!(texel.occlusion, ShadowTexel::UNSHADOWED, "seed {seed}");
        }
    }

    #[test]
    fn test_ray_leaving_screen_is_not_a_hit() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        let scene = occluder_scene(&view);
        let light = raking_light();

        // Interior pixel: the march stays on screen and finds the
        // occluder.
        let interior = resolver.resolve_pixel(uvec2(64, 64), &view, &light, &scene);
        assert_eq!(interior.occlusion, ShadowTexel::SHADOWED);

        // Pixel at the right edge: the same light pushes every sample
        // off screen almost immediately, so the march ends inconclusive
        // and must resolve unshadowed.
        let edge = resolver.resolve_pixel(uvec2(SIZE - 1, 64), &view, &light, &scene);
        assert_eq!(edge.occlusion, ShadowTexel::UNSHADOWED);
    }

    #[test]
    fn test_dither_range_and_decorrelation() {
        for y in 0..8 {
            for x in 0..8 {
                for seed in 0..8 {
                    let n = interleaved_gradient_noise(uvec2(x, y), seed);
                    assert!((0.0..1.0).contains(&n));
                }
            }
        }

        // Neighbouring pixels get different offsets.
        assert_ne!(
            interleaved_gradient_noise(uvec2(0, 0), 0),
            interleaved_gradient_noise(uvec2(1, 0), 0)
        );

        // The same pixel moves between frames.
        let frames: Vec<f32> = (0..8)
            .map(|seed| interleaved_gradient_noise(uvec2(5, 7), seed))
            .collect();
        assert!(frames.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_sky_pixels_resolve_unshadowed() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        // Cleared buffer: depth 1.0 everywhere, no geometry.
        let scene = SceneBuffers::new(SIZE, SIZE);

        let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &raking_light(), &scene);
        assert_eq!(texel.occlusion, ShadowTexel::UNSHADOWED);
        assert_eq!(texel.depth, 1.0);
    }

    #[test]
    fn test_local_light_shadows_like_directional() {
        let view = test_view(0);
        let resolver = ContactShadowResolver::new(ContactShadowConfig::default());
        let scene = occluder_scene(&view);

        // A local light placed along the raking to-light direction from
        // the shading point produces the same march.
        let light = LightDescriptor::local(Vec3::new(50.0, 0.0, 40.0));
        let texel = resolver.resolve_pixel(uvec2(64, 64), &view, &light, &scene);
        assert_eq!(texel.occlusion, ShadowTexel::SHADOWED);
    }
}
