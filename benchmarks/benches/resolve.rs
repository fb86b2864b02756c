use criterion::{criterion_group, criterion_main, Criterion};
use std::f32::consts::FRAC_PI_2;
use std::hint::black_box;
use umbra::glam::{uvec2, Mat4, Vec3};
use umbra::{
    ContactShadowConfig, ContactShadowResolver, LightDescriptor, Quality, SceneBuffers,
    TranslatedWorldPos, ViewDescriptor, ViewTransforms,
};

const SIZE: u32 = 256;

fn bench_view(seed: u32) -> ViewDescriptor {
    let proj = Mat4::perspective_rh(FRAC_PI_2, 1.0, 0.1, 100.0);
    let transforms = ViewTransforms::from_view_proj(Mat4::IDENTITY, proj, Vec3::ZERO);
    ViewDescriptor::fullscreen(transforms, uvec2(SIZE, SIZE), seed)
}

/// Plane at 10 units with a nearer slab over the right half: a mix of
/// early-hit, full-march, and off-screen pixels.
fn bench_scene(view: &ViewDescriptor) -> SceneBuffers {
    let depth_at = |dist: f32| {
        view.transforms()
            .project(TranslatedWorldPos(Vec3::new(0.0, 0.0, -dist)))
            .depth()
    };
    let mut scene = SceneBuffers::uniform(SIZE, SIZE, depth_at(10.0), Vec3::Z);
    scene.fill_pixel_rect(SIZE / 2..SIZE, 0..SIZE, depth_at(9.8), Vec3::Z);
    scene
}

fn bench_resolve(c: &mut Criterion) {
    let view = bench_view(0);
    let scene = bench_scene(&view);
    let light = LightDescriptor::directional(Vec3::new(-1.0, 0.0, -1.0));

    let mut group = c.benchmark_group("resolve");
    for quality in [Quality::Low, Quality::Medium, Quality::Ultra] {
        let resolver = ContactShadowResolver::new(ContactShadowConfig::preset(quality));
        group.bench_function(format!("{SIZE}x{SIZE}_{quality:?}"), |b| {
            b.iter(|| black_box(resolver.resolve(&view, &light, &scene)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
