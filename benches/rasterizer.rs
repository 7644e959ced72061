use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use softview::bench::Renderer;
use softview::face::FaceList;
use softview::material::Material;
use softview::mesh::Mesh;
use softview::scene::Scene;
use softview::texture::Texture;
use softview::transform::ViewTransform;
use softview::{Definition, RenderConfig, RenderMode};

const DISPLAY_WIDTH: u32 = 800;
const DISPLAY_HEIGHT: u32 = 600;

/// A rippled `n` x `n` quad grid with a uv per vertex.
fn grid_mesh(n: u32) -> Mesh {
    let mut vertices = Vec::new();
    let mut tex_coords = Vec::new();
    for row in 0..=n {
        for col in 0..=n {
            let (u, v) = (col as f32 / n as f32, row as f32 / n as f32);
            let height = 0.1 * ((u * 12.0).sin() + (v * 9.0).cos());
            vertices.extend_from_slice(&[u * 2.0 - 1.0, height, v * 2.0 - 1.0]);
            tex_coords.extend_from_slice(&[u, v]);
        }
    }
    let stride = n + 1;
    let quads: Vec<[u32; 4]> = (0..n)
        .flat_map(|row| {
            (0..n).map(move |col| {
                let i = row * stride + col;
                [i, i + stride, i + stride + 1, i + 1]
            })
        })
        .collect();
    let faces = FaceList::from_polygons(&quads);
    let indices = faces.corner_indices().to_vec();
    Mesh::new("grid", vertices, faces).with_tex_coords(tex_coords, Some(indices))
}

fn checker_texture() -> Arc<Texture> {
    let texels = (0..256 * 256)
        .map(|i| {
            let (x, y) = (i % 256, i / 256);
            if (x / 32 + y / 32) % 2 == 0 {
                0xffe0e0e0
            } else {
                0xff303030
            }
        })
        .collect();
    Arc::new(Texture::from_texels("checker", 256, texels, true).expect("power of two"))
}

fn grid_scene(n: u32) -> Scene {
    let mut scene = Scene::new();
    scene.add_child(grid_mesh(n).with_texture(checker_texture()));
    scene.init();
    scene
}

fn view_for(scene: &Scene) -> ViewTransform {
    let mut view = ViewTransform::new(softview::math::vec3::Vec3::new(-30.0, 20.0, 0.0), 0.0);
    view.reset(scene.aabb().as_ref(), DISPLAY_WIDTH, DISPLAY_HEIGHT);
    view
}

fn benchmark_render_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_mode");
    let mut scene = grid_scene(64);
    let view = view_for(&scene);
    let material = Material::default_for(softview::colors::DEFAULT_MODEL_COLOR);

    for mode in [
        RenderMode::Point,
        RenderMode::Wireframe,
        RenderMode::Flat,
        RenderMode::Smooth,
        RenderMode::Texture,
        RenderMode::TextureFlat,
        RenderMode::TextureSmooth,
    ] {
        let config = RenderConfig::default().with_render_mode(mode);
        let mut renderer = Renderer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT, &config);
        group.bench_with_input(BenchmarkId::from_parameter(mode), &config, |b, config| {
            b.iter(|| {
                renderer.begin_frame();
                renderer.render(black_box(&mut scene), &view, config, &material, None);
            });
        });
    }

    group.finish();
}

fn benchmark_definitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_frame");
    let mut scene = grid_scene(32);
    let view = view_for(&scene);
    let material = Material::default_for(softview::colors::DEFAULT_MODEL_COLOR);

    for definition in [Definition::Low, Definition::Standard, Definition::High] {
        let config = RenderConfig::default()
            .with_render_mode(RenderMode::Smooth)
            .with_definition(definition);
        let mut renderer = Renderer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT, &config);
        group.bench_with_input(
            BenchmarkId::from_parameter(definition),
            &config,
            |b, config| {
                b.iter(|| {
                    renderer.begin_frame();
                    renderer.render(black_box(&mut scene), &view, config, &material, None);
                    renderer.end_frame();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_render_modes, benchmark_definitions);
criterion_main!(benches);
