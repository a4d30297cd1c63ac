//! Benchmarks for batch execution on both adaptors.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use strata_render::{
    BatchTexture, BatchablePrimitive, BlendMode, GraphicsRenderable, PaintContextId,
    RenderBackend, Renderer, RendererOptions,
};
use strata_test_utils::{GpuGeometry, GpuSampler, GpuTexture, MockGlEncoder, MockGpuEncoder};

const PRIMITIVES_PER_CONTEXT: u32 = 8;

fn populate(renderer: &mut Renderer, count: u64) -> Vec<GraphicsRenderable> {
    (0..count)
        .map(|i| {
            let id = PaintContextId::new(i + 1);
            let primitives = (0..PRIMITIVES_PER_CONTEXT)
                .map(|p| BatchablePrimitive {
                    start: p * 6,
                    size: 6,
                    texture: Some(BatchTexture {
                        texture: GpuTexture::new(u64::from(p % 3) + 1, 64, 64),
                        sampler: GpuSampler::new(1),
                    }),
                    blend_mode: if p % 4 == 3 { BlendMode::Add } else { BlendMode::Normal },
                })
                .collect();
            renderer
                .update_context(id, GpuGeometry::new(i + 1, PRIMITIVES_PER_CONTEXT * 6), primitives)
                .unwrap();
            GraphicsRenderable::new(id).with_color(0xFF80_8080)
        })
        .collect()
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");

    for count in [10u64, 100, 1000] {
        group.throughput(Throughput::Elements(count));

        let gl = Arc::new(MockGlEncoder::new());
        let mut legacy =
            Renderer::from_backend(&RenderBackend::Legacy(gl.clone()), &RendererOptions::default())
                .unwrap();
        let renderables = populate(&mut legacy, count);
        group.bench_with_input(BenchmarkId::new("legacy", count), &renderables, |b, renderables| {
            b.iter(|| {
                let stats = legacy.render(black_box(renderables)).unwrap();
                gl.clear_calls();
                stats
            });
        });

        let gpu = Arc::new(MockGpuEncoder::new());
        let mut modern =
            Renderer::from_backend(&RenderBackend::Modern(gpu.clone()), &RendererOptions::default())
                .unwrap();
        let renderables = populate(&mut modern, count);
        group.bench_with_input(BenchmarkId::new("modern", count), &renderables, |b, renderables| {
            b.iter(|| {
                let stats = modern.render(black_box(renderables)).unwrap();
                gpu.clear_calls();
                stats
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_frame);
criterion_main!(benches);
