use criterion::{black_box, criterion_group, criterion_main, Criterion};

use photobooth::{
    filters::{FilterRegistry, FilterSelection},
    frame::{FrameSize, FrameSource, PixelBuffer, TestPatternSource},
    transform,
};

fn camera_frame() -> PixelBuffer {
    TestPatternSource::new(FrameSize::DEFAULT)
        .with_noise(0.2)
        .current_frame()
        .expect("test pattern frame")
}

fn bench_kernels(c: &mut Criterion) {
    let registry = FilterRegistry::new();
    let frame = camera_frame();
    let region = frame.full_region();

    let mut group = c.benchmark_group("kernels_640x480");
    for filter in [FilterSelection::Sepia, FilterSelection::Contrast, FilterSelection::Blur] {
        group.bench_function(filter.as_str(), |b| {
            b.iter_batched_ref(
                || frame.clone(),
                |buffer| registry.apply(filter, black_box(buffer), region),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_mirror(c: &mut Criterion) {
    let frame = camera_frame();
    let mut preview = PixelBuffer::new_transparent(frame.size());
    let region = preview.full_region();

    c.bench_function("draw_frame_mirrored_640x480", |b| {
        b.iter(|| transform::draw_frame(&mut preview, black_box(&frame), region, true))
    });
}

criterion_group!(benches, bench_kernels, bench_mirror);
criterion_main!(benches);
