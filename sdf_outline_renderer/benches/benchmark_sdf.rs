use criterion::{criterion_group, criterion_main, Criterion};
use sdf_outline_renderer::{render_sdf_from_outline, OutlineBuilder};
use std::hint::black_box;

pub fn benchmark_sdf(c: &mut Criterion) {
    c.bench_function("benchmark standard sdf gen", |b| {
        // Roughly the size of an ampersand at 24px
        let mut builder = OutlineBuilder::default();
        builder.move_to(1.0, 0.0);
        builder.quad_to(8.0, 19.0, 15.0, 0.0);
        builder.line_to(12.0, 0.0);
        builder.quad_to(8.0, 12.0, 4.0, 0.0);
        builder.move_to(5.0, 3.0);
        builder.curve_to(6.0, 8.0, 10.0, 8.0, 11.0, 3.0);
        let outline = black_box(builder.finish());
        b.iter(|| render_sdf_from_outline(&outline, 3, 8))
    });
}

criterion_group!(benches, benchmark_sdf);
criterion_main!(benches);
