//! Benchmarks for scalogram generation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scalogram::{assemble, zoom, CwtConfig, CwtTransformer};

fn test_signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 * 1e-7;
            (2.0 * std::f64::consts::PI * 150e3 * t).sin() + 0.3 * (i as f64 * 0.7).cos()
        })
        .collect()
}

fn benchmark_cwt(c: &mut Criterion) {
    let mut transformer = CwtTransformer::new(CwtConfig::default()).unwrap();
    let channel = test_signal(1001);

    c.bench_function("cwt_1001_samples", |b| {
        b.iter(|| transformer.transform(black_box(&channel)).unwrap())
    });
}

fn benchmark_assembly(c: &mut Criterion) {
    let mut transformer = CwtTransformer::new(CwtConfig::default()).unwrap();
    let image = transformer.transform(&test_signal(1001)).unwrap();
    let images = vec![image.clone(), image.clone(), image.clone()];

    c.bench_function("zoom_256x1001_to_224x74", |b| {
        b.iter(|| zoom(black_box(&image), (224, 74)).unwrap())
    });

    c.bench_function("assemble_three_channels", |b| {
        b.iter(|| assemble(black_box(&images)).unwrap())
    });
}

criterion_group!(benches, benchmark_cwt, benchmark_assembly);
criterion_main!(benches);
