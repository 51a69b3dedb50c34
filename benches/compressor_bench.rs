//! Benchmarks for the compressor.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use squash_preview::audio::{
    compress, generate_kick_loop, generate_white_noise, render_compressed, CompressorParams,
    ExportOptions, SampleBuffer, Viewport,
};

const SAMPLE_RATE: u32 = 44100;

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("Compress");
    let params = CompressorParams::new(-18.0, 4.0, 5.0, 120.0);

    for duration in [1.0, 5.0, 30.0] {
        let samples = generate_white_noise(SAMPLE_RATE, duration, 0.8, 42);

        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("white_noise", format!("{}s", duration)),
            &samples,
            |b, samples| {
                b.iter(|| {
                    black_box(compress(samples, SAMPLE_RATE, &params));
                });
            },
        );
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("Export");
    let params = CompressorParams::new(-12.0, 6.0, 1.0, 80.0);
    let loop_ = generate_kick_loop(128.0, SAMPLE_RATE, 10.0);
    let source = SampleBuffer::new(vec![loop_.clone(), loop_], SAMPLE_RATE);

    for normalize in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("stereo_10s", if normalize { "normalized" } else { "raw" }),
            &normalize,
            |b, &normalize| {
                b.iter(|| {
                    black_box(render_compressed(
                        &source,
                        Viewport::full(&source),
                        &params,
                        ExportOptions { normalize },
                    ));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compress, bench_export);
criterion_main!(benches);
