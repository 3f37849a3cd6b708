// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tvd_core::ExecutionContext;
use tvd_filter::{StreamingTvFilter, TvFilter, TvFilterConfig};

const SIZES: [usize; 3] = [10_000, 100_000, 1_000_000];
const LAMBDA: f64 = 1.0;

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn uniform(state: &mut u64) -> f64 {
    (lcg_next(state) >> 11) as f64 / (1u64 << 53) as f64
}

/// Integer levels in [-10, 10] held for 30 samples, plus noise in [-0.1, 0.1].
fn stepped_series(n: usize) -> Vec<f64> {
    let mut state = 0x5eed_1dea_cafe_f00d_u64;
    let mut level = 0.0;
    (0..n)
        .map(|idx| {
            if idx % 30 == 0 {
                level = (lcg_next(&mut state) % 21) as f64 - 10.0;
            }
            level + (uniform(&mut state) * 0.2 - 0.1)
        })
        .collect()
}

/// White noise only; the envelopes stay short and most runs settle quickly.
fn noise_series(n: usize) -> Vec<f64> {
    let mut state = 0xdead_beef_0bad_cafe_u64;
    (0..n).map(|_| uniform(&mut state) * 2.0 - 1.0).collect()
}

fn benchmark_batch_filter(c: &mut Criterion) {
    let filter =
        TvFilter::new(TvFilterConfig::with_lambda(LAMBDA)).expect("benchmark config is valid");
    let ctx = ExecutionContext::new();

    let mut group = c.benchmark_group("tv1d_batch");
    for &n in &SIZES {
        group.throughput(Throughput::Elements(n as u64));

        let stepped = stepped_series(n);
        group.bench_with_input(BenchmarkId::new("stepped", n), &stepped, |b, input| {
            b.iter(|| {
                let result = filter
                    .filter(black_box(input.as_slice()), &ctx)
                    .expect("filter should succeed");
                black_box(result.values);
            })
        });

        let noise = noise_series(n);
        group.bench_with_input(BenchmarkId::new("noise", n), &noise, |b, input| {
            b.iter(|| {
                let result = filter
                    .filter(black_box(input.as_slice()), &ctx)
                    .expect("filter should succeed");
                black_box(result.values);
            })
        });
    }
    group.finish();
}

fn benchmark_streaming_filter(c: &mut Criterion) {
    let n = 100_000;
    let input = stepped_series(n);
    let ctx = ExecutionContext::new();

    let mut group = c.benchmark_group("tv1d_streaming");
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("stepped_n1e5", |b| {
        let mut output = Vec::with_capacity(n);
        let mut stream = StreamingTvFilter::<f64>::new(TvFilterConfig::with_lambda(LAMBDA))
            .expect("benchmark config is valid");
        b.iter(|| {
            output.clear();
            stream.reset();
            for &x in &input {
                stream
                    .push(black_box(x), &mut output)
                    .expect("push should succeed");
            }
            stream
                .finish(&mut output, &ctx)
                .expect("finish should succeed");
            black_box(output.len());
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_batch_filter, benchmark_streaming_filter);
criterion_main!(benches);
