// SPDX-License-Identifier: LGPL-3.0-or-later

//! Criterion benchmarks for FFT operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::f32::consts::PI;
use streamdsp_lib::fft::{Fft, RealFft};
use streamdsp_lib::Complex32;

const SIZES: [usize; 8] = [256, 512, 1024, 2048, 4096, 960, 1920, 30720];

/// Generate a sine sweep test signal of given length.
fn sine_sweep(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / len as f32;
            (2.0 * PI * 1000.0 * t * t).sin()
        })
        .collect()
}

fn bench_rfft_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("rfft_forward");

    for &n in &SIZES {
        let src = sine_sweep(n);
        let mut fft = RealFft::new(n).unwrap();
        let mut dst = vec![Complex32::new(0.0, 0.0); fft.num_bins()];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                fft.forward(black_box(&src), black_box(&mut dst)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_rfft_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("rfft_roundtrip");

    for &n in &SIZES {
        let src = sine_sweep(n);
        let mut fft = RealFft::new(n).unwrap();
        let mut freq = vec![Complex32::new(0.0, 0.0); fft.num_bins()];
        let mut dst = vec![0.0f32; n];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                fft.forward(black_box(&src), black_box(&mut freq)).unwrap();
                fft.backward(black_box(&freq), black_box(&mut dst)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_fft_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_roundtrip");

    for &n in &SIZES {
        let src: Vec<Complex32> = sine_sweep(n)
            .into_iter()
            .map(|v| Complex32::new(v, 0.0))
            .collect();
        let mut fft = Fft::new(n).unwrap();
        let mut freq = vec![Complex32::new(0.0, 0.0); n];
        let mut dst = vec![Complex32::new(0.0, 0.0); n];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                fft.forward(black_box(&src), black_box(&mut freq)).unwrap();
                fft.backward(black_box(&freq), black_box(&mut dst)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rfft_forward,
    bench_rfft_roundtrip,
    bench_fft_roundtrip
);
criterion_main!(benches);
