// SPDX-License-Identifier: LGPL-3.0-or-later

//! Criterion benchmarks for the partitioned matrix convolver.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use streamdsp_units::conv::{MatrixConv, MatrixConvConfig, MultiConv, MultiConvConfig};

const BLOCK_SIZE: usize = 512;

/// Generate a deterministic white noise buffer using a simple LCG.
fn white_noise(len: usize) -> Vec<f32> {
    let mut state: u64 = 0xDEAD_BEEF_CAFE_BABE;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 33) as i32) as f32 / (i32::MAX as f32)
        })
        .collect()
}

/// Generate `count` decaying impulse responses of given length, back to back.
fn make_irs(count: usize, len: usize) -> Vec<f32> {
    (0..count * len)
        .map(|i| {
            let t = (i % len) as f32 / len as f32;
            (-3.0 * t).exp() * (1.0 - t)
        })
        .collect()
}

fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_conv_4x2");
    let input = vec![white_noise(BLOCK_SIZE); 4];
    let mut output = vec![vec![0.0f32; BLOCK_SIZE]; 2];

    for &filter_len in &[256, 1024, 4096, 16384] {
        let config = MatrixConvConfig {
            block_size: BLOCK_SIZE,
            in_channels: 4,
            out_channels: 2,
            filter_len,
        };
        let filters = make_irs(8, filter_len);

        group.bench_with_input(
            BenchmarkId::new("apply", filter_len),
            &filter_len,
            |b, _| {
                let mut conv = MatrixConv::new(config, &filters).unwrap();
                // Fill the spectrum delay lines before timing
                for _ in 0..conv.num_partitions() {
                    conv.apply(&input, &mut output).unwrap();
                }
                b.iter(|| {
                    conv.apply(black_box(&input), black_box(&mut output)).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_multi(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_conv_2ch");
    let input = vec![white_noise(BLOCK_SIZE); 2];
    let mut output = vec![vec![0.0f32; BLOCK_SIZE]; 2];

    for &filter_len in &[256, 4096] {
        let config = MultiConvConfig {
            block_size: BLOCK_SIZE,
            channels: 2,
            filter_len,
        };
        let filters = make_irs(2, filter_len);

        group.bench_with_input(
            BenchmarkId::new("apply", filter_len),
            &filter_len,
            |b, _| {
                let mut conv = MultiConv::new(config, &filters).unwrap();
                b.iter(|| {
                    conv.apply(black_box(&input), black_box(&mut output)).unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_matrix, bench_multi);
criterion_main!(benches);
