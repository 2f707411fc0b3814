// SPDX-License-Identifier: LGPL-3.0-or-later
//
// Round-trip tests for the FFT engine over power-of-two and
// non-power-of-two lengths: forward followed by backward must reproduce
// the input within 1e-5 for both the real and the complex transform.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use streamdsp_lib::fft::{Fft, FftBackendKind, RealFft};
use streamdsp_lib::Complex32;

const TOLERANCE: f32 = 1e-5;

const SIZES: [usize; 24] = [
    16, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536, 1048576, // 2^x
    80, 160, 320, 640, 1280, 240, 480, 960, 1920, 3840, 7680, 15360, 30720,
];

/// Generate a deterministic pseudo-random test signal in [-1, 1].
fn gen_test_signal(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect()
}

fn assert_within(name: &str, expected: &[f32], actual: &[f32]) {
    assert_eq!(expected.len(), actual.len());
    for (i, (&e, &a)) in expected.iter().zip(actual.iter()).enumerate() {
        assert!(
            (e - a).abs() <= TOLERANCE,
            "{name}: sample {i} mismatch: expected={e} got={a}"
        );
    }
}

#[test]
fn real_fft_roundtrip_all_sizes() {
    for (seed, &n) in SIZES.iter().enumerate() {
        let x = gen_test_signal(seed as u64, n);
        let mut fft = RealFft::new(n).unwrap();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];
        let mut y = vec![0.0f32; n];

        fft.forward(&x, &mut spectrum).unwrap();
        fft.backward(&spectrum, &mut y).unwrap();

        assert_within(&format!("rfft n={n}"), &x, &y);
    }
}

#[test]
fn complex_fft_roundtrip_all_sizes() {
    for (seed, &n) in SIZES.iter().enumerate() {
        let flat = gen_test_signal(100 + seed as u64, 2 * n);
        let x: Vec<Complex32> = flat
            .chunks_exact(2)
            .map(|c| Complex32::new(c[0], c[1]))
            .collect();
        let mut fft = Fft::new(n).unwrap();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); n];
        let mut y = vec![Complex32::new(0.0, 0.0); n];

        fft.forward(&x, &mut spectrum).unwrap();
        fft.backward(&spectrum, &mut y).unwrap();

        let re_x: Vec<f32> = x.iter().map(|c| c.re).collect();
        let im_x: Vec<f32> = x.iter().map(|c| c.im).collect();
        let re_y: Vec<f32> = y.iter().map(|c| c.re).collect();
        let im_y: Vec<f32> = y.iter().map(|c| c.im).collect();
        assert_within(&format!("fft n={n} (re)"), &re_x, &re_y);
        assert_within(&format!("fft n={n} (im)"), &im_x, &im_y);
    }
}

#[test]
fn odd_lengths_roundtrip() {
    for (seed, &n) in [3usize, 15, 81, 441, 1001].iter().enumerate() {
        let x = gen_test_signal(200 + seed as u64, n);
        let mut fft = RealFft::new(n).unwrap();
        assert_eq!(fft.backend(), FftBackendKind::PackedComplex);
        let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];
        let mut y = vec![0.0f32; n];

        fft.forward(&x, &mut spectrum).unwrap();
        fft.backward(&spectrum, &mut y).unwrap();

        assert_within(&format!("rfft n={n}"), &x, &y);
    }
}

#[test]
fn real_fft_matches_complex_fft() {
    let n = 960;
    let x = gen_test_signal(7, n);
    let xc: Vec<Complex32> = x.iter().map(|&v| Complex32::new(v, 0.0)).collect();

    let mut rfft = RealFft::new(n).unwrap();
    let mut cfft = Fft::new(n).unwrap();
    let mut half = vec![Complex32::new(0.0, 0.0); rfft.num_bins()];
    let mut full = vec![Complex32::new(0.0, 0.0); n];
    rfft.forward(&x, &mut half).unwrap();
    cfft.forward(&xc, &mut full).unwrap();

    for k in 0..half.len() {
        assert!(
            (half[k] - full[k]).norm() < 1e-3,
            "bin {k}: real={} complex={}",
            half[k],
            full[k]
        );
    }
}
