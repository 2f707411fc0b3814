// SPDX-License-Identifier: LGPL-3.0-or-later

//! Complex arithmetic on interleaved `Complex32` buffers.
//!
//! Spectra produced by [`crate::fft`] are stored as `Complex32` slices
//! (array-of-structs), which is the layout `rustfft` and `realfft` work
//! in. All functions process `min(len)` elements of their arguments.

use multiversion::multiversion;
use num_complex::Complex32;

/// Complex multiply-accumulate: `acc[i] += a[i] * b[i]`.
///
/// This is the inner loop of frequency-domain convolution.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mul_acc(acc: &mut [Complex32], a: &[Complex32], b: &[Complex32]) {
    for ((d, x), y) in acc.iter_mut().zip(a.iter()).zip(b.iter()) {
        d.re += x.re * y.re - x.im * y.im;
        d.im += x.re * y.im + x.im * y.re;
    }
}

/// Modulate a real sequence: `dst[i] = re[i] * tw[i]`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mul_real(dst: &mut [Complex32], re: &[f32], tw: &[Complex32]) {
    for ((d, &x), t) in dst.iter_mut().zip(re.iter()).zip(tw.iter()) {
        *d = Complex32::new(x * t.re, x * t.im);
    }
}

/// Real part of a scaled product: `dst[i] = k * Re(a[i] * b[i])`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mul_re(dst: &mut [f32], a: &[Complex32], b: &[Complex32], k: f32) {
    for ((d, x), y) in dst.iter_mut().zip(a.iter()).zip(b.iter()) {
        *d = k * (x.re * y.re - x.im * y.im);
    }
}

/// Scale in-place: `dst[i] *= k`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn scale(dst: &mut [Complex32], k: f32) {
    for d in dst.iter_mut() {
        d.re *= k;
        d.im *= k;
    }
}
