// SPDX-License-Identifier: LGPL-3.0-or-later

//! Packed (element-wise) and scalar operations on float buffers.
//!
//! These are the windowing and overlap-add primitives used by the
//! streaming transforms. All functions process `min(len)` elements.

use multiversion::multiversion;

/// Element-wise multiply: `dst[i] = a[i] * b[i]`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mul(dst: &mut [f32], a: &[f32], b: &[f32]) {
    for ((d, &x), &y) in dst.iter_mut().zip(a.iter()).zip(b.iter()) {
        *d = x * y;
    }
}

/// Element-wise multiply-accumulate: `dst[i] += a[i] * b[i]`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn mul_acc(dst: &mut [f32], a: &[f32], b: &[f32]) {
    for ((d, &x), &y) in dst.iter_mut().zip(a.iter()).zip(b.iter()) {
        *d += x * y;
    }
}

/// Element-wise accumulate: `dst[i] += src[i]`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn add(dst: &mut [f32], src: &[f32]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d += s;
    }
}

/// Scale buffer in-place: `dst[i] *= k`.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+avx", "x86_64+sse4.1", "aarch64+neon",))]
pub fn scale(dst: &mut [f32], k: f32) {
    for d in dst.iter_mut() {
        *d *= k;
    }
}
