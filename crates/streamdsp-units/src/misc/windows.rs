// SPDX-License-Identifier: LGPL-3.0-or-later

//! Window functions for short-time analysis and synthesis.
//!
//! Symmetric windows (`hann`) touch zero at both ends and suit filter
//! design. Periodic windows (`periodic_hann`, `sqrt_periodic_hann`) are
//! one sample of a length-`N` period and overlap-add to a constant when
//! shifted by any integer divisor of `N` smaller than `N`.

use std::f32::consts::PI;

/// Generate a rectangular window (all ones).
pub fn rectangular(dst: &mut [f32]) {
    dst.fill(1.0);
}

/// Raised cosine `a - b·cos(2πi/period)`.
fn hamming_general(dst: &mut [f32], a: f32, b: f32, period: usize) {
    if period == 0 {
        dst.fill(a - b);
        return;
    }
    let f = 2.0 * PI / period as f32;
    for (i, sample) in dst.iter_mut().enumerate() {
        *sample = a - b * (i as f32 * f).cos();
    }
}

/// Generate a symmetric Hann window.
pub fn hann(dst: &mut [f32]) {
    let n = dst.len();
    hamming_general(dst, 0.5, 0.5, n.saturating_sub(1));
}

/// Generate a periodic Hann window.
pub fn periodic_hann(dst: &mut [f32]) {
    let n = dst.len();
    hamming_general(dst, 0.5, 0.5, n);
}

/// Generate the square root of a periodic Hann window.
pub fn sqrt_periodic_hann(dst: &mut [f32]) {
    periodic_hann(dst);
    for sample in dst.iter_mut() {
        *sample = sample.max(0.0).sqrt();
    }
}

/// Fill `analysis` and `synthesis` with a window pair whose product
/// overlap-adds to exactly one at a shift of `hop` samples.
///
/// `hop == len` gives rectangular windows; any other divisor gives
/// √Hann windows scaled by `√(2·hop/len)`.
pub fn overlap_add_pair(analysis: &mut [f32], synthesis: &mut [f32], hop: usize) {
    let len = analysis.len();
    if hop >= len {
        rectangular(analysis);
        rectangular(synthesis);
        return;
    }
    sqrt_periodic_hann(analysis);
    let gain = (2.0 * hop as f32 / len as f32).sqrt();
    for sample in analysis.iter_mut() {
        *sample *= gain;
    }
    synthesis.copy_from_slice(analysis);
}
