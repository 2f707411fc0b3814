// SPDX-License-Identifier: LGPL-3.0-or-later

//! Prototype low-pass filter for the QMF bank.
//!
//! For a hop of `D` the bank has modulation period `K = 2D` and a
//! prototype of `L = PERIODS·K` taps. The target response is a
//! raised-cosine low-pass with cutoff `π/K`, tapered by a Hann window.
//!
//! Perfect reconstruction needs each residue `r < D` to form a lossless
//! two-channel pair `(p[r + tK], p[r + D + tK])`. The target's pair is
//! projected onto that set by peeling off rotation/delay lattice stages
//! (each angle chosen to cancel the outermost taps as closely as
//! possible) and rebuilding the pair from the angles alone, so the
//! result is orthonormal by construction.

use std::f64::consts::{FRAC_PI_2, PI};

/// Prototype length in units of the modulation period `2·hop`.
pub const PERIODS: usize = 5;

/// Design the prototype for a given hop size (`L = 10·hop` taps).
pub fn design(hop: usize) -> Vec<f32> {
    let k = 2 * hop;
    let target = target_response(hop);
    let mut p = vec![0.0f32; k * PERIODS];

    for r in 0..hop {
        let even: Vec<f64> = (0..PERIODS).map(|t| target[r + t * k]).collect();
        let odd: Vec<f64> = (0..PERIODS).map(|t| target[r + hop + t * k]).collect();
        let angles = lattice_angles(even, odd);
        let (even, odd) = lattice_rebuild(&angles);
        for t in 0..PERIODS {
            p[r + t * k] = even[t] as f32;
            p[r + hop + t * k] = odd[t] as f32;
        }
    }
    p
}

/// Hann-tapered raised-cosine low-pass, cutoff `π/(2·hop)`.
fn target_response(hop: usize) -> Vec<f64> {
    let k = (2 * hop) as f64;
    let len = 2 * hop * PERIODS;
    let half_width = k / 4.0;
    let omega = 2.0 * PI / k;
    // sin(uω)/u with its limit at zero
    let kernel = |u: f64| {
        if u.abs() < 1e-9 {
            omega
        } else {
            (u * omega).sin() / u
        }
    };
    let centre = (len - 1) as f64 / 2.0;
    (0..len)
        .map(|n| {
            let t = n as f64 - centre;
            let taper = 0.5 + 0.5 * (2.0 * PI * t / len as f64).cos();
            (kernel(t + half_width) + kernel(t - half_width)) * taper
        })
        .collect()
}

/// Peel lattice stages off a polyphase pair, outermost first.
///
/// `angles[s]` is the rotation of stage `s`; `angles[0]` is the final
/// single-tap rotation.
fn lattice_angles(mut even: Vec<f64>, mut odd: Vec<f64>) -> [f64; PERIODS] {
    let mut angles = [0.0; PERIODS];
    for stage in (1..PERIODS).rev() {
        let (ax, ay) = (even[stage], odd[stage]);
        let (bx, by) = (odd[0], -even[0]);
        let m00 = ax * ax + bx * bx;
        let m01 = ax * ay + bx * by;
        let m11 = ay * ay + by * by;
        // Minor eigenvector of the 2x2 scatter matrix
        let theta = 0.5 * (2.0 * m01).atan2(m00 - m11) + FRAC_PI_2;
        let (s, c) = theta.sin_cos();

        let rotated_even: Vec<f64> = (0..stage).map(|i| c * even[i] + s * odd[i]).collect();
        let rotated_odd: Vec<f64> = (1..=stage).map(|i| -s * even[i] + c * odd[i]).collect();
        even = rotated_even;
        odd = rotated_odd;
        angles[stage] = theta;
    }
    angles[0] = odd[0].atan2(even[0]);
    angles
}

/// Rebuild a unit-energy lossless pair from lattice angles.
fn lattice_rebuild(angles: &[f64; PERIODS]) -> (Vec<f64>, Vec<f64>) {
    let (s0, c0) = angles[0].sin_cos();
    let mut even = vec![c0];
    let mut odd = vec![s0];
    for &theta in &angles[1..] {
        odd.insert(0, 0.0);
        even.push(0.0);
        let (s, c) = theta.sin_cos();
        let next_even = even.iter().zip(&odd).map(|(&x, &y)| c * x - s * y).collect();
        let next_odd = even.iter().zip(&odd).map(|(&x, &y)| s * x + c * y).collect();
        even = next_even;
        odd = next_odd;
    }
    (even, odd)
}
