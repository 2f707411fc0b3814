// SPDX-License-Identifier: LGPL-3.0-or-later

//! Hybrid stage: finer frequency resolution for the lowest QMF bands.
//!
//! QMF band 0 is split eight ways by a 13-tap modulated Nyquist filter
//! and its outer sub-bands are merged, leaving four outputs. Bands 1 and
//! 2 are split two ways. Every other band is delayed by the filter's
//! group delay of six slots, so all outputs stay time-aligned.
//!
//! Each split's sub-band filters sum to a pure six-slot delay, which
//! makes synthesis a plain sum of the sub-bands.

use crate::misc::windows;
use num_complex::Complex64;
use once_cell::sync::Lazy;
use std::f64::consts::PI;
use streamdsp_lib::Complex32;

/// Taps per sub-band filter.
pub const TAPS: usize = 13;

/// Group delay of the hybrid filters, in slots.
pub const DELAY: usize = 6;

/// Number of QMF bands that are split.
pub const SPLIT_BANDS: usize = 3;

/// Bands added by the hybrid stage (`4 + 2 + 2 - 3`).
pub const EXTRA_BANDS: usize = 5;

/// Sub-band filters for one split QMF band.
#[derive(Debug, Clone)]
pub struct Split {
    /// QMF band index being split.
    pub band: usize,
    /// One filter per output sub-band.
    pub filters: Vec<[Complex32; TAPS]>,
    /// Sub-band centre offsets from the QMF band centre, in units of
    /// `sample_rate / hop`.
    pub centre_offsets: Vec<f32>,
}

/// Filters for QMF bands 0, 1 and 2.
pub static SPLITS: Lazy<[Split; SPLIT_BANDS]> = Lazy::new(|| {
    [
        split(
            0,
            8,
            &[&[0, 1, 2], &[3], &[4], &[5, 6, 7]],
            &[-3.0 / 16.0, -1.0 / 16.0, 1.0 / 16.0, 3.0 / 16.0],
        ),
        split(1, 2, &[&[0], &[1]], &[-1.0 / 8.0, 1.0 / 8.0]),
        split(2, 2, &[&[0], &[1]], &[-1.0 / 8.0, 1.0 / 8.0]),
    ]
});

/// Windowed-sinc low-pass with cutoff `π/q`, exactly zero at the
/// non-central multiples of `q`.
fn nyquist_lowpass(q: usize) -> [f64; TAPS] {
    // A 15-point symmetric Hann without its zero end points
    let mut taper = [0.0f32; TAPS + 2];
    windows::hann(&mut taper);

    let mut h = [0.0f64; TAPS];
    for (n, v) in h.iter_mut().enumerate() {
        let t = n as isize - DELAY as isize;
        *v = if t == 0 {
            1.0 / q as f64
        } else if t % q as isize == 0 {
            0.0
        } else {
            let x = PI * t as f64 / q as f64;
            x.sin() / x / q as f64 * taper[n + 1] as f64
        };
    }
    h
}

fn split(band: usize, q: usize, groups: &[&[usize]], centre_offsets: &[f32]) -> Split {
    let h = nyquist_lowpass(q);
    let phase = PI * (band as f64 + 0.5);
    let filters = groups
        .iter()
        .map(|group| {
            let mut g = [Complex32::new(0.0, 0.0); TAPS];
            for (n, tap) in g.iter_mut().enumerate() {
                let m = n as f64 - DELAY as f64;
                let sum: Complex64 = group
                    .iter()
                    .map(|&sub| {
                        let omega = phase + 2.0 * PI * (sub as f64 + 0.5) / q as f64 - PI;
                        Complex64::from_polar(h[n], omega * m)
                    })
                    .sum();
                *tap = Complex32::new(sum.re as f32, sum.im as f32);
            }
            g
        })
        .collect();
    Split {
        band,
        filters,
        centre_offsets: centre_offsets.to_vec(),
    }
}

/// Per-channel analysis state of the hybrid stage.
#[derive(Debug, Clone)]
pub(crate) struct HybridState {
    /// Last `TAPS` samples of each split band, circular.
    history: Vec<Complex32>,
    pos: usize,
    /// Last `DELAY` slots of the unsplit bands, circular.
    delay: Vec<Complex32>,
    delay_pos: usize,
    unsplit: usize,
}

impl HybridState {
    pub(crate) fn new(hop: usize) -> Self {
        let unsplit = hop - SPLIT_BANDS;
        Self {
            history: vec![Complex32::new(0.0, 0.0); SPLIT_BANDS * TAPS],
            pos: 0,
            delay: vec![Complex32::new(0.0, 0.0); DELAY * unsplit],
            delay_pos: 0,
            unsplit,
        }
    }

    /// Turn one slot of `hop` QMF bands into `hop + EXTRA_BANDS` hybrid
    /// bands.
    pub(crate) fn analyse(&mut self, qmf: &[Complex32], out: &mut [Complex32]) {
        self.pos = (self.pos + 1) % TAPS;
        for b in 0..SPLIT_BANDS {
            self.history[b * TAPS + self.pos] = qmf[b];
        }

        let mut o = 0;
        for (b, split) in SPLITS.iter().enumerate() {
            let hist = &self.history[b * TAPS..(b + 1) * TAPS];
            for g in &split.filters {
                let mut acc = Complex32::new(0.0, 0.0);
                for (n, &tap) in g.iter().enumerate() {
                    acc += tap * hist[(self.pos + TAPS - n) % TAPS];
                }
                out[o] = acc;
                o += 1;
            }
        }

        let start = self.delay_pos * self.unsplit;
        let slot = &mut self.delay[start..start + self.unsplit];
        out[o..o + self.unsplit].copy_from_slice(slot);
        slot.copy_from_slice(&qmf[SPLIT_BANDS..SPLIT_BANDS + self.unsplit]);
        self.delay_pos = (self.delay_pos + 1) % DELAY;
    }

    pub(crate) fn clear(&mut self) {
        self.history.fill(Complex32::new(0.0, 0.0));
        self.delay.fill(Complex32::new(0.0, 0.0));
        self.pos = 0;
        self.delay_pos = 0;
    }
}

/// Sum hybrid sub-bands back into `hop` QMF bands.
pub(crate) fn merge(bands: &[Complex32], qmf: &mut [Complex32]) {
    let mut o = 0;
    for (b, split) in SPLITS.iter().enumerate() {
        let n = split.filters.len();
        qmf[b] = bands[o..o + n].iter().sum();
        o += n;
    }
    let rest = qmf.len() - SPLIT_BANDS;
    qmf[SPLIT_BANDS..].copy_from_slice(&bands[o..o + rest]);
}
