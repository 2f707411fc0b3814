// SPDX-License-Identifier: LGPL-3.0-or-later

//! Uniformly-partitioned overlap-save convolution core.
//!
//! A filter of `L` taps is cut into `P = ceil(L / B)` partitions of `B`
//! taps. Each partition is zero-padded to `2B` and transformed once. For
//! every input block the last two blocks `[x_{j-1}, x_j]` are transformed
//! and stored in a spectrum delay line. An output is the sum over
//! partitions `p` of `H_p · X_{j-p}`; its inverse transform's second
//! half is the exact linear convolution for block `j`.

use crate::util::shift_buffer::ShiftBuffer;
use crate::util::spectrum_ring::SpectrumRing;
use streamdsp_lib::fft::RealFft;
use streamdsp_lib::{complex, Complex32, Result};

/// Frequency-domain partitions of one FIR filter.
#[derive(Debug, Clone)]
pub struct FilterSpectra {
    /// `num_partitions × bins`, partition-major.
    spectra: Vec<Complex32>,
    bins: usize,
}

impl FilterSpectra {
    pub fn num_partitions(&self) -> usize {
        self.spectra.len() / self.bins
    }

    pub fn partition(&self, p: usize) -> &[Complex32] {
        &self.spectra[p * self.bins..(p + 1) * self.bins]
    }
}

/// Per-input history and spectrum delay line.
#[derive(Debug, Clone)]
struct InputStage {
    history: ShiftBuffer,
    spectra: SpectrumRing,
}

/// Shared engine behind [`MatrixConv`](super::MatrixConv) and
/// [`MultiConv`](super::MultiConv).
#[derive(Debug)]
pub(crate) struct ConvCore {
    block: usize,
    num_partitions: usize,
    fft: RealFft,
    stages: Vec<InputStage>,
    acc: Vec<Complex32>,
    time: Vec<f32>,
}

impl ConvCore {
    pub(crate) fn new(block: usize, filter_len: usize, inputs: usize) -> Result<Self> {
        let fft = RealFft::new(2 * block)?;
        let bins = fft.num_bins();
        let num_partitions = filter_len.div_ceil(block);
        Ok(Self {
            block,
            num_partitions,
            stages: (0..inputs)
                .map(|_| InputStage {
                    history: ShiftBuffer::new(2 * block),
                    spectra: SpectrumRing::new(num_partitions, bins),
                })
                .collect(),
            acc: vec![Complex32::new(0.0, 0.0); bins],
            time: vec![0.0; 2 * block],
            fft,
        })
    }

    pub(crate) fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    /// Partition and transform `taps` (at most `num_partitions·block`).
    pub(crate) fn transform_filter(&mut self, taps: &[f32]) -> Result<FilterSpectra> {
        let bins = self.fft.num_bins();
        let mut spectra = vec![Complex32::new(0.0, 0.0); self.num_partitions * bins];
        for (p, dst) in spectra.chunks_exact_mut(bins).enumerate() {
            let start = (p * self.block).min(taps.len());
            let end = ((p + 1) * self.block).min(taps.len());
            self.time.fill(0.0);
            self.time[..end - start].copy_from_slice(&taps[start..end]);
            self.fft.forward(&self.time, dst)?;
        }
        self.time.fill(0.0);
        Ok(FilterSpectra { spectra, bins })
    }

    /// Take one `block` per input and transform it into the delay lines.
    ///
    /// Lengths must have been checked by the caller.
    pub(crate) fn push<I: AsRef<[f32]>>(&mut self, input: &[I]) -> Result<()> {
        for (stage, x) in self.stages.iter_mut().zip(input) {
            stage.history.push(x.as_ref());
            stage.spectra.advance();
            self.fft.forward(stage.history.data(), stage.spectra.current_mut())?;
        }
        Ok(())
    }

    /// Start a new output spectrum.
    pub(crate) fn begin_output(&mut self) {
        self.acc.fill(Complex32::new(0.0, 0.0));
    }

    /// Add the contribution of `filter` applied to input `input`.
    pub(crate) fn accumulate(&mut self, filter: &FilterSpectra, input: usize) {
        let spectra = &self.stages[input].spectra;
        for p in 0..spectra.slots() {
            complex::mul_acc(&mut self.acc, filter.partition(p), spectra.get(p));
        }
    }

    /// Inverse-transform the accumulated spectrum into `out` (`block`
    /// samples).
    pub(crate) fn finish_output(&mut self, out: &mut [f32]) -> Result<()> {
        self.fft.backward(&self.acc, &mut self.time)?;
        out.copy_from_slice(&self.time[self.block..]);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        for stage in &mut self.stages {
            stage.history.clear();
            stage.spectra.clear();
        }
        self.acc.fill(Complex32::new(0.0, 0.0));
        self.time.fill(0.0);
    }
}
