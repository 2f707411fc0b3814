// SPDX-License-Identifier: LGPL-3.0-or-later

//! Complex-modulated QMF filterbank with an optional hybrid stage.
//!
//! The bank produces `hop` complex bands, 2x oversampled, with centres at
//! `(k + ½)·fs/(2·hop)`. Analysis and synthesis share one real prototype
//! of `10·hop` taps ([`prototype::design`]), which makes an unmodified
//! round trip perfect reconstruction up to float rounding.
//!
//! # Algorithm
//!
//! Analysis, per hop (`K = 2·hop`):
//! 1. Slide `hop` samples into the `L`-long input buffer
//! 2. Multiply by the sign-alternated prototype and fold into `K` sums
//! 3. Pre-twiddle by `e^{-iπs/K}`, `K`-point FFT, keep the first `hop` bins
//! 4. Optionally refine bands 0..2 with the [`hybrid`] stage
//!
//! Synthesis mirrors it: merge hybrid sub-bands, zero-extend to `K`,
//! inverse FFT, post-twiddle, take twice the real part, weight by the
//! prototype and overlap-add `L` samples, emit `hop`.
//!
//! Latency is `9·hop` samples, plus `6·hop` with the hybrid stage.
//!
//! # Examples
//! ```
//! use streamdsp_units::qmf::{Qmf, QmfConfig};
//!
//! let mut qmf = Qmf::new(QmfConfig {
//!     hop_size: 64,
//!     hybrid: true,
//!     ..QmfConfig::default()
//! })
//! .unwrap();
//! assert_eq!(qmf.num_bands(), 69);
//! assert_eq!(qmf.latency(), 15 * 64);
//!
//! let input = vec![vec![0.0f32; 512]];
//! let mut frame = qmf.new_frame(1, 512).unwrap();
//! qmf.analysis(&input, &mut frame).unwrap();
//! ```

pub mod hybrid;
pub mod prototype;

use crate::frame::{FrameLayout, TfFrame};
use crate::util::shift_buffer::ShiftBuffer;
use crate::{block_len, block_len_mut, slots_in_block};
use hybrid::HybridState;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use streamdsp_lib::error::require_positive;
use streamdsp_lib::fft::Fft;
use streamdsp_lib::{complex, math, Complex32, DspError, Result};
use tracing::debug;

/// Smallest supported hop size.
pub const MIN_HOP_SIZE: usize = 4;

/// Construction parameters for [`Qmf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QmfConfig {
    /// Decimation factor and number of QMF bands.
    pub hop_size: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    /// Split the lowest bands for finer low-frequency resolution.
    pub hybrid: bool,
    /// Layout of frames created by [`Qmf::new_frame`].
    pub layout: FrameLayout,
}

impl Default for QmfConfig {
    fn default() -> Self {
        Self {
            hop_size: 128,
            in_channels: 1,
            out_channels: 1,
            hybrid: true,
            layout: FrameLayout::default(),
        }
    }
}

impl QmfConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("hop size", self.hop_size)?;
        require_positive("input channel count", self.in_channels)?;
        require_positive("output channel count", self.out_channels)?;
        if self.hop_size < MIN_HOP_SIZE {
            return Err(DspError::HopTooSmall {
                hop: self.hop_size,
                min: MIN_HOP_SIZE,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Channels {
    inputs: Vec<ShiftBuffer>,
    hybrid: Vec<HybridState>,
    outputs: Vec<ShiftBuffer>,
}

impl Channels {
    fn new(in_channels: usize, out_channels: usize, hop: usize, hybrid: bool) -> Self {
        let len = hop * 2 * prototype::PERIODS;
        Self {
            inputs: (0..in_channels).map(|_| ShiftBuffer::new(len)).collect(),
            hybrid: if hybrid {
                (0..in_channels).map(|_| HybridState::new(hop)).collect()
            } else {
                Vec::new()
            },
            outputs: (0..out_channels).map(|_| ShiftBuffer::new(len)).collect(),
        }
    }
}

/// Streaming QMF analysis/synthesis handle.
#[derive(Debug)]
pub struct Qmf {
    hop_size: usize,
    hybrid: bool,
    num_bands: usize,
    layout: FrameLayout,
    /// Prototype with the `(-1)^t` period signs folded in.
    prototype: Vec<f32>,
    fft: Fft,
    pre_twiddle: Vec<Complex32>,
    post_twiddle: Vec<Complex32>,
    channels: Channels,
    windowed: Vec<f32>,
    folded: Vec<f32>,
    spectrum: Vec<Complex32>,
    bands: Vec<Complex32>,
}

impl Qmf {
    /// Create a QMF handle. The prototype, plans and every buffer are
    /// built here.
    pub fn new(config: QmfConfig) -> Result<Self> {
        config.validate()?;
        let hop = config.hop_size;
        let period = 2 * hop;

        let mut proto = prototype::design(hop);
        for (t, chunk) in proto.chunks_exact_mut(period).enumerate() {
            if t % 2 == 1 {
                chunk.iter_mut().for_each(|v| *v = -*v);
            }
        }
        let pre_twiddle: Vec<Complex32> = (0..period)
            .map(|s| Complex32::from_polar(1.0, -PI * s as f32 / period as f32))
            .collect();
        let post_twiddle = pre_twiddle.iter().map(|t| t.conj()).collect();

        let num_bands = if config.hybrid {
            hop + hybrid::EXTRA_BANDS
        } else {
            hop
        };

        debug!(
            hop_size = hop,
            hybrid = config.hybrid,
            num_bands,
            in_channels = config.in_channels,
            out_channels = config.out_channels,
            "QMF created"
        );

        Ok(Self {
            hop_size: hop,
            hybrid: config.hybrid,
            num_bands,
            layout: config.layout,
            prototype: proto,
            fft: Fft::new(period)?,
            pre_twiddle,
            post_twiddle,
            channels: Channels::new(config.in_channels, config.out_channels, hop, config.hybrid),
            windowed: vec![0.0; period * prototype::PERIODS],
            folded: vec![0.0; period],
            spectrum: vec![Complex32::new(0.0, 0.0); period],
            bands: vec![Complex32::new(0.0, 0.0); num_bands],
        })
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn is_hybrid(&self) -> bool {
        self.hybrid
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn in_channels(&self) -> usize {
        self.channels.inputs.len()
    }

    pub fn out_channels(&self) -> usize {
        self.channels.outputs.len()
    }

    /// Round-trip delay in samples.
    pub fn latency(&self) -> usize {
        let base = (2 * prototype::PERIODS - 1) * self.hop_size;
        if self.hybrid {
            base + hybrid::DELAY * self.hop_size
        } else {
            base
        }
    }

    /// Centre frequency of each band in Hz.
    pub fn centre_frequencies(&self, sample_rate: f32) -> Vec<f32> {
        let mut freqs = vec![0.0; self.num_bands];
        self.fill_centre_frequencies(sample_rate, &mut freqs);
        freqs
    }

    /// Write band centre frequencies into `dst` (up to `num_bands` values).
    pub fn fill_centre_frequencies(&self, sample_rate: f32, dst: &mut [f32]) {
        let unit = sample_rate / self.hop_size as f32;
        let qmf_centre = |k: usize| (k as f32 + 0.5) * 0.5 * unit;

        let mut freqs = dst.iter_mut().take(self.num_bands);
        let first_plain = if self.hybrid {
            for split in hybrid::SPLITS.iter() {
                for offset in &split.centre_offsets {
                    if let Some(f) = freqs.next() {
                        *f = qmf_centre(split.band) + offset * unit;
                    }
                }
            }
            hybrid::SPLIT_BANDS
        } else {
            0
        };
        for (f, k) in freqs.zip(first_plain..) {
            *f = qmf_centre(k);
        }
    }

    /// Allocate a frame for `channels` channels and `block_size` samples,
    /// in the configured layout.
    pub fn new_frame(&self, channels: usize, block_size: usize) -> Result<TfFrame> {
        let slots = slots_in_block(block_size, self.hop_size)?;
        Ok(TfFrame::new(self.num_bands, channels, slots, self.layout))
    }

    /// Analyse one block per input channel into `frame`, shaped
    /// `(num_bands, in_channels, block/hop)`.
    pub fn analysis<I: AsRef<[f32]>>(&mut self, input: &[I], frame: &mut TfFrame) -> Result<()> {
        let block = block_len(input, self.in_channels())?;
        let slots = slots_in_block(block, self.hop_size)?;
        frame.check_shape(self.num_bands, self.in_channels(), slots)?;

        let hop = self.hop_size;
        let period = 2 * hop;
        for slot in 0..slots {
            for (ch, x) in input.iter().enumerate() {
                let buf = &mut self.channels.inputs[ch];
                buf.push(&x.as_ref()[slot * hop..(slot + 1) * hop]);

                math::mul(&mut self.windowed, buf.data(), &self.prototype);
                let (first, rest) = self.windowed.split_at(period);
                self.folded.copy_from_slice(first);
                for chunk in rest.chunks_exact(period) {
                    math::add(&mut self.folded, chunk);
                }

                complex::mul_real(&mut self.spectrum, &self.folded, &self.pre_twiddle);
                self.fft.forward_in_place(&mut self.spectrum)?;

                if self.hybrid {
                    self.channels.hybrid[ch].analyse(&self.spectrum[..hop], &mut self.bands);
                } else {
                    self.bands.copy_from_slice(&self.spectrum[..hop]);
                }
                frame.write_bands(ch, slot, &self.bands);
            }
        }
        Ok(())
    }

    /// Synthesise one block per output channel from `frame`, shaped
    /// `(num_bands, out_channels, block/hop)`.
    pub fn synthesis<O: AsMut<[f32]>>(&mut self, frame: &TfFrame, output: &mut [O]) -> Result<()> {
        let block = block_len_mut(output, self.out_channels())?;
        let slots = slots_in_block(block, self.hop_size)?;
        frame.check_shape(self.num_bands, self.out_channels(), slots)?;

        let hop = self.hop_size;
        let period = 2 * hop;
        for slot in 0..slots {
            for (ch, y) in output.iter_mut().enumerate() {
                frame.read_bands(ch, slot, &mut self.bands);
                if self.hybrid {
                    hybrid::merge(&self.bands, &mut self.spectrum[..hop]);
                } else {
                    self.spectrum[..hop].copy_from_slice(&self.bands);
                }
                self.spectrum[hop..].fill(Complex32::new(0.0, 0.0));
                self.fft.backward_in_place(&mut self.spectrum)?;
                complex::mul_re(&mut self.folded, &self.spectrum, &self.post_twiddle, 2.0);

                let acc = &mut self.channels.outputs[ch];
                for (dst, taps) in acc
                    .data_mut()
                    .chunks_exact_mut(period)
                    .zip(self.prototype.chunks_exact(period))
                {
                    math::mul_acc(dst, taps, &self.folded);
                }
                acc.drain_front(&mut y.as_mut()[slot * hop..(slot + 1) * hop]);
            }
        }
        Ok(())
    }

    /// Change the channel counts, resetting all per-channel state.
    /// A no-op when both counts are unchanged.
    pub fn channel_change(&mut self, in_channels: usize, out_channels: usize) -> Result<()> {
        require_positive("input channel count", in_channels)?;
        require_positive("output channel count", out_channels)?;
        if in_channels == self.in_channels() && out_channels == self.out_channels() {
            return Ok(());
        }
        debug!(
            from_in = self.in_channels(),
            from_out = self.out_channels(),
            in_channels,
            out_channels,
            "QMF channel change"
        );
        let fresh = Channels::new(in_channels, out_channels, self.hop_size, self.hybrid);
        drop(std::mem::replace(&mut self.channels, fresh));
        Ok(())
    }

    /// Zero all buffered state.
    pub fn flush(&mut self) {
        debug!("QMF flush");
        for buf in self
            .channels
            .inputs
            .iter_mut()
            .chain(self.channels.outputs.iter_mut())
        {
            buf.clear();
        }
        for state in &mut self.channels.hybrid {
            state.clear();
        }
    }
}
