// SPDX-License-Identifier: LGPL-3.0-or-later

//! Streaming short-time Fourier transform.
//!
//! Converts fixed-size multichannel blocks into time-frequency frames and
//! back, decoupling the host block size from the transform hop.
//!
//! # Algorithm
//!
//! Forward, per hop and input channel:
//! 1. Slide `hop` new samples into the channel's `window`-long buffer
//! 2. Multiply by the analysis window and zero-pad to `fft_size`
//! 3. Real FFT, store the `fft_size/2 + 1` bins in the frame slot
//!
//! Backward, per slot and output channel:
//! 1. Inverse real FFT (scaled by `1/fft_size`)
//! 2. Multiply the first `window` samples by the synthesis window; the
//!    zero-padded tail is kept unwindowed
//! 3. Overlap-add into the channel accumulator, emit `hop` samples
//!
//! With the default window pair an unmodified round trip reproduces the
//! input delayed by `window - hop` samples. `hop == window` turns the
//! engine into a plain block transform with no added delay.
//!
//! # Examples
//! ```
//! use streamdsp_units::stft::{Stft, StftConfig};
//!
//! let mut stft = Stft::new(StftConfig {
//!     window_size: 128,
//!     hop_size: 64,
//!     ..StftConfig::default()
//! })
//! .unwrap();
//!
//! let input = vec![vec![0.5f32; 256]];
//! let mut output = vec![vec![0.0f32; 256]];
//! let mut frame = stft.new_frame(1, 256).unwrap();
//!
//! stft.forward(&input, &mut frame).unwrap();
//! stft.backward(&frame, &mut output).unwrap();
//! assert!((output[0][200] - 0.5).abs() < 1e-5);
//! ```

use crate::frame::{FrameLayout, TfFrame};
use crate::misc::windows;
use crate::util::shift_buffer::ShiftBuffer;
use crate::{block_len, block_len_mut, slots_in_block};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use streamdsp_lib::error::{require_len, require_positive};
use streamdsp_lib::fft::RealFft;
use streamdsp_lib::{math, Complex32, DspError, Result};
use tracing::debug;

/// Construction parameters for [`Stft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StftConfig {
    /// Analysis window length in samples.
    pub window_size: usize,
    /// Hop between successive frames; must divide `window_size`.
    pub hop_size: usize,
    /// Transform length; `None` uses `window_size`.
    pub fft_size: Option<usize>,
    pub in_channels: usize,
    pub out_channels: usize,
    /// Layout of frames created by [`Stft::new_frame`].
    pub layout: FrameLayout,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            window_size: 256,
            hop_size: 128,
            fft_size: None,
            in_channels: 1,
            out_channels: 1,
            layout: FrameLayout::default(),
        }
    }
}

impl StftConfig {
    /// Effective transform length.
    pub fn fft_size(&self) -> usize {
        self.fft_size.unwrap_or(self.window_size)
    }

    /// Check the window/hop/FFT geometry and channel counts.
    pub fn validate(&self) -> Result<()> {
        require_positive("window size", self.window_size)?;
        require_positive("hop size", self.hop_size)?;
        require_positive("input channel count", self.in_channels)?;
        require_positive("output channel count", self.out_channels)?;
        if self.window_size % self.hop_size != 0 {
            return Err(DspError::HopDoesNotDivideWindow {
                window: self.window_size,
                hop: self.hop_size,
            });
        }
        if self.fft_size() < self.window_size {
            return Err(DspError::FftSmallerThanWindow {
                window: self.window_size,
                fft: self.fft_size(),
            });
        }
        Ok(())
    }
}

/// Per-channel streaming state.
#[derive(Debug, Clone)]
struct Channels {
    /// Sliding analysis windows, `window_size` each.
    inputs: Vec<ShiftBuffer>,
    /// Overlap-add accumulators, `fft_size` each.
    outputs: Vec<ShiftBuffer>,
}

impl Channels {
    fn new(in_channels: usize, out_channels: usize, window: usize, fft: usize) -> Self {
        Self {
            inputs: (0..in_channels).map(|_| ShiftBuffer::new(window)).collect(),
            outputs: (0..out_channels).map(|_| ShiftBuffer::new(fft)).collect(),
        }
    }
}

/// Streaming STFT handle.
#[derive(Debug)]
pub struct Stft {
    window_size: usize,
    hop_size: usize,
    fft_size: usize,
    num_bands: usize,
    layout: FrameLayout,
    fft: RealFft,
    analysis_window: Vec<f32>,
    synthesis_window: Vec<f32>,
    channels: Channels,
    /// Time-domain scratch, `fft_size`.
    time: Vec<f32>,
    /// Spectrum scratch, `num_bands`.
    spectrum: Vec<Complex32>,
}

impl Stft {
    /// Create an STFT handle. All buffers are allocated here.
    pub fn new(config: StftConfig) -> Result<Self> {
        config.validate()?;
        let window_size = config.window_size;
        let fft_size = config.fft_size();
        let fft = RealFft::new(fft_size)?;
        let num_bands = fft.num_bins();

        let mut analysis_window = vec![0.0; window_size];
        let mut synthesis_window = vec![0.0; window_size];
        windows::overlap_add_pair(&mut analysis_window, &mut synthesis_window, config.hop_size);

        debug!(
            window_size,
            hop_size = config.hop_size,
            fft_size,
            in_channels = config.in_channels,
            out_channels = config.out_channels,
            "STFT created"
        );

        Ok(Self {
            window_size,
            hop_size: config.hop_size,
            fft_size,
            num_bands,
            layout: config.layout,
            fft,
            analysis_window,
            synthesis_window,
            channels: Channels::new(config.in_channels, config.out_channels, window_size, fft_size),
            time: vec![0.0; fft_size],
            spectrum: vec![Complex32::new(0.0, 0.0); num_bands],
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bands, `fft_size/2 + 1`.
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn in_channels(&self) -> usize {
        self.channels.inputs.len()
    }

    pub fn out_channels(&self) -> usize {
        self.channels.outputs.len()
    }

    /// Round-trip delay in samples, `window_size - hop_size`.
    pub fn latency(&self) -> usize {
        self.window_size - self.hop_size
    }

    /// Centre frequency of each band in Hz: band `k` sits at
    /// `k·sample_rate/fft_size`.
    pub fn centre_frequencies(&self, sample_rate: f32) -> Vec<f32> {
        let mut freqs = vec![0.0; self.num_bands];
        self.fill_centre_frequencies(sample_rate, &mut freqs);
        freqs
    }

    /// Write band centre frequencies into `dst` (up to `num_bands` values).
    pub fn fill_centre_frequencies(&self, sample_rate: f32, dst: &mut [f32]) {
        let step = sample_rate / self.fft_size as f32;
        for (k, f) in dst.iter_mut().enumerate().take(self.num_bands) {
            *f = k as f32 * step;
        }
    }

    /// Allocate a frame sized for `channels` channels and `block_size`
    /// samples, in the configured layout.
    pub fn new_frame(&self, channels: usize, block_size: usize) -> Result<TfFrame> {
        let slots = slots_in_block(block_size, self.hop_size)?;
        Ok(TfFrame::new(self.num_bands, channels, slots, self.layout))
    }

    /// Analyse one block per input channel into `frame`.
    ///
    /// Every channel must hold the same number of samples, a multiple of
    /// the hop size; `frame` must be shaped
    /// `(num_bands, in_channels, block/hop)`.
    pub fn forward<I: AsRef<[f32]>>(&mut self, input: &[I], frame: &mut TfFrame) -> Result<()> {
        let block = block_len(input, self.in_channels())?;
        let slots = slots_in_block(block, self.hop_size)?;
        frame.check_shape(self.num_bands, self.in_channels(), slots)?;

        let (hop, window) = (self.hop_size, self.window_size);
        for slot in 0..slots {
            for (ch, x) in input.iter().enumerate() {
                let sliding = &mut self.channels.inputs[ch];
                sliding.push(&x.as_ref()[slot * hop..(slot + 1) * hop]);

                math::mul(
                    &mut self.time[..window],
                    sliding.data(),
                    &self.analysis_window,
                );
                self.time[window..].fill(0.0);
                self.fft.forward(&self.time, &mut self.spectrum)?;
                frame.write_bands(ch, slot, &self.spectrum);
            }
        }
        Ok(())
    }

    /// Synthesise one block per output channel from `frame`.
    ///
    /// `frame` must be shaped `(num_bands, out_channels, block/hop)`.
    pub fn backward<O: AsMut<[f32]>>(&mut self, frame: &TfFrame, output: &mut [O]) -> Result<()> {
        let block = block_len_mut(output, self.out_channels())?;
        let slots = slots_in_block(block, self.hop_size)?;
        frame.check_shape(self.num_bands, self.out_channels(), slots)?;

        let (hop, window) = (self.hop_size, self.window_size);
        for slot in 0..slots {
            for (ch, y) in output.iter_mut().enumerate() {
                frame.read_bands(ch, slot, &mut self.spectrum);
                self.fft.backward(&self.spectrum, &mut self.time)?;

                let acc = self.channels.outputs[ch].data_mut();
                math::mul_acc(&mut acc[..window], &self.time[..window], &self.synthesis_window);
                math::add(&mut acc[window..], &self.time[window..]);
                self.channels.outputs[ch].drain_front(&mut y.as_mut()[slot * hop..(slot + 1) * hop]);
            }
        }
        Ok(())
    }

    /// Change the channel counts.
    ///
    /// Fresh per-channel state is built and swapped in, so all channels
    /// restart from silence. A no-op when both counts are unchanged.
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
            "STFT channel change"
        );
        let fresh = Channels::new(in_channels, out_channels, self.window_size, self.fft_size);
        drop(std::mem::replace(&mut self.channels, fresh));
        Ok(())
    }

    /// Zero all sliding-window and overlap-add state.
    pub fn flush(&mut self) {
        debug!("STFT flush");
        for buf in self
            .channels
            .inputs
            .iter_mut()
            .chain(self.channels.outputs.iter_mut())
        {
            buf.clear();
        }
        self.time.fill(0.0);
        self.spectrum.fill(Complex32::new(0.0, 0.0));
    }

    /// Copy the analysis window into `dst` (must be `window_size` long).
    pub fn analysis_window(&self, dst: &mut [f32]) -> Result<()> {
        require_len(self.window_size, dst.len())?;
        dst.copy_from_slice(&self.analysis_window);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn stft(window: usize, hop: usize) -> Stft {
        Stft::new(StftConfig {
            window_size: window,
            hop_size: hop,
            ..StftConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let base = StftConfig::default();
        assert!(base.validate().is_ok());
        assert_eq!(
            StftConfig { hop_size: 0, ..base }.validate(),
            Err(DspError::InvalidParameter {
                name: "hop size",
                value: 0
            })
        );
        assert_eq!(
            StftConfig {
                window_size: 100,
                hop_size: 64,
                ..base
            }
            .validate(),
            Err(DspError::HopDoesNotDivideWindow {
                window: 100,
                hop: 64
            })
        );
        assert_eq!(
            StftConfig {
                fft_size: Some(128),
                ..base
            }
            .validate(),
            Err(DspError::FftSmallerThanWindow {
                window: 256,
                fft: 128
            })
        );
        assert!(Stft::new(StftConfig {
            in_channels: 0,
            ..base
        })
        .is_err());
    }

    #[test]
    fn test_geometry() {
        let s = Stft::new(StftConfig {
            window_size: 128,
            hop_size: 32,
            fft_size: Some(256),
            in_channels: 2,
            out_channels: 3,
            layout: FrameLayout::TimeChannelsBands,
        })
        .unwrap();
        assert_eq!(s.num_bands(), 129);
        assert_eq!(s.latency(), 96);
        assert_eq!(s.fft_size(), 256);
        assert_eq!(s.in_channels(), 2);
        assert_eq!(s.out_channels(), 3);
        let frame = s.new_frame(2, 128).unwrap();
        assert_eq!(frame.shape(), (129, 2, 4));
        assert_eq!(frame.layout(), FrameLayout::TimeChannelsBands);
        assert!(s.new_frame(2, 100).is_err());
    }

    #[test]
    fn test_centre_frequencies() {
        let s = stft(64, 32);
        let f = s.centre_frequencies(48000.0);
        assert_eq!(f.len(), 33);
        assert_eq!(f[0], 0.0);
        assert_approx_eq!(f32, f[1], 750.0, ulps = 2);
        assert_approx_eq!(f32, f[32], 24000.0, ulps = 2);
    }

    #[test]
    fn test_sine_lands_in_bin() {
        let mut s = stft(64, 32);
        let x: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 8.0 * i as f32 / 64.0).cos())
            .collect();
        let mut frame = s.new_frame(1, 256).unwrap();
        s.forward(&[&x[..]], &mut frame).unwrap();
        let last = frame.shape().2 - 1;
        let peak = (0..33)
            .max_by(|&a, &b| {
                frame
                    .get(a, 0, last)
                    .norm()
                    .total_cmp(&frame.get(b, 0, last).norm())
            })
            .unwrap();
        assert_eq!(peak, 8);
    }

    #[test]
    fn test_contract_violations_leave_state_untouched() {
        let mut s = stft(64, 32);
        let mut frame = s.new_frame(1, 64).unwrap();
        assert_eq!(
            s.forward(&[vec![1.0f32; 60]], &mut frame),
            Err(DspError::BlockNotMultipleOfHop { block: 60, hop: 32 })
        );
        assert!(matches!(
            s.forward(&[vec![1.0f32; 64], vec![1.0f32; 64]], &mut frame),
            Err(DspError::ChannelCountMismatch { .. })
        ));
        assert!(matches!(
            s.forward(&[vec![1.0f32; 96]], &mut frame),
            Err(DspError::FrameShapeMismatch { .. })
        ));
        // Sliding window still silent
        assert!(s.channels.inputs[0].data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_channel_change_noop_and_realloc() {
        let mut s = stft(64, 32);
        let mut frame = s.new_frame(1, 64).unwrap();
        s.forward(&[vec![1.0f32; 64]], &mut frame).unwrap();

        s.channel_change(1, 1).unwrap();
        assert!(s.channels.inputs[0].data().iter().any(|&v| v != 0.0));

        s.channel_change(2, 4).unwrap();
        assert_eq!(s.in_channels(), 2);
        assert_eq!(s.out_channels(), 4);
        assert!(s.channels.inputs[0].data().iter().all(|&v| v == 0.0));
        assert!(s.channel_change(0, 1).is_err());
    }

    #[test]
    fn test_flush_idempotent() {
        let mut s = stft(64, 16);
        let mut frame = s.new_frame(1, 64).unwrap();
        s.forward(&[vec![0.25f32; 64]], &mut frame).unwrap();
        let mut out = vec![vec![0.0f32; 64]];
        s.backward(&frame, &mut out).unwrap();

        s.flush();
        let once = (s.channels.inputs.clone(), s.channels.outputs.clone());
        s.flush();
        assert_eq!(once.0, s.channels.inputs);
        assert_eq!(once.1, s.channels.outputs);
        assert!(s.channels.outputs[0].data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_analysis_window_rectangular_without_overlap() {
        let s = stft(32, 32);
        let mut w = vec![0.0; 32];
        s.analysis_window(&mut w).unwrap();
        assert!(w.iter().all(|&v| v == 1.0));
        assert_eq!(s.latency(), 0);
    }
}
