// SPDX-License-Identifier: LGPL-3.0-or-later

//! Time-frequency frames exchanged between the transforms and band
//! processors.
//!
//! A [`TfFrame`] holds `bands × channels × slots` complex values. The
//! host allocates it once; `forward`/`analysis` calls overwrite it and
//! `backward`/`synthesis` calls read it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use streamdsp_lib::{Complex32, DspError, Result};

/// Memory order of a [`TfFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameLayout {
    /// `[band][channel][slot]`: each band's time series is contiguous.
    #[default]
    BandsChannelsTime,
    /// `[slot][channel][band]`: each spectrum is contiguous.
    TimeChannelsBands,
}

/// Three-dimensional complex array addressed by `(band, channel, slot)`.
///
/// # Examples
/// ```
/// use streamdsp_units::{FrameLayout, TfFrame};
/// use streamdsp_units::Complex32;
///
/// let mut frame = TfFrame::new(129, 2, 4, FrameLayout::BandsChannelsTime);
/// frame.set(3, 1, 2, Complex32::new(1.0, -1.0));
/// assert_eq!(frame.get(3, 1, 2), Complex32::new(1.0, -1.0));
/// assert_eq!(frame.shape(), (129, 2, 4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TfFrame {
    bands: usize,
    channels: usize,
    slots: usize,
    layout: FrameLayout,
    data: Vec<Complex32>,
}

impl TfFrame {
    /// Allocate a zeroed frame.
    pub fn new(bands: usize, channels: usize, slots: usize, layout: FrameLayout) -> Self {
        Self {
            bands,
            channels,
            slots,
            layout,
            data: vec![Complex32::new(0.0, 0.0); bands * channels * slots],
        }
    }

    /// `(bands, channels, slots)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.bands, self.channels, self.slots)
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    #[inline]
    fn index(&self, band: usize, channel: usize, slot: usize) -> usize {
        assert!(
            band < self.bands && channel < self.channels && slot < self.slots,
            "frame index ({band}, {channel}, {slot}) out of range for shape {:?}",
            self.shape()
        );
        match self.layout {
            FrameLayout::BandsChannelsTime => (band * self.channels + channel) * self.slots + slot,
            FrameLayout::TimeChannelsBands => (slot * self.channels + channel) * self.bands + band,
        }
    }

    /// Read one value. Panics if an index is out of range.
    pub fn get(&self, band: usize, channel: usize, slot: usize) -> Complex32 {
        self.data[self.index(band, channel, slot)]
    }

    /// Write one value. Panics if an index is out of range.
    pub fn set(&mut self, band: usize, channel: usize, slot: usize, value: Complex32) {
        let i = self.index(band, channel, slot);
        self.data[i] = value;
    }

    pub fn get_mut(&mut self, band: usize, channel: usize, slot: usize) -> &mut Complex32 {
        let i = self.index(band, channel, slot);
        &mut self.data[i]
    }

    /// Raw storage in [`layout`](Self::layout) order.
    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex32] {
        &mut self.data
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(Complex32::new(0.0, 0.0));
    }

    /// Copy channel `src_channel` of `src` into channel `channel` of this
    /// frame.
    ///
    /// Band and slot counts must match; layouts may differ.
    pub fn copy_channel_from(
        &mut self,
        channel: usize,
        src: &TfFrame,
        src_channel: usize,
    ) -> Result<()> {
        if src.bands != self.bands || src.slots != self.slots {
            return Err(DspError::FrameShapeMismatch {
                expected: (self.bands, src.channels, self.slots),
                got: src.shape(),
            });
        }
        if channel >= self.channels || src_channel >= src.channels {
            return Err(DspError::ChannelCountMismatch {
                expected: self.channels.min(src.channels),
                got: channel.max(src_channel) + 1,
            });
        }
        for band in 0..self.bands {
            for slot in 0..self.slots {
                self.set(band, channel, slot, src.get(band, src_channel, slot));
            }
        }
        Ok(())
    }

    /// Fail unless the frame has exactly the given shape.
    pub(crate) fn check_shape(&self, bands: usize, channels: usize, slots: usize) -> Result<()> {
        if self.shape() == (bands, channels, slots) {
            Ok(())
        } else {
            Err(DspError::FrameShapeMismatch {
                expected: (bands, channels, slots),
                got: self.shape(),
            })
        }
    }

    /// Store one spectrum (all bands) at `(channel, slot)`.
    pub(crate) fn write_bands(&mut self, channel: usize, slot: usize, src: &[Complex32]) {
        match self.layout {
            FrameLayout::TimeChannelsBands => {
                let start = self.index(0, channel, slot);
                self.data[start..start + self.bands].copy_from_slice(&src[..self.bands]);
            }
            FrameLayout::BandsChannelsTime => {
                for (band, &v) in src.iter().enumerate().take(self.bands) {
                    self.set(band, channel, slot, v);
                }
            }
        }
    }

    /// Load one spectrum (all bands) from `(channel, slot)`.
    pub(crate) fn read_bands(&self, channel: usize, slot: usize, dst: &mut [Complex32]) {
        match self.layout {
            FrameLayout::TimeChannelsBands => {
                let start = self.index(0, channel, slot);
                dst[..self.bands].copy_from_slice(&self.data[start..start + self.bands]);
            }
            FrameLayout::BandsChannelsTime => {
                for (band, v) in dst.iter_mut().enumerate().take(self.bands) {
                    *v = self.get(band, channel, slot);
                }
            }
        }
    }
}
