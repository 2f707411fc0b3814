// SPDX-License-Identifier: LGPL-3.0-or-later

//! Fixed-length shift register for hop-oriented processing.
//!
//! The buffer always holds exactly `len()` samples. `push()` slides the
//! contents left and appends new samples at the end, which makes it a
//! sliding analysis window. Summing frames into `data_mut()` and calling
//! `drain_front()` makes it an overlap-add accumulator: the finished head
//! is copied out and the vacated tail is zeroed.
//!
//! # Examples
//! ```
//! use streamdsp_units::util::shift_buffer::ShiftBuffer;
//!
//! let mut sb = ShiftBuffer::new(4);
//! sb.push(&[1.0, 2.0]);
//! assert_eq!(sb.data(), &[0.0, 0.0, 1.0, 2.0]);
//! sb.push(&[3.0]);
//! assert_eq!(sb.data(), &[0.0, 1.0, 2.0, 3.0]);
//! ```

/// Fixed-length FIFO shift register.
///
/// `data()` is always one contiguous slice, which is what windowing and
/// FFT input preparation need.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftBuffer {
    buffer: Vec<f32>,
}

impl ShiftBuffer {
    /// Create a zeroed buffer of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Slide left by `data.len()` and append `data` at the end.
    ///
    /// If `data` is longer than the buffer only its last `len()` samples
    /// are kept.
    pub fn push(&mut self, data: &[f32]) {
        let len = self.buffer.len();
        let data = &data[data.len().saturating_sub(len)..];
        let count = data.len();
        self.buffer.copy_within(count.., 0);
        self.buffer[len - count..].copy_from_slice(data);
    }

    /// Shift (consume) `count` samples from the front of the buffer.
    ///
    /// Remaining samples move to the beginning; the vacated tail is
    /// zeroed.
    pub fn shift(&mut self, count: usize) {
        let len = self.buffer.len();
        let count = count.min(len);
        if count == 0 {
            return;
        }
        self.buffer.copy_within(count.., 0);
        self.buffer[len - count..].fill(0.0);
    }

    /// Copy the first `dst.len()` samples out, then shift them away.
    pub fn drain_front(&mut self, dst: &mut [f32]) {
        let count = dst.len().min(self.buffer.len());
        dst[..count].copy_from_slice(&self.buffer[..count]);
        self.shift(count);
    }

    pub fn data(&self) -> &[f32] {
        &self.buffer
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    /// Zero all samples.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}
