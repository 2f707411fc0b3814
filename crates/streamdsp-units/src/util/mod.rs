// SPDX-License-Identifier: LGPL-3.0-or-later

//! Buffering utilities shared by the streaming engines.
//!
//! - Fixed-length shift registers for sliding windows and overlap-add
//! - A circular delay line of spectra for partitioned convolution

pub mod shift_buffer;
pub mod spectrum_ring;
