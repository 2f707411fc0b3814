// SPDX-License-Identifier: LGPL-3.0-or-later

//! # streamdsp-units
//!
//! Streaming time-frequency transforms and convolution engines built on
//! top of [`streamdsp_lib`]. It includes:
//!
//! - **STFT**: windowed short-time analysis/synthesis with arbitrary
//!   window/hop ratios and zero-padded transforms
//! - **QMF**: complex-modulated, oversampled filterbank with an optional
//!   hybrid stage for finer low-frequency resolution
//! - **Convolution**: uniformly-partitioned, overlap-save matrix and
//!   per-channel FIR convolution
//! - **Frames**: the [`TfFrame`] container exchanged with band processors
//!
//! Every handle allocates at construction (and at `channel_change`) only;
//! the streaming calls work entirely in pre-allocated buffers.

pub mod conv;
pub mod frame;
pub mod misc;
pub mod qmf;
pub mod stft;
pub mod util;

pub use frame::{FrameLayout, TfFrame};
pub use streamdsp_lib::{Complex32, DspError, Result};

use streamdsp_lib::error::require_len;

/// Check a multichannel input block and return its per-channel length.
///
/// All channels must share one length; `channels` must match the
/// expected count.
pub(crate) fn block_len<I: AsRef<[f32]>>(input: &[I], channels: usize) -> Result<usize> {
    if input.len() != channels {
        return Err(DspError::ChannelCountMismatch {
            expected: channels,
            got: input.len(),
        });
    }
    let len = input.first().map_or(0, |ch| ch.as_ref().len());
    for ch in input {
        require_len(len, ch.as_ref().len())?;
    }
    Ok(len)
}

/// Mutable counterpart of [`block_len`] for output blocks.
pub(crate) fn block_len_mut<O: AsMut<[f32]>>(output: &mut [O], channels: usize) -> Result<usize> {
    if output.len() != channels {
        return Err(DspError::ChannelCountMismatch {
            expected: channels,
            got: output.len(),
        });
    }
    let len = output.first_mut().map_or(0, |ch| ch.as_mut().len());
    for ch in output.iter_mut() {
        require_len(len, ch.as_mut().len())?;
    }
    Ok(len)
}

/// Number of hops in a block, rejecting blocks that are not a multiple
/// of the hop size.
pub(crate) fn slots_in_block(block: usize, hop: usize) -> Result<usize> {
    if block % hop != 0 {
        return Err(DspError::BlockNotMultipleOfHop { block, hop });
    }
    Ok(block / hop)
}
