// SPDX-License-Identifier: LGPL-3.0-or-later

//! Error types shared by every transform and convolution handle.
//!
//! Configuration errors are returned by constructors; call-contract
//! violations are returned by processing calls before any internal state
//! is touched. Neither kind is transient.

use thiserror::Error;

/// Errors reported by the FFT engine, the streaming transforms and the
/// convolution engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DspError {
    #[error("Unsupported FFT length: {0}")]
    UnsupportedFftLength(usize),

    #[error("Invalid {name}: {value} (must be positive)")]
    InvalidParameter { name: &'static str, value: usize },

    #[error("Hop size {hop} does not divide window size {window}")]
    HopDoesNotDivideWindow { window: usize, hop: usize },

    #[error("FFT size {fft} is smaller than window size {window}")]
    FftSmallerThanWindow { window: usize, fft: usize },

    #[error("Hop size {hop} is too small (minimum {min})")]
    HopTooSmall { hop: usize, min: usize },

    #[error("Filter data has {got} samples, expected {expected}")]
    FilterSizeMismatch { expected: usize, got: usize },

    #[error("Block size {block} is not a multiple of hop size {hop}")]
    BlockNotMultipleOfHop { block: usize, hop: usize },

    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("Channel count mismatch: expected {expected}, got {got}")]
    ChannelCountMismatch { expected: usize, got: usize },

    #[error("Frame shape mismatch: expected {expected:?}, got {got:?}")]
    FrameShapeMismatch {
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },

    #[error("FFT backend failure: {0}")]
    Backend(String),
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DspError>;

/// Reject a zero-valued size or count parameter.
pub fn require_positive(name: &'static str, value: usize) -> Result<usize> {
    if value == 0 {
        Err(DspError::InvalidParameter { name, value })
    } else {
        Ok(value)
    }
}

/// Check that a caller-supplied buffer has exactly the expected length.
pub fn require_len(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(DspError::BufferSizeMismatch { expected, got })
    }
}
