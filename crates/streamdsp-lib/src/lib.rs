// SPDX-License-Identifier: LGPL-3.0-or-later

//! # streamdsp-lib
//!
//! Low-level DSP primitives shared by the streaming transforms in
//! `streamdsp-units`. It includes:
//!
//! - **FFT**: complex and real transforms of arbitrary length, with
//!   pre-planned handles that never allocate after construction
//! - **Complex arithmetic**: multiply-accumulate and modulation on
//!   interleaved `Complex32` buffers
//! - **Math**: packed (element-wise) and scalar buffer operations
//! - **Errors**: the [`DspError`] taxonomy used across the workspace
//!
//! ## Design
//!
//! Buffer-processing functions use runtime SIMD dispatch via the
//! `multiversion` crate. Each annotated function is compiled for
//! AVX2+FMA, AVX, SSE4.1, and NEON targets; the best variant is
//! selected automatically at startup. The FFT delegates to `rustfft`
//! and `realfft`, which already provide SIMD-optimized kernels.

pub mod complex;
pub mod error;
pub mod fft;
pub mod math;

pub use error::{DspError, Result};
pub use num_complex::Complex32;
