// SPDX-License-Identifier: LGPL-3.0-or-later

//! Partitioned frequency-domain FIR convolution.
//!
//! - [`MatrixConv`]: every output is the sum of every input convolved with
//!   its own filter (`outputs × inputs` filters)
//! - [`MultiConv`]: channel `c` is convolved with filter `c`
//!
//! Both take exactly `block_size` samples per channel per call and return
//! the convolution output for those same samples, so the only latency is
//! the host block itself.

mod matrix;
mod multi;
pub mod partition;

pub use matrix::{MatrixConv, MatrixConvConfig};
pub use multi::{MultiConv, MultiConvConfig};
