// SPDX-License-Identifier: LGPL-3.0-or-later

//! Miscellaneous DSP utilities.
//!
//! - **Windows**: analysis/synthesis window functions for the STFT

pub mod windows;
