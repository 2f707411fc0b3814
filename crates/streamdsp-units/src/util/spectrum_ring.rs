// SPDX-License-Identifier: LGPL-3.0-or-later

//! Circular delay line of spectra.
//!
//! Holds the spectra of the last `slots` blocks, each `bins` complex
//! values long, in one contiguous allocation. The write head advances by
//! one slot per block, and `get(age)` looks `age` blocks back.
//!
//! # Examples
//! ```
//! use streamdsp_units::util::spectrum_ring::SpectrumRing;
//! use streamdsp_units::Complex32;
//!
//! let mut ring = SpectrumRing::new(3, 2);
//! ring.advance();
//! ring.current_mut()[0] = Complex32::new(1.0, 0.0);
//! ring.advance();
//! ring.current_mut()[0] = Complex32::new(2.0, 0.0);
//! assert_eq!(ring.get(0)[0].re, 2.0); // most recent
//! assert_eq!(ring.get(1)[0].re, 1.0); // one block back
//! ```

use streamdsp_lib::Complex32;

/// Fixed-size ring of spectra.
#[derive(Debug, Clone)]
pub struct SpectrumRing {
    buffer: Vec<Complex32>,
    bins: usize,
    slots: usize,
    head: usize,
}

impl SpectrumRing {
    /// Allocate a zeroed ring of `slots` spectra of `bins` values each.
    pub fn new(slots: usize, bins: usize) -> Self {
        let slots = slots.max(1);
        Self {
            buffer: vec![Complex32::new(0.0, 0.0); slots * bins],
            bins,
            slots,
            head: 0,
        }
    }

    /// Number of spectra held; at least one.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Move the write head to the next (oldest) slot.
    pub fn advance(&mut self) {
        self.head = (self.head + 1) % self.slots;
    }

    /// The slot under the write head.
    pub fn current_mut(&mut self) -> &mut [Complex32] {
        let start = self.head * self.bins;
        &mut self.buffer[start..start + self.bins]
    }

    /// The spectrum written `age` advances ago (`0` is the current slot).
    ///
    /// `age` wraps modulo the slot count.
    pub fn get(&self, age: usize) -> &[Complex32] {
        let idx = (self.head + self.slots - age % self.slots) % self.slots;
        let start = idx * self.bins;
        &self.buffer[start..start + self.bins]
    }

    /// Zero every slot and reset the write head.
    pub fn clear(&mut self) {
        self.buffer.fill(Complex32::new(0.0, 0.0));
        self.head = 0;
    }
}
