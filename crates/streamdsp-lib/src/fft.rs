// SPDX-License-Identifier: LGPL-3.0-or-later

//! FFT operations using `rustfft` and `realfft` as backends.
//!
//! Two pre-planned handles are provided:
//! - [`Fft`]: complex-to-complex transform of any length `1..=MAX_FFT_SIZE`
//! - [`RealFft`]: real-to-complex transform of any length `2..=MAX_FFT_SIZE`,
//!   producing the `n/2 + 1` non-redundant bins
//!
//! Conventions shared by both:
//! - the forward transform is un-normalized
//! - the backward transform is scaled by `1/n`, so a round trip is identity
//! - all plans and scratch buffers are owned by the handle, so processing
//!   calls never allocate
//! - buffer lengths are checked before anything is written

use crate::complex;
use crate::error::{require_len, DspError, Result};
use crate::math;
use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::FftPlanner;
use std::sync::Arc;

/// Largest transform length accepted by [`Fft`] and [`RealFft`].
pub const MAX_FFT_SIZE: usize = 1 << 24;

fn backend_err(e: impl std::fmt::Display) -> DspError {
    DspError::Backend(e.to_string())
}

/// Pre-planned complex FFT for allocation-free repeated transforms.
///
/// # Examples
/// ```
/// use streamdsp_lib::fft::Fft;
/// use streamdsp_lib::Complex32;
///
/// let mut fft = Fft::new(80).unwrap();
/// let src = vec![Complex32::new(1.0, 0.0); 80];
/// let mut dst = vec![Complex32::new(0.0, 0.0); 80];
/// fft.forward(&src, &mut dst).unwrap();
/// assert!((dst[0].re - 80.0).abs() < 1e-3);
/// ```
#[derive(Clone)]
pub struct Fft {
    n: usize,
    fwd: Arc<dyn rustfft::Fft<f32>>,
    inv: Arc<dyn rustfft::Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl std::fmt::Debug for Fft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("n", &self.n).finish_non_exhaustive()
    }
}

impl Fft {
    /// Plan a complex transform of length `n`.
    ///
    /// Returns [`DspError::UnsupportedFftLength`] for `n == 0` or
    /// `n > MAX_FFT_SIZE`.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 || n > MAX_FFT_SIZE {
            return Err(DspError::UnsupportedFftLength(n));
        }
        let mut planner = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n);
        let inv = planner.plan_fft_inverse(n);
        let scratch_len = fwd
            .get_inplace_scratch_len()
            .max(inv.get_inplace_scratch_len());
        Ok(Self {
            n,
            fwd,
            inv,
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        })
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Always `false`: zero-length plans cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Forward transform, `dst = FFT(src)`, un-normalized.
    pub fn forward(&mut self, src: &[Complex32], dst: &mut [Complex32]) -> Result<()> {
        require_len(self.n, src.len())?;
        require_len(self.n, dst.len())?;
        dst.copy_from_slice(src);
        self.fwd.process_with_scratch(dst, &mut self.scratch);
        Ok(())
    }

    /// Inverse transform, `dst = IFFT(src) / n`.
    pub fn backward(&mut self, src: &[Complex32], dst: &mut [Complex32]) -> Result<()> {
        require_len(self.n, src.len())?;
        require_len(self.n, dst.len())?;
        dst.copy_from_slice(src);
        self.inv.process_with_scratch(dst, &mut self.scratch);
        complex::scale(dst, 1.0 / self.n as f32);
        Ok(())
    }

    /// In-place forward transform.
    pub fn forward_in_place(&mut self, buf: &mut [Complex32]) -> Result<()> {
        require_len(self.n, buf.len())?;
        self.fwd.process_with_scratch(buf, &mut self.scratch);
        Ok(())
    }

    /// In-place inverse transform, scaled by `1/n`.
    pub fn backward_in_place(&mut self, buf: &mut [Complex32]) -> Result<()> {
        require_len(self.n, buf.len())?;
        self.inv.process_with_scratch(buf, &mut self.scratch);
        complex::scale(buf, 1.0 / self.n as f32);
        Ok(())
    }
}

/// Which implementation backs a [`RealFft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FftBackendKind {
    /// `realfft` for even lengths, packed complex for odd lengths.
    #[default]
    Auto,
    /// Half-length complex transform with post-processing (`realfft`).
    /// Even lengths only.
    RealFft,
    /// Full-length complex transform of the zero-imaginary signal.
    PackedComplex,
}

/// A real-input transform implementation.
///
/// Both methods are un-normalized and may use their input as scratch.
/// Inputs for `backward` have zero imaginary parts at DC (and at Nyquist
/// for even lengths).
pub trait RealFftBackend: Send {
    fn len(&self) -> usize;
    fn kind(&self) -> FftBackendKind;
    fn forward(&mut self, src: &mut [f32], dst: &mut [Complex32]) -> Result<()>;
    fn backward(&mut self, src: &mut [Complex32], dst: &mut [f32]) -> Result<()>;
}

/// `realfft` plans for an even length.
struct RealFftPlan {
    n: usize,
    fwd: Arc<dyn RealToComplex<f32>>,
    inv: Arc<dyn ComplexToReal<f32>>,
    scratch: Vec<Complex32>,
}

impl RealFftPlan {
    fn new(n: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fwd = planner.plan_fft_forward(n);
        let inv = planner.plan_fft_inverse(n);
        let scratch_len = fwd.get_scratch_len().max(inv.get_scratch_len());
        Self {
            n,
            fwd,
            inv,
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        }
    }
}

impl RealFftBackend for RealFftPlan {
    fn len(&self) -> usize {
        self.n
    }

    fn kind(&self) -> FftBackendKind {
        FftBackendKind::RealFft
    }

    fn forward(&mut self, src: &mut [f32], dst: &mut [Complex32]) -> Result<()> {
        self.fwd
            .process_with_scratch(src, dst, &mut self.scratch)
            .map_err(backend_err)
    }

    fn backward(&mut self, src: &mut [Complex32], dst: &mut [f32]) -> Result<()> {
        self.inv
            .process_with_scratch(src, dst, &mut self.scratch)
            .map_err(backend_err)
    }
}

/// Complex `rustfft` plans over a full-length buffer.
struct PackedComplexPlan {
    n: usize,
    fwd: Arc<dyn rustfft::Fft<f32>>,
    inv: Arc<dyn rustfft::Fft<f32>>,
    buf: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl PackedComplexPlan {
    fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n);
        let inv = planner.plan_fft_inverse(n);
        let scratch_len = fwd
            .get_inplace_scratch_len()
            .max(inv.get_inplace_scratch_len());
        Self {
            n,
            fwd,
            inv,
            buf: vec![Complex32::new(0.0, 0.0); n],
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        }
    }
}

impl RealFftBackend for PackedComplexPlan {
    fn len(&self) -> usize {
        self.n
    }

    fn kind(&self) -> FftBackendKind {
        FftBackendKind::PackedComplex
    }

    fn forward(&mut self, src: &mut [f32], dst: &mut [Complex32]) -> Result<()> {
        for (b, &s) in self.buf.iter_mut().zip(src.iter()) {
            *b = Complex32::new(s, 0.0);
        }
        self.fwd.process_with_scratch(&mut self.buf, &mut self.scratch);
        let bins = dst.len();
        dst.copy_from_slice(&self.buf[..bins]);
        Ok(())
    }

    fn backward(&mut self, src: &mut [Complex32], dst: &mut [f32]) -> Result<()> {
        let n = self.n;
        let bins = src.len();
        self.buf[..bins].copy_from_slice(src);
        // Rebuild the redundant half from conjugate symmetry.
        for j in bins..n {
            self.buf[j] = src[n - j].conj();
        }
        self.inv.process_with_scratch(&mut self.buf, &mut self.scratch);
        for (d, b) in dst.iter_mut().zip(self.buf.iter()) {
            *d = b.re;
        }
        Ok(())
    }
}

/// Pre-planned real-to-complex FFT.
///
/// `forward` takes `n` real samples and produces `n/2 + 1` bins;
/// `backward` is the inverse, scaled by `1/n`.
///
/// # Examples
/// ```
/// use streamdsp_lib::fft::RealFft;
/// use streamdsp_lib::Complex32;
///
/// let mut fft = RealFft::new(960).unwrap();
/// let x = vec![0.5f32; 960];
/// let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];
/// fft.forward(&x, &mut spectrum).unwrap();
/// let mut y = vec![0.0f32; 960];
/// fft.backward(&spectrum, &mut y).unwrap();
/// assert!((y[17] - 0.5).abs() < 1e-5);
/// ```
pub struct RealFft {
    n: usize,
    backend: Box<dyn RealFftBackend>,
    time: Vec<f32>,
    freq: Vec<Complex32>,
}

impl std::fmt::Debug for RealFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealFft")
            .field("n", &self.n)
            .field("backend", &self.backend.kind())
            .finish_non_exhaustive()
    }
}

impl RealFft {
    /// Plan a real transform of length `n`, choosing the backend
    /// automatically.
    pub fn new(n: usize) -> Result<Self> {
        Self::with_backend(n, FftBackendKind::Auto)
    }

    /// Plan a real transform of length `n` with an explicit backend.
    ///
    /// Returns [`DspError::UnsupportedFftLength`] for `n < 2`,
    /// `n > MAX_FFT_SIZE`, or an odd `n` with [`FftBackendKind::RealFft`].
    pub fn with_backend(n: usize, kind: FftBackendKind) -> Result<Self> {
        if !(2..=MAX_FFT_SIZE).contains(&n) {
            return Err(DspError::UnsupportedFftLength(n));
        }
        let backend: Box<dyn RealFftBackend> = match kind {
            FftBackendKind::Auto if n % 2 == 0 => Box::new(RealFftPlan::new(n)),
            FftBackendKind::Auto => Box::new(PackedComplexPlan::new(n)),
            FftBackendKind::RealFft if n % 2 == 0 => Box::new(RealFftPlan::new(n)),
            FftBackendKind::RealFft => return Err(DspError::UnsupportedFftLength(n)),
            FftBackendKind::PackedComplex => Box::new(PackedComplexPlan::new(n)),
        };
        Ok(Self {
            n,
            backend,
            time: vec![0.0; n],
            freq: vec![Complex32::new(0.0, 0.0); n / 2 + 1],
        })
    }

    /// Transform length (number of real samples).
    pub fn len(&self) -> usize {
        self.n
    }

    /// Always `false`: zero-length plans cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Number of frequency bins, `n/2 + 1`.
    pub fn num_bins(&self) -> usize {
        self.n / 2 + 1
    }

    /// The resolved backend (never [`FftBackendKind::Auto`]).
    pub fn backend(&self) -> FftBackendKind {
        self.backend.kind()
    }

    /// Forward transform of `n` reals into `n/2 + 1` bins, un-normalized.
    pub fn forward(&mut self, src: &[f32], dst: &mut [Complex32]) -> Result<()> {
        require_len(self.n, src.len())?;
        require_len(self.num_bins(), dst.len())?;
        self.time.copy_from_slice(src);
        self.backend.forward(&mut self.time, dst)
    }

    /// Inverse transform of `n/2 + 1` bins into `n` reals, scaled by `1/n`.
    ///
    /// The imaginary parts of the DC bin (and the Nyquist bin, for even
    /// `n`) are ignored.
    pub fn backward(&mut self, src: &[Complex32], dst: &mut [f32]) -> Result<()> {
        require_len(self.num_bins(), src.len())?;
        require_len(self.n, dst.len())?;
        self.freq.copy_from_slice(src);
        self.freq[0].im = 0.0;
        if self.n % 2 == 0 {
            self.freq[self.n / 2].im = 0.0;
        }
        self.backend.backward(&mut self.freq, dst)?;
        math::scale(dst, 1.0 / self.n as f32);
        Ok(())
    }
}
