// SPDX-License-Identifier: LGPL-3.0-or-later

//! Matrix FIR convolution: every output is the sum of all inputs, each
//! filtered by its own (output, input) filter.

use super::partition::{ConvCore, FilterSpectra};
use crate::{block_len, block_len_mut};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use streamdsp_lib::error::{require_len, require_positive};
use streamdsp_lib::{DspError, Result};
use tracing::debug;

/// Construction parameters for [`MatrixConv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatrixConvConfig {
    /// Samples per channel per `apply` call; also the partition size.
    pub block_size: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    /// Taps per (output, input) filter.
    pub filter_len: usize,
}

impl MatrixConvConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("block size", self.block_size)?;
        require_positive("input channel count", self.in_channels)?;
        require_positive("output channel count", self.out_channels)?;
        require_positive("filter length", self.filter_len)?;
        Ok(())
    }

    /// Length of the flattened `outputs × inputs × filter_len` matrix.
    pub fn filters_len(&self) -> usize {
        self.out_channels * self.in_channels * self.filter_len
    }
}

/// Matrix FIR convolver: `y_o = Σ_i h[o][i] * x_i`.
///
/// # Examples
/// ```
/// use streamdsp_units::conv::{MatrixConv, MatrixConvConfig};
///
/// let config = MatrixConvConfig {
///     block_size: 64,
///     in_channels: 2,
///     out_channels: 1,
///     filter_len: 3,
/// };
/// // y = x0 + 0.5·x1 delayed by two samples
/// let filters = [1.0, 0.0, 0.0, 0.0, 0.0, 0.5];
/// let mut conv = MatrixConv::new(config, &filters).unwrap();
///
/// let input = vec![vec![1.0f32; 64], vec![2.0f32; 64]];
/// let mut output = vec![vec![0.0f32; 64]];
/// conv.apply(&input, &mut output).unwrap();
/// assert!((output[0][10] - 2.0).abs() < 1e-4);
/// ```
#[derive(Debug)]
pub struct MatrixConv {
    config: MatrixConvConfig,
    core: ConvCore,
    /// `outputs × inputs`, output-major.
    filters: Vec<FilterSpectra>,
}

impl MatrixConv {
    /// Partition and transform `filters`, the flattened
    /// `out_channels × in_channels × filter_len` matrix.
    pub fn new(config: MatrixConvConfig, filters: &[f32]) -> Result<Self> {
        config.validate()?;
        if filters.len() != config.filters_len() {
            return Err(DspError::FilterSizeMismatch {
                expected: config.filters_len(),
                got: filters.len(),
            });
        }
        let mut core = ConvCore::new(config.block_size, config.filter_len, config.in_channels)?;
        let filters = filters
            .chunks_exact(config.filter_len)
            .map(|taps| core.transform_filter(taps))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            block_size = config.block_size,
            in_channels = config.in_channels,
            out_channels = config.out_channels,
            filter_len = config.filter_len,
            partitions = core.num_partitions(),
            "matrix convolver created"
        );

        Ok(Self {
            config,
            core,
            filters,
        })
    }

    pub fn config(&self) -> &MatrixConvConfig {
        &self.config
    }

    /// Latency in samples: one host block.
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    pub fn num_partitions(&self) -> usize {
        self.core.num_partitions()
    }

    /// Convolve one block per input into one block per output.
    pub fn apply<I, O>(&mut self, input: &[I], output: &mut [O]) -> Result<()>
    where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        let block = self.config.block_size;
        require_len(block, block_len(input, self.config.in_channels)?)?;
        require_len(block, block_len_mut(output, self.config.out_channels)?)?;

        self.core.push(input)?;
        let inputs = self.config.in_channels;
        for (o, y) in output.iter_mut().enumerate() {
            self.core.begin_output();
            for (i, filter) in self.filters[o * inputs..(o + 1) * inputs].iter().enumerate() {
                self.core.accumulate(filter, i);
            }
            self.core.finish_output(y.as_mut())?;
        }
        Ok(())
    }

    /// Zero the input history and delay lines; filters are kept.
    pub fn flush(&mut self) {
        debug!("matrix convolver flush");
        self.core.clear();
    }
}
