// SPDX-License-Identifier: LGPL-3.0-or-later

//! Per-channel FIR convolution with one filter per channel.

use super::partition::{ConvCore, FilterSpectra};
use crate::{block_len, block_len_mut};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use streamdsp_lib::error::{require_len, require_positive};
use streamdsp_lib::{DspError, Result};
use tracing::debug;

/// Construction parameters for [`MultiConv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiConvConfig {
    pub block_size: usize,
    pub channels: usize,
    pub filter_len: usize,
}

impl MultiConvConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("block size", self.block_size)?;
        require_positive("channel count", self.channels)?;
        require_positive("filter length", self.filter_len)?;
        Ok(())
    }
}

/// Per-channel FIR convolver: channel `c` is filtered by filter `c`.
#[derive(Debug)]
pub struct MultiConv {
    config: MultiConvConfig,
    core: ConvCore,
    filters: Vec<FilterSpectra>,
}

impl MultiConv {
    /// Partition and transform `filters`, the flattened
    /// `channels × filter_len` array.
    pub fn new(config: MultiConvConfig, filters: &[f32]) -> Result<Self> {
        config.validate()?;
        let expected = config.channels * config.filter_len;
        if filters.len() != expected {
            return Err(DspError::FilterSizeMismatch {
                expected,
                got: filters.len(),
            });
        }
        let mut core = ConvCore::new(config.block_size, config.filter_len, config.channels)?;
        let filters = filters
            .chunks_exact(config.filter_len)
            .map(|taps| core.transform_filter(taps))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            block_size = config.block_size,
            channels = config.channels,
            filter_len = config.filter_len,
            "multichannel convolver created"
        );

        Ok(Self {
            config,
            core,
            filters,
        })
    }

    pub fn config(&self) -> &MultiConvConfig {
        &self.config
    }

    /// Latency in samples: one host block.
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Filter one block per channel.
    pub fn apply<I, O>(&mut self, input: &[I], output: &mut [O]) -> Result<()>
    where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        let block = self.config.block_size;
        require_len(block, block_len(input, self.config.channels)?)?;
        require_len(block, block_len_mut(output, self.config.channels)?)?;

        self.core.push(input)?;
        for (c, (y, filter)) in output.iter_mut().zip(&self.filters).enumerate() {
            self.core.begin_output();
            self.core.accumulate(filter, c);
            self.core.finish_output(y.as_mut())?;
        }
        Ok(())
    }

    /// Zero the input history and delay lines; filters are kept.
    pub fn flush(&mut self) {
        debug!("multichannel convolver flush");
        self.core.clear();
    }
}
