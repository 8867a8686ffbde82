//! Uniformly partitioned frequency-domain filter bank
//!
//! A shaped impulse is zero-padded to a whole number of `block_size` segments.
//! Each segment is zero-padded again to `2 * block_size` and transformed per
//! channel. The doubled transform length leaves room for the full linear
//! convolution of one segment with one input block, so the engine's
//! overlap-add reproduces linear rather than circular convolution.

use num_complex::Complex;
use tracing::debug;

use crate::config::PartitionPadding;
use crate::error::ReverbResult;
use crate::impulse::ImpulseResponse;
use crate::spectral::SpectralTransform;

/// Number of channels the engine processes
pub const CHANNELS: usize = 2;

/// One segment of the impulse in the frequency domain, per channel
pub type Partition = [Vec<Complex<f32>>; CHANNELS];

/// Filter spectra for a shaped impulse, ordered from earliest segment to latest
#[derive(Clone, Debug)]
pub struct FilterBank {
    preset: String,
    block_size: usize,
    impulse_len: usize,
    partitions: Vec<Partition>,
}

impl FilterBank {
    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Frames of the shaped impulse before padding
    pub fn impulse_len(&self) -> usize {
        self.impulse_len
    }

    /// Partition count, always at least one
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Complex bins per channel per partition
    pub fn spectrum_len(&self) -> usize {
        self.block_size + 1
    }

    pub fn partition(&self, index: usize) -> &Partition {
        &self.partitions[index]
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }
}

/// Builds filter banks for a fixed block size
#[derive(Clone, Debug)]
pub struct FilterBankBuilder {
    block_size: usize,
    padding: PartitionPadding,
    fft: SpectralTransform,
}

impl FilterBankBuilder {
    pub fn new(block_size: usize, padding: PartitionPadding) -> Self {
        Self {
            block_size,
            padding,
            fft: SpectralTransform::for_block_size(block_size),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn padding(&self) -> PartitionPadding {
        self.padding
    }

    /// Number of partitions an impulse of `len` frames produces
    pub fn partition_count(&self, len: usize) -> usize {
        (len + self.padding.pad_amount(len, self.block_size)) / self.block_size
    }

    /// Partition and transform a shaped impulse
    pub fn build(&self, impulse: &ImpulseResponse) -> ReverbResult<FilterBank> {
        let block_size = self.block_size;
        let impulse_len = impulse.len();
        let num_partitions = self.partition_count(impulse_len);

        let mut segment = vec![0.0; self.fft.size()];
        let mut scratch = self.fft.make_scratch();
        let mut partitions = Vec::with_capacity(num_partitions);

        for index in 0..num_partitions {
            let start = index * block_size;
            let mut partition: Partition = [self.fft.make_spectrum(), self.fft.make_spectrum()];

            for (channel, spectrum) in partition.iter_mut().enumerate() {
                let data = impulse.channel(channel);
                let end = (start + block_size).min(data.len());

                // Segment in the first half, zeros everywhere else
                segment.fill(0.0);
                if start < end {
                    segment[..end - start].copy_from_slice(&data[start..end]);
                }
                self.fft.forward(&mut segment, spectrum, &mut scratch)?;
            }
            partitions.push(partition);
        }

        debug!(
            "Built filter bank for '{}': {} frames -> {} partitions of {}",
            impulse.preset(),
            impulse_len,
            num_partitions,
            block_size
        );

        Ok(FilterBank {
            preset: impulse.preset().to_string(),
            block_size,
            impulse_len,
            partitions,
        })
    }
}
