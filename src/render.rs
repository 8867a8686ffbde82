//! Offline rendering of WAV files through the reverb
//!
//! The input is read whole, processed in `block_size` chunks (the last chunk
//! zero-padded) and written as 32-bit float stereo at the engine rate.

use std::path::Path;
use tracing::info;

use crate::controller::Reverb;
use crate::error::{ReverbError, ReverbResult};

/// Configuration for rendering audio
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Keep processing silence after the input ends until the reverb tail has
    /// fully decayed (one extra block per partition)
    pub tail: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { tail: true }
    }
}

/// Statistics about rendered audio
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    /// Frames written per channel
    pub frames: usize,
    /// Blocks passed through the engine
    pub blocks: usize,
    /// Largest absolute output sample
    pub peak: f32,
}

impl RenderStats {
    pub fn print_summary(&self, sample_rate: u32) {
        println!("Render Statistics:");
        println!(
            "  Duration:  {:.3} seconds",
            self.frames as f32 / sample_rate as f32
        );
        println!("  Frames:    {}", self.frames);
        println!("  Blocks:    {}", self.blocks);
        println!("  Peak:      {:.3}", self.peak);
    }
}

/// Render a WAV file through `reverb` into a new WAV file
pub fn render_file(
    input_path: &Path,
    output_path: &Path,
    reverb: &mut Reverb,
    config: &RenderConfig,
) -> ReverbResult<RenderStats> {
    let sample_rate = reverb.controller().store().sample_rate();
    let (left, right) = read_input(input_path, sample_rate)?;
    let (out_left, out_right, blocks) = render_buffers(&left, &right, reverb, config)?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)?;
    let mut peak = 0.0f32;
    for (&l, &r) in out_left.iter().zip(&out_right) {
        peak = peak.max(l.abs()).max(r.abs());
        writer.write_sample(l)?;
        writer.write_sample(r)?;
    }
    writer.finalize()?;

    let stats = RenderStats {
        frames: out_left.len(),
        blocks,
        peak,
    };
    info!(
        "Rendered {:?} -> {:?}: {} frames in {} blocks, peak {:.3}",
        input_path, output_path, stats.frames, stats.blocks, stats.peak
    );
    Ok(stats)
}

/// Process whole stereo buffers block by block
///
/// Returns the output channels and the number of blocks processed. Output is
/// the input length, plus the tail when `config.tail` is set.
pub fn render_buffers(
    left: &[f32],
    right: &[f32],
    reverb: &mut Reverb,
    config: &RenderConfig,
) -> ReverbResult<(Vec<f32>, Vec<f32>, usize)> {
    let block_size = reverb.block_size();
    let frames = left.len().max(right.len());
    let input_blocks = frames.div_ceil(block_size);
    let tail_blocks = if config.tail {
        reverb.engine().partition_count()
    } else {
        0
    };
    let total_blocks = input_blocks + tail_blocks;
    let out_frames = if config.tail {
        total_blocks * block_size
    } else {
        frames
    };

    let mut out_left = Vec::with_capacity(total_blocks * block_size);
    let mut out_right = Vec::with_capacity(total_blocks * block_size);
    let mut in_left = vec![0.0; block_size];
    let mut in_right = vec![0.0; block_size];
    let mut block_left = vec![0.0; block_size];
    let mut block_right = vec![0.0; block_size];

    for block in 0..total_blocks {
        let start = block * block_size;
        copy_padded(left, start, &mut in_left);
        copy_padded(right, start, &mut in_right);
        reverb.process(&[&in_left, &in_right], &mut block_left, &mut block_right)?;
        out_left.extend_from_slice(&block_left);
        out_right.extend_from_slice(&block_right);
    }

    out_left.truncate(out_frames);
    out_right.truncate(out_frames);
    Ok((out_left, out_right, total_blocks))
}

/// Copy `source[start..start + dest.len()]`, zero-filling past the end
fn copy_padded(source: &[f32], start: usize, dest: &mut [f32]) {
    dest.fill(0.0);
    if start < source.len() {
        let end = (start + dest.len()).min(source.len());
        dest[..end - start].copy_from_slice(&source[start..end]);
    }
}

/// Read a mono or stereo WAV as normalised stereo
fn read_input(path: &Path, sample_rate: u32) -> ReverbResult<(Vec<f32>, Vec<f32>)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_rate != sample_rate {
        return Err(ReverbError::Config(format!(
            "{:?} is {} Hz but the reverb runs at {} Hz",
            path, spec.sample_rate, sample_rate
        )));
    }
    if spec.channels == 0 || spec.channels > 2 {
        return Err(ReverbError::InputChannels(spec.channels as usize));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    if spec.channels == 2 {
        let (left, right): (Vec<f32>, Vec<f32>) = samples
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        Ok((left, right))
    } else {
        Ok((samples.clone(), samples))
    }
}
