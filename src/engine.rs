//! Uniformly partitioned overlap-add convolution engine
//!
//! Per block of `B` samples and `P` filter partitions:
//! 1. Zero-pad the input block to `2B` and transform it
//! 2. Store the spectrum as the newest entry of the history ring
//! 3. `Y = sum_k history[k] * filters[k]` (history[k] is the input from k blocks ago)
//! 4. Inverse transform `Y` to `y` (`2B` samples)
//! 5. Output `y[..B] + overlap`, keep `y[B..]` as the next overlap
//!
//! The cost per block is `P` complex multiply-accumulates per bin plus one
//! forward and one inverse transform per channel, whatever the impulse length.
//! The output for a block includes that block's own contribution, so the engine
//! adds no latency.
//!
//! # Real-time contract
//!
//! `process()` does not allocate, lock or log. All buffers are sized at
//! construction or arrive pre-sized inside a [`ReverbState`] from the
//! controller. Mix settings are read through an `ArcSwap` once per block.

use arc_swap::ArcSwap;
use num_complex::Complex;
use std::sync::Arc;

use crate::error::{ReverbError, ReverbResult};
use crate::filter_bank::{FilterBank, Partition, CHANNELS};
use crate::handoff::{state_channel, StateReceiver};
use crate::parameters::MixSettings;
use crate::spectral::{complex_multiply_accumulate, SpectralTransform};

/// Input spectra of the most recent blocks, newest first
///
/// Advancing overwrites the oldest slot in place and moves the head index; no
/// spectra are copied.
#[derive(Clone, Debug)]
pub struct HistoryRing {
    slots: Vec<Partition>,
    newest: usize,
}

impl HistoryRing {
    /// `len` slots of silence
    pub fn new(len: usize, spectrum_len: usize) -> Self {
        let silence = vec![Complex::new(0.0, 0.0); spectrum_len];
        Self {
            slots: vec![[silence.clone(), silence]; len],
            newest: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entry from `age` blocks ago (0 = newest)
    pub fn get(&self, age: usize) -> &Partition {
        &self.slots[(self.newest + age) % self.slots.len()]
    }

    /// Retire the oldest entry and return its slot as the new newest entry
    pub fn advance(&mut self) -> &mut Partition {
        let len = self.slots.len();
        self.newest = (self.newest + len - 1) % len;
        &mut self.slots[self.newest]
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            for channel in slot.iter_mut() {
                channel.fill(Complex::new(0.0, 0.0));
            }
        }
        self.newest = 0;
    }

    /// True when every entry is the spectrum of silence
    pub fn is_silent(&self) -> bool {
        self.slots
            .iter()
            .flat_map(|slot| slot.iter())
            .all(|channel| channel.iter().all(|bin| bin.re == 0.0 && bin.im == 0.0))
    }
}

/// Everything the engine mutates per block, sized together from one filter bank
///
/// The history ring and overlap buffers can only be created from the filter
/// bank they serve, so their sizes always agree with it.
#[derive(Clone, Debug)]
pub struct ReverbState {
    generation: u64,
    filters: FilterBank,
    history: HistoryRing,
    overlap: [Vec<f32>; CHANNELS],
}

impl ReverbState {
    pub fn new(filters: FilterBank, generation: u64) -> Self {
        let history = HistoryRing::new(filters.len(), filters.spectrum_len());
        let overlap = [
            vec![0.0; filters.block_size()],
            vec![0.0; filters.block_size()],
        ];
        Self {
            generation,
            filters,
            history,
            overlap,
        }
    }

    /// Rebuild counter this state was created for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn overlap(&self) -> &[Vec<f32>; CHANNELS] {
        &self.overlap
    }

    pub fn partition_count(&self) -> usize {
        self.filters.len()
    }

    /// Silence history and overlap, keeping the filters
    pub fn reset(&mut self) {
        self.history.clear();
        for channel in &mut self.overlap {
            channel.fill(0.0);
        }
    }
}

/// Audio-thread half of the reverb
pub struct ConvolutionEngine {
    block_size: usize,
    fft: SpectralTransform,
    state: Box<ReverbState>,
    receiver: StateReceiver,
    mix: Arc<ArcSwap<MixSettings>>,

    // Per-block workspace
    padded: Vec<f32>,
    accumulator: Vec<Complex<f32>>,
    time: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    dry: [Vec<f32>; CHANNELS],
}

impl ConvolutionEngine {
    /// Engine fed by a controller through `receiver` and `mix`
    pub fn new(
        state: ReverbState,
        receiver: StateReceiver,
        mix: Arc<ArcSwap<MixSettings>>,
    ) -> Self {
        let block_size = state.filters().block_size();
        let fft = SpectralTransform::for_block_size(block_size);

        Self {
            block_size,
            padded: vec![0.0; fft.size()],
            accumulator: fft.make_spectrum(),
            time: vec![0.0; fft.size()],
            scratch: fft.make_scratch(),
            dry: [vec![0.0; block_size], vec![0.0; block_size]],
            fft,
            state: Box::new(state),
            receiver,
            mix,
        }
    }

    /// Engine with a fixed filter bank and no controller
    pub fn from_filter_bank(filters: FilterBank, mix: MixSettings) -> Self {
        let (_sender, receiver) = state_channel(1);
        Self::new(
            ReverbState::new(filters, 0),
            receiver,
            Arc::new(ArcSwap::from_pointee(mix)),
        )
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Fixed delay between input and its first wet contribution, in samples
    pub fn latency_samples(&self) -> usize {
        0
    }

    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    pub fn partition_count(&self) -> usize {
        self.state.partition_count()
    }

    pub fn state(&self) -> &ReverbState {
        &self.state
    }

    /// Current output-stage settings
    pub fn mix(&self) -> MixSettings {
        **self.mix.load()
    }

    /// Replace the output-stage settings
    pub fn set_mix(&self, mix: MixSettings) {
        self.mix.store(Arc::new(mix));
    }

    /// Silence the reverb tail without rebuilding
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Swap in any states queued by the controller. Returns true if the state
    /// changed. Called automatically at the start of every `process()`.
    pub fn commit_pending(&mut self) -> bool {
        let mut committed = false;
        while let Some(next) = self.receiver.receive() {
            let previous = std::mem::replace(&mut self.state, next);
            self.receiver.retire(previous);
            committed = true;
        }
        committed
    }

    /// Process one block
    ///
    /// `input` holds one (mono) or two (stereo) channels of exactly
    /// `block_size` samples. Mono input is duplicated to both channels. With
    /// bypass on, input is copied to the outputs unchanged.
    pub fn process(
        &mut self,
        input: &[&[f32]],
        left: &mut [f32],
        right: &mut [f32],
    ) -> ReverbResult<()> {
        self.commit_pending();

        let block_size = self.block_size;
        let num_inputs = input.len();
        if num_inputs == 0 || num_inputs > CHANNELS {
            return Err(ReverbError::InputChannels(num_inputs));
        }
        for len in input
            .iter()
            .map(|c| c.len())
            .chain([left.len(), right.len()])
        {
            if len != block_size {
                return Err(ReverbError::BlockSizeMismatch {
                    expected: block_size,
                    found: len,
                });
            }
        }

        let mix = **self.mix.load();
        let source = |ch: usize| input[ch.min(num_inputs - 1)];

        if mix.bypass {
            left.copy_from_slice(source(0));
            right.copy_from_slice(source(1));
            return Ok(());
        }

        for (ch, dry) in self.dry.iter_mut().enumerate() {
            dry.copy_from_slice(source(ch));
        }

        let state = &mut *self.state;

        // Transform the new block straight into the history slot it replaces
        let newest = state.history.advance();
        for (ch, spectrum) in newest.iter_mut().enumerate() {
            self.padded[..block_size].copy_from_slice(&self.dry[ch]);
            self.padded[block_size..].fill(0.0);
            self.fft.forward(&mut self.padded, spectrum, &mut self.scratch)?;
        }

        for ch in 0..CHANNELS {
            self.accumulator.fill(Complex::new(0.0, 0.0));
            for (age, filter) in state.filters.partitions().iter().enumerate() {
                complex_multiply_accumulate(
                    &mut self.accumulator,
                    &state.history.get(age)[ch],
                    &filter[ch],
                );
            }
            self.fft
                .inverse(&mut self.accumulator, &mut self.time, &mut self.scratch)?;

            let output: &mut [f32] = if ch == 0 { &mut *left } else { &mut *right };
            let overlap = &mut state.overlap[ch];
            let dry = &self.dry[ch];
            for i in 0..block_size {
                let wet = self.time[i] + overlap[i];
                output[i] = wet * mix.wet_mix + dry[i] * mix.dry_mix;
            }
            overlap.copy_from_slice(&self.time[block_size..]);
        }

        Ok(())
    }
}

impl std::fmt::Debug for ConvolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvolutionEngine")
            .field("block_size", &self.block_size)
            .field("partitions", &self.state.partition_count())
            .field("generation", &self.state.generation())
            .finish()
    }
}
