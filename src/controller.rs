//! Control-thread side of the reverb
//!
//! `ReverbController` owns the impulse store and turns parameter changes into
//! either a mix update (published through `ArcSwap`) or a full rebuild:
//!
//! ```text
//! preset/decay -> store.load -> shaper.shape -> builder.build -> ReverbState -> engine
//! ```
//!
//! `Reverb` pairs a controller with its engine for single-threaded use, where
//! every rebuild is committed before the call that caused it returns.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{PartitionPadding, ReverbConfig};
use crate::engine::{ConvolutionEngine, ReverbState};
use crate::error::{ReverbError, ReverbResult};
use crate::filter_bank::{FilterBank, FilterBankBuilder};
use crate::handoff::{state_channel, StateSender, HANDOFF_CAPACITY};
use crate::impulse_store::ImpulseResponseStore;
use crate::parameters::{MixSettings, ParameterChange, ParameterObserver, ReverbParameters};
use crate::shaper::ImpulseShaper;

/// Build a controller/engine pair from a config
///
/// Every configured preset is loaded up front, so a missing asset or a sample
/// rate mismatch fails here rather than on the first preset change.
pub fn reverb(config: &ReverbConfig) -> ReverbResult<(ReverbController, ConvolutionEngine)> {
    config.validate()?;
    let mut store = ImpulseResponseStore::from_config(config);
    store.load_all()?;
    ReverbController::with_store(
        store,
        config.block_size,
        config.padding,
        config.parameters.clone(),
    )
}

pub struct ReverbController {
    store: ImpulseResponseStore,
    shaper: ImpulseShaper,
    builder: FilterBankBuilder,
    params: ReverbParameters,
    generation: u64,
    sender: StateSender,
    mix: Arc<ArcSwap<MixSettings>>,
}

impl ReverbController {
    /// Build the initial state from `params` and connect a new engine to it
    pub fn with_store(
        mut store: ImpulseResponseStore,
        block_size: usize,
        padding: PartitionPadding,
        params: ReverbParameters,
    ) -> ReverbResult<(Self, ConvolutionEngine)> {
        if block_size == 0 {
            return Err(ReverbError::Config("block_size must be positive".into()));
        }
        let params = params.clamped();
        let shaper = ImpulseShaper::new(store.sample_rate());
        let builder = FilterBankBuilder::new(block_size, padding);

        let filters = build_filters(&mut store, &shaper, &builder, &params)?;
        let mix = Arc::new(ArcSwap::from_pointee(params.mix()));
        let (sender, receiver) = state_channel(HANDOFF_CAPACITY);
        let engine = ConvolutionEngine::new(ReverbState::new(filters, 0), receiver, Arc::clone(&mix));

        info!(
            "Reverb ready: preset '{}', block size {}, {} partitions",
            params.preset,
            block_size,
            engine.partition_count()
        );

        let controller = Self {
            store,
            shaper,
            builder,
            params,
            generation: 0,
            sender,
            mix,
        };
        Ok((controller, engine))
    }

    pub fn parameters(&self) -> &ReverbParameters {
        &self.params
    }

    /// Generation of the most recently sent state
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn block_size(&self) -> usize {
        self.builder.block_size()
    }

    pub fn store(&self) -> &ImpulseResponseStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ImpulseResponseStore {
        &mut self.store
    }

    /// Replace every parameter at once
    ///
    /// Values are clamped first. A preset or decay change rebuilds the filter
    /// bank; if that fails nothing is changed. Mix and bypass are published
    /// after the rebuild is queued, so the engine never mixes with settings
    /// ahead of its filters.
    pub fn set_parameters(&mut self, params: ReverbParameters) -> ReverbResult<()> {
        let params = params.clamped();
        let changes = params.changes_from(&self.params);
        if changes.is_empty() {
            return Ok(());
        }

        if changes.iter().any(ParameterChange::requires_rebuild) {
            self.send_rebuild(&params)?;
        }

        self.mix.store(Arc::new(params.mix()));
        debug!("Parameters updated: {:?}", changes);
        self.params = params;
        Ok(())
    }

    /// Apply a single change
    pub fn apply(&mut self, change: &ParameterChange) -> ReverbResult<()> {
        let mut params = self.params.clone();
        params.apply(change);
        self.set_parameters(params)
    }

    pub fn set_preset(&mut self, preset: &str) -> ReverbResult<()> {
        self.apply(&ParameterChange::Preset(preset.to_string()))
    }

    pub fn set_decay(&mut self, decay: f64) -> ReverbResult<()> {
        self.apply(&ParameterChange::Decay(decay))
    }

    pub fn set_dry_mix(&mut self, dry_mix: f32) -> ReverbResult<()> {
        self.apply(&ParameterChange::DryMix(dry_mix))
    }

    pub fn set_wet_mix(&mut self, wet_mix: f32) -> ReverbResult<()> {
        self.apply(&ParameterChange::WetMix(wet_mix))
    }

    pub fn set_bypass(&mut self, bypass: bool) -> ReverbResult<()> {
        self.apply(&ParameterChange::Bypass(bypass))
    }

    /// Rebuild from the current parameters, e.g. after `store_mut().insert()`
    /// replaced the active impulse
    pub fn rebuild(&mut self) -> ReverbResult<()> {
        let params = self.params.clone();
        self.send_rebuild(&params)
    }

    /// Filter bank for `params` without touching the engine
    pub fn build_filter_bank(&mut self, params: &ReverbParameters) -> ReverbResult<FilterBank> {
        build_filters(&mut self.store, &self.shaper, &self.builder, &params.clamped())
    }

    /// Free states the engine has replaced
    pub fn collect_retired(&mut self) -> usize {
        self.sender.collect_retired()
    }

    fn send_rebuild(&mut self, params: &ReverbParameters) -> ReverbResult<()> {
        let filters = build_filters(&mut self.store, &self.shaper, &self.builder, params)?;
        let generation = self.generation + 1;
        let partitions = filters.len();
        self.sender
            .send(Box::new(ReverbState::new(filters, generation)))?;
        self.generation = generation;

        info!(
            "Rebuilt reverb: preset '{}', decay {:.3}, {} partitions (generation {})",
            params.preset, params.decay, partitions, generation
        );
        Ok(())
    }
}

impl ParameterObserver for ReverbController {
    fn parameter_changed(&mut self, change: &ParameterChange) -> ReverbResult<()> {
        self.apply(change)
    }
}

fn build_filters(
    store: &mut ImpulseResponseStore,
    shaper: &ImpulseShaper,
    builder: &FilterBankBuilder,
    params: &ReverbParameters,
) -> ReverbResult<FilterBank> {
    let impulse = store.load(&params.preset)?;
    let shaped = shaper.shape(&impulse, params.decay);
    builder.build(&shaped)
}

/// Controller and engine driven from one thread
pub struct Reverb {
    controller: ReverbController,
    engine: ConvolutionEngine,
}

impl Reverb {
    pub fn new(config: &ReverbConfig) -> ReverbResult<Self> {
        let (controller, engine) = reverb(config)?;
        Ok(Self { controller, engine })
    }

    pub fn with_store(
        store: ImpulseResponseStore,
        block_size: usize,
        padding: PartitionPadding,
        params: ReverbParameters,
    ) -> ReverbResult<Self> {
        let (controller, engine) = ReverbController::with_store(store, block_size, padding, params)?;
        Ok(Self { controller, engine })
    }

    pub fn controller(&self) -> &ReverbController {
        &self.controller
    }

    pub fn engine(&self) -> &ConvolutionEngine {
        &self.engine
    }

    pub fn parameters(&self) -> &ReverbParameters {
        self.controller.parameters()
    }

    pub fn block_size(&self) -> usize {
        self.engine.block_size()
    }

    pub fn set_parameters(&mut self, params: ReverbParameters) -> ReverbResult<()> {
        let result = self.controller.set_parameters(params);
        self.sync();
        result
    }

    pub fn apply(&mut self, change: &ParameterChange) -> ReverbResult<()> {
        let result = self.controller.apply(change);
        self.sync();
        result
    }

    pub fn set_preset(&mut self, preset: &str) -> ReverbResult<()> {
        self.apply(&ParameterChange::Preset(preset.to_string()))
    }

    pub fn set_decay(&mut self, decay: f64) -> ReverbResult<()> {
        self.apply(&ParameterChange::Decay(decay))
    }

    pub fn set_dry_mix(&mut self, dry_mix: f32) -> ReverbResult<()> {
        self.apply(&ParameterChange::DryMix(dry_mix))
    }

    pub fn set_wet_mix(&mut self, wet_mix: f32) -> ReverbResult<()> {
        self.apply(&ParameterChange::WetMix(wet_mix))
    }

    pub fn set_bypass(&mut self, bypass: bool) -> ReverbResult<()> {
        self.apply(&ParameterChange::Bypass(bypass))
    }

    pub fn process(
        &mut self,
        input: &[&[f32]],
        left: &mut [f32],
        right: &mut [f32],
    ) -> ReverbResult<()> {
        self.engine.process(input, left, right)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn into_parts(self) -> (ReverbController, ConvolutionEngine) {
        (self.controller, self.engine)
    }

    fn sync(&mut self) {
        self.engine.commit_pending();
        self.controller.collect_retired();
    }
}

impl ParameterObserver for Reverb {
    fn parameter_changed(&mut self, change: &ParameterChange) -> ReverbResult<()> {
        self.apply(change)
    }
}
