//! Impulse response loading and caching
//!
//! The store owns an explicit preset table (preset id -> WAV path) and loads
//! each asset at most once. Loading happens on the control thread: either all
//! at once via [`ImpulseResponseStore::load_all`] at construction, or lazily the
//! first time a preset is selected.
//!
//! # Scaling
//!
//! Integer samples are divided by `2^bits_per_sample` and then multiplied by
//! [`IMPULSE_HEADROOM`]. For 16-bit files that is `x / 2^16 * 0.125`. Float
//! files get the same overall scale (`x * 0.5 * 0.125`), so an asset sounds
//! the same whichever sample format it was exported in.
//!
//! # Sample rates
//!
//! No resampling is performed. An asset whose rate differs from the engine's is
//! rejected with [`ReverbError::SampleRateMismatch`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ReverbConfig;
use crate::error::{ReverbError, ReverbResult};
use crate::impulse::ImpulseResponse;

/// Additional gain applied to every loaded impulse
pub const IMPULSE_HEADROOM: f32 = 0.125;

/// Impulse bank that loads and caches WAV files by preset id
#[derive(Clone, Debug)]
pub struct ImpulseResponseStore {
    sample_rate: u32,
    presets: BTreeMap<String, PathBuf>,
    impulses: HashMap<String, Arc<ImpulseResponse>>,
}

impl ImpulseResponseStore {
    /// Create a store for an explicit preset table (paths used as given)
    pub fn new(sample_rate: u32, presets: BTreeMap<String, PathBuf>) -> Self {
        Self {
            sample_rate,
            presets,
            impulses: HashMap::new(),
        }
    }

    /// Create a store from a config, resolving relative paths against `impulse_dir`
    pub fn from_config(config: &ReverbConfig) -> Self {
        Self::new(config.sample_rate, config.resolved_presets())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Known preset ids, sorted
    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(|name| name.as_str())
    }

    pub fn contains(&self, preset: &str) -> bool {
        self.presets.contains_key(preset) || self.impulses.contains_key(preset)
    }

    pub fn path(&self, preset: &str) -> Option<&Path> {
        self.presets.get(preset).map(|path| path.as_path())
    }

    pub fn is_loaded(&self, preset: &str) -> bool {
        self.impulses.contains_key(preset)
    }

    /// Get an impulse, reading it from disk on first use
    pub fn load(&mut self, preset: &str) -> ReverbResult<Arc<ImpulseResponse>> {
        if let Some(impulse) = self.impulses.get(preset) {
            return Ok(Arc::clone(impulse));
        }

        let path = self
            .presets
            .get(preset)
            .ok_or_else(|| ReverbError::UnknownPreset(preset.to_string()))?;

        let impulse = Arc::new(read_impulse(preset, path, self.sample_rate)?);
        info!(
            "Loaded impulse '{}' from {:?}: {} frames ({:.2}s)",
            preset,
            path,
            impulse.len(),
            impulse.duration()
        );
        self.impulses
            .insert(preset.to_string(), Arc::clone(&impulse));
        Ok(impulse)
    }

    /// Load every configured preset, failing on the first bad asset
    pub fn load_all(&mut self) -> ReverbResult<()> {
        let names: Vec<String> = self.presets.keys().cloned().collect();
        for name in names {
            self.load(&name)?;
        }
        debug!("{} impulses cached", self.impulses.len());
        Ok(())
    }

    /// Register an in-memory impulse under a preset id
    pub fn insert(&mut self, impulse: ImpulseResponse) -> ReverbResult<()> {
        if impulse.sample_rate() != self.sample_rate {
            return Err(ReverbError::SampleRateMismatch {
                preset: impulse.preset().to_string(),
                expected: self.sample_rate,
                found: impulse.sample_rate(),
            });
        }
        self.impulses
            .insert(impulse.preset().to_string(), Arc::new(impulse));
        Ok(())
    }
}

/// Read a WAV asset as a headroom-scaled stereo impulse
pub fn read_impulse(preset: &str, path: &Path, sample_rate: u32) -> ReverbResult<ImpulseResponse> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_rate != sample_rate {
        return Err(ReverbError::SampleRateMismatch {
            preset: preset.to_string(),
            expected: sample_rate,
            found: spec.sample_rate,
        });
    }
    if spec.channels == 0 || spec.channels > 2 {
        return Err(ReverbError::UnsupportedChannelCount {
            preset: preset.to_string(),
            channels: spec.channels,
        });
    }

    let raw_samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            let scale = 0.5 * IMPULSE_HEADROOM;
            reader
                .samples::<f32>()
                .map(|s| s.map(|v| v * scale))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Int => {
            let scale = IMPULSE_HEADROOM / (1u64 << spec.bits_per_sample) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    if raw_samples.is_empty() {
        return Err(ReverbError::EmptyImpulse(path.to_path_buf()));
    }

    let impulse = if spec.channels == 2 {
        // Deinterleave: L R L R -> (L L, R R)
        let num_frames = raw_samples.len() / 2;
        let mut left = Vec::with_capacity(num_frames);
        let mut right = Vec::with_capacity(num_frames);
        for frame in raw_samples.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        ImpulseResponse::stereo(preset, spec.sample_rate, left, right)
    } else {
        ImpulseResponse::mono(preset, spec.sample_rate, raw_samples)
    };

    Ok(impulse)
}
