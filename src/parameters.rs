//! Reverb control values and change notification
//!
//! `ReverbParameters` is the typed parameter surface of the reverb. Changes are
//! expressed as [`ParameterChange`] values so a host-side parameter system can
//! forward them to a [`ParameterObserver`] (the controller) without string
//! lookups. Only `preset` and `decay` invalidate the convolution state; the mix
//! values and bypass act on the output stage alone.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ReverbResult;

pub const DEFAULT_PRESET: &str = "sm-room";
pub const DEFAULT_DECAY: f64 = 1.0;
pub const DEFAULT_DRY_MIX: f32 = 0.8;
pub const DEFAULT_WET_MIX: f32 = 0.1;

/// Complete set of reverb controls
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParameters {
    /// Pass input through untouched
    pub bypass: bool,
    /// Impulse response preset id
    pub preset: String,
    /// Fraction of the impulse kept before the fade-out, 0.0 to 1.0
    pub decay: f64,
    /// Gain of the unprocessed signal, 0.0 to 1.0
    pub dry_mix: f32,
    /// Gain of the convolved signal, 0.0 to 1.0
    pub wet_mix: f32,
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self {
            bypass: false,
            preset: DEFAULT_PRESET.to_string(),
            decay: DEFAULT_DECAY,
            dry_mix: DEFAULT_DRY_MIX,
            wet_mix: DEFAULT_WET_MIX,
        }
    }
}

impl ReverbParameters {
    /// Copy with decay and mix values forced into [0, 1]
    pub fn clamped(&self) -> Self {
        Self {
            bypass: self.bypass,
            preset: self.preset.clone(),
            decay: clamp_unit("decay", self.decay, DEFAULT_DECAY),
            dry_mix: clamp_unit("dry_mix", self.dry_mix as f64, DEFAULT_DRY_MIX as f64) as f32,
            wet_mix: clamp_unit("wet_mix", self.wet_mix as f64, DEFAULT_WET_MIX as f64) as f32,
        }
    }

    /// Output-stage subset handed to the audio thread
    pub fn mix(&self) -> MixSettings {
        MixSettings {
            bypass: self.bypass,
            dry_mix: self.dry_mix,
            wet_mix: self.wet_mix,
        }
    }

    /// Apply a single change in place
    pub fn apply(&mut self, change: &ParameterChange) {
        match change {
            ParameterChange::Bypass(v) => self.bypass = *v,
            ParameterChange::Preset(name) => self.preset = name.clone(),
            ParameterChange::Decay(v) => self.decay = *v,
            ParameterChange::DryMix(v) => self.dry_mix = *v,
            ParameterChange::WetMix(v) => self.wet_mix = *v,
        }
    }

    /// Changes that turn `previous` into `self`
    pub fn changes_from(&self, previous: &ReverbParameters) -> Vec<ParameterChange> {
        let mut changes = Vec::new();
        if self.bypass != previous.bypass {
            changes.push(ParameterChange::Bypass(self.bypass));
        }
        if self.preset != previous.preset {
            changes.push(ParameterChange::Preset(self.preset.clone()));
        }
        if self.decay != previous.decay {
            changes.push(ParameterChange::Decay(self.decay));
        }
        if self.dry_mix != previous.dry_mix {
            changes.push(ParameterChange::DryMix(self.dry_mix));
        }
        if self.wet_mix != previous.wet_mix {
            changes.push(ParameterChange::WetMix(self.wet_mix));
        }
        changes
    }
}

fn clamp_unit(name: &str, value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        warn!("{} is NaN, using {}", name, fallback);
        return fallback;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

/// Output-stage controls read by the audio thread once per block
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixSettings {
    pub bypass: bool,
    pub dry_mix: f32,
    pub wet_mix: f32,
}

impl Default for MixSettings {
    fn default() -> Self {
        ReverbParameters::default().mix()
    }
}

/// A single parameter mutation
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterChange {
    Bypass(bool),
    Preset(String),
    Decay(f64),
    DryMix(f32),
    WetMix(f32),
}

impl ParameterChange {
    /// True when the filter bank must be rebuilt
    pub fn requires_rebuild(&self) -> bool {
        matches!(self, ParameterChange::Preset(_) | ParameterChange::Decay(_))
    }
}

/// Receives parameter mutations from a host parameter system
pub trait ParameterObserver {
    fn parameter_changed(&mut self, change: &ParameterChange) -> ReverbResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameter_values() {
        let params = ReverbParameters::default();
        assert!(!params.bypass);
        assert_eq!(params.preset, "sm-room");
        assert_eq!(params.decay, 1.0);
        assert_eq!(params.dry_mix, 0.8);
        assert_eq!(params.wet_mix, 0.1);
    }

    #[test]
    fn test_clamped_forces_unit_range() {
        let params = ReverbParameters {
            decay: -0.5,
            dry_mix: 1.7,
            wet_mix: f32::NAN,
            ..Default::default()
        };
        let clamped = params.clamped();
        assert_eq!(clamped.decay, 0.0);
        assert_eq!(clamped.dry_mix, 1.0);
        assert_eq!(clamped.wet_mix, DEFAULT_WET_MIX);
    }

    #[test]
    fn test_only_preset_and_decay_require_rebuild() {
        assert!(ParameterChange::Preset("hall".into()).requires_rebuild());
        assert!(ParameterChange::Decay(0.5).requires_rebuild());
        assert!(!ParameterChange::DryMix(0.5).requires_rebuild());
        assert!(!ParameterChange::WetMix(0.5).requires_rebuild());
        assert!(!ParameterChange::Bypass(true).requires_rebuild());
    }

    #[test]
    fn test_changes_from_lists_each_difference() {
        let previous = ReverbParameters::default();
        let next = ReverbParameters {
            preset: "hall".to_string(),
            wet_mix: 0.5,
            ..Default::default()
        };

        let changes = next.changes_from(&previous);
        assert_eq!(
            changes,
            vec![
                ParameterChange::Preset("hall".to_string()),
                ParameterChange::WetMix(0.5),
            ]
        );

        let mut replayed = previous.clone();
        for change in &changes {
            replayed.apply(change);
        }
        assert_eq!(replayed, next);
    }

    #[test]
    fn test_parameters_from_toml_fill_defaults() {
        let params: ReverbParameters = toml::from_str("preset = \"plate\"\ndecay = 0.25").unwrap();
        assert_eq!(params.preset, "plate");
        assert_eq!(params.decay, 0.25);
        assert_eq!(params.dry_mix, DEFAULT_DRY_MIX);
    }
}
