//! Reverb configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! yields the stock five-preset setup at 44.1kHz with 512-sample blocks:
//!
//! ```toml
//! sample_rate = 48000
//! block_size = 256
//! impulse_dir = "/usr/share/irverb/irs"
//! padding = "exact"
//!
//! [presets]
//! hall = "hall.wav"
//! cathedral = "/home/me/irs/cathedral.wav"
//!
//! [parameters]
//! preset = "hall"
//! decay = 0.6
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ReverbError, ReverbResult};
use crate::parameters::ReverbParameters;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_BLOCK_SIZE: usize = 512;
pub const DEFAULT_IMPULSE_DIR: &str = "irs";

/// How an impulse is padded out to a whole number of partitions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionPadding {
    /// Pad only up to the next multiple of the block size
    #[default]
    Exact,
    /// Always append padding, adding an all-zero partition when the length
    /// is already a multiple of the block size
    AlwaysExtra,
}

impl PartitionPadding {
    /// Number of zero samples appended to an impulse of `len` samples
    pub fn pad_amount(self, len: usize, block_size: usize) -> usize {
        let rem = len % block_size;
        match self {
            PartitionPadding::Exact if len == 0 => block_size,
            PartitionPadding::Exact if rem == 0 => 0,
            _ => block_size - rem,
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Engine sample rate; every impulse asset must match it
    pub sample_rate: u32,
    /// Samples per channel per processing call
    pub block_size: usize,
    /// Base directory for relative preset paths
    pub impulse_dir: PathBuf,
    /// Preset id -> impulse WAV file
    pub presets: BTreeMap<String, PathBuf>,
    pub padding: PartitionPadding,
    /// Initial control values
    pub parameters: ReverbParameters,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            impulse_dir: PathBuf::from(DEFAULT_IMPULSE_DIR),
            presets: default_presets(),
            padding: PartitionPadding::default(),
            parameters: ReverbParameters::default(),
        }
    }
}

/// Stock room/hall/plate table
pub fn default_presets() -> BTreeMap<String, PathBuf> {
    [
        ("sm-room", "small_room.wav"),
        ("md-room", "medium_room.wav"),
        ("lg-room", "large_room.wav"),
        ("hall", "hall.wav"),
        ("plate", "plate.wav"),
    ]
    .into_iter()
    .map(|(name, file)| (name.to_string(), PathBuf::from(file)))
    .collect()
}

impl ReverbConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> ReverbResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        // Relative impulse_dir is taken relative to the config file itself
        if config.impulse_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.impulse_dir = parent.join(&config.impulse_dir);
            }
        }
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> ReverbResult<Self> {
        let config: ReverbConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/irverb/irverb.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("irverb").join("irverb.toml"))
    }

    /// Resolved file path for a preset
    pub fn preset_path(&self, preset: &str) -> ReverbResult<PathBuf> {
        let path = self
            .presets
            .get(preset)
            .ok_or_else(|| ReverbError::UnknownPreset(preset.to_string()))?;
        Ok(resolve(&self.impulse_dir, path))
    }

    /// Preset table with every path resolved against `impulse_dir`
    pub fn resolved_presets(&self) -> BTreeMap<String, PathBuf> {
        self.presets
            .iter()
            .map(|(name, path)| (name.clone(), resolve(&self.impulse_dir, path)))
            .collect()
    }

    pub fn validate(&self) -> ReverbResult<()> {
        if self.sample_rate == 0 {
            return Err(ReverbError::Config("sample_rate must be positive".into()));
        }
        if self.block_size == 0 {
            return Err(ReverbError::Config("block_size must be positive".into()));
        }
        if self.presets.is_empty() {
            return Err(ReverbError::Config("preset table is empty".into()));
        }
        if !self.presets.contains_key(&self.parameters.preset) {
            return Err(ReverbError::UnknownPreset(self.parameters.preset.clone()));
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ReverbConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReverbConfig::default());
        assert_eq!(config.presets.len(), 5);
        assert_eq!(config.presets["hall"], PathBuf::from("hall.wav"));
    }

    #[test]
    fn test_parse_custom_table() {
        let content = r#"
            sample_rate = 48000
            block_size = 256
            impulse_dir = "/irs"
            padding = "always-extra"

            [presets]
            cave = "cave.wav"
            church = "/abs/church.wav"

            [parameters]
            preset = "cave"
            decay = 0.5
        "#;
        let config = ReverbConfig::from_toml_str(content).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.block_size, 256);
        assert_eq!(config.padding, PartitionPadding::AlwaysExtra);
        assert_eq!(config.parameters.decay, 0.5);
        assert_eq!(
            config.preset_path("cave").unwrap(),
            PathBuf::from("/irs/cave.wav")
        );
        assert_eq!(
            config.preset_path("church").unwrap(),
            PathBuf::from("/abs/church.wav")
        );
    }

    #[test]
    fn test_initial_preset_must_exist() {
        let content = r#"
            [presets]
            cave = "cave.wav"
        "#;
        // default initial preset "sm-room" is not in this table
        let result = ReverbConfig::from_toml_str(content);
        assert!(matches!(result, Err(ReverbError::UnknownPreset(name)) if name == "sm-room"));
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let result = ReverbConfig::from_toml_str("block_size = 0");
        assert!(matches!(result, Err(ReverbError::Config(_))));
    }

    #[test]
    fn test_pad_amount() {
        assert_eq!(PartitionPadding::Exact.pad_amount(1000, 512), 24);
        assert_eq!(PartitionPadding::Exact.pad_amount(1024, 512), 0);
        assert_eq!(PartitionPadding::Exact.pad_amount(0, 512), 512);
        assert_eq!(PartitionPadding::AlwaysExtra.pad_amount(1000, 512), 24);
        assert_eq!(PartitionPadding::AlwaysExtra.pad_amount(1024, 512), 512);
    }

    #[test]
    fn test_unknown_preset_path() {
        let config = ReverbConfig::default();
        assert!(matches!(
            config.preset_path("nope"),
            Err(ReverbError::UnknownPreset(_))
        ));
    }
}
