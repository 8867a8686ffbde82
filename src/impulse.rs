//! Stereo impulse response data

/// A loaded impulse response: two equal-length channels at a known sample rate
///
/// Loaded responses are shared immutably (behind `Arc`) by the store; shaping
/// works on a copy.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpulseResponse {
    preset: String,
    sample_rate: u32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl ImpulseResponse {
    /// Build from separate channels. The shorter channel is zero-extended.
    pub fn stereo(preset: &str, sample_rate: u32, mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().max(right.len());
        left.resize(len, 0.0);
        right.resize(len, 0.0);
        Self {
            preset: preset.to_string(),
            sample_rate,
            left,
            right,
        }
    }

    /// Mono data copied to both channels
    pub fn mono(preset: &str, sample_rate: u32, data: Vec<f32>) -> Self {
        Self::stereo(preset, sample_rate, data.clone(), data)
    }

    /// Single-sample unit impulse (identity filter)
    pub fn unit(preset: &str, sample_rate: u32) -> Self {
        Self::mono(preset, sample_rate, vec![1.0])
    }

    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in frames (samples per channel)
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Channel by index, 0 = left, 1 = right
    pub fn channel(&self, index: usize) -> &[f32] {
        if index == 0 {
            &self.left
        } else {
            &self.right
        }
    }

    pub(crate) fn channels_mut(&mut self) -> [&mut Vec<f32>; 2] {
        [&mut self.left, &mut self.right]
    }

    /// Drop every frame from `len` onwards
    pub fn truncate(&mut self, len: usize) {
        self.left.truncate(len);
        self.right.truncate(len);
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }
}
