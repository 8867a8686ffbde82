//! Error types shared by every stage of the reverb pipeline

use std::fmt;
use std::path::PathBuf;

/// Reverb error types
#[derive(Debug)]
pub enum ReverbError {
    /// IO error
    Io(std::io::Error),
    /// WAV decoding or encoding error
    Wav(hound::Error),
    /// Invalid or unreadable configuration
    Config(String),
    /// Preset id not present in the preset table
    UnknownPreset(String),
    /// Impulse asset recorded at a different rate than the engine runs at
    SampleRateMismatch {
        preset: String,
        expected: u32,
        found: u32,
    },
    /// Impulse asset with more than two channels
    UnsupportedChannelCount { preset: String, channels: u16 },
    /// Impulse asset that contains no frames
    EmptyImpulse(PathBuf),
    /// Input block length differs from the configured block size
    BlockSizeMismatch { expected: usize, found: usize },
    /// Input block with neither one nor two channels
    InputChannels(usize),
    /// FFT failure (only reachable with mis-sized buffers)
    Transform(String),
    /// The audio thread has not picked up earlier rebuilds yet
    HandoffFull,
}

impl fmt::Display for ReverbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReverbError::Io(e) => write!(f, "IO error: {}", e),
            ReverbError::Wav(e) => write!(f, "WAV error: {}", e),
            ReverbError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ReverbError::UnknownPreset(name) => write!(f, "Unknown preset: {}", name),
            ReverbError::SampleRateMismatch {
                preset,
                expected,
                found,
            } => write!(
                f,
                "Sample rate of impulse '{}' ({} Hz) must match sample rate of processor ({} Hz)",
                preset, found, expected
            ),
            ReverbError::UnsupportedChannelCount { preset, channels } => write!(
                f,
                "Impulse '{}' has {} channels, only mono or stereo is supported",
                preset, channels
            ),
            ReverbError::EmptyImpulse(path) => {
                write!(f, "Impulse file {} contains no samples", path.display())
            }
            ReverbError::BlockSizeMismatch { expected, found } => write!(
                f,
                "Block size mismatch: expected {} samples, got {}",
                expected, found
            ),
            ReverbError::InputChannels(n) => {
                write!(f, "Input block must have 1 or 2 channels, got {}", n)
            }
            ReverbError::Transform(msg) => write!(f, "FFT error: {}", msg),
            ReverbError::HandoffFull => {
                write!(f, "Rebuild queue is full, audio thread is not consuming states")
            }
        }
    }
}

impl std::error::Error for ReverbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReverbError::Io(e) => Some(e),
            ReverbError::Wav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReverbError {
    fn from(e: std::io::Error) -> Self {
        ReverbError::Io(e)
    }
}

impl From<hound::Error> for ReverbError {
    fn from(e: hound::Error) -> Self {
        ReverbError::Wav(e)
    }
}

impl From<realfft::FftError> for ReverbError {
    fn from(e: realfft::FftError) -> Self {
        ReverbError::Transform(e.to_string())
    }
}

impl From<toml::de::Error> for ReverbError {
    fn from(e: toml::de::Error) -> Self {
        ReverbError::Config(e.to_string())
    }
}

/// Result type for reverb operations
pub type ReverbResult<T> = Result<T, ReverbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_mismatch_display() {
        let err = ReverbError::SampleRateMismatch {
            preset: "hall".to_string(),
            expected: 44100,
            found: 48000,
        };
        assert_eq!(
            err.to_string(),
            "Sample rate of impulse 'hall' (48000 Hz) must match sample rate of processor (44100 Hz)"
        );
    }

    #[test]
    fn test_io_error_converts_and_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ReverbError = io.into();
        assert!(matches!(err, ReverbError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_block_size_mismatch_display() {
        let err = ReverbError::BlockSizeMismatch {
            expected: 512,
            found: 256,
        };
        assert_eq!(
            err.to_string(),
            "Block size mismatch: expected 512 samples, got 256"
        );
    }
}
