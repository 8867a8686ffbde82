//! # irverb - Partitioned Convolution Reverb
//!
//! irverb applies recorded impulse responses of arbitrary length to streaming
//! stereo audio at a fixed cost per block. Impulses are loaded from WAV files,
//! shortened by a decay fade, split into frequency-domain partitions and
//! convolved with uniformly partitioned overlap-add.
//!
//! ## Core Features
//!
//! - **Bounded per-block cost**: one forward and one inverse FFT per channel plus
//!   a multiply-accumulate per partition
//! - **Live preset and decay changes**: filter banks are rebuilt off the audio
//!   thread and handed over lock-free
//! - **Wet/dry mix and bypass**: applied on the next block, no rebuild
//! - **TOML configuration**: preset table, block size, sample rate
//! - **Offline rendering**: WAV in, WAV out, with the reverb tail
//!
//! ## Quick Start
//!
//! ```rust
//! use irverb::{ImpulseResponse, ImpulseResponseStore, PartitionPadding, Reverb, ReverbParameters};
//! use std::collections::BTreeMap;
//!
//! let mut store = ImpulseResponseStore::new(44100, BTreeMap::new());
//! let tail: Vec<f32> = (0..4410).map(|i| 0.999f32.powi(i) * 0.1).collect();
//! store.insert(ImpulseResponse::mono("room", 44100, tail)).unwrap();
//!
//! let params = ReverbParameters {
//!     preset: "room".to_string(),
//!     ..ReverbParameters::default()
//! };
//! let mut reverb = Reverb::with_store(store, 256, PartitionPadding::Exact, params).unwrap();
//!
//! let input = vec![0.5f32; 256];
//! let mut left = vec![0.0; 256];
//! let mut right = vec![0.0; 256];
//! reverb.process(&[&input], &mut left, &mut right).unwrap();
//!
//! // Shorten the tail; takes effect on the next block
//! reverb.set_decay(0.3).unwrap();
//! ```
//!
//! ## Threads
//!
//! [`reverb()`] returns a [`ReverbController`] for the control thread and a
//! [`ConvolutionEngine`] for the audio thread. The engine picks up rebuilt
//! state at the start of the next `process()` call.

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod filter_bank;
pub mod handoff;
pub mod impulse;
pub mod impulse_store;
pub mod parameters;
pub mod render;
pub mod shaper;
pub mod spectral;

pub use config::{PartitionPadding, ReverbConfig};
pub use controller::{reverb, Reverb, ReverbController};
pub use engine::{ConvolutionEngine, HistoryRing, ReverbState};
pub use error::{ReverbError, ReverbResult};
pub use filter_bank::{FilterBank, FilterBankBuilder};
pub use impulse::ImpulseResponse;
pub use impulse_store::ImpulseResponseStore;
pub use parameters::{MixSettings, ParameterChange, ParameterObserver, ReverbParameters};
pub use render::{render_file, RenderConfig, RenderStats};
pub use shaper::ImpulseShaper;
