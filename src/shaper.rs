//! Decay shaping: fade and truncate an impulse to shorten the perceived tail
//!
//! With `L` frames and decay `d`, the fade window starts at `floor(d * L)` and
//! runs for a fixed 20ms (clipped to the end of the impulse). Inside the window
//! sample `i` of `flen` is scaled by `0.1 ^ ((1 - i / flen) * 5)`, a 100dB gain
//! sweep, and everything after the window is discarded. `d = 1.0` leaves the
//! impulse untouched.

use tracing::debug;

use crate::impulse::ImpulseResponse;

/// Length of the fade window in seconds
pub const FADE_SECONDS: f64 = 0.020;

/// Fade gain exponent range, 5 decades = 100dB
const FADE_DECADES: f32 = 5.0;

#[derive(Clone, Copy, Debug)]
pub struct ImpulseShaper {
    sample_rate: u32,
}

impl ImpulseShaper {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Fade window length in samples at this sample rate
    pub fn fade_samples(&self) -> usize {
        (FADE_SECONDS * self.sample_rate as f64) as usize
    }

    /// `[fade_start, fade_stop)` for an impulse of `len` frames
    pub fn fade_window(&self, len: usize, decay: f64) -> (usize, usize) {
        let decay = decay.clamp(0.0, 1.0);
        let fade_start = ((decay * len as f64).floor() as usize).min(len);
        let fade_stop = len.min(fade_start + self.fade_samples());
        (fade_start, fade_stop)
    }

    /// Faded, truncated copy of `impulse`
    pub fn shape(&self, impulse: &ImpulseResponse, decay: f64) -> ImpulseResponse {
        let mut shaped = impulse.clone();
        let (fade_start, fade_stop) = self.fade_window(impulse.len(), decay);
        let fade_len = fade_stop - fade_start;

        if fade_len > 0 {
            for channel in shaped.channels_mut() {
                for (i, sample) in channel[fade_start..fade_stop].iter_mut().enumerate() {
                    *sample *= fade_gain(i, fade_len);
                }
            }
            shaped.truncate(fade_stop);
        }

        debug!(
            "Shaped '{}' with decay {:.3}: {} -> {} frames",
            impulse.preset(),
            decay,
            impulse.len(),
            shaped.len()
        );
        shaped
    }
}

/// Gain at position `i` of a `len`-sample fade window
pub fn fade_gain(i: usize, len: usize) -> f32 {
    let position = i as f32 / len as f32;
    0.1f32.powf((1.0 - position) * FADE_DECADES)
}
