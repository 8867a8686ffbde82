//! Planned real FFT pair used by the filter bank builder and the engine
//!
//! Both directions run with caller-owned scratch so the audio thread never
//! allocates. The inverse is normalised by the transform length.

use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::ReverbResult;

#[derive(Clone)]
pub struct SpectralTransform {
    size: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
}

impl std::fmt::Debug for SpectralTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralTransform")
            .field("size", &self.size)
            .finish()
    }
}

impl SpectralTransform {
    /// Plan a transform of `2 * block_size` real samples
    pub fn for_block_size(block_size: usize) -> Self {
        Self::new(2 * block_size)
    }

    pub fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            size,
            r2c: planner.plan_fft_forward(size),
            c2r: planner.plan_fft_inverse(size),
        }
    }

    /// Real samples per transform
    pub fn size(&self) -> usize {
        self.size
    }

    /// Complex bins per spectrum (hermitian half)
    pub fn spectrum_len(&self) -> usize {
        self.size / 2 + 1
    }

    pub fn make_spectrum(&self) -> Vec<Complex<f32>> {
        vec![Complex::new(0.0, 0.0); self.spectrum_len()]
    }

    /// Scratch large enough for either direction
    pub fn make_scratch(&self) -> Vec<Complex<f32>> {
        let len = self
            .r2c
            .get_scratch_len()
            .max(self.c2r.get_scratch_len());
        vec![Complex::new(0.0, 0.0); len]
    }

    /// Forward transform. `input` is used as workspace and left undefined.
    pub fn forward(
        &self,
        input: &mut [f32],
        output: &mut [Complex<f32>],
        scratch: &mut [Complex<f32>],
    ) -> ReverbResult<()> {
        let scratch_len = self.r2c.get_scratch_len();
        self.r2c
            .process_with_scratch(input, output, &mut scratch[..scratch_len])?;
        Ok(())
    }

    /// Normalised inverse transform. `input` is used as workspace.
    pub fn inverse(
        &self,
        input: &mut [Complex<f32>],
        output: &mut [f32],
        scratch: &mut [Complex<f32>],
    ) -> ReverbResult<()> {
        // DC and Nyquist bins of a real signal carry no imaginary part
        if let Some(first) = input.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = input.last_mut() {
            last.im = 0.0;
        }

        let scratch_len = self.c2r.get_scratch_len();
        self.c2r
            .process_with_scratch(input, output, &mut scratch[..scratch_len])?;

        let scale = 1.0 / self.size as f32;
        output.iter_mut().for_each(|sample| *sample *= scale);
        Ok(())
    }
}

/// `acc[i] += a[i] * b[i]` over complex bins
#[inline]
pub fn complex_multiply_accumulate(
    acc: &mut [Complex<f32>],
    a: &[Complex<f32>],
    b: &[Complex<f32>],
) {
    debug_assert_eq!(acc.len(), a.len());
    debug_assert_eq!(acc.len(), b.len());
    for ((out, &x), &h) in acc.iter_mut().zip(a).zip(b) {
        *out += x * h;
    }
}
