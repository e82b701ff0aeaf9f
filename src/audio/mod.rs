//! Audio buffers and the numeric stages that run after synthesis.

pub mod assemble;
pub mod dsp;
pub mod resample;
pub mod wav;

pub use assemble::assemble;
pub use dsp::PostProcessor;

/// Mono f32 samples at a known sample rate.
///
/// Each stage takes a buffer by value and hands back a new one, so no two
/// stages ever share samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap mono samples recorded at `sample_rate` Hz.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A buffer of `duration_ms` of silence.
    pub fn silence(duration_ms: u32, sample_rate: u32) -> Self {
        let len = samples_for_ms(duration_ms as f32, sample_rate);
        Self::new(vec![0.0; len], sample_rate)
    }

    /// The samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value, `0.0` when empty.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Take the samples out of the buffer.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Number of whole samples covering `ms` milliseconds at `sample_rate`.
pub fn samples_for_ms(ms: f32, sample_rate: u32) -> usize {
    if !(ms.is_finite() && ms > 0.0) {
        return 0;
    }
    (f64::from(sample_rate) * f64::from(ms) / 1000.0) as usize
}
