//! Post-processing applied once to the assembled waveform.
//!
//! Order is fixed: DC removal, edge fades, peak normalization, soft limiting,
//! then rate conversion. Silent or very short buffers pass through untouched.

use super::resample::resample;
use super::{AudioBuffer, samples_for_ms};
use crate::config::AudioConfig;
use crate::error::Result;

/// Peaks at or below this are treated as silence.
const SILENCE_PEAK: f32 = 1e-9;

/// Subtract the mean sample value.
pub fn remove_dc(buffer: AudioBuffer) -> AudioBuffer {
    if buffer.is_empty() {
        return buffer;
    }
    let rate = buffer.sample_rate();
    let mut samples = buffer.into_samples();
    let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / samples.len() as f64;
    let mean = mean as f32;
    for s in &mut samples {
        *s -= mean;
    }
    AudioBuffer::new(samples, rate)
}

/// Linear fade-in over the first `fade_ms` and fade-out over the last `fade_ms`.
///
/// Skipped when the fade is a single sample or the buffer is shorter than
/// both fades together.
pub fn fade_edges(buffer: AudioBuffer, fade_ms: f32) -> AudioBuffer {
    let k = samples_for_ms(fade_ms, buffer.sample_rate());
    let n = buffer.len();
    if k <= 1 || n < 2 * k {
        return buffer;
    }

    let rate = buffer.sample_rate();
    let mut samples = buffer.into_samples();
    let step = 1.0 / (k - 1) as f32;
    for i in 0..k {
        let gain = i as f32 * step;
        samples[i] *= gain;
        samples[n - 1 - i] *= gain;
    }
    AudioBuffer::new(samples, rate)
}

/// Scale so the largest absolute sample equals `target`.
pub fn peak_normalize(buffer: AudioBuffer, target: f32) -> AudioBuffer {
    let peak = buffer.peak();
    if peak <= SILENCE_PEAK {
        return buffer;
    }
    let gain = target / peak;
    let rate = buffer.sample_rate();
    let mut samples = buffer.into_samples();
    for s in &mut samples {
        *s *= gain;
    }
    AudioBuffer::new(samples, rate)
}

/// Tanh soft-knee limiter, engaged only when some sample exceeds `limit`.
///
/// Samples are clipped to [-1, 1] first, then mapped through
/// `tanh(x / limit) * limit`, which stays strictly inside `±limit`.
pub fn soft_limit(buffer: AudioBuffer, limit: f32) -> AudioBuffer {
    if buffer.peak() <= limit {
        return buffer;
    }
    let rate = buffer.sample_rate();
    let mut samples = buffer.into_samples();
    for s in &mut samples {
        *s = (s.clamp(-1.0, 1.0) / limit).tanh() * limit;
    }
    AudioBuffer::new(samples, rate)
}

/// Clamp every sample to [-1, 1].
pub fn clip(buffer: AudioBuffer) -> AudioBuffer {
    let rate = buffer.sample_rate();
    let mut samples = buffer.into_samples();
    for s in &mut samples {
        *s = s.clamp(-1.0, 1.0);
    }
    AudioBuffer::new(samples, rate)
}

/// The full post-processing chain with its tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessor {
    /// Edge fade length in milliseconds.
    pub fade_ms: f32,
    /// Peak normalization target.
    pub target_peak: f32,
    /// Soft limiter ceiling.
    pub soft_limit: f32,
    /// Output sample rate in Hz.
    pub target_sample_rate: u32,
}

impl PostProcessor {
    /// Build from the `[audio]` config section.
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            fade_ms: config.fade_ms,
            target_peak: config.target_peak,
            soft_limit: config.soft_limit,
            target_sample_rate: config.target_sample_rate,
        }
    }

    /// Run the chain. The result is at `target_sample_rate` and inside [-1, 1].
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer or target sample rate is zero.
    pub fn process(&self, buffer: AudioBuffer) -> Result<AudioBuffer> {
        let buffer = remove_dc(buffer);
        let buffer = fade_edges(buffer, self.fade_ms);
        let buffer = peak_normalize(buffer, self.target_peak);
        let buffer = soft_limit(buffer, self.soft_limit);
        let buffer = resample(buffer, self.target_sample_rate)?;
        Ok(clip(buffer))
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}
