//! Rational sample-rate conversion on top of `rubato`.
//!
//! `FftFixedIn` reduces the rate ratio by its GCD and filters in the
//! frequency domain. The tail is flushed with silence, the resampler's own
//! delay is dropped from the front, and the result is cut to exactly
//! `ceil(len * up / down)` samples so repeated conversions never drift.

use super::AudioBuffer;
use crate::error::{Result, SpeechError};
use rubato::{FftFixedIn, Resampler};
use tracing::debug;

/// Input frames handed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

/// FFT sub-chunks per input chunk.
const SUB_CHUNKS: usize = 2;

/// Greatest common divisor.
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Samples produced from `len` input samples at `source_rate` -> `target_rate`.
pub fn output_len(len: usize, source_rate: u32, target_rate: u32) -> usize {
    let divisor = gcd(source_rate, target_rate).max(1);
    let up = (target_rate / divisor) as usize;
    let down = (source_rate / divisor).max(1) as usize;
    (len * up).div_ceil(down)
}

/// Convert `buffer` to `target_rate`.
///
/// Returns the buffer unchanged when the rates already match.
///
/// # Errors
///
/// Returns [`SpeechError::Config`] if either rate is zero or the resampler
/// rejects the ratio.
pub fn resample(buffer: AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    let source_rate = buffer.sample_rate();
    if source_rate == 0 || target_rate == 0 {
        return Err(SpeechError::Config(format!(
            "cannot resample {source_rate} Hz -> {target_rate} Hz"
        )));
    }
    if source_rate == target_rate {
        return Ok(buffer);
    }
    if buffer.is_empty() {
        return Ok(AudioBuffer::new(Vec::new(), target_rate));
    }

    let samples = resample_samples(buffer.samples(), source_rate, target_rate)?;
    Ok(AudioBuffer::new(samples, target_rate))
}

fn resample_samples(input: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1,
    )
    .map_err(|e| {
        SpeechError::Config(format!(
            "failed to create resampler {source_rate} Hz -> {target_rate} Hz: {e}"
        ))
    })?;

    let delay = resampler.output_delay();
    let wanted = output_len(input.len(), source_rate, target_rate);
    debug!("resampling {} samples {source_rate} Hz -> {target_rate} Hz", input.len());

    let mut output = Vec::with_capacity(wanted + delay + resampler.output_frames_max());
    let mut pos = 0;
    while output.len() < wanted + delay {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(input.len());

        let mut chunk = input[pos..end].to_vec();
        chunk.resize(frames_needed, 0.0);

        let frames = vec![chunk];
        let resampled = resampler
            .process(&frames, None)
            .map_err(|e| SpeechError::Config(format!("resampling failed: {e}")))?;
        let Some(channel) = resampled.into_iter().next().filter(|c| !c.is_empty()) else {
            break;
        };
        output.extend(channel);
        pos = end;
    }

    output.drain(..delay.min(output.len()));
    output.resize(wanted, 0.0);
    Ok(output)
}
