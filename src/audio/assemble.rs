//! Concatenation of per-chunk waveforms.

use super::{AudioBuffer, samples_for_ms};
use crate::error::{Result, SpeechError};

/// Join chunk buffers in order with `pause_ms` of silence between neighbours.
///
/// No pause follows the last chunk.
///
/// # Errors
///
/// Returns [`SpeechError::EmptyPipeline`] when `chunks` is empty and
/// [`SpeechError::Synthesis`] when a chunk was produced at a different
/// sample rate than `sample_rate`.
pub fn assemble(chunks: Vec<AudioBuffer>, pause_ms: u32, sample_rate: u32) -> Result<AudioBuffer> {
    if chunks.is_empty() {
        return Err(SpeechError::EmptyPipeline);
    }

    let pause = samples_for_ms(pause_ms as f32, sample_rate);
    let total = chunks.iter().map(AudioBuffer::len).sum::<usize>() + pause * (chunks.len() - 1);
    let mut samples = Vec::with_capacity(total);

    let last = chunks.len() - 1;
    for (index, chunk) in chunks.into_iter().enumerate() {
        if chunk.sample_rate() != sample_rate {
            return Err(SpeechError::Synthesis {
                chunk_index: index,
                message: format!(
                    "chunk sample rate {} Hz does not match {} Hz",
                    chunk.sample_rate(),
                    sample_rate
                ),
            });
        }
        samples.extend(chunk.into_samples());
        if index < last {
            samples.resize(samples.len() + pause, 0.0);
        }
    }

    Ok(AudioBuffer::new(samples, sample_rate))
}
