//! 16-bit PCM WAV encoding, in memory or on disk.

use super::AudioBuffer;
use crate::error::{Result, SpeechError};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Full-scale value for 16-bit quantization.
const I16_SCALE: f32 = i16::MAX as f32;

fn spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Quantize to 16-bit PCM and serialize a mono WAV into memory.
///
/// Samples are clipped to [-1, 1] before scaling.
///
/// # Errors
///
/// Returns [`SpeechError::Encode`] if the sample rate is zero or the writer fails.
pub fn encode(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    if buffer.sample_rate() == 0 {
        return Err(SpeechError::Encode("sample rate must be > 0".into()));
    }

    let mut bytes = Vec::with_capacity(44 + buffer.len() * 2);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec(buffer.sample_rate()))
            .map_err(|e| SpeechError::Encode(format!("failed to create wav writer: {e}")))?;

        for &s in buffer.samples() {
            writer
                .write_sample(quantize(s))
                .map_err(|e| SpeechError::Encode(format!("failed to write wav sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| SpeechError::Encode(format!("failed to finalize wav: {e}")))?;
    }
    Ok(bytes)
}

/// Parse a 16-bit PCM WAV back into a mono buffer.
///
/// Multi-channel files are downmixed by averaging each frame.
///
/// # Errors
///
/// Returns [`SpeechError::Encode`] if the bytes are not a 16-bit integer WAV.
pub fn decode(bytes: &[u8]) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| SpeechError::Encode(format!("failed to read wav header: {e}")))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(SpeechError::Encode(format!(
            "expected 16-bit PCM, got {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let interleaved = reader
        .samples::<i16>()
        .map(|s| s.map(|v| f32::from(v) / I16_SCALE))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| SpeechError::Encode(format!("failed to read wav samples: {e}")))?;

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

/// Encode `buffer` and write it to `path`, creating parent directories.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns an error if encoding or the file write fails.
pub fn write_wav_file(buffer: &AudioBuffer, path: &Path) -> Result<PathBuf> {
    let bytes = encode(buffer)?;
    write_bytes(&bytes, path)
}

/// Persist already-encoded WAV bytes to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_bytes(bytes: &[u8], path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

fn quantize(sample: f32) -> i16 {
    let clamped = if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    };
    (clamped * I16_SCALE).round() as i16
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn header_describes_mono_pcm16() {
        let bytes = encode(&AudioBuffer::new(vec![0.0; 10], 48_000)).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), 44 + 20);

        let reader = hound::WavReader::new(Cursor::new(bytes.as_slice())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[test]
    fn round_trip_within_quantization_error() {
        let samples: Vec<f32> = (0..1_000)
            .map(|i| ((i as f32) * 0.013).sin() * 0.9)
            .chain([1.0, -1.0, 0.0])
            .collect();
        let original = AudioBuffer::new(samples, 24_000);
        let decoded = decode(&encode(&original).unwrap()).unwrap();

        assert_eq!(decoded.sample_rate(), 24_000);
        assert_eq!(decoded.len(), original.len());
        for (a, b) in original.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() <= 1.0 / 32_767.0, "{a} vs {b}");
        }
    }

    #[test]
    fn out_of_range_samples_are_clipped() {
        let decoded = decode(&encode(&AudioBuffer::new(vec![2.5, -4.0, f32::NAN], 8_000)).unwrap())
            .unwrap();
        assert_eq!(decoded.samples(), &[1.0, -1.0, 0.0]);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(
            encode(&AudioBuffer::new(vec![0.0], 0)),
            Err(SpeechError::Encode(_))
        ));
    }

    #[test]
    fn garbage_is_not_a_wav() {
        assert!(decode(b"not a wav file").is_err());
    }

    #[test]
    fn stereo_files_are_downmixed() {
        let mut bytes = Vec::new();
        {
            let spec = hound::WavSpec {
                channels: 2,
                ..spec(16_000)
            };
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for (l, r) in [(32_767i16, -32_767i16), (16_000, 16_000)] {
                writer.write_sample(l).unwrap();
                writer.write_sample(r).unwrap();
            }
            writer.finalize().unwrap();
        }
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded.samples()[0].abs() < 1e-6);
        assert!((decoded.samples()[1] - 16_000.0 / 32_767.0).abs() < 1e-6);
    }

    #[test]
    fn writes_file_and_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("voice.wav");
        let buffer = AudioBuffer::new(vec![0.25; 64], 48_000);

        let written = write_wav_file(&buffer, &path).unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read(&path).unwrap(), encode(&buffer).unwrap());
    }
}
