//! End-to-end voice generation: text in, WAV bytes out.
//!
//! ```text
//! raw text → normalize → annotate → chunk → synthesize (per chunk)
//!          → assemble → post-process → encode
//! ```
//!
//! Every stage either hands a complete result to the next or fails the whole
//! request; no partial audio is ever returned.

use crate::audio::{self, AudioBuffer, PostProcessor, wav};
use crate::config::GolosConfig;
use crate::error::{Result, SpeechError};
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::text::{self, Chunk};
use crate::tts::annotator::{self, StressAnnotator};
use crate::tts::{
    AdapterOptions, OnnxSpeechModel, SpeechModel, SynthesisAdapter, ensure_model_assets,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Summary of one generated utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisReport {
    /// Voice actually used, after fallback.
    pub speaker: String,
    /// Number of chunks synthesized.
    pub chunks: usize,
    /// Characters of text sent to the model, across all chunks.
    pub text_chars: usize,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output duration in seconds.
    pub duration_secs: f32,
    /// Output peak amplitude.
    pub peak: f32,
    /// Wall-clock time for the whole request.
    pub latency: Duration,
}

/// The synthesis pipeline. One instance owns one model.
///
/// `VoicePipeline` is `Send + Sync`; concurrent callers share the model and
/// serialize on inference only.
pub struct VoicePipeline {
    config: GolosConfig,
    adapter: SynthesisAdapter,
    annotator: Box<dyn StressAnnotator>,
    post: PostProcessor,
}

impl VoicePipeline {
    /// Assemble a pipeline from already-built collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the model is structurally
    /// incompatible (see [`SynthesisAdapter::new`]).
    pub fn new(
        config: GolosConfig,
        model: Box<dyn SpeechModel>,
        annotator: Box<dyn StressAnnotator>,
    ) -> Result<Self> {
        config.validate()?;
        let adapter = SynthesisAdapter::new(model, AdapterOptions::from(&config.model))?;
        let post = PostProcessor::from_config(&config.audio);
        info!(
            "voice pipeline ready (model {} Hz -> output {} Hz, chunk budget {} chars)",
            adapter.native_sample_rate(),
            post.target_sample_rate,
            config.text.max_chunk_chars
        );
        Ok(Self {
            config,
            adapter,
            annotator,
            post,
        })
    }

    /// Build the ONNX model and configured annotator, downloading model
    /// assets first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if any asset, the model or the annotator cannot be initialized.
    pub fn from_config(config: GolosConfig, callback: Option<&ProgressCallback>) -> Result<Self> {
        config.validate()?;
        let model_path = ensure_model_assets(&config.model, callback)?;

        let model_name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "speech model".to_owned());
        if let Some(cb) = callback {
            cb(ProgressEvent::LoadStarted {
                model_name: model_name.clone(),
            });
        }
        let start = Instant::now();
        let model = OnnxSpeechModel::load(&model_path, config.model.intra_threads)?;
        if let Some(cb) = callback {
            cb(ProgressEvent::LoadComplete {
                model_name,
                duration_secs: start.elapsed().as_secs_f64(),
            });
        }

        let annotator = annotator::from_config(&config.annotator)?;
        Self::new(config, Box::new(model), annotator)
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &GolosConfig {
        &self.config
    }

    /// Voice identifiers the model offers.
    pub fn voices(&self) -> Vec<String> {
        self.adapter.voices()
    }

    /// Normalize, annotate and chunk `text` without synthesizing.
    ///
    /// A `<speak>` envelope skips annotation and is one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::EmptyInput`] or [`SpeechError::Annotation`].
    pub fn prepare(&self, text: &str) -> Result<Vec<Chunk>> {
        let normalized = text::normalize(text)?;
        if text::is_markup(&normalized) {
            debug!("markup input, skipping annotation and chunking");
            return Ok(vec![Chunk {
                index: 0,
                text: normalized,
            }]);
        }

        let annotated = self.annotator.annotate(&normalized)?;
        if annotated.trim().is_empty() {
            return Err(SpeechError::Annotation(
                "annotator returned empty text".into(),
            ));
        }
        Ok(text::chunk(&annotated, self.config.text.max_chunk_chars))
    }

    /// Run the full chain and return the processed waveform.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; see [`SpeechError`].
    pub fn synthesize(
        &self,
        text: &str,
        speaker: Option<&str>,
    ) -> Result<(AudioBuffer, SynthesisReport)> {
        let start = Instant::now();

        let chunks = self.prepare(text)?;
        let voice = self.adapter.resolve_voice(speaker);
        let native_rate = self.adapter.native_sample_rate();

        let mut pieces = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            pieces.push(self.adapter.synthesize(chunk, &voice, native_rate)?);
        }

        let assembled = audio::assemble(pieces, self.config.audio.pause_ms, native_rate)?;
        let processed = self.post.process(assembled)?;

        let report = SynthesisReport {
            speaker: voice.id().to_owned(),
            chunks: chunks.len(),
            text_chars: chunks.iter().map(|c| c.text.chars().count()).sum(),
            sample_rate: processed.sample_rate(),
            duration_secs: processed.duration_secs(),
            peak: processed.peak(),
            latency: start.elapsed(),
        };
        Ok((processed, report))
    }

    /// Generate WAV bytes and the report for one utterance.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; see [`SpeechError`].
    pub fn generate_voice_with_report(
        &self,
        text: &str,
        speaker: Option<&str>,
    ) -> Result<(Vec<u8>, SynthesisReport)> {
        let start = Instant::now();
        let (processed, mut report) = self.synthesize(text, speaker)?;
        let bytes = wav::encode(&processed)?;
        report.latency = start.elapsed();

        info!(
            "generated voice: speaker={} chunks={} text_chars={} duration={:.2}s peak={:.3} latency={}ms",
            report.speaker,
            report.chunks,
            report.text_chars,
            report.duration_secs,
            report.peak,
            report.latency.as_millis()
        );
        Ok((bytes, report))
    }

    /// Generate WAV bytes for one utterance.
    ///
    /// An unknown `speaker` is replaced by the fallback voice.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; see [`SpeechError`].
    pub fn generate_voice(&self, text: &str, speaker: Option<&str>) -> Result<Vec<u8>> {
        self.generate_voice_with_report(text, speaker)
            .map(|(bytes, _)| bytes)
    }

    /// Generate an utterance and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns a stage error, or an I/O error if the file cannot be written.
    pub fn generate_voice_to_file(
        &self,
        text: &str,
        speaker: Option<&str>,
        path: &Path,
    ) -> Result<PathBuf> {
        let bytes = self.generate_voice(text, speaker)?;
        let written = wav::write_bytes(&bytes, path)?;
        info!("wrote {} ({} bytes)", written.display(), bytes.len());
        Ok(written)
    }

    /// [`Self::generate_voice`] on the blocking pool, bounded by `timeout`.
    ///
    /// On timeout the result is discarded; the blocking work still runs to
    /// completion in the background.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Timeout`], [`SpeechError::Task`] if the worker
    /// panicked, or the stage error from generation.
    pub async fn generate_voice_with_timeout(
        self: Arc<Self>,
        text: String,
        speaker: Option<String>,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let task =
            tokio::task::spawn_blocking(move || self.generate_voice(&text, speaker.as_deref()));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(SpeechError::Task(e.to_string())),
            Err(_) => Err(SpeechError::Timeout(timeout)),
        }
    }

    /// Release the model. Later generation calls fail.
    pub fn shutdown(&self) {
        self.adapter.shutdown();
    }
}

impl std::fmt::Debug for VoicePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePipeline")
            .field("adapter", &self.adapter)
            .field("post", &self.post)
            .finish_non_exhaustive()
    }
}
