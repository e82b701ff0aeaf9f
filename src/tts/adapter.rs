//! Synthesis adapter: owns the speech model and turns chunks into mono audio.
//!
//! The model's call convention is detected once at construction and cached, so
//! every request is built the same way. Unknown voices degrade to a fallback
//! voice; structural mismatches fail construction.

use super::model::{InferenceRequest, ModelSignature, SpeechModel, TextInput};
use crate::audio::AudioBuffer;
use crate::config::ModelConfig;
use crate::error::{Result, SpeechError};
use crate::text::Chunk;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// A voice identifier from the model's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Voice(String);

impl Voice {
    /// Wrap a voice identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as the model knows it.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of voices a model offers, plus the one used for unknown requests.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    fallback: usize,
}

impl VoiceCatalog {
    /// Build a catalog.
    ///
    /// The fallback is `preferred_default` when it names a catalog voice,
    /// otherwise the first voice.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Initialization`] if `ids` is empty.
    pub fn new(ids: Vec<String>, preferred_default: Option<&str>) -> Result<Self> {
        if ids.is_empty() {
            return Err(SpeechError::Initialization(
                "speech model reports an empty voice catalog".into(),
            ));
        }
        let voices: Vec<Voice> = ids.into_iter().map(Voice).collect();
        let fallback = match preferred_default {
            Some(name) => match voices.iter().position(|v| v.id() == name) {
                Some(pos) => pos,
                None => {
                    warn!(
                        "configured default speaker '{name}' is not in the catalog, using '{}'",
                        voices[0]
                    );
                    0
                }
            },
            None => 0,
        };
        Ok(Self { voices, fallback })
    }

    /// All voices, in model order.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Returns `true` if `id` is a catalog voice.
    pub fn contains(&self, id: &str) -> bool {
        self.voices.iter().any(|v| v.id() == id)
    }

    /// Voice substituted for unknown requests.
    pub fn fallback(&self) -> &Voice {
        &self.voices[self.fallback]
    }

    /// Map a requested identifier to a catalog voice.
    ///
    /// Unknown identifiers are logged and replaced by [`Self::fallback`].
    pub fn resolve(&self, requested: &str) -> Voice {
        if let Some(voice) = self.voices.iter().find(|v| v.id() == requested) {
            return voice.clone();
        }
        let fallback = self.fallback();
        warn!("unknown speaker '{requested}', falling back to '{fallback}'");
        fallback.clone()
    }
}

/// How the model takes its text argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextConvention {
    /// One string under `text`.
    Single,
    /// A one-element batch under `texts`.
    Batched,
}

/// The exact call shape a model accepts, detected once from its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallConvention {
    /// Text argument shape.
    pub text: TextConvention,
    /// Model takes a `speaker` argument.
    pub speaker: bool,
    /// Model takes a `sample_rate` argument.
    pub sample_rate: bool,
    /// Model takes a `put_accent` argument.
    pub put_accent: bool,
    /// Model takes a `put_yo` argument.
    pub put_yo: bool,
}

impl CallConvention {
    /// Derive the convention from declared parameter names.
    ///
    /// `text` wins over `texts` when a model declares both.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Initialization`] if neither text parameter is declared.
    pub fn detect(signature: &ModelSignature) -> Result<Self> {
        let text = if signature.accepts("text") {
            TextConvention::Single
        } else if signature.accepts("texts") {
            TextConvention::Batched
        } else {
            return Err(SpeechError::Initialization(format!(
                "speech model takes neither 'text' nor 'texts' (declares: {})",
                signature.parameters().join(", ")
            )));
        };

        Ok(Self {
            text,
            speaker: signature.accepts("speaker"),
            sample_rate: signature.accepts("sample_rate"),
            put_accent: signature.accepts("put_accent"),
            put_yo: signature.accepts("put_yo"),
        })
    }

    /// Build the request for one chunk. Undeclared parameters are left out.
    pub fn build(
        &self,
        text: &str,
        voice: &Voice,
        sample_rate: u32,
        options: &AdapterOptions,
    ) -> InferenceRequest {
        let text = match self.text {
            TextConvention::Single => TextInput::Single(text.to_owned()),
            TextConvention::Batched => TextInput::Batch(vec![text.to_owned()]),
        };
        InferenceRequest {
            text,
            speaker: self.speaker.then(|| voice.id().to_owned()),
            sample_rate: self.sample_rate.then_some(sample_rate),
            put_accent: self.put_accent.then_some(options.put_accent),
            put_yo: self.put_yo.then_some(options.put_yo),
        }
    }
}

/// Adapter tuning taken from the `[model]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Preferred fallback voice.
    pub default_speaker: Option<String>,
    /// Forwarded as `put_accent` when the model declares it.
    pub put_accent: bool,
    /// Forwarded as `put_yo` when the model declares it.
    pub put_yo: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            default_speaker: None,
            put_accent: true,
            put_yo: true,
        }
    }
}

impl From<&ModelConfig> for AdapterOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            default_speaker: config.default_speaker.clone(),
            put_accent: config.put_accent,
            put_yo: config.put_yo,
        }
    }
}

/// Owns one speech model and serializes inference on it.
pub struct SynthesisAdapter {
    model: Mutex<Option<Box<dyn SpeechModel>>>,
    catalog: VoiceCatalog,
    convention: CallConvention,
    native_rate: u32,
    options: AdapterOptions,
}

impl SynthesisAdapter {
    /// Inspect `model` and take ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Initialization`] if the model has no entry
    /// point, no usable text parameter, no voices or no sample rate.
    pub fn new(model: Box<dyn SpeechModel>, options: AdapterOptions) -> Result<Self> {
        let signature = model.signature().ok_or_else(|| {
            SpeechError::Initialization("speech model exposes no inference entry point".into())
        })?;
        let convention = CallConvention::detect(&signature)?;
        let catalog = VoiceCatalog::new(model.speakers(), options.default_speaker.as_deref())?;
        let native_rate = match model.sample_rate() {
            Some(rate) if rate > 0 => rate,
            _ => {
                return Err(SpeechError::Initialization(
                    "speech model does not report a sample rate".into(),
                ));
            }
        };

        info!(
            "synthesis adapter ready ({} voices, {native_rate} Hz, {:?} text, fallback voice '{}')",
            catalog.voices().len(),
            convention.text,
            catalog.fallback()
        );

        Ok(Self {
            model: Mutex::new(Some(model)),
            catalog,
            convention,
            native_rate,
            options,
        })
    }

    /// Voice identifiers, in model order.
    pub fn voices(&self) -> Vec<String> {
        self.catalog.voices().iter().map(|v| v.id().to_owned()).collect()
    }

    /// Sample rate the model produces natively.
    pub fn native_sample_rate(&self) -> u32 {
        self.native_rate
    }

    /// Validate a requested voice, falling back when it is unknown.
    pub fn resolve_voice(&self, requested: Option<&str>) -> Voice {
        match requested {
            Some(id) => self.catalog.resolve(id),
            None => self.catalog.fallback().clone(),
        }
    }

    /// Synthesize one chunk to mono audio tagged with `sample_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Synthesis`] carrying the chunk index if the
    /// model fails or returns no samples, or if the adapter was shut down.
    pub fn synthesize(
        &self,
        chunk: &Chunk,
        voice: &Voice,
        sample_rate: u32,
    ) -> Result<AudioBuffer> {
        let fail = |message: String| SpeechError::Synthesis {
            chunk_index: chunk.index,
            message,
        };

        let voice = if self.catalog.contains(voice.id()) {
            voice.clone()
        } else {
            self.catalog.resolve(voice.id())
        };
        let request = self
            .convention
            .build(&chunk.text, &voice, sample_rate, &self.options);

        let start = std::time::Instant::now();
        let output = {
            let mut guard = self
                .model
                .lock()
                .map_err(|_| fail("speech model lock poisoned".into()))?;
            let model = guard
                .as_mut()
                .ok_or_else(|| fail("synthesis adapter has been shut down".into()))?;
            model.infer(&request).map_err(|e| fail(e.to_string()))?
        };

        let samples = output
            .into_mono()
            .ok_or_else(|| fail("model produced no decodable audio".into()))?;

        debug!(
            "chunk {}: {} chars -> {} samples in {:.0}ms (voice={voice})",
            chunk.index,
            chunk.text.chars().count(),
            samples.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(AudioBuffer::new(samples, sample_rate))
    }

    /// Drop the model. Later calls to [`Self::synthesize`] fail.
    pub fn shutdown(&self) {
        match self.model.lock() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    info!("synthesis adapter shut down");
                }
            }
            Err(poisoned) => {
                poisoned.into_inner().take();
            }
        }
    }
}

impl fmt::Debug for SynthesisAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisAdapter")
            .field("catalog", &self.catalog)
            .field("convention", &self.convention)
            .field("native_rate", &self.native_rate)
            .finish_non_exhaustive()
    }
}
