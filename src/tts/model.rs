//! The speech model seam: what a backend must expose and what it returns.

use crate::error::Result;

/// Parameter names a model's inference entry point declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSignature {
    parameters: Vec<String>,
}

impl ModelSignature {
    /// Build from declared parameter names.
    pub fn new<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the entry point accepts `name`.
    pub fn accepts(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    /// All declared parameter names.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

/// Text argument in the shape the model expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    /// One string (`text` parameter).
    Single(String),
    /// A batch of strings (`texts` parameter).
    Batch(Vec<String>),
}

/// One inference call, built from a cached [`CallConvention`](super::CallConvention).
///
/// Optional fields are `None` when the model does not declare the parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// Text to speak.
    pub text: TextInput,
    /// Voice identifier.
    pub speaker: Option<String>,
    /// Requested output sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Let the model place stress marks itself.
    pub put_accent: Option<bool>,
    /// Let the model restore `ё`.
    pub put_yo: Option<bool>,
}

/// Raw samples with the shape the model reported.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Row-major sample data.
    pub data: Vec<f32>,
    /// Dimensions; empty or inconsistent shapes are read as flat.
    pub shape: Vec<usize>,
}

impl RawAudio {
    /// Flat mono samples.
    pub fn mono(data: Vec<f32>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Samples with an explicit shape.
    pub fn with_shape(data: Vec<f32>, shape: Vec<usize>) -> Self {
        Self { data, shape }
    }

    /// Collapse to one channel.
    ///
    /// Unit dimensions are squeezed. A rank-2 array is read as frames by
    /// channels, with the shorter axis taken as channels, and averaged per
    /// frame. Higher ranks are flattened. Returns `None` when there are no
    /// samples.
    pub fn into_mono(self) -> Option<Vec<f32>> {
        if self.data.is_empty() {
            return None;
        }

        let dims: Vec<usize> = self.shape.iter().copied().filter(|&d| d != 1).collect();
        let consistent = dims.iter().product::<usize>() == self.data.len();
        if !consistent || dims.len() != 2 {
            return Some(self.data);
        }

        let (rows, cols) = (dims[0], dims[1]);
        let data = self.data;
        let mono = if cols <= rows {
            // [frames, channels]
            data.chunks_exact(cols)
                .map(|frame| frame.iter().sum::<f32>() / cols as f32)
                .collect()
        } else {
            // [channels, frames]
            (0..cols)
                .map(|f| (0..rows).map(|c| data[c * cols + f]).sum::<f32>() / rows as f32)
                .collect()
        };
        Some(mono)
    }
}

/// What a model hands back for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutput {
    /// One waveform.
    Single(RawAudio),
    /// One waveform per batch element; only the first is used.
    List(Vec<RawAudio>),
}

impl SynthesisOutput {
    /// Normalize to one mono buffer, `None` if nothing decodable came back.
    pub fn into_mono(self) -> Option<Vec<f32>> {
        let raw = match self {
            Self::Single(raw) => raw,
            Self::List(list) => list.into_iter().next()?,
        };
        raw.into_mono()
    }
}

/// An external speech model.
///
/// Implementations need not be thread-safe; the adapter serializes calls.
pub trait SpeechModel: Send {
    /// Fixed catalog of voice identifiers.
    fn speakers(&self) -> Vec<String>;

    /// Native output sample rate, if the model reports one.
    fn sample_rate(&self) -> Option<u32>;

    /// Declared inference parameters, `None` if there is no entry point.
    fn signature(&self) -> Option<ModelSignature>;

    /// Run inference.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn infer(&mut self, request: &InferenceRequest) -> Result<SynthesisOutput>;
}
