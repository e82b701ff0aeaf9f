//! ONNX speech model backed by `ort`, described by a JSON manifest.
//!
//! The manifest sits next to the graph (`v4_ru.onnx` + `v4_ru.json`) and
//! lists the voices, native sample rate, symbol table and the graph inputs
//! the export declares. Text is encoded one symbol per character; characters
//! outside the table are dropped.

use super::model::{
    InferenceRequest, ModelSignature, RawAudio, SpeechModel, SynthesisOutput, TextInput,
};
use crate::error::{Result, SpeechError};
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Model description shipped next to the ONNX graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelManifest {
    /// Native output sample rate in Hz.
    pub sample_rate: u32,
    /// Voice identifiers, indexed by the `speaker` input.
    pub speakers: Vec<String>,
    /// Symbol table; each character's position is its token id.
    pub symbols: String,
    /// Graph input names, in declaration order.
    pub parameters: Vec<String>,
    /// Interleaved channels in the output tensor.
    #[serde(default = "default_channels")]
    pub channels: usize,
    /// Token id used to pad batched sequences.
    #[serde(default)]
    pub pad_id: i64,
}

fn default_channels() -> usize {
    1
}

impl ModelManifest {
    /// Manifest path for a model file: same stem, `.json` extension.
    pub fn path_for(model_path: &Path) -> PathBuf {
        model_path.with_extension("json")
    }

    /// Read and parse a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Initialization`] if the file is missing or malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SpeechError::Initialization(format!(
                "failed to read model manifest {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Initialization`] if the JSON does not describe a manifest.
    pub fn from_json(raw: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(raw).map_err(|e| {
            SpeechError::Initialization(format!("failed to parse model manifest: {e}"))
        })?;
        if manifest.channels == 0 {
            return Err(SpeechError::Initialization(
                "model manifest declares zero output channels".into(),
            ));
        }
        Ok(manifest)
    }

    /// Character to token id map.
    fn symbol_ids(&self) -> HashMap<char, i64> {
        self.symbols
            .chars()
            .enumerate()
            .map(|(i, c)| (c, i as i64))
            .collect()
    }
}

/// A speech model exported to ONNX.
pub struct OnnxSpeechModel {
    session: Session,
    manifest: ModelManifest,
    symbol_ids: HashMap<char, i64>,
}

impl OnnxSpeechModel {
    /// Load the graph at `path` and the manifest next to it.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or the graph fails to load.
    pub fn load(path: &Path, intra_threads: usize) -> Result<Self> {
        if !path.exists() {
            return Err(SpeechError::Initialization(format!(
                "speech model not found at {}",
                path.display()
            )));
        }
        let manifest = ModelManifest::from_file(&ModelManifest::path_for(path))?;

        info!("loading speech model: {}", path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(intra_threads.max(1)))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| SpeechError::Model(format!("failed to load ONNX model: {e}")))?;

        info!(
            "speech model ready ({} voices, {} Hz, inputs: {})",
            manifest.speakers.len(),
            manifest.sample_rate,
            manifest.parameters.join(", ")
        );

        let symbol_ids = manifest.symbol_ids();
        Ok(Self {
            session,
            manifest,
            symbol_ids,
        })
    }

    fn encode_text(&self, text: &str) -> Vec<i64> {
        text.chars()
            .flat_map(char::to_lowercase)
            .filter_map(|c| self.symbol_ids.get(&c).copied())
            .collect()
    }

    fn speaker_index(&self, speaker: &str) -> Result<i64> {
        self.manifest
            .speakers
            .iter()
            .position(|s| s == speaker)
            .map(|i| i as i64)
            .ok_or_else(|| SpeechError::Model(format!("speaker '{speaker}' not in manifest")))
    }
}

/// Split the output tensor into per-item raw audio.
///
/// A shape that accounts for every sample is trusted: batched output is split
/// along its leading dimension and each item keeps the remaining dimensions,
/// so channel layout is left to [`RawAudio::into_mono`]. A flat output from a
/// multi-channel manifest is read as interleaved frames. Shapes that do not
/// match the data fall back to splitting the flat buffer evenly.
fn shape_output(
    data: Vec<f32>,
    shape: &[usize],
    batch: usize,
    channels: usize,
) -> SynthesisOutput {
    let interleaved = |samples: Vec<f32>| {
        if channels > 1 {
            let frames = samples.len() / channels;
            RawAudio::with_shape(samples, vec![frames, channels])
        } else {
            RawAudio::mono(samples)
        }
    };
    let consistent = !shape.is_empty() && shape.iter().product::<usize>() == data.len();

    if consistent {
        if batch > 1 && shape[0] == batch {
            let item_shape = shape[1..].to_vec();
            let per_item = data.len() / batch;
            if per_item == 0 {
                return SynthesisOutput::List(Vec::new());
            }
            return SynthesisOutput::List(
                data.chunks_exact(per_item)
                    .map(|c| shape_item(c.to_vec(), item_shape.clone(), channels))
                    .collect(),
            );
        }
        if batch <= 1 {
            return SynthesisOutput::Single(shape_item(data, shape.to_vec(), channels));
        }
    }

    if batch <= 1 {
        return SynthesisOutput::Single(interleaved(data));
    }
    let per_item = data.len() / batch;
    if per_item == 0 {
        return SynthesisOutput::List(Vec::new());
    }
    SynthesisOutput::List(
        data.chunks_exact(per_item)
            .map(|c| interleaved(c.to_vec()))
            .collect(),
    )
}

/// One item with a trusted shape. Only a shape that is flat after squeezing
/// unit dimensions borrows the manifest's channel count.
fn shape_item(samples: Vec<f32>, shape: Vec<usize>, channels: usize) -> RawAudio {
    let rank = shape.iter().filter(|&&d| d != 1).count();
    if rank <= 1 && channels > 1 {
        let frames = samples.len() / channels;
        RawAudio::with_shape(samples, vec![frames, channels])
    } else {
        RawAudio::with_shape(samples, shape)
    }
}

fn scalar(value: i64) -> Result<Tensor<i64>> {
    Tensor::from_array(([1_usize], vec![value]))
        .map_err(|e| SpeechError::Model(format!("failed to create scalar tensor: {e}")))
}

impl SpeechModel for OnnxSpeechModel {
    fn speakers(&self) -> Vec<String> {
        self.manifest.speakers.clone()
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.manifest.sample_rate).filter(|&r| r > 0)
    }

    fn signature(&self) -> Option<ModelSignature> {
        if self.manifest.parameters.is_empty() {
            None
        } else {
            Some(ModelSignature::new(self.manifest.parameters.iter().cloned()))
        }
    }

    fn infer(&mut self, request: &InferenceRequest) -> Result<SynthesisOutput> {
        use ort::session::{SessionInputValue, SessionInputs};

        let (text_input, texts): (&str, Vec<&str>) = match &request.text {
            TextInput::Single(text) => ("text", vec![text.as_str()]),
            TextInput::Batch(texts) => ("texts", texts.iter().map(String::as_str).collect()),
        };

        let sequences: Vec<Vec<i64>> = texts.iter().map(|t| self.encode_text(t)).collect();
        let seq_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
        if seq_len == 0 {
            return Err(SpeechError::Model(
                "input has no characters from the model's symbol table".into(),
            ));
        }
        let batch = sequences.len();
        let mut ids = Vec::with_capacity(batch * seq_len);
        for seq in &sequences {
            ids.extend_from_slice(seq);
            ids.extend(std::iter::repeat_n(self.manifest.pad_id, seq_len - seq.len()));
        }

        let ids_tensor = Tensor::from_array(([batch, seq_len], ids))
            .map_err(|e| SpeechError::Model(format!("failed to create text tensor: {e}")))?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert(text_input.to_string(), ids_tensor.into());
        if let Some(speaker) = &request.speaker {
            feed.insert("speaker".to_string(), scalar(self.speaker_index(speaker)?)?.into());
        }
        if let Some(rate) = request.sample_rate {
            feed.insert("sample_rate".to_string(), scalar(i64::from(rate))?.into());
        }
        if let Some(flag) = request.put_accent {
            feed.insert("put_accent".to_string(), scalar(i64::from(flag))?.into());
        }
        if let Some(flag) = request.put_yo {
            feed.insert("put_yo".to_string(), scalar(i64::from(flag))?.into());
        }

        let outputs = self
            .session
            .run(SessionInputs::from(feed))
            .map_err(|e| SpeechError::Model(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| SpeechError::Model(format!("failed to extract output tensor: {e}")))?;
        let shape: Vec<usize> = shape
            .iter()
            .map(|&d| usize::try_from(d).unwrap_or(0))
            .collect();
        let data = data.to_vec();
        drop(outputs);

        Ok(shape_output(data, &shape, batch, self.manifest.channels))
    }
}
