//! Speech synthesis: the model seam, the adapter around it and the stress annotator.

pub mod adapter;
pub mod annotator;
pub mod download;
pub mod model;
pub mod onnx;

pub use adapter::{
    AdapterOptions, CallConvention, SynthesisAdapter, TextConvention, Voice, VoiceCatalog,
};
pub use annotator::{CommandAnnotator, PassthroughAnnotator, StressAnnotator};
pub use download::ensure_model_assets;
pub use model::{
    InferenceRequest, ModelSignature, RawAudio, SpeechModel, SynthesisOutput, TextInput,
};
pub use onnx::{ModelManifest, OnnxSpeechModel};
