//! Golos: Russian text-to-speech synthesis pipeline.
//!
//! Turns arbitrary user-facing text into a 16-bit PCM WAV:
//! Text → Normalize → Annotate → Chunk → Synthesize → Assemble → Post-process → Encode
//!
//! # Architecture
//!
//! - **Text**: Normalization of URLs, handles, numerals and Latin words, then
//!   sentence-aware chunking under a character budget
//! - **TTS**: A stress annotator and an adapter around an ONNX speech model
//!   (`ort`) that detects the model's call convention once
//! - **Audio**: Assembly with pauses, DC removal, fades, peak normalization,
//!   soft limiting, polyphase resampling and WAV encoding via `hound`

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod text;
pub mod tts;

pub use audio::AudioBuffer;
pub use config::GolosConfig;
pub use error::{Result, SpeechError};
pub use pipeline::{SynthesisReport, VoicePipeline};
pub use progress::{ProgressCallback, ProgressEvent};
pub use tts::{SpeechModel, StressAnnotator, Voice};
