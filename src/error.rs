//! Error types for the golos synthesis pipeline.

/// Top-level error type for text-to-speech synthesis.
///
/// Every variant names the stage that failed. A failed request never yields
/// partial audio.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// No usable text remained after normalization.
    #[error("normalize: {0}")]
    EmptyInput(String),

    /// The stress annotator failed or returned nothing.
    #[error("annotate: {0}")]
    Annotation(String),

    /// The speech model produced no decodable audio for a chunk.
    #[error("synthesize: chunk {chunk_index}: {message}")]
    Synthesis {
        /// Zero-based index of the failing chunk.
        chunk_index: usize,
        /// What went wrong.
        message: String,
    },

    /// Zero chunks reached the assembler.
    #[error("assemble: no audio chunks were synthesized")]
    EmptyPipeline,

    /// Model, voice catalog or annotator could not be initialized.
    #[error("initialize: {0}")]
    Initialization(String),

    /// WAV serialization or parsing error.
    #[error("encode: {0}")]
    Encode(String),

    /// Model asset download or loading error.
    #[error("model error: {0}")]
    Model(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A timed synthesis call did not finish in time. The blocking work is
    /// abandoned, not interrupted.
    #[error("timeout: synthesis did not finish within {0:?}")]
    Timeout(std::time::Duration),

    /// The blocking synthesis task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SpeechError>;
