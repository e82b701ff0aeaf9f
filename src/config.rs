//! Configuration types for the synthesis pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the synthesis pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GolosConfig {
    /// Post-processing and output settings.
    pub audio: AudioConfig,
    /// Text preparation settings.
    pub text: TextConfig,
    /// Speech model settings.
    pub model: ModelConfig,
    /// Stress annotator settings.
    pub annotator: AnnotatorConfig,
}

/// Audio post-processing and output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output sample rate in Hz. The model's native rate is resampled to this.
    pub target_sample_rate: u32,
    /// Silence inserted between consecutive chunks, in milliseconds.
    pub pause_ms: u32,
    /// Length of the linear fade at each edge, in milliseconds.
    pub fade_ms: f32,
    /// Peak amplitude the buffer is normalized to.
    pub target_peak: f32,
    /// Soft limiter ceiling.
    pub soft_limit: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 48_000,
            pause_ms: 140,
            fade_ms: 8.0,
            target_peak: 0.95,
            soft_limit: 0.98,
        }
    }
}

/// Text preparation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Maximum characters per synthesized chunk.
    ///
    /// Keeps single-shot inference latency bounded; long inputs degrade
    /// quality on most models.
    pub max_chunk_chars: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 220,
        }
    }
}

/// Speech model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model. The manifest is read from the same path with
    /// a `.json` extension.
    pub path: PathBuf,
    /// URL the model is fetched from when `path` does not exist.
    ///
    /// The manifest is fetched from the same URL with a `.json` extension.
    pub download_url: Option<String>,
    /// Voice used when a request names an unknown speaker.
    ///
    /// `None` (or a name not in the catalog) falls back to the first voice.
    pub default_speaker: Option<String>,
    /// ONNX intra-op thread count.
    pub intra_threads: usize,
    /// Ask the model to place stress marks itself, when it supports that.
    pub put_accent: bool,
    /// Ask the model to restore `ё`, when it supports that.
    pub put_yo: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_dir().join("v4_ru.onnx"),
            download_url: None,
            default_speaker: None,
            intra_threads: 4,
            put_accent: true,
            put_yo: true,
        }
    }
}

/// Which stress annotator backs the pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotatorKind {
    /// External program: plain text on stdin, annotated text on stdout.
    #[default]
    Command,
    /// No annotation; text is forwarded unchanged.
    Passthrough,
}

/// Stress annotator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Annotator backend.
    pub kind: AnnotatorKind,
    /// Program to spawn (command backend only).
    pub program: String,
    /// Extra arguments passed to the program.
    pub args: Vec<String>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            kind: AnnotatorKind::default(),
            program: "silero-stress".to_owned(),
            args: Vec::new(),
        }
    }
}

fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("golos")
        .join("models")
}

impl GolosConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::SpeechError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SpeechError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/golos/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("golos").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("golos")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/golos-config/config.toml")
        }
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Config`](crate::error::SpeechError::Config)
    /// naming the offending field.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpeechError;

        if self.audio.target_sample_rate == 0 {
            return Err(SpeechError::Config(
                "audio.target_sample_rate must be > 0".into(),
            ));
        }
        if self.text.max_chunk_chars == 0 {
            return Err(SpeechError::Config("text.max_chunk_chars must be > 0".into()));
        }
        if !(self.audio.fade_ms.is_finite() && self.audio.fade_ms >= 0.0) {
            return Err(SpeechError::Config("audio.fade_ms must be >= 0".into()));
        }
        if !(self.audio.target_peak > 0.0 && self.audio.target_peak <= 1.0) {
            return Err(SpeechError::Config(
                "audio.target_peak must be in (0, 1]".into(),
            ));
        }
        if !(self.audio.soft_limit > 0.0 && self.audio.soft_limit <= 1.0) {
            return Err(SpeechError::Config(
                "audio.soft_limit must be in (0, 1]".into(),
            ));
        }
        if self.model.intra_threads == 0 {
            return Err(SpeechError::Config("model.intra_threads must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GolosConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.target_sample_rate, 48_000);
        assert_eq!(config.audio.pause_ms, 140);
        assert_eq!(config.text.max_chunk_chars, 220);
        assert!((config.audio.fade_ms - 8.0).abs() < f32::EPSILON);
        assert!((config.audio.target_peak - 0.95).abs() < f32::EPSILON);
        assert!((config.audio.soft_limit - 0.98).abs() < f32::EPSILON);
        assert!(config.model.path.ends_with("v4_ru.onnx"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = GolosConfig::default();
        config.audio.target_sample_rate = 24_000;
        config.text.max_chunk_chars = 120;
        config.annotator.kind = AnnotatorKind::Passthrough;
        config.model.default_speaker = Some("xenia".into());

        config.save_to_file(&path).unwrap();
        assert!(path.exists());

        let loaded = GolosConfig::from_file(&path).unwrap();
        assert_eq!(loaded.audio.target_sample_rate, 24_000);
        assert_eq!(loaded.text.max_chunk_chars, 120);
        assert_eq!(loaded.annotator.kind, AnnotatorKind::Passthrough);
        assert_eq!(loaded.model.default_speaker.as_deref(), Some("xenia"));
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = GolosConfig::from_file(std::path::Path::new("/nonexistent/golos.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(matches!(
            GolosConfig::from_file(&path),
            Err(crate::error::SpeechError::Config(_))
        ));
    }

    #[test]
    fn partial_section_uses_defaults() {
        let config: GolosConfig = toml::from_str("[audio]\npause_ms = 300\n").unwrap();
        assert_eq!(config.audio.pause_ms, 300);
        assert_eq!(config.audio.target_sample_rate, 48_000);
        assert_eq!(config.annotator.kind, AnnotatorKind::Command);
        assert_eq!(config.annotator.program, "silero-stress");
    }

    #[test]
    fn annotator_kind_deserializes() {
        let config: GolosConfig =
            toml::from_str("[annotator]\nkind = \"passthrough\"\n").unwrap();
        assert_eq!(config.annotator.kind, AnnotatorKind::Passthrough);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = GolosConfig::default();
        config.audio.target_sample_rate = 0;
        assert!(config.validate().is_err());

        let mut config = GolosConfig::default();
        config.text.max_chunk_chars = 0;
        assert!(config.validate().is_err());

        let mut config = GolosConfig::default();
        config.audio.target_peak = 1.5;
        assert!(config.validate().is_err());

        let mut config = GolosConfig::default();
        config.audio.soft_limit = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = GolosConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("golos"));
    }
}
