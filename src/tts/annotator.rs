//! Stress annotation: marks word stress before text reaches the model.

use crate::config::{AnnotatorConfig, AnnotatorKind};
use crate::error::{Result, SpeechError};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Inserts stress markers into normalized text.
pub trait StressAnnotator: Send + Sync {
    /// Annotate `text`.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Annotation`] if annotation fails or yields nothing.
    fn annotate(&self, text: &str) -> Result<String>;
}

/// Forwards text unchanged. Must be chosen explicitly in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAnnotator;

impl StressAnnotator for PassthroughAnnotator {
    fn annotate(&self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }
}

/// Runs an external program: plain text on stdin, annotated text on stdout.
#[derive(Debug, Clone)]
pub struct CommandAnnotator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandAnnotator {
    /// Resolve `program` on `PATH` (or as a path) once.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Initialization`] if the program cannot be found.
    pub fn new(program: &str, args: Vec<String>) -> Result<Self> {
        let resolved = which::which(program).map_err(|e| {
            SpeechError::Initialization(format!("stress annotator '{program}' not found: {e}"))
        })?;
        info!("stress annotator: {}", resolved.display());
        Ok(Self {
            program: resolved,
            args,
        })
    }
}

impl StressAnnotator for CommandAnnotator {
    fn annotate(&self, text: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SpeechError::Annotation(format!(
                    "failed to spawn {}: {e}",
                    self.program.display()
                ))
            })?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock
        // on a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_owned();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output().map_err(|e| {
            SpeechError::Annotation(format!("failed to wait for annotator: {e}"))
        })?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(SpeechError::Annotation(format!(
                        "failed to write annotator input: {e}"
                    )));
                }
                Err(_) => {
                    return Err(SpeechError::Annotation(
                        "annotator input thread panicked".into(),
                    ));
                }
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Annotation(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let annotated = String::from_utf8(output.stdout)
            .map_err(|e| SpeechError::Annotation(format!("annotator output is not UTF-8: {e}")))?;
        let annotated = annotated.trim();
        if annotated.is_empty() {
            return Err(SpeechError::Annotation(
                "annotator returned empty output".into(),
            ));
        }

        debug!(
            "annotated {} chars -> {} chars",
            text.chars().count(),
            annotated.chars().count()
        );
        Ok(annotated.to_owned())
    }
}

/// Build the annotator the configuration selects.
///
/// # Errors
///
/// Returns [`SpeechError::Initialization`] if the command backend's program is missing.
pub fn from_config(config: &AnnotatorConfig) -> Result<Box<dyn StressAnnotator>> {
    match config.kind {
        AnnotatorKind::Command => Ok(Box::new(CommandAnnotator::new(
            &config.program,
            config.args.clone(),
        )?)),
        AnnotatorKind::Passthrough => {
            info!("stress annotation disabled (passthrough)");
            Ok(Box::new(PassthroughAnnotator))
        }
    }
}
