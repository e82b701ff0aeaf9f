//! CLI binary for golos.

use anyhow::Context;
use clap::{Parser, Subcommand};
use golos::{GolosConfig, ProgressCallback, ProgressEvent, VoicePipeline};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Golos: Russian text-to-speech.
#[derive(Parser)]
#[command(name = "golos", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Synthesize text to a WAV file.
    Synth {
        /// Text to speak.
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file instead.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Voice identifier; unknown voices fall back to the default.
        #[arg(short, long)]
        speaker: Option<String>,

        /// Output WAV path.
        #[arg(short, long, default_value = "out.wav")]
        output: PathBuf,
    },

    /// List the model's voices.
    Voices,

    /// Print normalized text and its chunks without loading a model.
    Normalize {
        /// Text to normalize.
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("golos=info,ort=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Synth {
            text,
            file,
            speaker,
            output,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("pass --text or --file"),
            };
            run_synth(config, text, speaker, output).await
        }
        Command::Voices => list_voices(config),
        Command::Normalize { text } => print_normalized(&config, &text),
    }
}

/// Explicit path, else the default path if it exists, else built-in defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<GolosConfig> {
    let config = match explicit {
        Some(path) => GolosConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let default_path = GolosConfig::default_config_path();
            if default_path.exists() {
                info!("using config {}", default_path.display());
                GolosConfig::from_file(&default_path)?
            } else {
                GolosConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

fn progress_printer() -> ProgressCallback {
    Box::new(|event| match event {
        ProgressEvent::Cached { filename } => println!("  {filename}  [cached]"),
        ProgressEvent::DownloadComplete { filename } => println!("  {filename}  [downloaded]"),
        ProgressEvent::LoadComplete {
            model_name,
            duration_secs,
        } => println!("  {model_name} loaded in {duration_secs:.1}s"),
        _ => {}
    })
}

async fn run_synth(
    config: GolosConfig,
    text: String,
    speaker: Option<String>,
    output: PathBuf,
) -> anyhow::Result<()> {
    let (pipeline, text) = tokio::task::spawn_blocking(move || {
        let callback = progress_printer();
        VoicePipeline::from_config(config, Some(&callback)).map(|p| (p, text))
    })
    .await??;

    let written = tokio::task::spawn_blocking(move || {
        pipeline.generate_voice_to_file(&text, speaker.as_deref(), &output)
    })
    .await??;

    println!("{}", written.display());
    Ok(())
}

fn list_voices(config: GolosConfig) -> anyhow::Result<()> {
    let callback = progress_printer();
    let pipeline = VoicePipeline::from_config(config, Some(&callback))?;
    for voice in pipeline.voices() {
        println!("{voice}");
    }
    Ok(())
}

fn print_normalized(config: &GolosConfig, text: &str) -> anyhow::Result<()> {
    let normalized = golos::text::normalize(text)?;
    println!("{normalized}");
    if golos::text::is_markup(&normalized) {
        return Ok(());
    }
    for chunk in golos::text::chunk(&normalized, config.text.max_chunk_chars) {
        println!("[{}] {}", chunk.index, chunk.text);
    }
    Ok(())
}
