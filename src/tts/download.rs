//! One-time download of the speech model and its manifest.

use super::onnx::ModelManifest;
use crate::config::ModelConfig;
use crate::error::{Result, SpeechError};
use crate::progress::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Make sure the model graph and manifest exist locally, downloading them if needed.
///
/// Returns the model path.
///
/// # Errors
///
/// Returns [`SpeechError::Initialization`] if an asset is missing and no
/// download URL is configured, or [`SpeechError::Model`] if a download fails.
pub fn ensure_model_assets(
    config: &ModelConfig,
    callback: Option<&ProgressCallback>,
) -> Result<PathBuf> {
    let model_path = config.path.clone();
    let manifest_path = ModelManifest::path_for(&model_path);

    ensure_file(&model_path, config.download_url.as_deref(), callback)?;
    let manifest_url = config.download_url.as_deref().map(manifest_url);
    ensure_file(&manifest_path, manifest_url.as_deref(), callback)?;

    Ok(model_path)
}

/// Manifest URL for a model URL: the `.onnx` suffix becomes `.json`.
pub fn manifest_url(model_url: &str) -> String {
    match model_url.strip_suffix(".onnx") {
        Some(stem) => format!("{stem}.json"),
        None => format!("{model_url}.json"),
    }
}

fn ensure_file(dest: &Path, url: Option<&str>, callback: Option<&ProgressCallback>) -> Result<()> {
    let filename = file_label(dest);
    if dest.exists() {
        if let Some(cb) = callback {
            cb(ProgressEvent::Cached { filename });
        }
        return Ok(());
    }

    let Some(url) = url else {
        return Err(SpeechError::Initialization(format!(
            "{} is missing and no model.download_url is configured",
            dest.display()
        )));
    };
    download_url_with_progress(url, dest, callback)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Stream `url` into `dest` through a `.part` file, renamed on completion.
///
/// # Errors
///
/// Returns [`SpeechError::Model`] on HTTP or read failure, or an I/O error
/// if the destination cannot be written.
pub fn download_url_with_progress(
    url: &str,
    dest: &Path,
    callback: Option<&ProgressCallback>,
) -> Result<()> {
    let filename = file_label(dest);
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    info!("downloading {url} -> {}", dest.display());

    let resp = ureq::get(url)
        .call()
        .map_err(|e| SpeechError::Model(format!("failed to download {filename}: {e}")))?;

    let total_bytes = resp
        .header("content-length")
        .and_then(|v| v.parse::<u64>().ok());

    if let Some(cb) = callback {
        cb(ProgressEvent::DownloadStarted {
            url: url.to_owned(),
            filename: filename.clone(),
            total_bytes,
        });
    }

    let bytes_downloaded =
        stream_to_file(resp.into_reader(), dest, &filename, total_bytes, callback)?;
    info!("downloaded {filename} ({bytes_downloaded} bytes)");

    if let Some(cb) = callback {
        cb(ProgressEvent::DownloadComplete { filename });
    }
    Ok(())
}

/// Copy `reader` into `dest` via `<dest>.part`, removing the partial file on failure.
fn stream_to_file(
    reader: impl Read,
    dest: &Path,
    filename: &str,
    total_bytes: Option<u64>,
    callback: Option<&ProgressCallback>,
) -> Result<u64> {
    let tmp = dest.with_extension("part");
    let result = copy_to_part(reader, &tmp, filename, total_bytes, callback)
        .and_then(|n| std::fs::rename(&tmp, dest).map(|()| n).map_err(SpeechError::from));
    if result.is_err() && tmp.exists() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn copy_to_part(
    mut reader: impl Read,
    tmp: &Path,
    filename: &str,
    total_bytes: Option<u64>,
    callback: Option<&ProgressCallback>,
) -> Result<u64> {
    let pb = ProgressBar::new(total_bytes.unwrap_or(0));
    if let Ok(style) = ProgressStyle::with_template(
        "  {msg} [{bar:30}] {bytes}/{total_bytes} {bytes_per_sec} ETA {eta}",
    ) {
        pb.set_style(style);
    }
    pb.set_message(filename.to_owned());

    let mut file = std::fs::File::create(tmp)?;
    let mut buf = [0u8; 64 * 1024];
    let mut bytes_downloaded: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| SpeechError::Model(format!("download read error: {e}")))?;
        if n == 0 {
            break;
        }
        std::io::Write::write_all(&mut file, &buf[..n])?;
        pb.inc(n as u64);
        bytes_downloaded += n as u64;
        if let Some(cb) = callback {
            cb(ProgressEvent::DownloadProgress {
                filename: filename.to_owned(),
                bytes_downloaded,
                total_bytes,
            });
        }
    }
    pb.finish();
    Ok(bytes_downloaded)
}
