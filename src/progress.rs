//! Progress events for model asset download and loading.
//!
//! Decouples the download logic from presentation: the CLI draws `indicatif`
//! bars, library callers can subscribe with a [`ProgressCallback`].

/// Progress events emitted while fetching and loading the speech model.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// An asset download has started.
    DownloadStarted {
        /// Source URL.
        url: String,
        /// Local file name being written.
        filename: String,
        /// Total size in bytes, if the server reported one.
        total_bytes: Option<u64>,
    },

    /// Download progress update.
    DownloadProgress {
        /// Local file name being written.
        filename: String,
        /// Bytes downloaded so far.
        bytes_downloaded: u64,
        /// Total size in bytes, if known.
        total_bytes: Option<u64>,
    },

    /// An asset download completed.
    DownloadComplete {
        /// Local file name written.
        filename: String,
    },

    /// The asset was already on disk.
    Cached {
        /// Local file name.
        filename: String,
    },

    /// Model loading into memory has started.
    LoadStarted {
        /// Human-readable model name.
        model_name: String,
    },

    /// Model loading completed.
    LoadComplete {
        /// Human-readable model name.
        model_name: String,
        /// Time taken to load in seconds.
        duration_secs: f64,
    },
}

/// Callback type for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn callback_receives_events() {
        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);

        let callback: ProgressCallback = Box::new(move |event| {
            let label = match &event {
                ProgressEvent::DownloadStarted { .. } => "started",
                ProgressEvent::DownloadProgress { .. } => "progress",
                ProgressEvent::DownloadComplete { .. } => "complete",
                ProgressEvent::Cached { .. } => "cached",
                ProgressEvent::LoadStarted { .. } => "load_started",
                ProgressEvent::LoadComplete { .. } => "load_complete",
            };
            let Ok(mut guard) = events_clone.lock() else {
                return;
            };
            guard.push(label.to_owned());
        });

        callback(ProgressEvent::DownloadStarted {
            url: "https://example.invalid/v4_ru.onnx".into(),
            filename: "v4_ru.onnx".into(),
            total_bytes: Some(1000),
        });
        callback(ProgressEvent::DownloadProgress {
            filename: "v4_ru.onnx".into(),
            bytes_downloaded: 500,
            total_bytes: Some(1000),
        });
        callback(ProgressEvent::DownloadComplete {
            filename: "v4_ru.onnx".into(),
        });
        callback(ProgressEvent::LoadComplete {
            model_name: "speech model".into(),
            duration_secs: 0.5,
        });

        let events = events.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            &["started", "progress", "complete", "load_complete"]
        );
    }
}
