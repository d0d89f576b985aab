// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folder watcher — poll a scan folder for newly arrived images and run the
// frame pipeline on each one exactly once.
//
// Files present when the watcher starts are ignored. Pipeline outputs written
// into the same folder are recognised by their stem suffix and never fed back
// in. Nothing is ever deleted here; that belongs to the color stage.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use negframe_core::ResultRecord;
use negframe_core::error::{NegframeError, Result};
use negframe_frame::{FrameExtractor, output_path_for};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// Extensions (lowercase) accepted as scans.
const SCAN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Stem suffixes of files this tool writes itself.
const OUTPUT_SUFFIXES: &[&str] = &["_", "_rebate", "_inner"];

/// Marker used by the downstream inversion stage.
const INVERTED_MARKER: &str = "_inverted";

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub folder: PathBuf,
    /// Wait between first sighting and processing, so the scanner can finish writing.
    pub settle: Duration,
    pub poll: Duration,
    /// External program launched with the output image as its only argument.
    pub viewer: Option<PathBuf>,
}

impl WatchOptions {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            settle: Duration::from_millis(2000),
            poll: Duration::from_millis(1000),
            viewer: None,
        }
    }
}

pub struct FolderWatcher {
    options: WatchOptions,
    extractor: Arc<FrameExtractor>,
    seen: HashSet<PathBuf>,
    shutdown: Arc<Notify>,
}

impl FolderWatcher {
    /// Prepare a watcher, recording every file already in the folder as seen.
    pub fn new(options: WatchOptions, extractor: FrameExtractor) -> Result<Self> {
        if !options.folder.is_dir() {
            return Err(NegframeError::Watch(format!(
                "not a directory: {}",
                options.folder.display()
            )));
        }
        let seen: HashSet<PathBuf> = list_files(&options.folder)?.into_iter().collect();
        info!(
            folder = %options.folder.display(),
            existing = seen.len(),
            "Watch folder ready; existing files ignored"
        );
        Ok(Self {
            options,
            extractor: Arc::new(extractor),
            seen,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Handle that stops [`FolderWatcher::run`] when notified.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Poll until shut down. Per-file failures are logged and skipped.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.options.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = Arc::clone(&self.shutdown);

        info!(folder = %self.options.folder.display(), "Watching for new scans");
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("watch loop received shutdown signal");
                    break;
                }

                _ = ticker.tick() => {
                    let new_files = match self.scan_new() {
                        Ok(files) => files,
                        Err(e) => {
                            error!(error = %e, "failed to list watch folder");
                            continue;
                        }
                    };
                    for path in new_files {
                        if let Err(e) = self.handle_file(&path).await {
                            warn!(path = %path.display(), error = %e, "scan failed");
                        }
                    }
                }
            }
        }

        info!("Watcher stopped");
        Ok(())
    }

    /// New candidate files since the last call, each returned at most once.
    pub fn scan_new(&mut self) -> Result<Vec<PathBuf>> {
        let mut fresh = Vec::new();
        for path in list_files(&self.options.folder)? {
            if !self.seen.insert(path.clone()) {
                continue;
            }
            if !is_candidate(&path) {
                debug!(path = %path.display(), "Ignoring non-scan file");
                continue;
            }
            if output_path_for(&path).exists() {
                debug!(path = %path.display(), "Output already exists; skipping");
                continue;
            }
            fresh.push(path);
        }
        fresh.sort();
        Ok(fresh)
    }

    /// Settle, then run the pipeline on one file and publish its record.
    ///
    /// Returns `None` when the file vanished or is still empty after settling.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn handle_file(&self, path: &Path) -> Result<Option<ResultRecord>> {
        info!("New scan detected");
        tokio::time::sleep(self.options.settle).await;

        if !is_ready(path).await {
            info!("File not ready; skipping");
            return Ok(None);
        }

        let extractor = Arc::clone(&self.extractor);
        let input = path.to_path_buf();
        let record = tokio::task::spawn_blocking(move || extractor.process_file(&input))
            .await
            .map_err(|e| NegframeError::Watch(format!("pipeline task: {e}")))??;

        let record_path = record_path_for(path);
        record.write_json(&record_path)?;
        println!("{}", serde_json::to_string(&record)?);
        info!(
            output = %record.image_path.display(),
            record = %record_path.display(),
            "Scan processed"
        );

        if let Some(viewer) = &self.options.viewer {
            open_viewer(viewer, &record.image_path);
        }
        Ok(Some(record))
    }
}

/// Whether `path` looks like an incoming scan rather than one of our outputs.
pub fn is_candidate(path: &Path) -> bool {
    let extension_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCAN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    if !extension_ok {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    !stem.contains(INVERTED_MARKER) && !OUTPUT_SUFFIXES.iter().any(|s| stem.ends_with(s))
}

/// A file is ready once it exists and is non-empty.
pub async fn is_ready(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// `<stem>_.json` next to the output image.
pub fn record_path_for(input: &Path) -> PathBuf {
    output_path_for(input).with_extension("json")
}

fn list_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

fn open_viewer(viewer: &Path, image: &Path) {
    match tokio::process::Command::new(viewer).arg(image).spawn() {
        Ok(_) => debug!(viewer = %viewer.display(), "Viewer launched"),
        Err(e) => warn!(viewer = %viewer.display(), error = %e, "failed to launch viewer"),
    }
}
