use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, error, info, warn};
use notify::{Config as NotifyConfig, PollWatcher, RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{
    new_debouncer_opt, Config as DebouncerConfig, DebounceEventResult, DebouncedEventKind,
};
use walkdir::WalkDir;

use crate::config::WatcherConfig;
use crate::error::WorkerError;

pub struct DirectoryScanner {
    input_directory: PathBuf,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(input_directory: P) -> Self {
        Self {
            input_directory: input_directory.as_ref().to_path_buf(),
        }
    }

    pub fn input_directory(&self) -> &Path {
        &self.input_directory
    }

    /// A visible file with a `.pdf` extension in any letter case.
    pub fn is_candidate(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    }

    /// PDFs currently waiting in the input directory, in name order.
    pub fn scan(&self) -> Result<Vec<PathBuf>, WorkerError> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.input_directory)
            .min_depth(1)
            .max_depth(1) // Only the top level; nothing nested is ever claimed
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(WorkerError::ScanFailed {
                        path: self.input_directory.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() && Self::is_candidate(entry.path()) {
                debug!("Found document: {}", entry.path().display());
                found.push(entry.into_path());
            }
        }

        info!(
            "Scanned {} documents in {}",
            found.len(),
            self.input_directory.display()
        );
        Ok(found)
    }

    /// Blocks until `shutdown` is set, calling `callback` once per settled
    /// candidate path per debounced batch. Paths are handed over strictly
    /// one at a time.
    pub fn watch<F>(
        &self,
        config: &WatcherConfig,
        shutdown: &AtomicBool,
        mut callback: F,
    ) -> Result<(), WorkerError>
    where
        F: FnMut(PathBuf),
    {
        let (tx, rx) = std::sync::mpsc::channel();
        let debounce = Duration::from_millis(config.debounce_ms);

        // Keep the debouncer alive for the duration of the loop.
        if config.use_polling {
            // PollWatcher for Docker/NFS mounts where inotify sees nothing
            let poll_config = NotifyConfig::default()
                .with_poll_interval(Duration::from_millis(config.poll_interval_ms));
            let debouncer_config = DebouncerConfig::default()
                .with_timeout(debounce)
                .with_notify_config(poll_config);
            let mut debouncer = new_debouncer_opt::<_, PollWatcher>(debouncer_config, tx)
                .map_err(|e| WorkerError::WatchError(e.to_string()))?;
            debouncer
                .watcher()
                .watch(&self.input_directory, RecursiveMode::NonRecursive)
                .map_err(|e| WorkerError::WatchError(e.to_string()))?;
            self.event_loop(&rx, shutdown, &mut callback)
        } else {
            let debouncer_config = DebouncerConfig::default().with_timeout(debounce);
            let mut debouncer = new_debouncer_opt::<_, RecommendedWatcher>(debouncer_config, tx)
                .map_err(|e| WorkerError::WatchError(e.to_string()))?;
            debouncer
                .watcher()
                .watch(&self.input_directory, RecursiveMode::NonRecursive)
                .map_err(|e| WorkerError::WatchError(e.to_string()))?;
            self.event_loop(&rx, shutdown, &mut callback)
        }
    }

    fn event_loop<F>(
        &self,
        rx: &Receiver<DebounceEventResult>,
        shutdown: &AtomicBool,
        callback: &mut F,
    ) -> Result<(), WorkerError>
    where
        F: FnMut(PathBuf),
    {
        info!("Watching directory: {}", self.input_directory.display());

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Watch mode shutting down...");
                break;
            }

            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(Ok(events)) => {
                    let mut batch: Vec<PathBuf> = Vec::new();
                    for event in events {
                        if !matches!(event.kind, DebouncedEventKind::Any) {
                            continue;
                        }
                        if event.path.is_file()
                            && Self::is_candidate(&event.path)
                            && !batch.contains(&event.path)
                        {
                            batch.push(event.path);
                        }
                    }
                    batch.sort();

                    for path in batch {
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                        info!("New document detected: {}", path.display());
                        callback(path);
                    }
                }
                Ok(Err(errors)) => {
                    warn!("Watch error: {:?}", errors);
                }
                Err(RecvTimeoutError::Timeout) => {
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!("Watch channel disconnected");
                    return Err(WorkerError::WatchError(
                        "Watch channel disconnected".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
