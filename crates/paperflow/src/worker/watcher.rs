use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use crate::config::WatcherConfig;
use crate::error::WorkerError;
use crate::pipeline::progress::ProgressReporter;
use crate::pipeline::Pipeline;
use crate::sanitize;
use crate::worker::job::{JobResult, ProcessingJob};
use crate::worker::scanner::DirectoryScanner;

/// Outcome of waiting for a freshly announced file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Ready,
    Vanished,
    StillChanging,
}

/// How long to wait before trusting that a writer is done with a file:
/// a fixed delay, then up to `stability_checks` size samples until two
/// consecutive ones agree.
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    settle_delay: Duration,
    stability_checks: u32,
    stability_interval: Duration,
}

impl SettlePolicy {
    pub fn new(settle_delay: Duration, stability_checks: u32, stability_interval: Duration) -> Self {
        Self {
            settle_delay,
            stability_checks,
            stability_interval,
        }
    }

    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new(
            Duration::from_millis(config.settle_delay_ms),
            config.stability_checks,
            Duration::from_millis(config.stability_interval_ms),
        )
    }

    /// No waiting at all.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, 0, Duration::ZERO)
    }

    pub fn wait(&self, path: &Path) -> Settled {
        thread::sleep(self.settle_delay);

        let Some(mut last) = file_size(path) else {
            return Settled::Vanished;
        };
        if self.stability_checks == 0 {
            return Settled::Ready;
        }

        for _ in 0..self.stability_checks {
            thread::sleep(self.stability_interval);
            let Some(size) = file_size(path) else {
                return Settled::Vanished;
            };
            if size == last {
                return Settled::Ready;
            }
            last = size;
        }
        Settled::StillChanging
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// The long-running loop: one document at a time, failures contained.
pub struct DocumentWatcher {
    pipeline: Pipeline,
    scanner: DirectoryScanner,
    settle: SettlePolicy,
    config: WatcherConfig,
    progress: Box<dyn ProgressReporter>,
}

impl DocumentWatcher {
    pub fn new(
        pipeline: Pipeline,
        config: WatcherConfig,
        progress: Box<dyn ProgressReporter>,
    ) -> Self {
        let scanner = DirectoryScanner::new(&pipeline.config().input_directory);
        let settle = SettlePolicy::from_config(&config);
        Self {
            pipeline,
            scanner,
            settle,
            config,
            progress,
        }
    }

    pub fn with_settle_policy(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Processes what is already waiting (if configured), then watches until
    /// `shutdown` is set. Returns once the current document is finished.
    pub fn run(&self, shutdown: &AtomicBool) -> Result<(), WorkerError> {
        if self.config.process_existing {
            let pending = self.scanner.scan()?;
            if !pending.is_empty() {
                info!("Processing {} document(s) found at startup", pending.len());
            }
            for path in pending {
                if shutdown.load(Ordering::Relaxed) {
                    return Ok(());
                }
                self.handle(&path);
            }
        }

        self.scanner.watch(&self.config, shutdown, |path| {
            self.handle(&path);
        })
    }

    /// Handles one announced path. Returns `None` when no job was run to
    /// completion (not a candidate, not settled, or the job panicked).
    pub fn handle(&self, path: &Path) -> Option<JobResult> {
        let name = sanitize::redact_path(path);
        if !DirectoryScanner::is_candidate(path) {
            debug!("Ignoring {}", name);
            return None;
        }

        match self.settle.wait(path) {
            Settled::Ready => {}
            Settled::Vanished => {
                debug!("{} disappeared before processing", name);
                return None;
            }
            Settled::StillChanging => {
                info!("{} is still being written, waiting for the next event", name);
                return None;
            }
        }

        let job = ProcessingJob::new(path.to_path_buf());
        info!("Processing {} (job {})", name, job.id);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.run(job, self.progress.as_ref())
        }));

        match outcome {
            Ok(result) => {
                if result.success {
                    info!(
                        "Finished {} via {} OCR",
                        name,
                        result
                            .strategy
                            .map(|s| s.to_string())
                            .unwrap_or_default()
                    );
                } else {
                    error!(
                        "Failed to process {}: {}. Left in place for retry.",
                        name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                Some(result)
            }
            Err(payload) => {
                error!(
                    "Panic while processing {}: {}. Left in place for retry.",
                    name,
                    panic_message(payload.as_ref())
                );
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
