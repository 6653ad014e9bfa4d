use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::WorkerError;
use crate::pipeline::ocr::OcrStrategyKind;
use crate::pipeline::progress::{ProgressEvent, ProgressReporter};

/// Lifecycle of one source file.
///
/// ```text
/// Discovered -> OcrRunning -> OcrSucceeded ----------------------+
///                          \-> OcrFailed -> ManualOcrRunning     |
///                                 -> ManualOcrSucceeded ---------+-> ExtractionRunning
///                                 \-> ManualOcrFailed                -> ExtractionSucceeded -> Archived
///                                                                    \-> ExtractionFailed
/// ```
///
/// Every non-terminal state may also move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Discovered,
    OcrRunning,
    OcrSucceeded,
    OcrFailed,
    ManualOcrRunning,
    ManualOcrSucceeded,
    ManualOcrFailed,
    ExtractionRunning,
    ExtractionSucceeded,
    ExtractionFailed,
    Archived,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Archived | JobState::Failed)
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }

        matches!(
            (self, next),
            (Discovered, OcrRunning)
                | (OcrRunning, OcrSucceeded)
                | (OcrRunning, OcrFailed)
                | (OcrFailed, ManualOcrRunning)
                | (ManualOcrRunning, ManualOcrSucceeded)
                | (ManualOcrRunning, ManualOcrFailed)
                | (OcrSucceeded, ExtractionRunning)
                | (ManualOcrSucceeded, ExtractionRunning)
                | (ExtractionRunning, ExtractionSucceeded)
                | (ExtractionRunning, ExtractionFailed)
                | (ExtractionSucceeded, Archived)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Discovered => "discovered",
            JobState::OcrRunning => "ocr_running",
            JobState::OcrSucceeded => "ocr_succeeded",
            JobState::OcrFailed => "ocr_failed",
            JobState::ManualOcrRunning => "manual_ocr_running",
            JobState::ManualOcrSucceeded => "manual_ocr_succeeded",
            JobState::ManualOcrFailed => "manual_ocr_failed",
            JobState::ExtractionRunning => "extraction_running",
            JobState::ExtractionSucceeded => "extraction_succeeded",
            JobState::ExtractionFailed => "extraction_failed",
            JobState::Archived => "archived",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One source file moving through the pipeline. Never persisted: the
/// directory that holds the file is the durable record.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub id: String,
    pub source_path: PathBuf,
    pub discovered_at: DateTime<Utc>,
    state: JobState,
    history: Vec<JobState>,
}

impl ProcessingJob {
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_path,
            discovered_at: Utc::now(),
            state: JobState::Discovered,
            history: vec![JobState::Discovered],
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state the job has been in, oldest first.
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    /// File name without extension; shared by both output artifacts.
    pub fn stem(&self) -> Option<&str> {
        self.source_path.file_stem().and_then(|s| s.to_str())
    }

    pub fn advance(
        &mut self,
        next: JobState,
        progress: &dyn ProgressReporter,
    ) -> Result<(), WorkerError> {
        if !self.state.can_transition_to(next) {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        let from = self.state;
        self.state = next;
        self.history.push(next);
        progress.report(ProgressEvent::Transition {
            job_id: self.id.clone(),
            from,
            to: next,
        });
        Ok(())
    }
}

/// Outcome of one job, handed back to the watcher.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: String,
    pub source_path: PathBuf,
    pub success: bool,
    pub final_state: JobState,
    pub history: Vec<JobState>,
    pub output_pdf: Option<PathBuf>,
    pub output_text: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
    pub strategy: Option<OcrStrategyKind>,
    pub pages: usize,
    pub error: Option<String>,
}

/// Paths of the committed artifacts of a successful job.
#[derive(Debug, Clone)]
pub struct JobArtifacts {
    pub output_pdf: PathBuf,
    pub output_text: PathBuf,
    pub archive_path: PathBuf,
    pub strategy: OcrStrategyKind,
    pub pages: usize,
}

impl JobResult {
    pub fn success(job: &ProcessingJob, artifacts: JobArtifacts) -> Self {
        Self {
            job_id: job.id.clone(),
            source_path: job.source_path.clone(),
            success: true,
            final_state: job.state(),
            history: job.history.clone(),
            output_pdf: Some(artifacts.output_pdf),
            output_text: Some(artifacts.output_text),
            archive_path: Some(artifacts.archive_path),
            strategy: Some(artifacts.strategy),
            pages: artifacts.pages,
            error: None,
        }
    }

    pub fn failure(job: &ProcessingJob, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            source_path: job.source_path.clone(),
            success: false,
            final_state: job.state(),
            history: job.history.clone(),
            output_pdf: None,
            output_text: None,
            archive_path: None,
            strategy: None,
            pages: 0,
            error: Some(error),
        }
    }

    pub fn source_name(&self) -> String {
        crate::sanitize::redact_path(&self.source_path)
    }
}
