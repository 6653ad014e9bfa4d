use std::path::PathBuf;

use thiserror::Error;

use crate::error::{ProcessError, StorageError, WorkerError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Primary OCR failed: {0}")]
    PrimaryOcr(#[from] PrimaryOcrFailure),

    #[error("Manual OCR failed{}: {source}", page_suffix(.page))]
    ManualOcr {
        page: Option<u32>,
        #[source]
        source: ProcessError,
    },

    #[error("Text extraction failed: {0}")]
    Extraction(#[source] ProcessError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Archival failed: {0}")]
    Archive(#[source] StorageError),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error(transparent)]
    Transition(#[from] WorkerError),
}

impl PipelineError {
    /// The primary tool was killed from outside rather than failing on the
    /// document, so there is nothing to fall back from.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            PipelineError::PrimaryOcr(PrimaryOcrFailure::Signaled { .. })
        )
    }
}

/// Why the external whole-document OCR run was rejected.
#[derive(Error, Debug)]
pub enum PrimaryOcrFailure {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Exited with {}: {stderr}", describe_exit(.code))]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("Terminated by signal {signal}")]
    Signaled { signal: i32 },

    #[error("No usable output at '{0}'")]
    MissingOutput(PathBuf),
}

fn page_suffix(page: &Option<u32>) -> String {
    page.map(|p| format!(" on page {}", p)).unwrap_or_default()
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}
