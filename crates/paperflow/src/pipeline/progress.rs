use crate::pipeline::ocr::OcrStrategyKind;
use crate::worker::job::JobState;

/// Events emitted while a job moves through the pipeline.
/// Extracted text is never part of an event (can be large).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Transition {
        job_id: String,
        from: JobState,
        to: JobState,
    },
    Completed {
        output_pdf: String,
        output_text: String,
        archive_path: String,
        strategy: OcrStrategyKind,
        pages: usize,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes every event as a structured log line.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Transition { job_id, from, to } => {
                tracing::debug!(job_id = %job_id, from = %from, to = %to, "Job state changed");
            }
            ProgressEvent::Completed {
                output_pdf,
                output_text,
                archive_path,
                strategy,
                pages,
            } => {
                tracing::info!(
                    strategy = %strategy,
                    pages,
                    "Document processed: {} + {}, source archived as {}",
                    output_pdf,
                    output_text,
                    archive_path
                );
            }
            ProgressEvent::Failed { error } => {
                tracing::warn!("Document processing failed: {}", error);
            }
        }
    }
}
