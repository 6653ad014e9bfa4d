use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus};

use tracing::{info_span, warn};

use crate::config::Config;
use crate::error::ProcessError;
use crate::processor::pdf::Document;
use crate::processor::recognizer::Recognizer;
use crate::processor::writer::TextPdfWriter;
use crate::sanitize;
use crate::worker::job::{JobState, ProcessingJob};

use super::error::{PipelineError, PrimaryOcrFailure};
use super::progress::ProgressReporter;

/// Which strategy produced the OCR'd document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrStrategyKind {
    Primary,
    Manual,
}

impl fmt::Display for OcrStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrStrategyKind::Primary => f.write_str("primary"),
            OcrStrategyKind::Manual => f.write_str("manual"),
        }
    }
}

/// Produces an OCR-annotated copy of `source` at `output`.
///
/// `output` already exists (staged, empty) and may be overwritten freely;
/// it is only published if the whole job succeeds.
pub trait OcrStrategy {
    fn name(&self) -> &str;
    fn run(
        &self,
        source: &Path,
        output: &Path,
        recognizer: &Recognizer,
    ) -> Result<(), PipelineError>;
}

/// Whole-document OCR through the external `ocrmypdf` tool.
#[derive(Debug, Clone)]
pub struct OcrMyPdf {
    program: String,
    jobs: usize,
    optimize: u8,
    language: String,
}

impl OcrMyPdf {
    pub fn new(program: &str, jobs: usize, optimize: u8, language: &str) -> Self {
        Self {
            program: program.to_string(),
            jobs,
            optimize,
            language: language.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let language = config
            .primary
            .language
            .as_deref()
            .unwrap_or(&config.ocr.language);
        Self::new(
            &config.primary.program,
            config.primary.jobs,
            config.primary.optimize,
            language,
        )
    }

    fn command(&self, source: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--force-ocr")
            .arg("--deskew")
            .arg("--rotate-pages")
            .arg("--optimize")
            .arg(self.optimize.to_string())
            .arg("--output-type")
            .arg("pdf")
            .arg("--jobs")
            .arg(self.jobs.to_string())
            .arg("--language")
            .arg(&self.language)
            .arg(source)
            .arg(output);
        // Keeps a terminal Ctrl-C aimed at the watcher away from the child.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

impl OcrStrategy for OcrMyPdf {
    fn name(&self) -> &str {
        "ocrmypdf"
    }

    fn run(
        &self,
        source: &Path,
        output: &Path,
        _recognizer: &Recognizer,
    ) -> Result<(), PipelineError> {
        let result = self
            .command(source, output)
            .output()
            .map_err(|e| PrimaryOcrFailure::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if let Some(signal) = terminating_signal(&result.status) {
            return Err(PrimaryOcrFailure::Signaled { signal }.into());
        }
        if !result.status.success() {
            return Err(PrimaryOcrFailure::ExitStatus {
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            }
            .into());
        }

        let written = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(PrimaryOcrFailure::MissingOutput(output.to_path_buf()).into());
        }
        Ok(())
    }
}

/// Per-page fallback: render, preprocess, recognize, correct, then lay the
/// texts out as a plain paginated PDF.
#[derive(Debug, Default, Clone)]
pub struct ManualPageOcr {
    writer: TextPdfWriter,
}

impl ManualPageOcr {
    pub fn new(writer: TextPdfWriter) -> Self {
        Self { writer }
    }
}

impl OcrStrategy for ManualPageOcr {
    fn name(&self) -> &str {
        "manual"
    }

    fn run(
        &self,
        source: &Path,
        output: &Path,
        recognizer: &Recognizer,
    ) -> Result<(), PipelineError> {
        let document = Document::open(source, recognizer.renderer()).map_err(manual(None))?;
        if document.page_count() == 0 {
            return Err(manual(None)(ProcessError::PdfProcessing(
                "Document has no pages".to_string(),
            )));
        }

        let mut texts = Vec::with_capacity(document.page_count());
        for page in document.pages() {
            let recognized = recognizer
                .recognize_page(&page)
                .map_err(manual(Some(page.number())))?;
            texts.push(recognized.text);
        }

        let bytes = self.writer.write(&texts).map_err(manual(None))?;
        std::fs::write(output, bytes).map_err(|e| {
            manual(None)(ProcessError::PdfProcessing(format!(
                "Failed to write synthesized PDF: {}",
                e
            )))
        })?;

        tracing::debug!(pages = texts.len(), "Synthesized text PDF");
        Ok(())
    }
}

fn manual(page: Option<u32>) -> impl FnOnce(ProcessError) -> PipelineError {
    move |source| PipelineError::ManualOcr { page, source }
}

/// Primary strategy, then exactly one fallback attempt.
pub struct OcrPipeline {
    primary: Box<dyn OcrStrategy>,
    fallback: Box<dyn OcrStrategy>,
}

impl OcrPipeline {
    pub fn new(primary: Box<dyn OcrStrategy>, fallback: Box<dyn OcrStrategy>) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(OcrMyPdf::from_config(config)),
            Box::new(ManualPageOcr::default()),
        )
    }

    pub fn run(
        &self,
        job: &mut ProcessingJob,
        source: &Path,
        output: &Path,
        recognizer: &Recognizer,
        progress: &dyn ProgressReporter,
    ) -> Result<OcrStrategyKind, PipelineError> {
        job.advance(JobState::OcrRunning, progress)?;
        let primary = {
            let _span = info_span!("ocr.primary", strategy = self.primary.name()).entered();
            self.primary.run(source, output, recognizer)
        };

        match primary {
            Ok(()) => {
                job.advance(JobState::OcrSucceeded, progress)?;
                return Ok(OcrStrategyKind::Primary);
            }
            Err(e) if e.is_interrupted() => {
                warn!(
                    "Primary OCR for {} was interrupted: {}. Leaving the source in place.",
                    sanitize::redact_path(source),
                    e
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Primary OCR failed for {}: {}. Falling back to {} OCR.",
                    sanitize::redact_path(source),
                    e,
                    self.fallback.name()
                );
                job.advance(JobState::OcrFailed, progress)?;
            }
        }

        job.advance(JobState::ManualOcrRunning, progress)?;
        let fallback = {
            let _span = info_span!("ocr.manual", strategy = self.fallback.name()).entered();
            self.fallback.run(source, output, recognizer)
        };

        match fallback {
            Ok(()) => {
                job.advance(JobState::ManualOcrSucceeded, progress)?;
                Ok(OcrStrategyKind::Manual)
            }
            Err(e) => {
                job.advance(JobState::ManualOcrFailed, progress)?;
                Err(e)
            }
        }
    }
}
