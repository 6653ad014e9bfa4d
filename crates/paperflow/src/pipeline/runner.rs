use std::path::Path;
use std::sync::Arc;

use tempfile::TempPath;
use tracing::{debug, info_span};

use crate::config::Config;
use crate::processor::recognizer::Recognizer;
use crate::sanitize;
use crate::storage::FileStorage;
use crate::worker::job::{JobArtifacts, JobResult, JobState, ProcessingJob};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::extract::{ExtractedText, TextExtractor};
use super::ocr::OcrPipeline;
use super::progress::{ProgressEvent, ProgressReporter};

/// Drives one source file from `input/` to archived, or leaves it in place.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    storage: FileStorage,
    recognizer: Recognizer,
    ocr: OcrPipeline,
    extractor: TextExtractor,
}

impl Pipeline {
    /// Production constructor: builds all sub-components from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(PipelineConfig::from_config(config)),
            Recognizer::from_config(config),
            OcrPipeline::from_config(config),
            TextExtractor::from_config(&config.ocr),
        )
    }

    /// Inject specific sub-components.
    pub fn new(
        config: Arc<PipelineConfig>,
        recognizer: Recognizer,
        ocr: OcrPipeline,
        extractor: TextExtractor,
    ) -> Self {
        let storage = FileStorage::new(&config.output_directory, &config.processed_directory);
        Self {
            config,
            storage,
            recognizer,
            ocr,
            extractor,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for a single document. Never panics on a bad
    /// document: every failure ends in a `Failed` job with the source left
    /// where it was.
    pub fn run(&self, mut job: ProcessingJob, progress: &dyn ProgressReporter) -> JobResult {
        let filename = sanitize::redact_path(&job.source_path);
        let _pipeline_span = info_span!("pipeline",
            job_id = %job.id,
            filename = %filename,
        )
        .entered();

        match self.execute(&mut job, progress) {
            Ok(artifacts) => {
                progress.report(ProgressEvent::Completed {
                    output_pdf: artifacts.output_pdf.display().to_string(),
                    output_text: artifacts.output_text.display().to_string(),
                    archive_path: artifacts.archive_path.display().to_string(),
                    strategy: artifacts.strategy,
                    pages: artifacts.pages,
                });
                JobResult::success(&job, artifacts)
            }
            Err(e) => {
                let err_msg = e.to_string();
                if !job.state().is_terminal() {
                    if let Err(transition) = job.advance(JobState::Failed, progress) {
                        debug!("Could not mark job failed: {}", transition);
                    }
                }
                progress.report(ProgressEvent::Failed {
                    error: err_msg.clone(),
                });
                JobResult::failure(&job, err_msg)
            }
        }
    }

    fn execute(
        &self,
        job: &mut ProcessingJob,
        progress: &dyn ProgressReporter,
    ) -> Result<JobArtifacts, PipelineError> {
        let source = job.source_path.clone();
        let stem = job
            .stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PipelineError::InvalidSource(format!("No usable file name: {}", source.display()))
            })?
            .to_string();
        if !source.is_file() {
            return Err(PipelineError::InvalidSource(format!(
                "Not a file: {}",
                sanitize::redact_path(&source)
            )));
        }

        // Step 1: OCR into a staged file
        let staged_pdf = self.storage.stage(&stem, "pdf")?;
        let strategy = self
            .ocr
            .run(job, &source, &staged_pdf, &self.recognizer, progress)?;

        // Step 2: Extract text from the OCR'd document and stage the sidecar
        job.advance(JobState::ExtractionRunning, progress)?;
        let (extracted, staged_text) = match self.extract(&stem, &staged_pdf) {
            Ok(staged) => staged,
            Err(e) => {
                job.advance(JobState::ExtractionFailed, progress)?;
                return Err(e);
            }
        };
        job.advance(JobState::ExtractionSucceeded, progress)?;

        // Step 3: Publish both artifacts
        let output_pdf = self.storage.commit(staged_pdf, &stem, "pdf")?;
        let output_text = self
            .storage
            .commit(staged_text, &stem, "txt")
            .inspect_err(|_| remove_orphan(&output_pdf))?;

        // Step 4: Archive source
        let archive_path = self.storage.archive(&source).map_err(PipelineError::Archive)?;
        job.advance(JobState::Archived, progress)?;

        debug!(
            "Archived {} -> {}",
            sanitize::redact_path(&source),
            sanitize::redact_path(&archive_path)
        );

        Ok(JobArtifacts {
            output_pdf,
            output_text,
            archive_path,
            strategy,
            pages: extracted.page_count(),
        })
    }

    fn extract(
        &self,
        stem: &str,
        ocr_output: &Path,
    ) -> Result<(ExtractedText, TempPath), PipelineError> {
        let extracted = self
            .extractor
            .extract(ocr_output, &self.recognizer)
            .map_err(PipelineError::Extraction)?;
        let staged_text = self
            .storage
            .stage_bytes(stem, "txt", extracted.text().as_bytes())?;
        Ok((extracted, staged_text))
    }

    /// Releases the recognition model.
    pub fn shutdown(&self) {
        self.recognizer.shutdown();
    }
}

/// A PDF whose sidecar could not be published would break the one
/// pdf + one txt pairing, so it is taken back.
fn remove_orphan(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            "Could not remove {} after failed commit: {}",
            sanitize::redact_path(path),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProcessError, RecognitionError};
    use crate::pipeline::ocr::{ManualPageOcr, OcrStrategy, OcrStrategyKind};
    use crate::pipeline::progress::NoopProgress;
    use crate::processor::correct::TextCorrector;
    use crate::processor::ocr::RecognitionEngine;
    use crate::processor::preprocess::ImagePreprocessor;
    use crate::processor::render::PageRenderer;
    use image::{DynamicImage, GrayImage};
    use tempfile::TempDir;

    struct OnePageRenderer;

    impl PageRenderer for OnePageRenderer {
        fn render(&self, _path: &Path, _page: u32, _dpi: u32) -> Result<DynamicImage, ProcessError> {
            Ok(DynamicImage::ImageLuma8(GrayImage::new(4, 4)))
        }

        fn page_count(&self, _path: &Path) -> Result<usize, ProcessError> {
            Ok(1)
        }
    }

    struct FixedEngine(Result<String, RecognitionError>);

    impl RecognitionEngine for FixedEngine {
        fn recognize(
            &self,
            _image: &GrayImage,
            _language: &str,
            _whitelist: &str,
        ) -> Result<String, RecognitionError> {
            self.0.clone()
        }
    }

    struct AlwaysFails;

    impl OcrStrategy for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        fn run(&self, _s: &Path, _o: &Path, _r: &Recognizer) -> Result<(), PipelineError> {
            Err(PipelineError::InvalidSource("simulated".to_string()))
        }
    }

    fn setup() -> (TempDir, Arc<PipelineConfig>) {
        let tmp = TempDir::new().unwrap();
        let config = PipelineConfig::under(tmp.path());
        std::fs::create_dir_all(&config.input_directory).unwrap();
        (tmp, Arc::new(config))
    }

    fn pipeline(config: Arc<PipelineConfig>, engine: FixedEngine) -> Pipeline {
        let recognizer = Recognizer::new(
            Box::new(OnePageRenderer),
            ImagePreprocessor::default(),
            Box::new(engine),
            TextCorrector::passthrough(),
            "deu",
            "abc",
            300,
        );
        Pipeline::new(
            config,
            recognizer,
            OcrPipeline::new(Box::new(AlwaysFails), Box::new(ManualPageOcr::default())),
            TextExtractor::default(),
        )
    }

    fn drop_scan(config: &PipelineConfig, name: &str) -> std::path::PathBuf {
        let path = config.input_directory.join(name);
        std::fs::write(&path, b"%PDF-1.4 scanned image only").unwrap();
        path
    }

    #[test]
    fn test_full_pipeline_via_fallback() {
        let (_tmp, config) = setup();
        let source = drop_scan(&config, "brief.pdf");
        let pipeline = pipeline(config.clone(), FixedEngine(Ok("Hallo Welt".to_string())));

        let result = pipeline.run(ProcessingJob::new(source.clone()), &NoopProgress);

        assert!(result.success, "Pipeline failed: {:?}", result.error);
        assert_eq!(result.final_state, JobState::Archived);
        assert_eq!(result.strategy, Some(OcrStrategyKind::Manual));
        assert!(!source.exists());
        assert!(config.processed_directory.join("brief.pdf").exists());
        assert!(config.output_directory.join("brief.pdf").exists());
        assert_eq!(
            std::fs::read_to_string(config.output_directory.join("brief.txt")).unwrap(),
            "Hallo Welt"
        );
    }

    #[test]
    fn test_fallback_failure_leaves_source_and_no_artifacts() {
        let (_tmp, config) = setup();
        let source = drop_scan(&config, "brief.pdf");
        let pipeline = pipeline(
            config.clone(),
            FixedEngine(Err(RecognitionError::EngineUnavailable("none".into()))),
        );

        let result = pipeline.run(ProcessingJob::new(source.clone()), &NoopProgress);

        assert!(!result.success);
        assert_eq!(result.final_state, JobState::Failed);
        assert!(result.history.contains(&JobState::ManualOcrFailed));
        assert!(source.exists());
        let leftovers: Vec<_> = std::fs::read_dir(&config.output_directory)
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_missing_source_is_invalid() {
        let (_tmp, config) = setup();
        let pipeline = pipeline(config.clone(), FixedEngine(Ok(String::new())));
        let result = pipeline.run(
            ProcessingJob::new(config.input_directory.join("gone.pdf")),
            &NoopProgress,
        );
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Not a file"));
        assert_eq!(result.final_state, JobState::Failed);
    }
}
