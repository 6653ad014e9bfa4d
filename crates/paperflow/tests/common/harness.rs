//! Test harness for isolated pipeline runs.
//!
//! The `TestHarness` struct owns a temporary directory laid out like a
//! production deployment (`input/`, `output/`, `processed/`) and builds
//! pipelines whose external tools are replaced by fakes.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use paperflow::config::schema::DEFAULT_WHITELIST;
use paperflow::pipeline::{
    ManualPageOcr, OcrPipeline, OcrStrategy, Pipeline, PipelineConfig, TextExtractor,
};
use paperflow::processor::{ImagePreprocessor, PageRenderer, Recognizer, TextCorrector};

use super::fakes::{FakeEngine, FakeRenderer};

/// Builds a recognizer around fakes with the default preprocessing.
pub fn fake_recognizer(renderer: impl PageRenderer + 'static, engine: FakeEngine) -> Recognizer {
    Recognizer::new(
        Box::new(renderer),
        ImagePreprocessor::default(),
        Box::new(engine),
        TextCorrector::passthrough(),
        "deu",
        DEFAULT_WHITELIST,
        300,
    )
}

/// Test harness providing an isolated directory layout for integration tests.
pub struct TestHarness {
    /// Keeps the temporary tree alive for the lifetime of the harness.
    temp_dir: TempDir,
    pub config: Arc<PipelineConfig>,
}

impl TestHarness {
    /// Creates the directory layout with an empty `input/`. `output/` and
    /// `processed/` are left for the pipeline to create.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = PipelineConfig::under(temp_dir.path());
        std::fs::create_dir_all(&config.input_directory).expect("Failed to create input dir");
        Self {
            temp_dir,
            config: Arc::new(config),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A pipeline with the given primary strategy, the real manual fallback
    /// and fakes underneath.
    pub fn pipeline(&self, primary: Box<dyn OcrStrategy>, engine: FakeEngine) -> Pipeline {
        self.pipeline_with_renderer(primary, FakeRenderer::new(), engine)
    }

    pub fn pipeline_with_renderer(
        &self,
        primary: Box<dyn OcrStrategy>,
        renderer: FakeRenderer,
        engine: FakeEngine,
    ) -> Pipeline {
        Pipeline::new(
            Arc::clone(&self.config),
            fake_recognizer(renderer, engine),
            OcrPipeline::new(primary, Box::new(ManualPageOcr::default())),
            TextExtractor::default(),
        )
    }

    /// Places a document into `input/` as a scanner would.
    pub fn drop_document(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.config.input_directory.join(name);
        std::fs::write(&path, content).expect("Failed to write input document");
        path
    }

    pub fn input_entries(&self) -> Vec<String> {
        entries(&self.config.input_directory)
    }

    pub fn output_entries(&self) -> Vec<String> {
        entries(&self.config.output_directory)
    }

    pub fn processed_entries(&self) -> Vec<String> {
        entries(&self.config.processed_directory)
    }

    pub fn output_text(&self, stem: &str) -> String {
        let path = self.config.output_directory.join(format!("{}.txt", stem));
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }
}

/// Sorted file names in `dir`; empty when the directory does not exist.
fn entries(dir: &Path) -> Vec<String> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read_dir
        .map(|e| {
            e.expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .to_string()
        })
        .collect();
    names.sort();
    names
}
