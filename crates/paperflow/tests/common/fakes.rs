//! Stand-ins for the external tools, so the suite runs without
//! pdftoppm, Tesseract or ocrmypdf installed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage, Luma};

use paperflow::error::{ProcessError, RecognitionError};
use paperflow::pipeline::{
    OcrStrategy, PipelineError, PrimaryOcrFailure, ProgressEvent, ProgressReporter,
};
use paperflow::processor::{PageRenderer, Recognizer};
use paperflow::JobState;

/// Width offset that encodes the page number into rendered images.
const PAGE_WIDTH_BASE: u32 = 100;

/// Renders page `n` as a white image `100 + n` pixels wide, so the fake
/// engine can tell pages apart after preprocessing.
pub struct FakeRenderer {
    page_count: Option<usize>,
}

impl FakeRenderer {
    /// Page count unknown: only documents lopdf can parse are usable.
    pub fn new() -> Self {
        Self { page_count: None }
    }

    /// Reports `count` pages for documents lopdf cannot parse.
    pub fn with_page_count(count: usize) -> Self {
        Self {
            page_count: Some(count),
        }
    }
}

impl PageRenderer for FakeRenderer {
    fn render(&self, _path: &Path, page: u32, _dpi: u32) -> Result<DynamicImage, ProcessError> {
        Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            PAGE_WIDTH_BASE + page,
            20,
            Luma([255]),
        )))
    }

    fn page_count(&self, _path: &Path) -> Result<usize, ProcessError> {
        self.page_count.ok_or_else(|| {
            ProcessError::PdfProcessing("pdfinfo could not read the document".to_string())
        })
    }
}

#[derive(Clone)]
enum PageScript {
    Text(Result<String, RecognitionError>),
    Panic,
}

/// Returns scripted text per page and records which pages it saw.
/// Pages without a script recognize as empty text.
#[derive(Clone, Default)]
pub struct FakeEngine {
    pages: HashMap<u32, PageScript>,
    calls: Arc<Mutex<Vec<u32>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, number: u32, text: &str) -> Self {
        self.pages
            .insert(number, PageScript::Text(Ok(text.to_string())));
        self
    }

    pub fn failing(mut self, number: u32) -> Self {
        self.pages.insert(
            number,
            PageScript::Text(Err(RecognitionError::Failed(format!(
                "page {} unreadable",
                number
            )))),
        );
        self
    }

    /// Panics on page `number`, like a crash inside the native library.
    pub fn panicking(mut self, number: u32) -> Self {
        self.pages.insert(number, PageScript::Panic);
        self
    }

    /// Pages recognized so far, in call order.
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl paperflow::processor::RecognitionEngine for FakeEngine {
    fn recognize(
        &self,
        image: &GrayImage,
        _language: &str,
        _whitelist: &str,
    ) -> Result<String, RecognitionError> {
        let page = image.width() - PAGE_WIDTH_BASE;
        self.calls.lock().unwrap().push(page);
        match self.pages.get(&page) {
            Some(PageScript::Text(result)) => result.clone(),
            Some(PageScript::Panic) => panic!("recognition engine crashed on page {}", page),
            None => Ok(String::new()),
        }
    }
}

/// Primary OCR that "succeeds" by copying the source unchanged.
pub struct CopyingPrimary;

impl OcrStrategy for CopyingPrimary {
    fn name(&self) -> &str {
        "copy"
    }

    fn run(&self, source: &Path, output: &Path, _r: &Recognizer) -> Result<(), PipelineError> {
        std::fs::copy(source, output).map_err(|e| PrimaryOcrFailure::Spawn {
            program: "copy".to_string(),
            source: e,
        })?;
        Ok(())
    }
}

/// Primary OCR that exits non-zero after leaving a partial file behind.
pub struct FailingPrimary;

impl OcrStrategy for FailingPrimary {
    fn name(&self) -> &str {
        "failing"
    }

    fn run(&self, _source: &Path, output: &Path, _r: &Recognizer) -> Result<(), PipelineError> {
        std::fs::write(output, b"%PDF-1.5 truncated").map_err(|e| PrimaryOcrFailure::Spawn {
            program: "failing".to_string(),
            source: e,
        })?;
        Err(PrimaryOcrFailure::ExitStatus {
            code: Some(2),
            stderr: "simulated crash".to_string(),
        }
        .into())
    }
}

/// Collects every progress event.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Target states of all reported transitions.
    pub fn transitions(&self) -> Vec<JobState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Transition { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
