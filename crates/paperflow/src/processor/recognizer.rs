use tracing::info_span;

use crate::config::Config;
use crate::error::ProcessError;
use crate::processor::correct::TextCorrector;
use crate::processor::ocr::{RecognitionEngine, TesseractEngine};
use crate::processor::pdf::Page;
use crate::processor::preprocess::ImagePreprocessor;
use crate::processor::render::{PageRenderer, PdftoppmRenderer};

/// Where a page's final text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// The embedded text layer was long enough to trust.
    Native,
    /// Rendered and run through recognition.
    Recognized,
    /// Recognition failed; the page contributes empty text.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub source: TextSource,
    /// Text before correction.
    pub raw: String,
    /// Final text for the page.
    pub text: String,
}

impl PageText {
    pub fn native(number: u32, raw: String, text: String) -> Self {
        Self {
            number,
            source: TextSource::Native,
            raw,
            text,
        }
    }

    pub fn failed(number: u32) -> Self {
        Self {
            number,
            source: TextSource::Failed,
            raw: String::new(),
            text: String::new(),
        }
    }
}

/// The per-page recognition chain shared by the manual OCR fallback and
/// the extractor: render, preprocess, recognize, correct.
///
/// Owns the long-lived handles (recognition model, correction backend) so
/// they are initialized at most once per process.
pub struct Recognizer {
    renderer: Box<dyn PageRenderer>,
    preprocessor: ImagePreprocessor,
    engine: Box<dyn RecognitionEngine>,
    corrector: TextCorrector,
    language: String,
    whitelist: String,
    dpi: u32,
}

impl Recognizer {
    /// Production constructor. Checks the correction backend once.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(PdftoppmRenderer::default()),
            ImagePreprocessor::from_config(&config.preprocess),
            Box::new(TesseractEngine::from_config(&config.ocr)),
            TextCorrector::detect(&config.correction),
            &config.ocr.language,
            &config.ocr.whitelist,
            config.ocr.dpi,
        )
    }

    pub fn new(
        renderer: Box<dyn PageRenderer>,
        preprocessor: ImagePreprocessor,
        engine: Box<dyn RecognitionEngine>,
        corrector: TextCorrector,
        language: &str,
        whitelist: &str,
        dpi: u32,
    ) -> Self {
        Self {
            renderer,
            preprocessor,
            engine,
            corrector,
            language: language.to_string(),
            whitelist: whitelist.to_string(),
            dpi,
        }
    }

    pub fn renderer(&self) -> &dyn PageRenderer {
        self.renderer.as_ref()
    }

    pub fn recognize_page(&self, page: &Page<'_>) -> Result<PageText, ProcessError> {
        let _span = info_span!("page", number = page.number()).entered();

        let raster = page.raster(self.renderer.as_ref(), self.dpi)?;
        let prepared = self.preprocessor.preprocess(raster);
        let raw = self
            .engine
            .recognize(&prepared, &self.language, &self.whitelist)?;
        let text = self.corrector.correct(&raw);

        tracing::debug!(chars = text.chars().count(), "Page recognized");
        Ok(PageText {
            number: page.number(),
            source: TextSource::Recognized,
            raw,
            text,
        })
    }

    pub fn correct(&self, text: &str) -> String {
        self.corrector.correct(text)
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}
