use std::path::Path;

use tracing::{info_span, warn};

use crate::config::OcrConfig;
use crate::error::ProcessError;
use crate::processor::pdf::{Document, Page};
use crate::processor::recognizer::{PageText, Recognizer, TextSource};
use crate::sanitize;

/// Placeholder the PDF text decoder emits for CID fonts it cannot map.
const IDENTITY_H_MARKER: &str = "?Identity-H Unimplemented?";

/// A native text layer is trusted when, after dropping undecodable-font
/// markers and trimming, it has strictly more than `min_chars` characters.
pub fn is_native_text_usable(text: &str, min_chars: usize) -> bool {
    clean_native_text(text).chars().count() > min_chars
}

fn clean_native_text(text: &str) -> String {
    text.replace(IDENTITY_H_MARKER, "").trim().to_string()
}

/// Best-available plain text of a document, page by page.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub pages: Vec<PageText>,
}

impl ExtractedText {
    /// Page texts in order, joined by a newline.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn count(&self, source: TextSource) -> usize {
        self.pages.iter().filter(|p| p.source == source).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextExtractor {
    min_native_chars: usize,
    correct_native: bool,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(50, true)
    }
}

impl TextExtractor {
    pub fn new(min_native_chars: usize, correct_native: bool) -> Self {
        Self {
            min_native_chars,
            correct_native,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.min_native_chars, config.correct_native_text)
    }

    /// Extracts every page. Only a document that cannot be opened at all
    /// is an error; a page whose recognition fails contributes empty text.
    pub fn extract(
        &self,
        path: &Path,
        recognizer: &Recognizer,
    ) -> Result<ExtractedText, ProcessError> {
        let _span = info_span!("extract", file = %sanitize::redact_path(path)).entered();

        let document = Document::open(path, recognizer.renderer())?;
        let pages: Vec<PageText> = document
            .pages()
            .map(|page| self.extract_page(&page, recognizer))
            .collect();

        let extracted = ExtractedText { pages };
        tracing::info!(
            pages = extracted.page_count(),
            native = extracted.count(TextSource::Native),
            recognized = extracted.count(TextSource::Recognized),
            failed = extracted.count(TextSource::Failed),
            "Text extracted"
        );
        Ok(extracted)
    }

    fn extract_page(&self, page: &Page<'_>, recognizer: &Recognizer) -> PageText {
        if let Some(native) = page.native_text() {
            if is_native_text_usable(&native, self.min_native_chars) {
                let raw = clean_native_text(&native);
                let text = if self.correct_native {
                    recognizer.correct(&raw)
                } else {
                    raw.clone()
                };
                return PageText::native(page.number(), raw, text);
            }
        }

        match recognizer.recognize_page(page) {
            Ok(recognized) => recognized,
            Err(e) => {
                warn!("Page {} left empty: {}", page.number(), e);
                PageText::failed(page.number())
            }
        }
    }
}
