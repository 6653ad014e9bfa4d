//! Read side of the document model: pages, native text layers, rasters.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::ProcessError;
use crate::processor::render::PageRenderer;

/// A PDF on disk and its ordered pages.
///
/// When the object structure cannot be parsed the document is still usable:
/// the page count comes from the renderer and no page has a text layer.
pub struct Document {
    path: PathBuf,
    inner: Option<lopdf::Document>,
    page_numbers: Vec<u32>,
}

impl Document {
    pub fn open(path: &Path, renderer: &dyn PageRenderer) -> Result<Self, ProcessError> {
        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        match lopdf::Document::load_mem(&bytes) {
            Ok(doc) => {
                let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                Ok(Self {
                    path: path.to_path_buf(),
                    inner: Some(doc),
                    page_numbers,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "Could not parse PDF structure of {}: {}. Using renderer page count.",
                    crate::sanitize::redact_path(path),
                    e
                );
                let count = renderer.page_count(path).map_err(|count_err| {
                    ProcessError::PdfProcessing(format!(
                        "Failed to load PDF: {}; page count unavailable: {}",
                        e, count_err
                    ))
                })?;
                let count = u32::try_from(count).map_err(|_| {
                    ProcessError::PdfProcessing(format!("Implausible page count {}", count))
                })?;
                Ok(Self {
                    path: path.to_path_buf(),
                    inner: None,
                    page_numbers: (1..=count).collect(),
                })
            }
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    /// False when the page list came from the renderer instead of the PDF.
    pub fn has_structure(&self) -> bool {
        self.inner.is_some()
    }

    pub fn pages(&self) -> impl Iterator<Item = Page<'_>> + '_ {
        self.page_numbers.iter().map(move |&number| Page {
            document: self,
            number,
            raster: OnceCell::new(),
        })
    }
}

/// One page of a [`Document`]. The raster is rendered on first request.
pub struct Page<'a> {
    document: &'a Document,
    number: u32,
    raster: OnceCell<DynamicImage>,
}

impl<'a> Page<'a> {
    /// 1-based page number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The embedded text layer, if the page has one that decodes.
    pub fn native_text(&self) -> Option<String> {
        let doc = self.document.inner.as_ref()?;
        match doc.extract_text(&[self.number]) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(page = self.number, "No usable text layer: {}", e);
                None
            }
        }
    }

    pub fn raster(
        &self,
        renderer: &dyn PageRenderer,
        dpi: u32,
    ) -> Result<&DynamicImage, ProcessError> {
        if let Some(image) = self.raster.get() {
            return Ok(image);
        }
        let image = renderer.render(&self.document.path, self.number, dpi)?;
        Ok(self.raster.get_or_init(|| image))
    }
}
