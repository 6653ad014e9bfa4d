use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;

use crate::error::ProcessError;

/// Rasterizes single PDF pages.
pub trait PageRenderer {
    /// Renders 1-based `page` of the PDF at `path`.
    fn render(&self, path: &Path, page: u32, dpi: u32) -> Result<DynamicImage, ProcessError>;

    /// Page count for PDFs whose object structure cannot be parsed.
    fn page_count(&self, path: &Path) -> Result<usize, ProcessError>;
}

/// Renders with poppler-utils (`pdftoppm`, `pdfinfo`).
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    pdftoppm: PathBuf,
    pdfinfo: PathBuf,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new("pdftoppm", "pdfinfo")
    }
}

impl PdftoppmRenderer {
    pub fn new(pdftoppm: impl Into<PathBuf>, pdfinfo: impl Into<PathBuf>) -> Self {
        Self {
            pdftoppm: pdftoppm.into(),
            pdfinfo: pdfinfo.into(),
        }
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render(&self, path: &Path, page: u32, dpi: u32) -> Result<DynamicImage, ProcessError> {
        let _span = tracing::debug_span!("render", page, dpi).entered();

        // Removed with everything pdftoppm wrote into it, on every return path.
        let scratch = tempfile::Builder::new()
            .prefix("paperflow-render")
            .tempdir()
            .map_err(|e| ProcessError::Render {
                page,
                message: format!("Failed to create scratch directory: {}", e),
            })?;
        let output_prefix = scratch.path().join("page");
        let page_arg = page.to_string();

        let output = Command::new(&self.pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg("-singlefile")
            .arg(path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| ProcessError::Render {
                page,
                message: format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ),
            })?;

        if !output.status.success() {
            return Err(ProcessError::Render {
                page,
                message: format!(
                    "pdftoppm failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        image::open(output_prefix.with_extension("png")).map_err(|e| ProcessError::Render {
            page,
            message: format!("Failed to read rendered image: {}", e),
        })
    }

    fn page_count(&self, path: &Path) -> Result<usize, ProcessError> {
        let output = Command::new(&self.pdfinfo)
            .arg(path)
            .output()
            .map_err(|e| {
                ProcessError::PdfProcessing(format!(
                    "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::PdfProcessing(format!(
                "pdfinfo failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_page_count(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ProcessError::PdfProcessing("pdfinfo reported no page count".to_string())
        })
    }
}

fn parse_page_count(pdfinfo_stdout: &str) -> Option<usize> {
    pdfinfo_stdout
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse().ok())
}
