//! Synthesizes a plain paginated text PDF from recognized page texts.
//!
//! This is the output of the manual OCR path: readable and searchable, but
//! not a visual facsimile of the scan.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::ProcessError;

/// A4 in PDF points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

/// Average Helvetica glyph width relative to the font size, used to wrap
/// lines without font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct TextPdfWriter {
    font_size: f32,
    line_height: f32,
    margin: f32,
}

impl Default for TextPdfWriter {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height: 14.0,
            margin: 15.0,
        }
    }
}

impl TextPdfWriter {
    pub fn new(font_size: f32, line_height: f32, margin: f32) -> Self {
        Self {
            font_size,
            line_height,
            margin,
        }
    }

    /// Characters that fit on one line.
    pub fn line_capacity(&self) -> usize {
        let usable = PAGE_WIDTH - 2.0 * self.margin;
        ((usable / (self.font_size * AVG_GLYPH_WIDTH)).floor() as usize).max(1)
    }

    /// Lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        let usable = PAGE_HEIGHT - 2.0 * self.margin;
        ((usable / self.line_height).floor() as usize).max(1)
    }

    /// Lays out each entry of `page_texts` starting on a fresh page, with
    /// word wrapping and automatic page breaks, and serializes the PDF.
    pub fn write(&self, page_texts: &[String]) -> Result<Vec<u8>, ProcessError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let lines = self.wrap(text);
            let chunks: Vec<&[String]> = if lines.is_empty() {
                vec![&[]]
            } else {
                lines.chunks(self.lines_per_page()).collect()
            };
            for chunk in chunks {
                let page_id = self.add_page(&mut doc, pages_id, resources_id, chunk)?;
                kids.push(page_id.into());
            }
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ProcessError::PdfProcessing(e.to_string()))?;
        Ok(buffer)
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        resources_id: ObjectId,
        lines: &[String],
    ) -> Result<ObjectId, ProcessError> {
        let mut operations = Vec::with_capacity(lines.len() * 5);
        let mut y = PAGE_HEIGHT - self.margin - self.font_size;
        for line in lines {
            if !line.is_empty() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec!["F1".into(), self.font_size.into()],
                ));
                operations.push(Operation::new("Td", vec![self.margin.into(), y.into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(line))],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            y -= self.line_height;
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| ProcessError::PdfProcessing(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        }))
    }

    /// Greedy word wrap. Words longer than a line are hard-split.
    pub fn wrap(&self, text: &str) -> Vec<String> {
        let capacity = self.line_capacity();
        let mut lines = Vec::new();

        for raw in text.lines() {
            let mut current = String::new();
            let mut current_len = 0usize;
            for word in raw.split_whitespace() {
                let mut word: Vec<char> = word.chars().collect();
                while word.len() > capacity {
                    if current_len > 0 {
                        lines.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    let rest = word.split_off(capacity);
                    lines.push(word.into_iter().collect());
                    word = rest;
                }
                let needed = if current_len == 0 {
                    word.len()
                } else {
                    current_len + 1 + word.len()
                };
                if needed > capacity {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current_len += word.len();
                current.extend(word);
            }
            lines.push(current);
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }
}

/// Encodes to WinAnsi. Latin-1 maps directly, the few Windows-1252
/// extras are mapped explicitly, anything else becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}
