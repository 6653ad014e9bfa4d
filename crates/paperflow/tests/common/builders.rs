//! Fixture PDFs built in memory with lopdf.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};

/// Builder for small PDFs with one optional line of native text per page.
pub struct PdfBuilder {
    pages: Vec<Option<String>>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// A page carrying `text` in its text layer. Avoid parentheses and
    /// backslashes, they are written unescaped.
    pub fn text_page(mut self, text: &str) -> Self {
        self.pages.push(Some(text.to_string()));
        self
    }

    /// A page with no text layer, like a raw scan.
    pub fn image_page(mut self) -> Self {
        self.pages.push(None);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in &self.pages {
            let content = match page {
                Some(text) => format!("BT /F1 10 Tf 40 760 Td ({}) Tj ET", text),
                None => String::new(),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
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

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("Failed to serialize fixture PDF");
        bytes
    }
}

/// Bytes no PDF parser accepts.
pub fn corrupt_pdf() -> Vec<u8> {
    b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\nthis is not an object table".to_vec()
}

/// Native text of exactly `len` characters, no whitespace at either end.
pub fn native_text(len: usize) -> String {
    "Rechnungsbetrag".chars().cycle().take(len).collect()
}
