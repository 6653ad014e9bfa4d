//! Per-page text extraction: native layer vs. recognition.

mod common;

use tempfile::TempDir;

use common::{fake_recognizer, native_text, FakeEngine, FakeRenderer, PdfBuilder};

use paperflow::pipeline::TextExtractor;
use paperflow::processor::TextSource;

/// Represents one single-page extraction case.
struct ThresholdCase {
    name: &'static str,
    native_len: usize,
    expect_native: bool,
}

const THRESHOLD_CASES: &[ThresholdCase] = &[
    ThresholdCase {
        name: "empty_layer",
        native_len: 0,
        expect_native: false,
    },
    ThresholdCase {
        name: "stamp_only",
        native_len: 12,
        expect_native: false,
    },
    ThresholdCase {
        name: "exactly_at_threshold",
        native_len: 50,
        expect_native: false,
    },
    ThresholdCase {
        name: "one_above_threshold",
        native_len: 51,
        expect_native: true,
    },
    ThresholdCase {
        name: "full_page",
        native_len: 400,
        expect_native: true,
    },
];

#[test]
fn test_native_threshold_cases() {
    for case in THRESHOLD_CASES {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.pdf");
        let builder = if case.native_len == 0 {
            PdfBuilder::new().image_page()
        } else {
            PdfBuilder::new().text_page(&native_text(case.native_len))
        };
        std::fs::write(&path, builder.build()).unwrap();

        let engine = FakeEngine::new().page(1, "Erkannter Text");
        let recognizer = fake_recognizer(FakeRenderer::new(), engine.clone());
        let extracted = TextExtractor::default()
            .extract(&path, &recognizer)
            .unwrap_or_else(|e| panic!("[{}] extraction failed: {}", case.name, e));

        assert_eq!(extracted.page_count(), 1, "[{}]", case.name);
        let page = &extracted.pages[0];
        if case.expect_native {
            assert_eq!(page.source, TextSource::Native, "[{}]", case.name);
            assert_eq!(page.text, native_text(case.native_len), "[{}]", case.name);
            assert!(engine.calls().is_empty(), "[{}] engine was called", case.name);
        } else {
            assert_eq!(page.source, TextSource::Recognized, "[{}]", case.name);
            assert_eq!(page.text, "Erkannter Text", "[{}]", case.name);
            assert_eq!(engine.calls(), vec![1], "[{}]", case.name);
        }
    }
}

#[test]
fn test_pages_are_joined_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.pdf");
    let long = native_text(90);
    let pdf = PdfBuilder::new()
        .image_page()
        .text_page(&long)
        .text_page("Stempel")
        .build();
    std::fs::write(&path, pdf).unwrap();

    let engine = FakeEngine::new().page(1, "Anschreiben").page(3, "Anlage");
    let recognizer = fake_recognizer(FakeRenderer::new(), engine.clone());
    let extracted = TextExtractor::default().extract(&path, &recognizer).unwrap();

    assert_eq!(extracted.text(), format!("Anschreiben\n{}\nAnlage", long));
    assert_eq!(extracted.count(TextSource::Native), 1);
    assert_eq!(extracted.count(TextSource::Recognized), 2);
    assert_eq!(engine.calls(), vec![1, 3]);
}

#[test]
fn test_failed_page_contributes_empty_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("smudged.pdf");
    let pdf = PdfBuilder::new().image_page().image_page().build();
    std::fs::write(&path, pdf).unwrap();

    let engine = FakeEngine::new().failing(1).page(2, "Lesbar");
    let recognizer = fake_recognizer(FakeRenderer::new(), engine);
    let extracted = TextExtractor::default().extract(&path, &recognizer).unwrap();

    assert_eq!(extracted.pages[0].source, TextSource::Failed);
    assert_eq!(extracted.text(), "\nLesbar");
}

#[test]
fn test_configured_threshold_is_honored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.pdf");
    std::fs::write(&path, PdfBuilder::new().text_page("Kurzer Vermerk").build()).unwrap();

    let engine = FakeEngine::new().page(1, "anders");
    let recognizer = fake_recognizer(FakeRenderer::new(), engine.clone());
    let extracted = TextExtractor::new(5, false)
        .extract(&path, &recognizer)
        .unwrap();

    assert_eq!(extracted.text(), "Kurzer Vermerk");
    assert!(engine.calls().is_empty());
}

#[test]
fn test_missing_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    let recognizer = fake_recognizer(FakeRenderer::new(), FakeEngine::new());
    let result = TextExtractor::default().extract(&dir.path().join("gone.pdf"), &recognizer);
    assert!(result.is_err());
}
