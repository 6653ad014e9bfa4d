pub mod correct;
pub mod ocr;
pub mod pdf;
pub mod preprocess;
pub mod recognizer;
pub mod render;
pub mod writer;

pub use correct::{CorrectionBackend, LanguageToolClient, TextCorrector};
pub use ocr::{RecognitionEngine, TesseractEngine};
pub use pdf::{Document, Page};
pub use preprocess::ImagePreprocessor;
pub use recognizer::{PageText, Recognizer, TextSource};
pub use render::{PageRenderer, PdftoppmRenderer};
pub use writer::TextPdfWriter;
