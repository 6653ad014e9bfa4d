pub mod config;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use error::{PipelineError, PrimaryOcrFailure};
pub use extract::{is_native_text_usable, ExtractedText, TextExtractor};
pub use ocr::{ManualPageOcr, OcrMyPdf, OcrPipeline, OcrStrategy, OcrStrategyKind};
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::Pipeline;
