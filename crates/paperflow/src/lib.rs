pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use config::{discover_config, load_config, Config};
pub use error::{
    ConfigError, LoggingError, PaperflowError, ProcessError, RecognitionError, Result,
    StorageError, WorkerError,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError};
pub use worker::{DocumentWatcher, JobResult, JobState, ProcessingJob};
