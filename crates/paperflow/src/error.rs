use std::path::PathBuf;
use thiserror::Error;

use crate::worker::job::JobState;

#[derive(Error, Debug)]
pub enum PaperflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to render page {page}: {message}")]
    Render { page: u32, message: String },

    #[error("Recognition failed: {0}")]
    Recognition(#[from] RecognitionError),
}

/// A single recognition call failed. Callers decide whether that is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("Recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Recognition failed: {0}")]
    Failed(String),
}

/// Correction backend faults. These never leave `processor::correct`.
#[derive(Error, Debug)]
pub enum CorrectionError {
    #[error("Correction backend unavailable: {0}")]
    Unavailable(String),

    #[error("Correction request failed: {0}")]
    Request(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage file in '{directory}': {source}")]
    Stage {
        directory: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source path has no usable file name: {0}")]
    InvalidName(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Invalid job transition from {from:?} to {to:?}")]
    InvalidTransition { from: JobState, to: JobState },
}

pub type Result<T> = std::result::Result<T, PaperflowError>;
