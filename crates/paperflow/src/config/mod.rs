pub mod loader;
pub mod schema;

pub use loader::{discover_config, load_config, load_config_from_str};
pub use schema::{
    Config, CorrectionConfig, DirectoriesConfig, LogFormat, LoggingConfig, OcrConfig,
    PreprocessConfig, PrimaryOcrConfig, WatcherConfig,
};
