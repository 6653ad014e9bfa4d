use std::path::PathBuf;

use crate::config::Config;

/// Directory layout the pipeline works in.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub processed_directory: PathBuf,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_directory: PathBuf::from(&config.directories.input),
            output_directory: PathBuf::from(&config.directories.output),
            processed_directory: PathBuf::from(&config.directories.processed),
        }
    }

    /// All three directories below `root`, named as in the default layout.
    pub fn under(root: &std::path::Path) -> Self {
        Self {
            input_directory: root.join("input"),
            output_directory: root.join("output"),
            processed_directory: root.join("processed"),
        }
    }
}
