use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use paperflow::config::discover_config;
use paperflow::pipeline::{LogProgress, Pipeline};
use paperflow::storage::filesystem::ensure_directory;
use paperflow::worker::DocumentWatcher;
use paperflow::{logging, PaperflowError};

fn main() -> ExitCode {
    let (config, config_path) = match discover_config() {
        Ok(found) => found,
        Err(e) => {
            eprintln!("paperflow: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("paperflow: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting paperflow v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Using config file {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    match run(&config, &shutdown) {
        Ok(()) => {
            info!("Stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &paperflow::Config, shutdown: &AtomicBool) -> Result<(), PaperflowError> {
    let pipeline = Pipeline::from_config(config);
    for directory in [
        &pipeline.config().input_directory,
        &pipeline.config().output_directory,
        &pipeline.config().processed_directory,
    ] {
        ensure_directory(directory)?;
    }

    let watcher = DocumentWatcher::new(pipeline, config.watcher.clone(), Box::new(LogProgress));
    let outcome = watcher.run(shutdown);
    watcher.pipeline().shutdown();
    outcome?;
    Ok(())
}
