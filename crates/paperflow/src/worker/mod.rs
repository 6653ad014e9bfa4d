pub mod job;
pub mod scanner;
pub mod watcher;

pub use job::{JobArtifacts, JobResult, JobState, ProcessingJob};
pub use scanner::DirectoryScanner;
pub use watcher::{DocumentWatcher, SettlePolicy, Settled};
