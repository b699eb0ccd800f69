//! Batch conversion module
//!
//! Discovers capture archives under an input root and converts every
//! archive × strategy × exposure key on a bounded worker pool.

mod config;
mod discovery;
mod report;
mod scheduler;


pub use config::{BatchConfig, BatchConfigBuilder};
pub use discovery::{ArchiveEntry, discover_archives};
pub use report::BatchReport;
pub use scheduler::{ArchiveJob, BatchScheduler, BatchState, InterruptHandle};
