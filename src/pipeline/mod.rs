//! Pipeline entry points for monitor operations.
//!
//! - `run_monitor`: Render every item, fingerprint it and alert on change
//! - `run_validate`: Check settings, registry and credentials
//! - `run_info`: Show what the snapshot holds per item

pub mod batch;
pub mod info;
pub mod report;
pub mod setup;
pub mod validate;

pub use batch::{BatchSummary, Monitor, RunOptions, run_monitor};
pub use info::{SnapshotInfo, run_info};
pub use report::{BatchReporter, LogReporter};
pub use setup::{MonitorPaths, Setup};
pub use validate::run_validate;
