//! Snapshot persistence.
//!
//! ## File Layout
//!
//! ```text
//! snapshot.json     # {"<item id>": "<sha256 hex>", ...}
//! snapshot.tmp      # transient, only while a save is in flight
//! ```

pub mod local;
pub mod snapshot;

// Re-export for convenience
pub use snapshot::{RawSnapshot, SINGLE_KEY, SnapshotStore, compare};
