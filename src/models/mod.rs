// src/models/mod.rs

//! Domain models for the monitor.
//!
//! Items to watch, webhook credentials and tunable settings.

mod config;
mod credentials;
mod item;

// Re-export all public types
pub use config::{Config, ExtractionConfig, MonitorConfig};
pub use credentials::WebhookCredentials;
pub use item::{ItemId, MonitoredItem, Registry};
