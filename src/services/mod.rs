//! Service layer for the monitor.
//!
//! This module contains the business logic for:
//! - Volatile-text detection (`PatternFilter`)
//! - Markup to canonical text (`ContentNormalizer`)
//! - Content digests (`fingerprint`)
//! - Page loading (`PageRenderer`, `HttpRenderer`)
//! - Alert delivery (`Notifier`, `DiscordNotifier`)

pub mod filter;
pub mod fingerprint;
pub mod normalizer;
pub mod notifier;
pub mod renderer;

pub use filter::PatternFilter;
pub use fingerprint::fingerprint;
pub use normalizer::ContentNormalizer;
pub use notifier::{DiscordNotifier, Notifier, change_message};
pub use renderer::{HttpRenderer, PageRenderer};
