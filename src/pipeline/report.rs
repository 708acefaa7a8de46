// src/pipeline/report.rs

//! Batch event reporting.
//!
//! The orchestrator never logs directly; it hands every per-item outcome to
//! a [`BatchReporter`]. The CLI uses [`LogReporter`], tests record events.

use crate::error::AppError;
use crate::models::MonitoredItem;
use crate::pipeline::batch::BatchSummary;

/// Sink for batch events.
pub trait BatchReporter: Send + Sync {
    /// Fingerprint matched the stored one.
    fn unchanged(&self, item: &MonitoredItem);

    /// Fingerprint differed or was missing; the snapshot has been updated.
    fn changed(&self, item: &MonitoredItem);

    /// Rendering or normalization failed; the item was skipped.
    fn failed(&self, item: &MonitoredItem, error: &AppError);

    /// The change alert could not be delivered.
    fn notify_failed(&self, item: &MonitoredItem, error: &AppError);

    /// Legacy URL keys were folded into item ids while loading.
    fn migrated(&self, keys: usize);

    /// The batch finished and the snapshot was saved.
    fn finished(&self, summary: &BatchSummary);
}

/// Reporter writing through the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct LogReporter {
    quiet_ok: bool,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress `[OK]` lines for unchanged items.
    pub fn quiet_ok() -> Self {
        Self { quiet_ok: true }
    }
}

impl BatchReporter for LogReporter {
    fn unchanged(&self, item: &MonitoredItem) {
        if !self.quiet_ok {
            log::info!("[OK] No changes: {} - {}", item.id, item.label);
        }
    }

    fn changed(&self, item: &MonitoredItem) {
        log::info!("[CHANGED] {} - {} - {}", item.id, item.label, item.url);
    }

    fn failed(&self, item: &MonitoredItem, error: &AppError) {
        log::error!("[ERROR] {} - {} → {}", item.id, item.label, error);
    }

    fn notify_failed(&self, item: &MonitoredItem, error: &AppError) {
        log::error!(
            "[ERROR] {} - {} → alert not delivered: {}",
            item.id,
            item.label,
            error
        );
    }

    fn migrated(&self, keys: usize) {
        log::info!("Legacy URL-keyed snapshot migrated to item ids ({keys} keys)");
    }

    fn finished(&self, summary: &BatchSummary) {
        if summary.changed == 0 {
            log::info!("No relevant change detected on any item.");
        }
        log::info!(
            "[SUMMARY] {} items: {} changed, {} unchanged, {} failed, {} undelivered alerts",
            summary.total,
            summary.changed,
            summary.unchanged,
            summary.failed,
            summary.notify_failures
        );
    }
}
