// src/pipeline/batch.rs

//! Batch orchestration.
//!
//! One pass over the registry: render, normalize, fingerprint, compare,
//! update the snapshot and alert on change. Items are processed one at a
//! time over a single render session. A failing item is reported and
//! skipped; the snapshot is written once, after every item was attempted.

use std::path::Path;

use crate::error::Result;
use crate::models::{MonitoredItem, Registry};
use crate::pipeline::report::{BatchReporter, LogReporter};
use crate::pipeline::setup::{MonitorPaths, Setup};
use crate::services::{
    ContentNormalizer, DiscordNotifier, HttpRenderer, Notifier, PageRenderer, change_message,
    fingerprint,
};
use crate::storage::{SnapshotStore, compare};

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub notify_failures: usize,
    pub migrated_keys: usize,
}

enum ItemOutcome {
    Unchanged,
    Changed { delivery: Result<()> },
}

/// Runs batches over a registry.
pub struct Monitor<'a> {
    registry: &'a Registry,
    normalizer: &'a ContentNormalizer,
    notifier: &'a dyn Notifier,
    reporter: &'a dyn BatchReporter,
}

impl<'a> Monitor<'a> {
    pub fn new(
        registry: &'a Registry,
        normalizer: &'a ContentNormalizer,
        notifier: &'a dyn Notifier,
        reporter: &'a dyn BatchReporter,
    ) -> Self {
        Self {
            registry,
            normalizer,
            notifier,
            reporter,
        }
    }

    /// Run one batch and close `renderer` afterwards, whatever the outcome.
    pub async fn run(
        &self,
        renderer: &mut dyn PageRenderer,
        snapshot_path: &Path,
    ) -> Result<BatchSummary> {
        let result = self.run_items(renderer, snapshot_path).await;
        if let Err(e) = renderer.close().await {
            log::warn!("Failed to close render session: {}", e);
        }
        result
    }

    async fn run_items(
        &self,
        renderer: &mut dyn PageRenderer,
        snapshot_path: &Path,
    ) -> Result<BatchSummary> {
        let mut store = SnapshotStore::load(snapshot_path, self.registry).await;
        let mut summary = BatchSummary {
            total: self.registry.len(),
            migrated_keys: store.migrated_keys(),
            ..BatchSummary::default()
        };
        if summary.migrated_keys > 0 {
            self.reporter.migrated(summary.migrated_keys);
        }

        for item in self.registry {
            match self.process_item(item, renderer, &mut store).await {
                Ok(ItemOutcome::Unchanged) => {
                    summary.unchanged += 1;
                    self.reporter.unchanged(item);
                }
                Ok(ItemOutcome::Changed { delivery }) => {
                    summary.changed += 1;
                    self.reporter.changed(item);
                    if let Err(e) = delivery {
                        summary.notify_failures += 1;
                        self.reporter.notify_failed(item, &e);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    self.reporter.failed(item, &e);
                }
            }
        }

        store.save(snapshot_path).await?;
        self.reporter.finished(&summary);
        Ok(summary)
    }

    async fn process_item(
        &self,
        item: &MonitoredItem,
        renderer: &mut dyn PageRenderer,
        store: &mut SnapshotStore,
    ) -> Result<ItemOutcome> {
        let markup = renderer.render(&item.url, item.selector.as_deref()).await?;
        let text = self.normalizer.normalize(&markup, item)?;
        let current = fingerprint(&text);

        if !compare(store.get(item.id), &current) {
            return Ok(ItemOutcome::Unchanged);
        }

        // Record before alerting so a failed delivery is not re-reported next run.
        store.set(item.id, current);
        let delivery = self.notifier.notify(&change_message(item)).await;
        Ok(ItemOutcome::Changed { delivery })
    }
}

/// Command-line switches for one monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip `[OK]` lines for unchanged items
    pub quiet_ok: bool,
    /// Render without a visible browser window
    pub headless: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            quiet_ok: false,
            headless: true,
        }
    }
}

impl RunOptions {
    /// Fold the switches into loaded settings.
    fn apply(&self, setup: &mut Setup) {
        if !self.headless {
            setup.config.monitor.headless = false;
        }
    }
}

/// Load everything from `paths` and run one batch over HTTP.
pub async fn run_monitor(paths: &MonitorPaths, options: RunOptions) -> Result<BatchSummary> {
    let mut setup = Setup::load(paths)?;
    options.apply(&mut setup);
    log::info!("Monitoring {} items", setup.registry.len());

    let notifier = DiscordNotifier::new(setup.credentials.clone(), &setup.config.monitor)?;
    let reporter = if options.quiet_ok {
        LogReporter::quiet_ok()
    } else {
        LogReporter::new()
    };

    let mut renderer = HttpRenderer::new(&setup.config.monitor)?;
    Monitor::new(&setup.registry, &setup.normalizer, &notifier, &reporter)
        .run(&mut renderer, &paths.snapshot)
        .await
}
