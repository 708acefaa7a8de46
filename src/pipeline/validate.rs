// src/pipeline/validate.rs

use crate::error::Result;
use crate::pipeline::setup::{MonitorPaths, Setup};

/// Load and validate every configuration file without touching the network
/// or the snapshot.
pub fn run_validate(paths: &MonitorPaths) -> Result<Setup> {
    log::info!("Validating configuration...");

    match Setup::load(paths) {
        Ok(setup) => {
            log::info!("✓ Settings OK ({})", paths.config.display());
            log::info!("    User-Agent: {}", setup.config.monitor.user_agent);
            log::info!(
                "    Page timeout: {}s",
                setup.config.monitor.page_timeout_secs
            );
            log::info!(
                "    Volatile patterns: {}",
                setup.config.extraction.volatile_patterns.len()
            );
            log::info!(
                "✓ Registry OK: {} items ({})",
                setup.registry.len(),
                paths.registry.display()
            );
            log::info!(
                "✓ Credentials OK{}",
                if setup.credentials.mention_role_id.is_some() {
                    " (with role mention)"
                } else {
                    ""
                }
            );
            log::info!("All validations passed!");
            Ok(setup)
        }
        Err(e) => {
            log::error!("Validation failed: {}", e);
            Err(e)
        }
    }
}
