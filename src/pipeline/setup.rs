// src/pipeline/setup.rs

//! Configuration-layer loading shared by every command.
//!
//! Anything that fails here aborts the run before a single page is fetched.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{Config, Registry, WebhookCredentials};
use crate::services::ContentNormalizer;
use crate::utils::resolve_path;

pub const DEFAULT_REGISTRY_FILE: &str = "urls.json";
pub const DEFAULT_CREDENTIALS_FILE: &str = "discord.txt";
pub const DEFAULT_SNAPSHOT_FILE: &str = "snapshot.json";
pub const DEFAULT_CONFIG_FILE: &str = "monitor.toml";

/// Directory holding the running executable, or `.` when it cannot be
/// determined. Relative file paths are anchored here by default.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Locations of every file the monitor reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorPaths {
    pub registry: PathBuf,
    pub credentials: PathBuf,
    pub snapshot: PathBuf,
    pub config: PathBuf,
}

impl MonitorPaths {
    /// Default file names inside `base`.
    pub fn in_dir(base: &Path) -> Self {
        Self {
            registry: base.join(DEFAULT_REGISTRY_FILE),
            credentials: base.join(DEFAULT_CREDENTIALS_FILE),
            snapshot: base.join(DEFAULT_SNAPSHOT_FILE),
            config: base.join(DEFAULT_CONFIG_FILE),
        }
    }

    /// Anchor every relative path at `base`.
    pub fn resolved(self, base: &Path) -> Self {
        Self {
            registry: resolve_path(base, &self.registry),
            credentials: resolve_path(base, &self.credentials),
            snapshot: resolve_path(base, &self.snapshot),
            config: resolve_path(base, &self.config),
        }
    }
}

/// Validated settings, registry, credentials and compiled normalizer.
#[derive(Debug, Clone)]
pub struct Setup {
    pub config: Config,
    pub registry: Registry,
    pub credentials: WebhookCredentials,
    pub normalizer: ContentNormalizer,
}

impl Setup {
    pub fn load(paths: &MonitorPaths) -> Result<Self> {
        let config = Config::load_or_default(&paths.config)?;
        config.validate()?;
        let normalizer = ContentNormalizer::new(&config.extraction)?;

        let registry = Registry::load(&paths.registry)?;
        let credentials = WebhookCredentials::load(&paths.credentials)?;

        log::debug!(
            "Loaded {} items from {}",
            registry.len(),
            paths.registry.display()
        );

        Ok(Self {
            config,
            registry,
            credentials,
            normalizer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::fs;
    use tempfile::TempDir;

    fn write_valid_files(dir: &Path) {
        fs::write(
            dir.join(DEFAULT_REGISTRY_FILE),
            r#"{"items": [{"id": 1, "label": "A", "url": "https://a"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.join(DEFAULT_CREDENTIALS_FILE),
            "DISCORD_WEBHOOK_URL=https://hook.test\n",
        )
        .unwrap();
    }

    #[test]
    fn test_resolved_keeps_absolute_paths() {
        let paths = MonitorPaths {
            registry: PathBuf::from("urls.json"),
            credentials: PathBuf::from("/etc/discord.txt"),
            snapshot: PathBuf::from("state/snapshot.json"),
            config: PathBuf::from("monitor.toml"),
        }
        .resolved(Path::new("/srv"));

        assert_eq!(paths.registry, PathBuf::from("/srv/urls.json"));
        assert_eq!(paths.credentials, PathBuf::from("/etc/discord.txt"));
        assert_eq!(paths.snapshot, PathBuf::from("/srv/state/snapshot.json"));
    }

    #[test]
    fn test_executable_dir_exists() {
        let dir = executable_dir();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_load_with_defaults() {
        let tmp = TempDir::new().unwrap();
        write_valid_files(tmp.path());

        let setup = Setup::load(&MonitorPaths::in_dir(tmp.path())).unwrap();
        assert_eq!(setup.registry.len(), 1);
        assert_eq!(setup.credentials.webhook_url, "https://hook.test");
    }

    #[test]
    fn test_missing_credentials_abort() {
        let tmp = TempDir::new().unwrap();
        write_valid_files(tmp.path());
        fs::remove_file(tmp.path().join(DEFAULT_CREDENTIALS_FILE)).unwrap();

        let err = Setup::load(&MonitorPaths::in_dir(tmp.path())).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_bad_pattern_aborts() {
        let tmp = TempDir::new().unwrap();
        write_valid_files(tmp.path());
        fs::write(
            tmp.path().join(DEFAULT_CONFIG_FILE),
            "[extraction]\nvolatile_patterns = [\"(open\"]\n",
        )
        .unwrap();

        let err = Setup::load(&MonitorPaths::in_dir(tmp.path())).unwrap_err();
        assert!(matches!(err, AppError::Pattern { .. }));
    }
}
