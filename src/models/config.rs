//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and timing behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Content extraction and volatile-block rules
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, using defaults when the file does not exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No settings file at {:?}. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.user_agent.trim().is_empty() {
            return Err(AppError::validation("monitor.user_agent is empty"));
        }
        if self.monitor.page_timeout_secs == 0 {
            return Err(AppError::validation("monitor.page_timeout_secs must be > 0"));
        }
        if self.monitor.notify_timeout_secs == 0 {
            return Err(AppError::validation(
                "monitor.notify_timeout_secs must be > 0",
            ));
        }
        if self.extraction.default_container_id.trim().is_empty() {
            return Err(AppError::validation(
                "extraction.default_container_id is empty",
            ));
        }
        Ok(())
    }
}

/// HTTP client and timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// User-Agent header for page requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Upper bound for loading one page, in seconds
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Upper bound for one webhook delivery, in seconds
    #[serde(default = "defaults::notify_timeout")]
    pub notify_timeout_secs: u64,

    /// Render without a visible browser window
    #[serde(default = "defaults::headless")]
    pub headless: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            page_timeout_secs: defaults::page_timeout(),
            notify_timeout_secs: defaults::notify_timeout(),
            headless: defaults::headless(),
        }
    }
}

/// Where to look for content and what to throw away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Element id of the site's primary dynamic content container
    #[serde(default = "defaults::default_container_id")]
    pub default_container_id: String,

    /// Generic region selectors tried in order when the container is absent
    #[serde(default = "defaults::fallback_selectors")]
    pub fallback_selectors: Vec<String>,

    /// Case-insensitive regexes marking volatile statistics blocks
    #[serde(default = "defaults::volatile_patterns")]
    pub volatile_patterns: Vec<String>,
}

impl ExtractionConfig {
    /// CSS selector for the default container.
    pub fn default_container_selector(&self) -> String {
        format!("#{}", self.default_container_id.trim())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_container_id: defaults::default_container_id(),
            fallback_selectors: defaults::fallback_selectors(),
            volatile_patterns: defaults::volatile_patterns(),
        }
    }
}

mod defaults {
    // Monitor defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
            .into()
    }
    pub fn page_timeout() -> u64 {
        60
    }
    pub fn notify_timeout() -> u64 {
        30
    }
    pub fn headless() -> bool {
        true
    }

    // Extraction defaults
    pub fn default_container_id() -> String {
        "conteudoDinamico".into()
    }
    pub fn fallback_selectors() -> Vec<String> {
        vec![
            "#content".into(),
            "main".into(),
            ".content".into(),
            "#conteudo".into(),
            ".conteudo".into(),
        ]
    }
    pub fn volatile_patterns() -> Vec<String> {
        vec![
            r"Estatísticas da NF-e".into(),
            r"NF-?e\s+Autorizadas".into(),
            r"Número\s+de\s+Emissores".into(),
        ]
    }
}
