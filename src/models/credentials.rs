//! Webhook credentials read from a `KEY=VALUE` text file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

const WEBHOOK_URL_KEY: &str = "DISCORD_WEBHOOK_URL";
const USERNAME_KEY: &str = "USERNAME";
const AVATAR_URL_KEY: &str = "AVATAR_URL";
const MENTION_ROLE_KEY: &str = "MENTION_ROLE_ID";

/// Where and as whom change alerts are posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookCredentials {
    /// Webhook endpoint (required)
    pub webhook_url: String,

    /// Display name override for the bot
    pub username: Option<String>,

    /// Avatar image override for the bot
    pub avatar_url: Option<String>,

    /// Role to mention at the start of every alert
    pub mention_role_id: Option<String>,
}

impl WebhookCredentials {
    /// Load credentials from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::config(format!(
                "Webhook credentials file not found: {}",
                path.display()
            )));
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parse `KEY=VALUE` lines. Blank lines, `#` comments and lines without
    /// `=` are ignored; a repeated key overrides the earlier value.
    pub fn parse(content: &str) -> Result<Self> {
        let mut pairs: HashMap<&str, &str> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                pairs.insert(key.trim(), value.trim());
            }
        }

        let lookup = |key: &str| {
            pairs
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        let webhook_url = lookup(WEBHOOK_URL_KEY)
            .ok_or_else(|| AppError::config(format!("{WEBHOOK_URL_KEY} missing from credentials")))?;

        Ok(Self {
            webhook_url,
            username: lookup(USERNAME_KEY),
            avatar_url: lookup(AVATAR_URL_KEY),
            mention_role_id: lookup(MENTION_ROLE_KEY),
        })
    }
}
