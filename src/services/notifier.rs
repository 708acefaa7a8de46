//! Change alerts delivered to a webhook.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{MonitorConfig, MonitoredItem, WebhookCredentials};
use crate::utils::http;

/// Delivers a message to whoever is watching.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Alert text for a changed item.
pub fn change_message(item: &MonitoredItem) -> String {
    format!("Change detected on **{}**:\n{}", item.label, item.url)
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
}

/// Discord-style webhook notifier.
pub struct DiscordNotifier {
    client: Client,
    credentials: WebhookCredentials,
}

impl DiscordNotifier {
    pub fn new(credentials: WebhookCredentials, config: &MonitorConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_webhook_client(config)?,
            credentials,
        })
    }

    /// Prefix the configured role mention, if any.
    fn compose(&self, message: &str) -> String {
        match &self.credentials.mention_role_id {
            Some(role) => format!("<@&{role}> {message}"),
            None => message.to_string(),
        }
    }

    fn payload<'a>(&'a self, content: &'a str) -> WebhookPayload<'a> {
        WebhookPayload {
            content,
            username: self.credentials.username.as_deref(),
            avatar_url: self.credentials.avatar_url.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let content = self.compose(message);
        let response = self
            .client
            .post(&self.credentials.webhook_url)
            .json(&self.payload(&content))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notify {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(role: Option<&str>) -> WebhookCredentials {
        WebhookCredentials {
            webhook_url: "https://discord.test/api/webhooks/1/abc".into(),
            username: Some("Watcher".into()),
            avatar_url: None,
            mention_role_id: role.map(str::to_string),
        }
    }

    #[test]
    fn test_change_message() {
        let item = MonitoredItem {
            id: 3,
            label: "Portal".into(),
            url: "https://example.com".into(),
            selector: None,
        };
        assert_eq!(
            change_message(&item),
            "Change detected on **Portal**:\nhttps://example.com"
        );
    }

    #[test]
    fn test_compose_with_and_without_mention() {
        let config = MonitorConfig::default();
        let plain = DiscordNotifier::new(credentials(None), &config).unwrap();
        assert_eq!(plain.compose("hi"), "hi");

        let mention = DiscordNotifier::new(credentials(Some("42")), &config).unwrap();
        assert_eq!(mention.compose("hi"), "<@&42> hi");
    }

    #[test]
    fn test_payload_skips_absent_fields() {
        let notifier = DiscordNotifier::new(credentials(None), &MonitorConfig::default()).unwrap();
        let json = serde_json::to_value(notifier.payload("changed")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": "changed", "username": "Watcher"})
        );
    }
}
