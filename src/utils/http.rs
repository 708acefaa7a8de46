// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::MonitorConfig;

/// Create the client used to load monitored pages.
pub fn create_page_client(config: &MonitorConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.page_timeout_secs))
        .build()?;
    Ok(client)
}

/// Create the client used to deliver webhook alerts.
pub fn create_webhook_client(config: &MonitorConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.notify_timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_build_from_defaults() {
        let config = MonitorConfig::default();
        assert!(create_page_client(&config).is_ok());
        assert!(create_webhook_client(&config).is_ok());
    }
}
