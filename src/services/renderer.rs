//! Page rendering sessions.
//!
//! A session turns a URL into markup. It is a single stateful resource
//! (think one browser tab), so it is borrowed mutably and driven one page
//! at a time.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::MonitorConfig;
use crate::utils::http;

/// Produces raw markup for a page.
#[async_trait]
pub trait PageRenderer: Send {
    /// Load `url` and return its markup.
    ///
    /// `selector` names the region the caller is about to extract, so a
    /// live-DOM session can wait for it before returning.
    async fn render(&mut self, url: &str, selector: Option<&str>) -> Result<String>;

    /// Release the session.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Renderer backed by a plain HTTP GET. Scripts are not executed.
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Create a renderer with the configured user agent and page timeout.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        if !config.headless {
            log::warn!("Visible rendering requested; static fetches have no window, ignoring");
        }
        Ok(Self {
            client: http::create_page_client(config)?,
        })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&mut self, url: &str, selector: Option<&str>) -> Result<String> {
        if let Some(selector) = selector {
            log::debug!("Static fetch of {url}; not waiting for '{selector}'");
        }
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
