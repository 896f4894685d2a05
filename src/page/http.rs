//! HTTP-backed page capability
//!
//! Implements the page interface with a plain HTTP client and an HTML
//! parser: `navigate` fetches the page body, element queries run CSS
//! selectors over the stored body, and `click` follows the control's href.
//! There is no real waiting since the document is fully available after the
//! fetch, so the element timeouts are accepted and ignored.

use crate::config::UserAgentConfig;
use crate::page::{ElementHandle, PageCapability};
use crate::PageError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

#[derive(Default)]
struct SessionState {
    current_url: String,
    body: String,
}

/// A single HTTP page session
pub struct HttpPage {
    client: Client,
    state: Mutex<SessionState>,
}

impl HttpPage {
    /// Builds a session with the configured user agent and request timeout
    pub fn new(
        user_agent: &UserAgentConfig,
        request_timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, request_timeout)?;
        Ok(Self {
            client,
            state: Mutex::new(SessionState::default()),
        })
    }

    fn body(&self) -> String {
        self.state.lock().unwrap().body.clone()
    }
}

/// Builds an HTTP client with proper identification
///
/// User agent format: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn build_http_client(
    config: &UserAgentConfig,
    request_timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Runs a CSS selector over an HTML body and snapshots every match
fn select_handles(
    body: &str,
    selector: &str,
) -> std::result::Result<Vec<ElementHandle>, PageError> {
    let parsed = Selector::parse(selector).map_err(|e| {
        PageError::Interaction(format!("invalid selector '{}': {}", selector, e))
    })?;

    let document = Html::parse_document(body);
    let mut handles = Vec::new();
    for element in document.select(&parsed) {
        let text = element.text().collect::<String>().trim().to_string();
        let attributes: HashMap<String, String> = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        handles.push(ElementHandle {
            selector: selector.to_string(),
            text,
            attributes,
        });
    }
    Ok(handles)
}

#[async_trait]
impl PageCapability for HttpPage {
    async fn navigate(&self, url: &str) -> std::result::Result<(), PageError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| PageError::Request {
                    url: url.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // URL after any redirects, so pagination identity checks see the
        // effective page.
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|source| PageError::Request {
            url: url.to_string(),
            source,
        })?;

        let mut state = self.state.lock().unwrap();
        state.current_url = final_url;
        state.body = body;
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> std::result::Result<Option<ElementHandle>, PageError> {
        let handles = select_handles(&self.body(), selector)?;
        Ok(handles.into_iter().next())
    }

    async fn wait_for_all(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> std::result::Result<Vec<ElementHandle>, PageError> {
        select_handles(&self.body(), selector)
    }

    async fn click(&self, handle: &ElementHandle) -> std::result::Result<(), PageError> {
        let href = handle.attribute("href").ok_or_else(|| {
            PageError::Interaction(format!("control '{}' has no href", handle.selector))
        })?;

        let base = self.current_url();
        let target = Url::parse(&base)
            .and_then(|b| b.join(href))
            .map_err(|e| PageError::Interaction(format!("cannot resolve href '{}': {}", href, e)))?;

        self.navigate(target.as_str()).await
    }

    fn current_url(&self) -> String {
        self.state.lock().unwrap().current_url.clone()
    }
}
