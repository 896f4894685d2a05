//! Detail-page extraction
//!
//! Turns a rendered detail page into a `DetailRecord`. The crawl drivers
//! treat extraction as a pluggable capability behind the `Extractor` trait;
//! the shipped implementation reads a configured CSS selector table.

use crate::config::DetailSelectors;
use crate::page::PageCapability;
use crate::state::DetailRecord;
use crate::ExtractError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Pluggable page-to-record extraction capability
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Assembles a record from the page the session is currently on
    async fn extract(
        &self,
        page: &dyn PageCapability,
        url: &str,
    ) -> std::result::Result<DetailRecord, ExtractError>;
}

/// Selector-table extractor for drug detail pages
///
/// Field absence is not an error: a missing element yields the explicit
/// empty value for that field (empty string or empty list). Only a page
/// with no name heading at all is rejected, since a record without an
/// identifier is useless.
pub struct CssExtractor {
    selectors: DetailSelectors,
    element_timeout: Duration,
}

impl CssExtractor {
    pub fn new(selectors: DetailSelectors, element_timeout: Duration) -> Self {
        Self {
            selectors,
            element_timeout,
        }
    }

    /// Text of the first match, or the empty string
    async fn text_of(&self, page: &dyn PageCapability, selector: &str) -> String {
        match page.wait_for_element(selector, self.element_timeout).await {
            Ok(Some(handle)) => page.read_text(&handle),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::debug!(selector, error = %e, "element lookup failed, using empty value");
                String::new()
            }
        }
    }

    /// Non-empty texts of all matches
    async fn texts_of(&self, page: &dyn PageCapability, selector: &str) -> Vec<String> {
        match page.wait_for_all(selector, self.element_timeout).await {
            Ok(handles) => handles
                .iter()
                .map(|h| page.read_text(h))
                .filter(|t| !t.is_empty())
                .collect(),
            Err(e) => {
                tracing::debug!(selector, error = %e, "element lookup failed, using empty list");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Extractor for CssExtractor {
    async fn extract(
        &self,
        page: &dyn PageCapability,
        url: &str,
    ) -> std::result::Result<DetailRecord, ExtractError> {
        let name = self.text_of(page, &self.selectors.name).await;
        if name.is_empty() {
            return Err(ExtractError::DataFormat {
                url: url.to_string(),
                message: "detail page has no name heading".to_string(),
            });
        }

        let uses: Vec<Value> = self
            .texts_of(page, &self.selectors.uses)
            .await
            .into_iter()
            .map(|condition| json!({ "condition": condition }))
            .collect();

        // Benefit tiles come as parallel title/description lists; pair them
        // up positionally and pad the shorter side with empty strings.
        let titles = self.texts_of(page, &self.selectors.benefit_titles).await;
        let descriptions = self
            .texts_of(page, &self.selectors.benefit_descriptions)
            .await;
        let benefits: Vec<Value> = (0..titles.len().max(descriptions.len()))
            .map(|i| {
                json!({
                    "condition": titles.get(i).map(String::as_str).unwrap_or(""),
                    "description": descriptions.get(i).map(String::as_str).unwrap_or(""),
                })
            })
            .collect();

        let side_effects = json!({
            "general_info": self.text_of(page, &self.selectors.side_effects_general).await,
            "common": self.texts_of(page, &self.selectors.side_effects_common).await,
        });

        let mechanism = json!({
            "description": self.text_of(page, &self.selectors.mechanism).await,
        });

        let administration = json!({
            "instructions": self.text_of(page, &self.selectors.administration).await,
        });

        let mut attribute_groups = BTreeMap::new();
        attribute_groups.insert("uses".to_string(), Value::Array(uses));
        attribute_groups.insert("benefits".to_string(), Value::Array(benefits));
        attribute_groups.insert("side_effects".to_string(), side_effects);
        attribute_groups.insert("mechanism".to_string(), mechanism);
        attribute_groups.insert("administration".to_string(), administration);

        Ok(DetailRecord {
            identifier: name,
            attribute_groups,
            source_url: url.to_string(),
            fetched_at: Utc::now(),
        })
    }
}
