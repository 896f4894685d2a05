//! Enumeration driver for link discovery
//!
//! Walks the two-dimensional (category, page) space of the catalog index,
//! feeding every product link into the dedup sink and saving a checkpoint
//! after each completed page. Category index 0 is the implicit default
//! index view; it duplicates the first category key, which is therefore
//! never walked explicitly. This offset-by-one behavior matches the target
//! site, where the index opens on the first category by default.

use crate::audit::EventLog;
use crate::config::{CatalogConfig, Config};
use crate::page::{ElementHandle, PageCapability};
use crate::retry::{Backoff, Disposition, RetryError, RetryPolicy};
use crate::state::{Checkpoint, CheckpointStore, UrlSink};
use crate::{PageError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How a category walk ended
enum CategoryOutcome {
    /// No more pages in this category
    Exhausted,

    /// Operator asked for a stop; checkpoint already points at the next
    /// unit of work
    Interrupted,
}

/// Drives the discovery phase over a page session
pub struct EnumerationDriver<P: PageCapability> {
    catalog: CatalogConfig,
    product_selector: String,
    next_selector: String,
    element_timeout: Duration,
    settle_delay: Duration,
    retry: RetryPolicy,
    page: P,
    sink: UrlSink,
    checkpoint: CheckpointStore,
    audit: EventLog,
    shutdown: Arc<AtomicBool>,
}

impl<P: PageCapability> EnumerationDriver<P> {
    pub fn new(
        config: &Config,
        page: P,
        sink: UrlSink,
        checkpoint: CheckpointStore,
        audit: EventLog,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        // Listing-page retries escalate linearly with the attempt number.
        let retry = RetryPolicy::new(
            config.fetch.max_attempts,
            Backoff::Linear {
                step: config.fetch.link_retry_step(),
            },
        );

        Self {
            catalog: config.catalog.clone(),
            product_selector: config.selectors.product_link.clone(),
            next_selector: config.selectors.next_page.clone(),
            element_timeout: config.fetch.element_timeout(),
            settle_delay: config.fetch.settle_delay(),
            retry,
            page,
            sink,
            checkpoint,
            audit,
            shutdown,
        }
    }

    /// Runs enumeration from the saved checkpoint to exhaustion.
    ///
    /// Only persistence failures abort the run; a category whose pages
    /// cannot be fetched is logged and skipped.
    pub async fn run(&mut self) -> Result<()> {
        let start = self.checkpoint.load();
        let total = self.catalog.categories.len();

        if start.category_index >= total {
            tracing::info!(urls = self.sink.len(), "enumeration already complete");
            return Ok(());
        }

        tracing::info!(
            category_index = start.category_index,
            page = start.page_number,
            total_categories = total,
            known_urls = self.sink.len(),
            "starting enumeration"
        );

        for index in start.category_index..total {
            // The checkpointed page applies only to the category the run
            // stopped in; every later category starts at page 1.
            let start_page = if index == start.category_index {
                start.page_number
            } else {
                1
            };

            match self.walk_category(index, start_page).await? {
                CategoryOutcome::Interrupted => {
                    tracing::info!("enumeration interrupted, progress saved");
                    self.audit.log_error(
                        "USER_INTERRUPT",
                        &format!("interrupted at category index {}", index),
                        None,
                        None,
                    )?;
                    return Ok(());
                }
                CategoryOutcome::Exhausted => {
                    self.checkpoint.save(&Checkpoint {
                        category_index: index + 1,
                        page_number: 1,
                    })?;
                }
            }
        }

        tracing::info!(urls = self.sink.len(), "enumeration complete");
        Ok(())
    }

    /// Walks one category from `start_page` until end-of-listing
    async fn walk_category(&mut self, index: usize, start_page: u32) -> Result<CategoryOutcome> {
        let key = self.catalog.categories[index].clone();
        let mut page_no = start_page;
        let mut unit_url = self.unit_url(index, page_no);

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Ok(CategoryOutcome::Interrupted);
            }

            let handles = match self.load_listing(&unit_url).await {
                Ok(handles) => handles,
                Err(err) => {
                    // One bad page must not stop the crawl: record it and
                    // move on to the next category.
                    tracing::error!(
                        category = %key,
                        page = page_no,
                        attempts = err.attempts,
                        error = %err.last,
                        "giving up on listing page, moving to next category"
                    );
                    self.audit.log_error(
                        "PAGE_ERROR",
                        &err.last.to_string(),
                        Some(unit_url.as_str()),
                        Some(err.attempts),
                    )?;
                    return Ok(CategoryOutcome::Exhausted);
                }
            };

            let links = self.absolutize(&handles);
            let mut accepted = 0;
            for link in &links {
                if self.sink.accept(link)? {
                    accepted += 1;
                }
            }

            self.audit.log_state(&key, page_no, links.len())?;
            tracing::info!(
                category = %key,
                page = page_no,
                urls_found = links.len(),
                accepted,
                total = self.sink.len(),
                "listing page processed"
            );

            match self.advance().await? {
                Some(next_url) => {
                    page_no += 1;
                    unit_url = next_url;
                    // Confirm the completed page before touching the next one.
                    self.checkpoint.save(&Checkpoint {
                        category_index: index,
                        page_number: page_no,
                    })?;
                    tokio::time::sleep(self.settle_delay).await;
                }
                None => return Ok(CategoryOutcome::Exhausted),
            }
        }
    }

    /// URL of one (category, page) unit
    fn unit_url(&self, index: usize, page: u32) -> String {
        if index == 0 && page == 1 {
            self.catalog.index_url.clone()
        } else {
            self.catalog.page_url(&self.catalog.categories[index], page)
        }
    }

    /// Navigates to a listing page and collects its product link handles,
    /// with bounded retries
    async fn load_listing(
        &self,
        url: &str,
    ) -> std::result::Result<Vec<ElementHandle>, RetryError<PageError>> {
        let page = &self.page;
        let selector = self.product_selector.clone();
        let timeout = self.element_timeout;
        let target = url.to_string();

        self.retry
            .run(
                move || {
                    let target = target.clone();
                    let selector = selector.clone();
                    async move {
                        page.navigate(&target).await?;
                        page.wait_for_all(&selector, timeout).await
                    }
                },
                |e: &PageError| {
                    if e.is_retryable() {
                        Disposition::Retryable
                    } else {
                        Disposition::Terminal
                    }
                },
            )
            .await
    }

    /// Resolves handle hrefs against the current page URL
    fn absolutize(&self, handles: &[ElementHandle]) -> Vec<String> {
        let base = Url::parse(&self.page.current_url()).ok();

        let mut links = Vec::new();
        for handle in handles {
            let Some(href) = self.page.read_attribute(handle, "href") else {
                continue;
            };
            match &base {
                Some(base) => match base.join(&href) {
                    Ok(resolved) => links.push(resolved.to_string()),
                    Err(e) => {
                        tracing::debug!(href = %href, error = %e, "unresolvable product href");
                    }
                },
                None => links.push(href),
            }
        }
        links
    }

    /// Tries to move to the next page of the current category.
    ///
    /// End-of-listing is a deliberate, site-specific policy with three
    /// signals: no next-page control, a control whose href carries no page
    /// marker, or a click that leaves the effective URL unchanged (broken
    /// pagination links on the last page).
    async fn advance(&self) -> Result<Option<String>> {
        let controls = match self
            .page
            .wait_for_all(&self.next_selector, self.element_timeout)
            .await
        {
            Ok(controls) => controls,
            Err(PageError::Timeout { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(control) = controls.last().cloned() else {
            return Ok(None);
        };

        let Some(href) = self.page.read_attribute(&control, "href") else {
            return Ok(None);
        };
        if !href.contains("page") {
            tracing::debug!(href = %href, "next control carries no page marker, ending category");
            return Ok(None);
        }

        let before = self.page.current_url();

        if let Err(e) = self.page.click(&control).await {
            // UI-stability workaround: controls can go stale or get covered
            // by an overlay. Re-query once and try again; this is not
            // charged against the retry budget.
            tracing::warn!(error = %e, "click on next control failed, re-querying once");
            let controls = self
                .page
                .wait_for_all(&self.next_selector, self.element_timeout)
                .await
                .unwrap_or_default();
            let Some(control) = controls.last().cloned() else {
                return Ok(None);
            };
            if let Err(e) = self.page.click(&control).await {
                tracing::warn!(error = %e, "click failed again, ending category");
                return Ok(None);
            }
        }

        if self.page.current_url() == before {
            tracing::debug!("page identity unchanged after click, ending category");
            return Ok(None);
        }

        Ok(Some(self.page.current_url()))
    }
}
