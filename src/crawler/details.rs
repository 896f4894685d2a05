//! Detail fetch driver
//!
//! Works through the discovered URL list sequentially, fetching each detail
//! page, extracting a record, and appending it to the result store. Resume
//! is implicit: any URL whose record is already in the store is skipped, so
//! the URL list itself needs no cursor. Per-URL failures are logged and
//! skipped; only persistence failures abort the run.

use crate::audit::EventLog;
use crate::config::Config;
use crate::crawler::Extractor;
use crate::page::PageCapability;
use crate::retry::{Backoff, Disposition, RetryPolicy};
use crate::state::ResultStore;
use crate::{PageError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Drives the detail phase over a page session and an extractor
pub struct DetailFetchDriver<P: PageCapability, X: Extractor> {
    page: P,
    extractor: X,
    store: ResultStore,
    audit: EventLog,
    retry: RetryPolicy,
    pace: Backoff,
    shutdown: Arc<AtomicBool>,
}

impl<P: PageCapability, X: Extractor> DetailFetchDriver<P, X> {
    pub fn new(
        config: &Config,
        page: P,
        extractor: X,
        store: ResultStore,
        audit: EventLog,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        // Detail retries and the between-request pause are both jittered so
        // the request pattern does not look mechanical to the target site.
        let retry = RetryPolicy::new(
            config.fetch.max_attempts,
            Backoff::Jittered {
                min: config.fetch.retry_backoff_min(),
                max: config.fetch.retry_backoff_max(),
            },
        );
        let pace = Backoff::Jittered {
            min: config.fetch.page_delay_min(),
            max: config.fetch.page_delay_max(),
        };

        Self {
            page,
            extractor,
            store,
            audit,
            retry,
            pace,
            shutdown,
        }
    }

    /// Processes every URL in `urls` that is not already in the result store
    pub async fn run(&mut self, urls: &[String]) -> Result<()> {
        let done = self.store.source_urls();
        tracing::info!(
            total = urls.len(),
            already_fetched = done.len(),
            "starting detail fetch"
        );

        for (position, url) in urls.iter().enumerate() {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!(
                    processed = position,
                    total = urls.len(),
                    "detail fetch interrupted, progress saved"
                );
                self.audit.log_error(
                    "USER_INTERRUPT",
                    &format!("interrupted after {} of {} URLs", position, urls.len()),
                    None,
                    None,
                )?;
                return Ok(());
            }

            if done.contains(url) {
                tracing::debug!(url = %url, "record already present, skipping");
                continue;
            }

            self.fetch_one(url).await?;
            tokio::time::sleep(self.pace.delay(1)).await;
        }

        tracing::info!(records = self.store.len(), "detail fetch complete");
        Ok(())
    }

    /// Fetches and extracts one URL. Page and data failures are recorded
    /// and swallowed; the returned error is persistence only.
    async fn fetch_one(&mut self, url: &str) -> Result<()> {
        let page = &self.page;
        let target = url.to_string();

        let navigated = self
            .retry
            .run(
                move || {
                    let target = target.clone();
                    async move { page.navigate(&target).await }
                },
                |e: &PageError| {
                    if e.is_retryable() {
                        Disposition::Retryable
                    } else {
                        Disposition::Terminal
                    }
                },
            )
            .await;

        if let Err(err) = navigated {
            tracing::error!(
                url = %url,
                attempts = err.attempts,
                error = %err.last,
                "giving up on detail page"
            );
            self.audit.log_error(
                "NETWORK_ERROR",
                &err.last.to_string(),
                Some(url),
                Some(err.attempts),
            )?;
            return Ok(());
        }

        match self.extractor.extract(&self.page, url).await {
            Ok(record) => {
                tracing::info!(url = %url, identifier = %record.identifier, "record extracted");
                self.store.append(record)?;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "extraction failed, skipping URL");
                self.audit.log_error("DATA_ERROR", &e.to_string(), Some(url), None)?;
            }
        }

        Ok(())
    }
}
