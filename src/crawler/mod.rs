//! Crawl phases
//!
//! The harvest runs as two independent phases sharing the durable state
//! files. `run_discovery` enumerates the catalog and fills the URL list;
//! `run_details` works through that list and fills the result document.
//! Either phase can be interrupted and re-run; completed work is never
//! redone.

mod details;
mod enumerate;
mod extract;

pub use details::DetailFetchDriver;
pub use enumerate::EnumerationDriver;
pub use extract::{CssExtractor, Extractor};

use crate::audit::EventLog;
use crate::config::Config;
use crate::page::HttpPage;
use crate::state::{CheckpointStore, ResultStore, UrlSink};
use crate::{PersistenceError, Result};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Runs the link discovery phase to completion (or interruption).
///
/// With `fresh` set, any saved checkpoint and URL list are removed first so
/// the enumeration starts from the beginning of the catalog.
pub async fn run_discovery(config: Config, fresh: bool, shutdown: Arc<AtomicBool>) -> Result<()> {
    let checkpoint = CheckpointStore::new(&config.output.checkpoint_path);

    if fresh {
        checkpoint.reset()?;
        match std::fs::remove_file(&config.output.links_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PersistenceError::Write {
                    path: config.output.links_path.clone().into(),
                    source,
                }
                .into())
            }
        }
        tracing::info!("fresh run requested, cleared checkpoint and URL list");
    }

    let page = HttpPage::new(&config.user_agent, config.fetch.request_timeout())?;
    let sink = UrlSink::open(&config.output.links_path)?;
    let audit = EventLog::open(&config.output.audit_log_path)?;

    let mut driver = EnumerationDriver::new(&config, page, sink, checkpoint, audit, shutdown);
    driver.run().await
}

/// Runs the detail fetch phase over the previously discovered URL list.
pub async fn run_details(config: Config, shutdown: Arc<AtomicBool>) -> Result<()> {
    let urls = read_url_list(Path::new(&config.output.links_path))?;
    if urls.is_empty() {
        tracing::warn!(
            path = %config.output.links_path,
            "no discovered URLs; run the discovery phase first"
        );
        return Ok(());
    }

    let page = HttpPage::new(&config.user_agent, config.fetch.request_timeout())?;
    let extractor = CssExtractor::new(config.selectors.detail.clone(), config.fetch.element_timeout());
    let store = ResultStore::open(&config.output.results_path)?;
    let audit = EventLog::open(&config.output.audit_log_path)?;

    let mut driver = DetailFetchDriver::new(&config, page, extractor, store, audit, shutdown);
    driver.run(&urls).await
}

/// Reads the discovered URL list, one URL per line. A missing file is an
/// empty list.
fn read_url_list(path: &Path) -> Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()),
    }
}
