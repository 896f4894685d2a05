//! Medharvest: a resumable medicine-catalog harvester
//!
//! This crate crawls a catalog website in two independent phases: link
//! discovery (enumerating product detail-page URLs across a category/page
//! index) and detail fetching (turning each detail page into a structured
//! record). Both phases checkpoint their progress to durable files so an
//! interrupted run can be restarted without redoing completed work.

pub mod audit;
pub mod config;
pub mod crawler;
pub mod page;
pub mod retry;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for medharvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors writing or reading the durable progress files
///
/// These are fatal for the run: once a checkpoint, URL list, or result
/// document can no longer be written, progress cannot be trusted to survive
/// a crash, so the caller aborts instead of continuing blind.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a page capability backend
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timed out waiting for '{selector}'")]
    Timeout { selector: String },

    #[error("Interaction failed: {0}")]
    Interaction(String),
}

impl PageError {
    /// Whether a failed operation is worth another attempt.
    ///
    /// Network-level failures and server-side statuses (429, 5xx) are
    /// transient; client-side statuses (404 and friends) and interaction
    /// failures are terminal for the unit of work.
    pub fn is_retryable(&self) -> bool {
        match self {
            PageError::Request { .. } => true,
            PageError::Http { status, .. } => *status == 429 || *status >= 500,
            PageError::Timeout { .. } => true,
            PageError::Interaction(_) => false,
        }
    }
}

/// Errors turning a rendered page into a detail record
///
/// Always terminal for the URL in question: the page was fetched fine but
/// does not carry the structure we expect, so retrying cannot help.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Expected data missing at {url}: {message}")]
    DataFormat { url: String, message: String },
}

/// Result type alias for medharvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use page::{ElementHandle, HttpPage, PageCapability};
pub use retry::{Backoff, Disposition, RetryError, RetryPolicy};
pub use state::{Checkpoint, CheckpointStore, DetailRecord, ResultStore, UrlSink};
