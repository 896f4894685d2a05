//! Structured result document
//!
//! Detail records accumulate in an ordered, append-only sequence that is
//! rewritten in full to a single JSON document after every append. The
//! rewrite is O(n) per record (O(n^2) for a run), which is an accepted
//! tradeoff at catalog scale in exchange for a document that is complete
//! and well-formed at every instant.

use crate::state::write_atomic;
use crate::PersistenceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// One extracted detail page
///
/// Attribute groups are opaque to the crawl core; their shape is the
/// extractor's contract. Missing fields take explicit empty values (empty
/// string, empty array) rather than being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    /// Primary identifier of the item (the product name)
    pub identifier: String,

    /// Group name to group-specific structured content
    #[serde(default)]
    pub attribute_groups: BTreeMap<String, serde_json::Value>,

    /// The detail page this record was extracted from
    pub source_url: String,

    /// When the record was fetched
    pub fetched_at: DateTime<Utc>,
}

/// On-disk shape of the result document
#[derive(Debug, Default, Serialize, Deserialize)]
struct ResultDocument {
    drugs: Vec<DetailRecord>,
}

/// Append-only result set persisted as one JSON document
pub struct ResultStore {
    path: PathBuf,
    records: Vec<DetailRecord>,
}

impl ResultStore {
    /// Opens the result document at `path`, loading any existing records.
    ///
    /// A missing file starts an empty set. A file that exists but cannot be
    /// parsed is an error: rewriting over it would silently discard data.
    pub fn open(path: impl Into<PathBuf>) -> std::result::Result<Self, PersistenceError> {
        let path = path.into();

        let records = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let document: ResultDocument = serde_json::from_str(&content).map_err(
                    |source| PersistenceError::Deserialize {
                        path: path.clone(),
                        source,
                    },
                )?;
                document.drugs
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        tracing::debug!(path = %path.display(), existing = records.len(), "opened result store");

        Ok(Self { path, records })
    }

    /// Appends a record and rewrites the full document durably.
    pub fn append(&mut self, record: DetailRecord) -> std::result::Result<(), PersistenceError> {
        self.records.push(record);
        self.persist()
    }

    /// Source URLs of every record currently held, for skip-on-resume.
    pub fn source_urls(&self) -> HashSet<String> {
        self.records
            .iter()
            .map(|r| r.source_url.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DetailRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> std::result::Result<(), PersistenceError> {
        let document = ResultDocument {
            drugs: self.records.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document).map_err(|source| {
            PersistenceError::Serialize {
                what: "result document",
                source,
            }
        })?;
        write_atomic(&self.path, &bytes)
    }
}
