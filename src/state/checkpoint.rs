//! Enumeration checkpoint persistence
//!
//! The checkpoint is the minimal state needed to resume link discovery
//! without redoing completed work: which category the crawler is on and
//! which page within it. It always points at work that has not yet been
//! confirmed complete; it is written only after a page's URLs are durably
//! in the sink.

use crate::state::write_atomic;
use crate::PersistenceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The next unit of enumeration work to attempt
///
/// `category_index` 0 is the implicit default index view; indices past the
/// last category mean the whole space is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub category_index: usize,
    pub page_number: u32,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            category_index: 0,
            page_number: 1,
        }
    }
}

/// Loads and saves the enumeration checkpoint as a small JSON file
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the last saved checkpoint.
    ///
    /// A missing file means a first run and yields the zero-value
    /// checkpoint. An unreadable or corrupt file is logged and also yields
    /// the zero-value checkpoint; the crawl restarts from scratch rather
    /// than failing to start at all.
    pub fn load(&self) -> Checkpoint {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no checkpoint found, starting fresh");
                return Checkpoint::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read checkpoint, starting fresh");
                return Checkpoint::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(cp) => cp,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt checkpoint, starting fresh");
                Checkpoint::default()
            }
        }
    }

    /// Durably saves the checkpoint.
    ///
    /// On successful return a subsequent `load` in a new process observes
    /// this value even if the current process dies immediately after.
    pub fn save(&self, checkpoint: &Checkpoint) -> std::result::Result<(), PersistenceError> {
        let bytes =
            serde_json::to_vec(checkpoint).map_err(|source| PersistenceError::Serialize {
                what: "checkpoint",
                source,
            })?;
        write_atomic(&self.path, &bytes)
    }

    /// Deletes any saved checkpoint (used by fresh runs)
    pub fn reset(&self) -> std::result::Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
