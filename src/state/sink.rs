//! Deduplicating URL sink
//!
//! Discovered URLs are appended to a line-oriented UTF-8 file, one absolute
//! URL per line, the instant they are first seen. The membership set is
//! seeded from the existing file at startup, so re-running after an
//! interruption never re-emits URLs already on disk.

use crate::PersistenceError;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Accumulates discovered URLs, rejecting duplicates
pub struct UrlSink {
    path: PathBuf,
    seen: HashSet<String>,
    file: File,
}

impl UrlSink {
    /// Opens (or creates) the URL list at `path`.
    ///
    /// Existing lines are read into the membership set first; a missing
    /// file simply means an empty set.
    pub fn open(path: impl Into<PathBuf>) -> std::result::Result<Self, PersistenceError> {
        let path = path.into();

        let mut seen = HashSet::new();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                for line in content.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        seen.insert(line.to_string());
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: path.clone(),
                    source,
                })
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), existing = seen.len(), "opened URL sink");

        Ok(Self { path, seen, file })
    }

    /// Accepts a URL if it has not been seen before.
    ///
    /// First occurrence: the URL is durably appended (written and flushed
    /// before returning) and `true` comes back. Repeat occurrence: no I/O,
    /// `false`. A failed append is fatal because the dedup invariant can no
    /// longer be guaranteed.
    pub fn accept(&mut self, url: &str) -> std::result::Result<bool, PersistenceError> {
        if self.seen.contains(url) {
            return Ok(false);
        }

        let wrap = |source: std::io::Error| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };
        writeln!(self.file, "{}", url).map_err(wrap)?;
        self.file.flush().map_err(wrap)?;

        self.seen.insert(url.to_string());
        Ok(true)
    }

    /// Number of distinct URLs accepted so far (including seeded ones)
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
