//! Durable crawl state
//!
//! This module owns everything the crawler persists between runs:
//!
//! - `Checkpoint` / `CheckpointStore`: where enumeration left off
//! - `UrlSink`: the deduplicated, append-only URL list
//! - `DetailRecord` / `ResultStore`: the structured result document

mod checkpoint;
mod results;
mod sink;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use results::{DetailRecord, ResultStore};
pub use sink::UrlSink;

use crate::PersistenceError;
use std::io::Write;
use std::path::Path;

/// Writes `bytes` to `path` with write-then-rename semantics.
///
/// The content lands in a sibling `.tmp` file, is flushed and synced, then
/// renamed over the destination. A crash at any point leaves either the old
/// file or the new one, never a truncated mix.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::result::Result<(), PersistenceError> {
    let tmp_path = path.with_extension("tmp");

    let wrap = |source: std::io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::create(&tmp_path).map_err(wrap)?;
    file.write_all(bytes).map_err(wrap)?;
    file.sync_all().map_err(wrap)?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(wrap)?;
    Ok(())
}
