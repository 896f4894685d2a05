//! Append-only audit log
//!
//! Every completed page and every per-unit error lands in a plain-text log
//! file, one line per event, for post-hoc inspection of a run. This is
//! separate from the tracing output: it survives redirection and restarts
//! and records exactly the state transitions an operator needs to audit a
//! crawl after the fact.

use crate::PersistenceError;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Writes timestamped state and error lines to an append-only file
pub struct EventLog {
    path: PathBuf,
    file: File,
}

impl EventLog {
    pub fn open(path: impl Into<PathBuf>) -> std::result::Result<Self, PersistenceError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    /// Records a completed enumeration page: `STATE: <category>,<page> - URLs found: N`
    pub fn log_state(
        &mut self,
        category: &str,
        page: u32,
        urls_found: usize,
    ) -> std::result::Result<(), PersistenceError> {
        let line = format!(
            "[{}] STATE: {},{} - URLs found: {}",
            Self::timestamp(),
            category,
            page,
            urls_found
        );
        self.append(&line)
    }

    /// Records a per-unit error with enough context to diagnose it later
    pub fn log_error(
        &mut self,
        kind: &str,
        message: &str,
        url: Option<&str>,
        retry_attempt: Option<u32>,
    ) -> std::result::Result<(), PersistenceError> {
        let mut line = format!("[{}] {}: ", Self::timestamp(), kind);
        if let Some(url) = url {
            line.push_str(&format!("URL: {} - ", url));
        }
        line.push_str(message);
        if let Some(attempt) = retry_attempt {
            line.push_str(&format!(" (Retry attempt: {})", attempt));
        }
        self.append(&line)
    }

    fn append(&mut self, line: &str) -> std::result::Result<(), PersistenceError> {
        let wrap = |source: std::io::Error| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };
        writeln!(self.file, "{}", line).map_err(wrap)?;
        self.file.flush().map_err(wrap)
    }

    fn timestamp() -> String {
        Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn state_lines_carry_category_page_and_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("harvest.log");
        let mut log = EventLog::open(&path).unwrap();

        log.log_state("B", 3, 40).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("STATE: B,3 - URLs found: 40"));
    }

    #[test]
    fn error_lines_carry_url_and_attempt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("harvest.log");
        let mut log = EventLog::open(&path).unwrap();

        log.log_error("NETWORK_ERROR", "connection reset", Some("http://x/a"), Some(2))
            .unwrap();
        log.log_error("USER_INTERRUPT", "stopped by operator", None, None)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("NETWORK_ERROR: URL: http://x/a - connection reset (Retry attempt: 2)"));
        assert!(content.contains("USER_INTERRUPT: stopped by operator"));
    }

    #[test]
    fn reopening_appends_rather_than_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("harvest.log");

        EventLog::open(&path).unwrap().log_state("A", 1, 10).unwrap();
        EventLog::open(&path).unwrap().log_state("A", 2, 12).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
