//! Completion ledger: append-only record of publications
//!
//! The ledger is authoritative for "is this (content, channel) done". The
//! coordinator only reads it and appends to it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{json_file, Error, Result};

/// Status recorded on every ledger entry
pub const PUBLISHED_STATUS: &str = "published";

/// One successful publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub content_id: String,
    pub title: String,
    pub channel: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub status: String,
}

impl LedgerEntry {
    #[must_use]
    pub fn published(
        content_id: impl Into<String>,
        title: impl Into<String>,
        channel: impl Into<String>,
        author: impl Into<String>,
        url: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            title: title.into(),
            channel: channel.into(),
            author: author.into(),
            published_at,
            url: url.into(),
            status: PUBLISHED_STATUS.to_string(),
        }
    }
}

/// Read/append access to the ledger
pub trait Ledger {
    /// All readable entries in recorded order
    fn entries(&self) -> Result<Vec<LedgerEntry>>;

    fn append(&self, entry: &LedgerEntry) -> Result<()>;
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        (**self).entries()
    }

    fn append(&self, entry: &LedgerEntry) -> Result<()> {
        (**self).append(entry)
    }
}

impl<L: Ledger + ?Sized> Ledger for std::sync::Arc<L> {
    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        (**self).entries()
    }

    fn append(&self, entry: &LedgerEntry) -> Result<()> {
        (**self).append(entry)
    }
}

/// The completion entry for (`content_id`, `channel`), if any
#[must_use]
pub fn find_completion<'a>(
    entries: &'a [LedgerEntry],
    content_id: &str,
    channel: &str,
) -> Option<&'a LedgerEntry> {
    entries
        .iter()
        .find(|e| e.content_id == content_id && e.channel == channel)
}

/// Entries published less than `window` before `now`, newest first
#[must_use]
pub fn recent(entries: &[LedgerEntry], now: DateTime<Utc>, window: Duration) -> Vec<LedgerEntry> {
    let mut recent: Vec<LedgerEntry> = entries
        .iter()
        .filter(|e| now - e.published_at < window)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    recent
}

/// Ledger stored as a JSON array in `ledger.json`
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger at `<editorial_dir>/ledger.json`
    #[must_use]
    pub fn in_editorial_dir(editorial_dir: &Path) -> Self {
        Self::new(editorial_dir.join("ledger.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Ledger for JsonLedger {
    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let rows = match json_file::read_rows(&self.path) {
            Ok(rows) => rows,
            Err(Error::Parse(e)) => {
                tracing::warn!("Ignoring unreadable ledger: {e}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<LedgerEntry>(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("Skipping malformed ledger entry: {e}");
                    None
                }
            })
            .collect())
    }

    fn append(&self, entry: &LedgerEntry) -> Result<()> {
        // Rows that do not parse as entries are kept verbatim
        let mut rows = json_file::read_rows(&self.path).map_err(|e| match e {
            Error::Parse(msg) => Error::Parse(format!("refusing to overwrite ledger: {msg}")),
            other => other,
        })?;
        rows.push(serde_json::to_value(entry)?);
        json_file::write_pretty(&self.path, &rows)
    }
}
