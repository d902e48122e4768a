//! Content registry: cumulative per-item publication state
//!
//! Not part of the coordination core. Publishing merges each ledger entry
//! into the row for its content item.

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{json_file, ledger::LedgerEntry, Error, Result};

fn default_kind() -> String {
    "post".to_string()
}

/// One content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub author: String,
    /// Channels in first-published order, no duplicates
    #[serde(default)]
    pub channels_published: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub published_at: String,
    /// Fields written by other tools, preserved on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegistryEntry {
    /// A new row for the first publication of an item
    #[must_use]
    pub fn from_publication(entry: &LedgerEntry) -> Self {
        let at = timestamp(entry);
        Self {
            id: entry.content_id.clone(),
            title: entry.title.clone(),
            kind: default_kind(),
            status: entry.status.clone(),
            author: entry.author.clone(),
            channels_published: vec![entry.channel.clone()],
            created_at: at.clone(),
            published_at: at,
            extra: Map::new(),
        }
    }

    /// Fold a later publication into this row
    pub fn merge_publication(&mut self, entry: &LedgerEntry) {
        self.status.clone_from(&entry.status);
        if !self.channels_published.contains(&entry.channel) {
            self.channels_published.push(entry.channel.clone());
        }
        self.published_at = timestamp(entry);
    }
}

fn timestamp(entry: &LedgerEntry) -> String {
    entry
        .published_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read/merge access to the registry
pub trait Registry {
    fn entries(&self) -> Result<Vec<RegistryEntry>>;

    /// Create or update the row for `entry.content_id`, returning the result
    fn record_publication(&self, entry: &LedgerEntry) -> Result<RegistryEntry>;
}

impl<R: Registry + ?Sized> Registry for Box<R> {
    fn entries(&self) -> Result<Vec<RegistryEntry>> {
        (**self).entries()
    }

    fn record_publication(&self, entry: &LedgerEntry) -> Result<RegistryEntry> {
        (**self).record_publication(entry)
    }
}

impl<R: Registry + ?Sized> Registry for std::sync::Arc<R> {
    fn entries(&self) -> Result<Vec<RegistryEntry>> {
        (**self).entries()
    }

    fn record_publication(&self, entry: &LedgerEntry) -> Result<RegistryEntry> {
        (**self).record_publication(entry)
    }
}

/// Registry stored as a JSON array in `registry.json`
#[derive(Debug, Clone)]
pub struct JsonRegistry {
    path: PathBuf,
}

impl JsonRegistry {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry at `<editorial_dir>/registry.json`
    #[must_use]
    pub fn in_editorial_dir(editorial_dir: &Path) -> Self {
        Self::new(editorial_dir.join("registry.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Registry for JsonRegistry {
    fn entries(&self) -> Result<Vec<RegistryEntry>> {
        let rows = match json_file::read_rows(&self.path) {
            Ok(rows) => rows,
            Err(Error::Parse(e)) => {
                tracing::warn!("Ignoring unreadable registry: {e}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect())
    }

    fn record_publication(&self, entry: &LedgerEntry) -> Result<RegistryEntry> {
        let mut rows = json_file::read_rows(&self.path).map_err(|e| match e {
            Error::Parse(msg) => Error::Parse(format!("refusing to overwrite registry: {msg}")),
            other => other,
        })?;

        let existing = rows.iter().position(|row| {
            row.get("id").and_then(Value::as_str) == Some(entry.content_id.as_str())
        });

        let parsed = existing.and_then(|idx| {
            serde_json::from_value::<RegistryEntry>(rows[idx].clone())
                .ok()
                .map(|row| (idx, row))
        });

        let merged = match parsed {
            Some((idx, mut row)) => {
                row.merge_publication(entry);
                rows[idx] = serde_json::to_value(&row)?;
                row
            }
            None => {
                let row = RegistryEntry::from_publication(entry);
                rows.push(serde_json::to_value(&row)?);
                row
            }
        };

        json_file::write_pretty(&self.path, &rows)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{Duration, Utc};

    use super::*;

    fn publication(channel: &str, minutes_ago: i64) -> LedgerEntry {
        LedgerEntry::published(
            "post-1",
            "Hello",
            channel,
            "alice",
            "https://example.com/p1",
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    #[test]
    fn test_first_publication_creates_row() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let registry = JsonRegistry::in_editorial_dir(dir.path());

        let row = registry.record_publication(&publication("twitter", 0))?;

        assert_eq!(row.id, "post-1");
        assert_eq!(row.kind, "post");
        assert_eq!(row.status, "published");
        assert_eq!(row.channels_published, vec!["twitter"]);
        assert_eq!(row.created_at, row.published_at);
        assert_eq!(registry.entries()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_later_publication_merges_channels_in_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let registry = JsonRegistry::in_editorial_dir(dir.path());

        let first = registry.record_publication(&publication("twitter", 30))?;
        registry.record_publication(&publication("mastodon", 20))?;
        let last = registry.record_publication(&publication("twitter", 10))?;

        assert_eq!(last.channels_published, vec!["twitter", "mastodon"]);
        assert_eq!(last.created_at, first.created_at);
        assert_ne!(last.published_at, first.published_at);
        assert_eq!(registry.entries()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_merge_keeps_foreign_fields_and_status_update() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let registry = JsonRegistry::in_editorial_dir(dir.path());
        fs::write(
            registry.path(),
            r#"[{"id":"post-1","title":"Draft","type":"thread","status":"draft","tags":["rust"]}]"#,
        )?;

        let row = registry.record_publication(&publication("blog", 0))?;

        assert_eq!(row.status, "published");
        assert_eq!(row.kind, "thread");
        assert_eq!(row.title, "Draft");
        assert_eq!(row.channels_published, vec!["blog"]);
        let raw = fs::read_to_string(registry.path())?;
        assert!(raw.contains("\"tags\""));
        Ok(())
    }
}
