//! File-per-record lease store
//!
//! Layout:
//!
//! ```text
//! <editorial_dir>/claims/<content_id>-<agent>.claim     active
//! <editorial_dir>/claims/<content_id>-<agent>~N.claim   active, name was taken
//! <editorial_dir>/claims/archive/<...>.claim            archived
//! ```
//!
//! File names are only a hint. Records are matched by the key stored inside
//! them, so colliding names and hand-renamed files are handled correctly.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;

use super::LeaseStore;
use crate::{
    json_file,
    lease::{Lease, LeaseKey, CLAIM_EXTENSION},
    Error, Result,
};

/// Name of the archive directory inside the claims directory
pub const ARCHIVE_DIR: &str = "archive";

/// Lease store backed by one JSON file per lease
#[derive(Debug, Clone)]
pub struct FsLeaseStore {
    claims_dir: PathBuf,
}

/// A `.claim` file and its record, `None` when unreadable
struct RecordFile {
    path: PathBuf,
    lease: Option<Lease>,
}

impl RecordFile {
    fn holds(&self, key: &LeaseKey) -> bool {
        self.lease.as_ref().is_some_and(|lease| lease.key() == *key)
    }
}

impl FsLeaseStore {
    /// Store rooted at an explicit claims directory
    #[must_use]
    pub fn new(claims_dir: impl Into<PathBuf>) -> Self {
        Self {
            claims_dir: claims_dir.into(),
        }
    }

    /// Store at `<editorial_dir>/claims`
    #[must_use]
    pub fn in_editorial_dir(editorial_dir: &Path) -> Self {
        Self::new(editorial_dir.join("claims"))
    }

    #[must_use]
    pub fn claims_dir(&self) -> &Path {
        &self.claims_dir
    }

    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.claims_dir.join(ARCHIVE_DIR)
    }

    /// Every archived record, for forensic inspection
    ///
    /// # Errors
    ///
    /// Returns an error if the archive directory exists but cannot be read.
    pub fn archived(&self) -> Result<Vec<Lease>> {
        Ok(sorted(scan(&self.archive_dir())?))
    }

    /// Where the record for `key` lives or should be written.
    ///
    /// An existing record for the key is reused. Otherwise the preferred
    /// name is used unless another key's record holds it, in which case the
    /// first free `~N` variant is.
    fn record_path(&self, key: &LeaseKey, files: &[RecordFile]) -> PathBuf {
        if let Some(file) = files.iter().find(|file| file.holds(key)) {
            return file.path.clone();
        }

        let taken: HashSet<&Path> = files
            .iter()
            .filter(|file| file.lease.is_some())
            .map(|file| file.path.as_path())
            .collect();

        let name = key.file_name();
        let stem = name.trim_end_matches(&format!(".{CLAIM_EXTENSION}"));
        let mut candidate = self.claims_dir.join(&name);
        let mut n = 2_u32;
        while taken.contains(candidate.as_path()) {
            candidate = self.claims_dir.join(format!("{stem}~{n}.{CLAIM_EXTENSION}"));
            n += 1;
        }
        candidate
    }

    fn move_to_archive(&self, path: &Path) -> Result<()> {
        let archive_dir = self.archive_dir();
        fs::create_dir_all(&archive_dir).map_err(|e| {
            Error::storage(
                format!("Failed to create archive directory {}", archive_dir.display()),
                e,
            )
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut target = archive_dir.join(&name);
        if target.exists() {
            let stem = name.trim_end_matches(&format!(".{CLAIM_EXTENSION}"));
            target = archive_dir.join(format!(
                "{stem}-{}.{CLAIM_EXTENSION}",
                Utc::now().timestamp_millis()
            ));
        }

        match fs::rename(path, &target) {
            Ok(()) => {
                tracing::debug!("Archived claim {} to {}", path.display(), target.display());
                Ok(())
            }
            // Another process archived it first
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(
                format!("Failed to archive {}", path.display()),
                e,
            )),
        }
    }
}

impl LeaseStore for FsLeaseStore {
    fn list_all(&self) -> Result<Vec<Lease>> {
        Ok(sorted(scan(&self.claims_dir)?))
    }

    fn create(&self, lease: &Lease) -> Result<()> {
        let files = scan(&self.claims_dir)?;
        let path = self.record_path(&lease.key(), &files);
        json_file::write_pretty(&path, lease)?;
        tracing::debug!(key = %lease.key(), "Wrote claim {}", path.display());
        Ok(())
    }

    fn archive(&self, key: &LeaseKey) -> Result<()> {
        let files = scan(&self.claims_dir)?;
        let preferred = self.claims_dir.join(key.file_name());

        // Every record holding the key, plus an unreadable record sitting at
        // the key's preferred name
        let targets = files.iter().filter(|file| {
            file.holds(key) || (file.lease.is_none() && file.path == preferred)
        });

        for file in targets {
            self.move_to_archive(&file.path)?;
        }
        Ok(())
    }
}

/// Parse a single record, `None` if unreadable or malformed
fn read_record(path: &Path) -> Option<Lease> {
    match json_file::read::<Lease>(path) {
        Ok(lease) => lease,
        Err(e) => {
            tracing::debug!("Skipping unreadable claim {}: {e}", path.display());
            None
        }
    }
}

/// Every `.claim` file directly inside `dir`
fn scan(dir: &Path) -> Result<Vec<RecordFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(Error::storage(
                format!("Failed to read claims directory {}", dir.display()),
                e,
            ))
        }
    };

    Ok(entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(CLAIM_EXTENSION)
        })
        .map(|path| RecordFile {
            lease: read_record(&path),
            path,
        })
        .collect())
}

fn sorted(files: Vec<RecordFile>) -> Vec<Lease> {
    let mut leases: Vec<Lease> = files.into_iter().filter_map(|file| file.lease).collect();
    leases.sort_by(|a, b| {
        a.claimed_at
            .cmp(&b.claimed_at)
            .then_with(|| a.agent.cmp(&b.agent))
    });
    leases
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn store() -> (tempfile::TempDir, FsLeaseStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsLeaseStore::in_editorial_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn test_list_on_missing_directory_is_empty() -> Result<()> {
        let (_dir, store) = store();
        assert!(store.list_all()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_writes_claim_file() -> Result<()> {
        let (dir, store) = store();
        let lease = Lease::new("post-1", "write", "twitter", "alice", Utc::now());
        store.create(&lease)?;

        let path = dir.path().join("claims/post-1-alice.claim");
        assert!(path.exists());
        let raw = fs::read_to_string(path)?;
        assert!(raw.contains("\"content_id\": \"post-1\""));
        assert_eq!(store.list_all()?, vec![lease]);
        Ok(())
    }

    #[test]
    fn test_corrupt_and_foreign_files_are_skipped() -> Result<()> {
        let (dir, store) = store();
        let claims = dir.path().join("claims");
        fs::create_dir_all(&claims)?;
        fs::write(claims.join("broken-x.claim"), "{not json")?;
        fs::write(claims.join("notes.txt"), "hello")?;
        fs::write(
            claims.join("partial-y.claim"),
            r#"{"agent":"y","content_id":"partial"}"#,
        )?;
        store.create(&Lease::new("ok", "write", "blog", "z", Utc::now()))?;

        let leases = store.list_all()?;
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0].content_id, "ok");
        Ok(())
    }

    #[test]
    fn test_archive_moves_record() -> Result<()> {
        let (dir, store) = store();
        let lease = Lease::new("post-1", "write", "twitter", "alice", Utc::now());
        store.create(&lease)?;
        store.archive(&lease.key())?;

        assert!(store.list_all()?.is_empty());
        assert!(dir.path().join("claims/archive/post-1-alice.claim").exists());
        assert_eq!(store.archived()?, vec![lease]);
        Ok(())
    }

    #[test]
    fn test_archive_missing_is_noop() -> Result<()> {
        let (dir, store) = store();
        store.archive(&LeaseKey::new("ghost", "nobody"))?;
        assert!(!dir.path().join("claims/archive").exists());
        Ok(())
    }

    #[test]
    fn test_repeated_archive_keeps_history() -> Result<()> {
        let (_dir, store) = store();
        let now = Utc::now();
        let first = Lease::new("post-1", "write", "twitter", "alice", now - Duration::hours(1));
        store.create(&first)?;
        store.archive(&first.key())?;

        let second = Lease::new("post-1", "review", "twitter", "alice", now);
        store.create(&second)?;
        store.archive(&second.key())?;

        let archived = store.archived()?;
        assert_eq!(archived.len(), 2);
        assert_eq!(archived[0].action, "write");
        assert_eq!(archived[1].action, "review");
        Ok(())
    }

    #[test]
    fn test_archive_leaves_colliding_foreign_record() -> Result<()> {
        let (_dir, store) = store();
        // "post" + "1-bob" and "post-1" + "bob" share a file name
        let foreign = Lease::new("post", "write", "twitter", "1-bob", Utc::now());
        store.create(&foreign)?;

        store.archive(&LeaseKey::new("post-1", "bob"))?;

        assert_eq!(store.list_all()?, vec![foreign]);
        Ok(())
    }

    #[test]
    fn test_create_never_replaces_colliding_foreign_record() -> Result<()> {
        let (dir, store) = store();
        let now = Utc::now();
        let bob = Lease::new("post-1", "write", "twitter", "bob", now);
        let other = Lease::new("post", "write", "blog", "1-bob", now + Duration::seconds(1));
        store.create(&bob)?;
        store.create(&other)?;

        assert_eq!(store.list_all()?, vec![bob.clone(), other]);
        assert!(dir.path().join("claims/post-1-bob.claim").exists());
        assert!(dir.path().join("claims/post-1-bob~2.claim").exists());

        // Rewriting the displaced key reuses its file
        let moved = Lease::new("post", "review", "blog", "1-bob", now + Duration::seconds(2));
        store.create(&moved)?;
        assert_eq!(store.list_all()?, vec![bob.clone(), moved.clone()]);

        store.archive(&moved.key())?;
        assert_eq!(store.list_all()?, vec![bob]);
        assert!(dir.path().join("claims/archive/post-1-bob~2.claim").exists());
        Ok(())
    }

    #[test]
    fn test_archive_finds_record_under_any_name() -> Result<()> {
        let (dir, store) = store();
        let claims = dir.path().join("claims");
        fs::create_dir_all(&claims)?;
        let lease = Lease::new("post-1", "write", "twitter", "Jane Doe", Utc::now());
        fs::write(
            claims.join("post-1-Jane Doe.claim"),
            serde_json::to_string(&lease)?,
        )?;

        assert_eq!(store.list_all()?, vec![lease.clone()]);
        store.archive(&lease.key())?;

        assert!(store.list_all()?.is_empty());
        assert!(!claims.join("post-1-Jane Doe.claim").exists());
        assert_eq!(store.archived()?, vec![lease]);
        Ok(())
    }

    #[test]
    fn test_archive_clears_unreadable_record_at_preferred_name() -> Result<()> {
        let (dir, store) = store();
        let claims = dir.path().join("claims");
        fs::create_dir_all(&claims)?;
        fs::write(claims.join("post-1-alice.claim"), "{truncated")?;

        store.archive(&LeaseKey::new("post-1", "alice"))?;

        assert!(!claims.join("post-1-alice.claim").exists());
        assert!(claims.join("archive/post-1-alice.claim").exists());
        Ok(())
    }
}
