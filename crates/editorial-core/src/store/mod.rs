//! Durable lease storage
//!
//! A store holds one record per (content, agent) key and supports list,
//! create (last write wins) and archive (soft delete). Stores make no
//! promise that "list, decide, create" is atomic: two agents can both pass a
//! conflict check before either writes. Backends that can close that window
//! return a real guard from [`LeaseStore::exclusive`].

mod fs;
mod locked;

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

pub use fs::FsLeaseStore;
pub use locked::{LockOptions, LockedFsLeaseStore};

use crate::{
    lease::{Lease, LeaseKey},
    Result,
};

/// Persistent collection of lease records
pub trait LeaseStore {
    /// Every active (non-archived) record. Unreadable records are skipped.
    fn list_all(&self) -> Result<Vec<Lease>>;

    /// Write a record at `lease.key()`, replacing any existing one
    fn create(&self, lease: &Lease) -> Result<()>;

    /// Move the record at `key` into the archive. Absent records are a no-op.
    fn archive(&self, key: &LeaseKey) -> Result<()>;

    /// Exclusive access for a check-then-create sequence.
    ///
    /// The default offers no exclusion.
    fn exclusive(&self) -> Result<ExclusiveGuard> {
        Ok(ExclusiveGuard::unguarded())
    }
}

impl<S: LeaseStore + ?Sized> LeaseStore for Box<S> {
    fn list_all(&self) -> Result<Vec<Lease>> {
        (**self).list_all()
    }

    fn create(&self, lease: &Lease) -> Result<()> {
        (**self).create(lease)
    }

    fn archive(&self, key: &LeaseKey) -> Result<()> {
        (**self).archive(key)
    }

    fn exclusive(&self) -> Result<ExclusiveGuard> {
        (**self).exclusive()
    }
}

impl<S: LeaseStore + ?Sized> LeaseStore for std::sync::Arc<S> {
    fn list_all(&self) -> Result<Vec<Lease>> {
        (**self).list_all()
    }

    fn create(&self, lease: &Lease) -> Result<()> {
        (**self).create(lease)
    }

    fn archive(&self, key: &LeaseKey) -> Result<()> {
        (**self).archive(key)
    }

    fn exclusive(&self) -> Result<ExclusiveGuard> {
        (**self).exclusive()
    }
}

/// Held across a check-then-create sequence; released on drop
#[derive(Debug)]
#[must_use]
pub struct ExclusiveGuard {
    lock: Option<(std::fs::File, PathBuf)>,
}

impl ExclusiveGuard {
    /// A guard that excludes nothing
    pub const fn unguarded() -> Self {
        Self { lock: None }
    }

    pub(crate) const fn locked(file: std::fs::File, path: PathBuf) -> Self {
        Self {
            lock: Some((file, path)),
        }
    }

    /// Whether this guard holds a real lock
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}

impl Drop for ExclusiveGuard {
    fn drop(&mut self) {
        if let Some((file, path)) = &self.lock {
            if let Err(e) = fs2::FileExt::unlock(file) {
                tracing::debug!("Failed to unlock {}: {e}", path.display());
            } else {
                tracing::debug!("Released claims lock: {}", path.display());
            }
        }
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryLeaseStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    active: BTreeMap<LeaseKey, Lease>,
    archived: Vec<Lease>,
}

impl MemoryLeaseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Archived records, oldest archival first
    #[must_use]
    pub fn archived(&self) -> Vec<Lease> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .archived
            .clone()
    }
}

impl LeaseStore for MemoryLeaseStore {
    fn list_all(&self) -> Result<Vec<Lease>> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut leases: Vec<Lease> = state.active.values().cloned().collect();
        leases.sort_by(|a, b| a.claimed_at.cmp(&b.claimed_at));
        Ok(leases)
    }

    fn create(&self, lease: &Lease) -> Result<()> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .insert(lease.key(), lease.clone());
        Ok(())
    }

    fn archive(&self, key: &LeaseKey) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lease) = state.active.remove(key) {
            state.archived.push(lease);
        }
        Ok(())
    }
}
