//! Claim coordinator
//!
//! Composes the lease store, expiry policy and conflict resolver into the
//! acquire / release / check / publish operations. Every operation starts
//! with an expiry sweep over the store.
//!
//! # Races
//!
//! Acquire is "list, decide, create". With a store whose
//! [`LeaseStore::exclusive`] is unguarded, two agents acquiring the same
//! (content, channel) from separate processes at the same moment can both
//! succeed. Use [`LockedFsLeaseStore`](crate::store::LockedFsLeaseStore) when
//! that matters.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    audit::{noop_hook, AuditEvent, AuditHook, GitAudit},
    clock::{Clock, SystemClock},
    config::Config,
    conflict::find_conflict,
    error::require,
    expiry::{list_alive, ExpiryPolicy},
    ledger::{self, JsonLedger, Ledger, LedgerEntry},
    lease::{Lease, LeaseKey},
    registry::{JsonRegistry, Registry, RegistryEntry},
    store::{FsLeaseStore, LeaseStore, LockedFsLeaseStore},
    Error, Result,
};

/// Default window for "recent publications" in the status report
pub const DEFAULT_RECENT_HOURS: i64 = 48;

/// A lease was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claimed {
    pub lease: Lease,
}

/// The caller's lease on a content item is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Released {
    pub content_id: String,
    pub agent: String,
}

/// A publication was recorded and the publisher's lease archived
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Published {
    pub entry: LedgerEntry,
    pub registry: RegistryEntry,
}

/// Result of a read-only check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The pair is already in the ledger
    AlreadyPublished { entry: LedgerEntry },
    /// Another agent holds an alive lease on the pair
    Conflict { holder: Lease },
    /// Nothing stands in the way
    Clear {
        content_id: String,
        channel: String,
    },
}

/// An alive lease with its age at report time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveLease {
    #[serde(flatten)]
    pub lease: Lease,
    pub age_minutes: i64,
}

/// Aggregate view of the editorial state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub active: Vec<ActiveLease>,
    /// Publications inside the recent window, newest first
    pub recent: Vec<LedgerEntry>,
    pub recent_window_hours: i64,
    pub registry_total: usize,
    pub ledger_total: usize,
    pub active_total: usize,
}

/// Orchestrates claims over a shared store
pub struct ClaimCoordinator {
    store: Box<dyn LeaseStore>,
    ledger: Box<dyn Ledger>,
    registry: Box<dyn Registry>,
    clock: Box<dyn Clock>,
    audit: AuditHook,
    expiry: ExpiryPolicy,
    recent_window: Duration,
}

impl std::fmt::Debug for ClaimCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimCoordinator")
            .field("expiry", &self.expiry)
            .field("recent_window", &self.recent_window)
            .finish_non_exhaustive()
    }
}

impl ClaimCoordinator {
    /// Coordinator on the wall clock with auditing disabled
    #[must_use]
    pub fn new(
        store: impl LeaseStore + 'static,
        ledger: impl Ledger + 'static,
        registry: impl Registry + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            ledger: Box::new(ledger),
            registry: Box::new(registry),
            clock: Box::new(SystemClock),
            audit: noop_hook(),
            expiry: ExpiryPolicy::default(),
            recent_window: Duration::hours(DEFAULT_RECENT_HOURS),
        }
    }

    /// File-backed coordinator for an editorial directory, as configured
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configured TTL or window is not positive.
    pub fn open(config: &Config) -> Result<Self> {
        let dir = config.editorial_dir.as_path();
        let fs_store = FsLeaseStore::in_editorial_dir(dir);
        let store: Box<dyn LeaseStore> = if config.claims.exclusive {
            Box::new(LockedFsLeaseStore::new(fs_store))
        } else {
            Box::new(fs_store)
        };

        let coordinator = Self::new(
            store,
            JsonLedger::in_editorial_dir(dir),
            JsonRegistry::in_editorial_dir(dir),
        )
        .with_expiry(config.expiry_policy()?)
        .with_recent_window(config.recent_window()?);

        Ok(if config.audit.git_commit {
            coordinator.with_audit_hook(GitAudit::new(dir).into_hook())
        } else {
            coordinator
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_audit_hook(mut self, hook: AuditHook) -> Self {
        self.audit = hook;
        self
    }

    #[must_use]
    pub const fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    #[must_use]
    pub const fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = window;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Alive leases; expired ones found along the way are archived.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    pub fn list_alive(&self) -> Result<Vec<Lease>> {
        list_alive(&self.store, &self.expiry, self.now())
    }

    /// The alive lease blocking `agent` from (`content_id`, `channel`), if any
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    pub fn find_conflict(
        &self,
        content_id: &str,
        channel: &str,
        agent: &str,
    ) -> Result<Option<Lease>> {
        let alive = self.list_alive()?;
        Ok(find_conflict(&alive, content_id, channel, agent).cloned())
    }

    /// Claim `content_id` on `channel` for `agent`.
    ///
    /// Re-acquiring by the same agent replaces its previous lease on the
    /// content item, whichever channel that lease was for.
    ///
    /// # Errors
    ///
    /// - `MissingArgument` if any input is blank
    /// - `Conflict` if another agent holds an alive lease on the pair
    pub fn acquire(
        &self,
        content_id: &str,
        action: &str,
        channel: &str,
        agent: &str,
    ) -> Result<Claimed> {
        require("content_id", content_id)?;
        require("action", action)?;
        require("channel", channel)?;
        require("agent", agent)?;

        let guard = self.store.exclusive()?;
        tracing::debug!(locked = guard.is_locked(), "Checking claims for {content_id}");
        let now = self.now();
        let alive = list_alive(&self.store, &self.expiry, now)?;

        if let Some(holder) = find_conflict(&alive, content_id, channel, agent) {
            tracing::debug!(
                content_id,
                channel,
                holder = %holder.agent,
                "Claim refused"
            );
            return Err(Error::Conflict {
                content_id: content_id.to_string(),
                channel: channel.to_string(),
                agent: holder.agent.clone(),
                claimed_at: holder.claimed_at,
            });
        }

        let lease = Lease::new(content_id, action, channel, agent, now);
        self.store.create(&lease)?;
        drop(guard);

        self.notify(&AuditEvent::Claimed {
            agent: agent.to_string(),
            content_id: content_id.to_string(),
            action: action.to_string(),
            channel: channel.to_string(),
        });

        Ok(Claimed { lease })
    }

    /// Archive `agent`'s lease on `content_id`. Releasing nothing succeeds.
    ///
    /// # Errors
    ///
    /// - `MissingArgument` if any input is blank
    /// - `Storage` if the record exists but cannot be moved
    pub fn release(&self, content_id: &str, agent: &str) -> Result<Released> {
        require("content_id", content_id)?;
        require("agent", agent)?;

        self.list_alive()?;
        self.store.archive(&LeaseKey::new(content_id, agent))?;

        self.notify(&AuditEvent::Released {
            agent: agent.to_string(),
            content_id: content_id.to_string(),
        });

        Ok(Released {
            content_id: content_id.to_string(),
            agent: agent.to_string(),
        })
    }

    /// Read-only check of (`content_id`, `channel`) on behalf of `agent`.
    ///
    /// The ledger is consulted first: finished work is reported as published
    /// even if a stale claim on it lingers.
    ///
    /// # Errors
    ///
    /// - `MissingArgument` if any input is blank
    /// - storage errors from the store or ledger
    pub fn check(&self, content_id: &str, channel: &str, agent: &str) -> Result<CheckOutcome> {
        require("content_id", content_id)?;
        require("channel", channel)?;
        require("agent", agent)?;

        let alive = self.list_alive()?;

        let entries = self.ledger.entries()?;
        if let Some(entry) = ledger::find_completion(&entries, content_id, channel) {
            return Ok(CheckOutcome::AlreadyPublished {
                entry: entry.clone(),
            });
        }

        Ok(find_conflict(&alive, content_id, channel, agent).map_or_else(
            || CheckOutcome::Clear {
                content_id: content_id.to_string(),
                channel: channel.to_string(),
            },
            |holder| CheckOutcome::Conflict {
                holder: holder.clone(),
            },
        ))
    }

    /// Record a publication and archive the publisher's own lease.
    ///
    /// Never gated by other agents' leases. `title` defaults to `content_id`.
    ///
    /// # Errors
    ///
    /// - `MissingArgument` if any required input is blank
    /// - storage or parse errors from the ledger, registry or store
    pub fn publish_and_release(
        &self,
        content_id: &str,
        channel: &str,
        url: &str,
        title: Option<&str>,
        agent: &str,
    ) -> Result<Published> {
        require("content_id", content_id)?;
        require("channel", channel)?;
        require("url", url)?;
        require("agent", agent)?;

        let now = self.now();
        list_alive(&self.store, &self.expiry, now)?;

        let title = title.filter(|t| !t.trim().is_empty()).unwrap_or(content_id);
        let entry = LedgerEntry::published(content_id, title, channel, agent, url, now);
        self.ledger.append(&entry)?;
        let registry = self.registry.record_publication(&entry)?;

        self.store.archive(&LeaseKey::new(content_id, agent))?;

        self.notify(&AuditEvent::Published {
            agent: agent.to_string(),
            content_id: content_id.to_string(),
            channel: channel.to_string(),
        });

        Ok(Published { entry, registry })
    }

    /// Alive leases, recent publications and totals
    ///
    /// # Errors
    ///
    /// Returns storage errors from the store, ledger or registry.
    pub fn status(&self) -> Result<StatusReport> {
        let now = self.now();
        let alive = list_alive(&self.store, &self.expiry, now)?;
        let entries = self.ledger.entries()?;
        let registry_total = self.registry.entries()?.len();

        let active: Vec<ActiveLease> = alive
            .into_iter()
            .map(|lease| {
                let age_minutes = (lease.age(now).num_seconds() + 30).div_euclid(60);
                ActiveLease { lease, age_minutes }
            })
            .collect();

        Ok(StatusReport {
            generated_at: now,
            active_total: active.len(),
            active,
            recent: ledger::recent(&entries, now, self.recent_window),
            recent_window_hours: self.recent_window.num_hours(),
            registry_total,
            ledger_total: entries.len(),
        })
    }

    fn notify(&self, event: &AuditEvent) {
        tracing::debug!("{event}");
        (self.audit)(event);
    }
}
