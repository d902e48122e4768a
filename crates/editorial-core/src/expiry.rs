//! Lease expiry policy
//!
//! Liveness is computed lazily whenever leases are read. There is no sweeper
//! process: [`list_alive`] archives every expired record it encounters, so
//! stale claims clean themselves up on the next scan.

use chrono::{DateTime, Duration, Utc};

use crate::{
    lease::Lease,
    store::LeaseStore,
    Error, Result,
};

/// Default lease lifetime in minutes
pub const DEFAULT_LEASE_TTL_MINUTES: i64 = 120;

/// Decides whether a lease is still alive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(DEFAULT_LEASE_TTL_MINUTES),
        }
    }
}

impl ExpiryPolicy {
    /// Create a policy with the given time-to-live
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `ttl` is not positive.
    pub fn new(ttl: Duration) -> Result<Self> {
        if ttl <= Duration::zero() {
            return Err(Error::InvalidConfig(format!(
                "lease TTL must be positive, got {}s",
                ttl.num_seconds()
            )));
        }
        Ok(Self { ttl })
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A lease is alive iff `now - claimed_at < ttl`; exactly `ttl` old is expired.
    #[must_use]
    pub fn is_alive(&self, lease: &Lease, now: DateTime<Utc>) -> bool {
        lease.age(now) < self.ttl
    }
}

/// [`ExpiryPolicy::is_alive`] under the default two hour TTL
#[must_use]
pub fn is_alive(lease: &Lease, now: DateTime<Utc>) -> bool {
    ExpiryPolicy::default().is_alive(lease, now)
}

/// Read every alive lease, archiving expired ones as a side effect.
///
/// Archival failures are logged and skipped; the expired lease is still
/// excluded from the result.
///
/// # Errors
///
/// Returns an error only if the store cannot be listed.
pub fn list_alive<S: LeaseStore + ?Sized>(
    store: &S,
    policy: &ExpiryPolicy,
    now: DateTime<Utc>,
) -> Result<Vec<Lease>> {
    let (alive, expired): (Vec<Lease>, Vec<Lease>) = store
        .list_all()?
        .into_iter()
        .partition(|lease| policy.is_alive(lease, now));

    for lease in &expired {
        match store.archive(&lease.key()) {
            Ok(()) => tracing::info!(
                key = %lease.key(),
                age_minutes = lease.age(now).num_minutes(),
                "Archived expired claim"
            ),
            Err(e) => tracing::warn!(key = %lease.key(), "Failed to archive expired claim: {e}"),
        }
    }

    Ok(alive)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::store::MemoryLeaseStore;

    fn lease_at(claimed_at: DateTime<Utc>) -> Lease {
        Lease::new("post-1", "write", "twitter", "alice", claimed_at)
    }

    #[test]
    fn test_exactly_ttl_is_expired() {
        let now = Utc::now();
        assert!(!is_alive(&lease_at(now - Duration::hours(2)), now));
        assert!(is_alive(
            &lease_at(now - Duration::hours(2) + Duration::milliseconds(1)),
            now
        ));
        assert!(is_alive(&lease_at(now), now));
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        assert!(ExpiryPolicy::new(Duration::zero()).is_err());
        assert!(ExpiryPolicy::new(Duration::minutes(-5)).is_err());
        assert!(ExpiryPolicy::new(Duration::minutes(5)).is_ok());
    }

    #[test]
    fn test_list_alive_archives_expired() -> Result<()> {
        let now = Utc::now();
        let store = MemoryLeaseStore::new();
        store.create(&Lease::new("fresh", "write", "twitter", "a", now))?;
        store.create(&Lease::new(
            "stale",
            "write",
            "twitter",
            "b",
            now - Duration::hours(3),
        ))?;

        let alive = list_alive(&store, &ExpiryPolicy::default(), now)?;

        assert_eq!(alive.len(), 1);
        assert_eq!(alive[0].content_id, "fresh");
        assert_eq!(store.list_all()?.len(), 1);
        assert_eq!(store.archived().len(), 1);
        assert_eq!(store.archived()[0].content_id, "stale");
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_alive_iff_younger_than_ttl(age_secs in -86_400_i64..86_400, ttl_mins in 1_i64..600) {
            let now = Utc::now();
            let policy = ExpiryPolicy::new(Duration::minutes(ttl_mins)).unwrap();
            let lease = lease_at(now - Duration::seconds(age_secs));

            prop_assert_eq!(policy.is_alive(&lease, now), age_secs < ttl_mins * 60);
        }
    }
}
