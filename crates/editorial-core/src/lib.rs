//! Editorial-core - claim/lease coordination for multi-agent publishing
//!
//! Agents claim (content, channel) pairs before working on them. Claims are
//! leases with a two hour lifetime stored one file per lease, with no central
//! lock server. This crate provides:
//! - Lease records, storage backends and the lazy expiry policy
//! - Conflict detection and the claim coordinator
//! - The completion ledger, content registry and timeline collaborators
//! - Best-effort audit hooks
//! - Configuration loading

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod coordinator;
pub mod error;
pub mod expiry;
mod json_file;
pub mod lease;
pub mod ledger;
pub mod registry;
pub mod store;
pub mod timeline;

pub use audit::{AuditEvent, AuditHook, GitAudit};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_config, Config};
pub use coordinator::{
    ActiveLease, CheckOutcome, ClaimCoordinator, Claimed, Published, Released, StatusReport,
};
pub use error::{Error, Result};
pub use expiry::{is_alive, ExpiryPolicy};
pub use lease::{Lease, LeaseKey};
pub use ledger::{JsonLedger, Ledger, LedgerEntry};
pub use registry::{JsonRegistry, Registry, RegistryEntry};
pub use store::{FsLeaseStore, LeaseStore, LockedFsLeaseStore, MemoryLeaseStore};
