//! Commands module for the editorial CLI
//!
//! Each command takes resolved options and a coordinator, prints its result,
//! and returns an error only for failures.

pub mod check;
pub mod claim;
pub mod publish;
pub mod release;
pub mod status;

use chrono::{DateTime, SecondsFormat, Utc};

/// Exit code of a `check` that found another agent's claim
pub const EXIT_CONFLICT: i32 = 3;

/// ISO-8601 with millisecond precision, as stored in claim and ledger files
fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
