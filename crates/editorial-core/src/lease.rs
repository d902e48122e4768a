//! Lease (claim) records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// File extension of persisted lease records
pub const CLAIM_EXTENSION: &str = "claim";

/// A time-bounded claim by one agent on a content item for a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Holder of the lease
    pub agent: String,
    /// Content item under work
    pub content_id: String,
    /// Free-form description of the work ("write", "review", ...)
    pub action: String,
    /// Target distribution surface
    pub channel: String,
    /// When the lease was created
    pub claimed_at: DateTime<Utc>,
}

impl Lease {
    /// Create a new lease claimed at `claimed_at`
    #[must_use]
    pub fn new(
        content_id: impl Into<String>,
        action: impl Into<String>,
        channel: impl Into<String>,
        agent: impl Into<String>,
        claimed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            agent: agent.into(),
            content_id: content_id.into(),
            action: action.into(),
            channel: channel.into(),
            claimed_at,
        }
    }

    /// Storage identity of this lease
    #[must_use]
    pub fn key(&self) -> LeaseKey {
        LeaseKey::new(&self.content_id, &self.agent)
    }

    /// Time elapsed since the claim was made
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.claimed_at
    }

    /// Whether this lease is for `content_id` on `channel` (exact match)
    #[must_use]
    pub fn targets(&self, content_id: &str, channel: &str) -> bool {
        self.content_id == content_id && self.channel == channel
    }
}

/// Storage key of a lease: one live record per (content, agent) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeaseKey {
    pub content_id: String,
    pub agent: String,
}

impl LeaseKey {
    #[must_use]
    pub fn new(content_id: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            agent: agent.into(),
        }
    }

    /// Preferred record file name, `<content_id>-<agent>.claim`
    ///
    /// Path separators and other characters unsafe in file names (including
    /// `~`) are replaced with `_`. Distinct keys can map to the same name
    /// (`a-b` + `c` and `a` + `b-c`), so stores locate records by the key
    /// they contain and fall back to `<name>~N.claim` when the name is taken.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.{CLAIM_EXTENSION}",
            sanitize(&self.content_id),
            sanitize(&self.agent)
        )
    }
}

impl std::fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.content_id, self.agent)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
