//! Conflict detection
//!
//! Only a lease on the same content and the same channel, held by a different
//! agent, is a conflict. Matching is exact string equality.

use crate::lease::Lease;

/// First alive lease on (`content_id`, `channel`) held by someone other than `agent`
#[must_use]
pub fn find_conflict<'a>(
    alive: &'a [Lease],
    content_id: &str,
    channel: &str,
    agent: &str,
) -> Option<&'a Lease> {
    alive
        .iter()
        .find(|lease| lease.targets(content_id, channel) && lease.agent != agent)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn leases() -> Vec<Lease> {
        let now = Utc::now();
        vec![
            Lease::new("post-1", "write", "twitter", "a", now),
            Lease::new("post-1", "write", "mastodon", "b", now),
            Lease::new("post-2", "write", "twitter", "c", now),
        ]
    }

    #[test]
    fn test_same_content_same_channel_other_agent_conflicts() {
        let alive = leases();
        let holder = find_conflict(&alive, "post-1", "twitter", "b");
        assert_eq!(holder.map(|l| l.agent.as_str()), Some("a"));
    }

    #[test]
    fn test_own_lease_is_not_a_conflict() {
        let alive = leases();
        assert!(find_conflict(&alive, "post-1", "twitter", "a").is_none());
    }

    #[test]
    fn test_different_channel_or_content_never_conflicts() {
        let alive = leases();
        assert!(find_conflict(&alive, "post-1", "bluesky", "z").is_none());
        assert!(find_conflict(&alive, "post-3", "twitter", "z").is_none());
    }

    #[test]
    fn test_matching_is_exact() {
        let alive = leases();
        assert!(find_conflict(&alive, "POST-1", "twitter", "z").is_none());
        assert!(find_conflict(&alive, "post-1", "Twitter", "z").is_none());
        assert!(find_conflict(&alive, "post-1 ", "twitter", "z").is_none());
    }
}
