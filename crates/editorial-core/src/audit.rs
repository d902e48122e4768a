//! Best-effort audit notifications
//!
//! After each successful mutation the coordinator hands an [`AuditEvent`] to
//! an injected [`AuditHook`]. Hooks swallow their own failures; the mutation
//! is never reported as failed or rolled back because auditing failed.

use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

use serde::Serialize;

/// A state transition worth recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    Claimed {
        agent: String,
        content_id: String,
        action: String,
        channel: String,
    },
    Released {
        agent: String,
        content_id: String,
    },
    Published {
        agent: String,
        content_id: String,
        channel: String,
    },
}

impl AuditEvent {
    /// Human-readable history line, used as the commit message
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Claimed {
                agent,
                content_id,
                action,
                channel,
            } => format!("editorial: {agent} claimed {content_id} for {action} on {channel}"),
            Self::Released { agent, content_id } => {
                format!("editorial: {agent} released claim on {content_id}")
            }
            Self::Published {
                agent,
                content_id,
                channel,
            } => format!("editorial: {agent} published {content_id} on {channel}"),
        }
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Fire-and-forget notification callback
pub type AuditHook = Box<dyn Fn(&AuditEvent) + Send + Sync>;

/// A hook that records nothing
#[must_use]
pub fn noop_hook() -> AuditHook {
    Box::new(|_| {})
}

/// Commits the editorial directory to git after every mutation
#[derive(Debug, Clone)]
pub struct GitAudit {
    dir: PathBuf,
}

impl GitAudit {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stage everything under the directory and commit it with `message`.
    ///
    /// Fails when git is missing, the directory is not a repository, or there
    /// is nothing to commit.
    pub fn commit(&self, message: &str) -> std::result::Result<(), String> {
        self.git(&["add", "."])?;
        self.git(&["commit", "-m", message])
    }

    fn git(&self, args: &[&str]) -> std::result::Result<(), String> {
        let status = Command::new("git")
            .arg("-C")
            .arg(&self.dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| format!("failed to run git {}: {e}", args.join(" ")))?;

        if status.success() {
            Ok(())
        } else {
            Err(format!("git {} exited with {status}", args.join(" ")))
        }
    }

    /// Wrap into a hook that discards the commit outcome
    #[must_use]
    pub fn into_hook(self) -> AuditHook {
        Box::new(move |event| {
            if let Err(e) = self.commit(&event.message()) {
                tracing::debug!("Audit commit skipped: {e}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let claimed = AuditEvent::Claimed {
            agent: "alice".into(),
            content_id: "post-1".into(),
            action: "write".into(),
            channel: "twitter".into(),
        };
        assert_eq!(
            claimed.message(),
            "editorial: alice claimed post-1 for write on twitter"
        );

        let released = AuditEvent::Released {
            agent: "alice".into(),
            content_id: "post-1".into(),
        };
        assert_eq!(released.to_string(), "editorial: alice released claim on post-1");

        let published = AuditEvent::Published {
            agent: "bob".into(),
            content_id: "post-1".into(),
            channel: "blog".into(),
        };
        assert_eq!(published.message(), "editorial: bob published post-1 on blog");
    }

    #[test]
    fn test_event_serializes_with_tag() -> crate::Result<()> {
        let event = AuditEvent::Released {
            agent: "alice".into(),
            content_id: "post-1".into(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["event"], "released");
        assert_eq!(json["agent"], "alice");
        Ok(())
    }

    #[test]
    fn test_git_hook_outside_repository_is_silent() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let hook = GitAudit::new(dir.path().join("not-a-repo")).into_hook();
        hook(&AuditEvent::Released {
            agent: "alice".into(),
            content_id: "post-1".into(),
        });
        Ok(())
    }
}
