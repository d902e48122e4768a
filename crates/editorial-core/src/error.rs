//! Error types for editorial-core
//!
//! Only [`Error::MissingArgument`] and [`Error::Conflict`] describe caller
//! mistakes or refused work. Corrupt lease records and audit hook failures
//! never become errors: they are logged and treated as absent.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Core error type for editorial operations
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was empty or not supplied
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Another agent holds an alive lease on the same content and channel
    #[error("Conflict: {agent} already claimed {content_id} on {channel} (claimed at {claimed_at})")]
    Conflict {
        content_id: String,
        channel: String,
        agent: String,
        claimed_at: DateTime<Utc>,
    },

    /// Filesystem or other storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// A collaborator file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration value is invalid
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a storage error with context
    pub fn storage(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }

    /// Returns the process exit code for this error.
    ///
    /// - 1: caller error (missing argument, bad configuration)
    /// - 2: system error (storage, parse)
    /// - 3: conflict
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingArgument(_) | Self::InvalidConfig(_) => 1,
            Self::Storage(_) | Self::Parse(_) => 2,
            Self::Conflict { .. } => 3,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for editorial-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reject empty or whitespace-only required inputs
pub(crate) fn require<'a>(name: &'static str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(Error::MissingArgument(name))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::MissingArgument("content_id").exit_code(), 1);
        assert_eq!(Error::InvalidConfig("ttl".into()).exit_code(), 1);
        assert_eq!(Error::Storage("disk".into()).exit_code(), 2);
        let conflict = Error::Conflict {
            content_id: "post-1".into(),
            channel: "twitter".into(),
            agent: "a".into(),
            claimed_at: Utc::now(),
        };
        assert_eq!(conflict.exit_code(), 3);
    }

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("content_id", "post-1").is_ok());
        assert!(matches!(
            require("channel", "   "),
            Err(Error::MissingArgument("channel"))
        ));
        assert!(matches!(
            require("agent", ""),
            Err(Error::MissingArgument("agent"))
        ));
    }

    #[test]
    fn test_conflict_display_names_holder() {
        let err = Error::Conflict {
            content_id: "post-1".into(),
            channel: "twitter".into(),
            agent: "alice".into(),
            claimed_at: Utc::now(),
        };
        let msg = err.to_string();
        assert!(msg.contains("alice already claimed post-1 on twitter"));
    }
}
