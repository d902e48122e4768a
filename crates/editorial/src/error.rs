use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required positional argument was not supplied
    #[error("{source}\nUsage: {usage}")]
    Usage {
        usage: &'static str,
        #[source]
        source: editorial_core::Error,
    },

    #[error(transparent)]
    Core(#[from] editorial_core::Error),

    #[error("Output error: {0}")]
    Output(String),
}

impl Error {
    /// Process exit code: 1 caller error, 2 system error, 3 conflict
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { source, .. } | Self::Core(source) => source.exit_code(),
            Self::Output(_) => 2,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for an error surfaced from any layer
#[must_use]
pub fn exit_code_of(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>()
        .map(Error::exit_code)
        .or_else(|| {
            err.downcast_ref::<editorial_core::Error>()
                .map(editorial_core::Error::exit_code)
        })
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_maps_to_caller_exit_code() {
        let err = Error::Usage {
            usage: "editorial release <content-id>",
            source: editorial_core::Error::MissingArgument("content_id"),
        };
        assert_eq!(err.exit_code(), 1);
        let msg = err.to_string();
        assert!(msg.contains("Missing argument: content_id"));
        assert!(msg.contains("Usage: editorial release <content-id>"));
    }

    #[test]
    fn test_exit_code_of_downcasts_both_layers() {
        let core = anyhow::Error::new(editorial_core::Error::Storage("disk".into()));
        assert_eq!(exit_code_of(&core), 2);

        let cli = anyhow::Error::new(Error::Core(editorial_core::Error::MissingArgument("url")));
        assert_eq!(exit_code_of(&cli), 1);

        assert_eq!(exit_code_of(&anyhow::anyhow!("other")), 2);
    }
}
