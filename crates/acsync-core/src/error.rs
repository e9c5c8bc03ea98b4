//! Core error types.
//!
//! Errors are split by how the run recovers from them: `SourceError::Query`
//! is recoverable per-query, everything in `CoreError` aborts the run.

use thiserror::Error;

use crate::backprop::WriteTarget;

/// Error from a single source-of-record backend (directory or staff).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The configured directory group does not exist.
    #[error("group '{group}' was not found in the directory")]
    GroupNotFound { group: String },

    /// A single filtered staff query failed (e.g. an unparsable filter
    /// value). The aggregator drops that query's contribution and continues
    /// with the next one.
    #[error("staff query failed: {message}")]
    Query { message: String },

    /// Backend-level failure: connection, protocol, unexpected data.
    #[error("source backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SourceError {
    /// Create a per-query failure.
    pub fn query(message: impl Into<String>) -> Self {
        SourceError::Query {
            message: message.into(),
        }
    }

    /// Create a backend failure.
    pub fn backend(message: impl Into<String>) -> Self {
        SourceError::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend failure with an underlying cause.
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SourceError::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Fatal error aborting a synchronization run.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The configured directory group does not exist. Configuration error,
    /// raised before any write.
    #[error("group '{group}' was not found in the directory")]
    GroupNotFound { group: String },

    /// No source produced any candidate identity and fail-on-empty is set.
    /// Raised before any remote call so an empty roster is never pushed.
    #[error("no candidate identities found in any source")]
    NoCandidates,

    /// Directory backend failure outside a recoverable query.
    #[error("directory error")]
    Directory(#[source] SourceError),

    /// Staff directory backend failure outside a recoverable query.
    #[error("staff directory error")]
    Staff(#[source] SourceError),

    /// A card write to a local record failed. Writes already committed
    /// before the failure stay committed; the next run reconciles again.
    #[error("card write to {target} record '{key}' failed")]
    CardWrite {
        target: WriteTarget,
        key: String,
        #[source]
        source: SourceError,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_display() {
        let err = SourceError::GroupNotFound {
            group: "Care".to_string(),
        };
        assert_eq!(err.to_string(), "group 'Care' was not found in the directory");

        let err = SourceError::query("bad filter value '12x'");
        assert_eq!(err.to_string(), "staff query failed: bad filter value '12x'");
    }

    #[test]
    fn card_write_error_carries_target_and_key() {
        let err = CoreError::CardWrite {
            target: WriteTarget::Directory,
            key: "alice".to_string(),
            source: SourceError::backend("ldap modify rejected"),
        };
        assert_eq!(
            err.to_string(),
            "card write to directory record 'alice' failed"
        );
    }
}
