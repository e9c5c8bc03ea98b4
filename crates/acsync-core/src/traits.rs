//! Collaborator interfaces consumed by the engine.
//!
//! The engine never talks to a backend directly; it is handed three injected
//! clients (directory, staff directory, remote service) plus a notifier.
//! Tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SourceError;
use crate::identity::Identity;
use crate::policy::SyncPolicy;
use crate::roster::Roster;

/// A member of the configured directory group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMember {
    /// Account name (the `AD-` local key).
    pub account: String,
    /// Display name.
    pub display_name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// Cross-reference to the staff record, if linked.
    pub staff_number: Option<String>,
    /// Current card identifier stored on the account.
    pub card: Option<String>,
}

/// A staff/HR directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffEmployee {
    /// Staff number (the `MA-` local key).
    pub staff_number: String,
    /// Display name.
    pub display_name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Cross-reference to the directory account, if linked.
    pub account: Option<String>,
    /// Current card identifier stored on the record.
    pub card: Option<String>,
}

/// One filtered staff query. Variants carry the raw configured value;
/// numeric values are parsed by the client, and a parse failure surfaces as
/// a recoverable [`SourceError::Query`].
///
/// The variant order is also the precedence order among staff-only matches
/// and must not be reordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffFilter {
    /// Match on job title id.
    JobTitleId(String),
    /// Match on job title name.
    JobTitleName(String),
    /// Match on organization id.
    OrgId(String),
    /// Match on organization name.
    OrgName(String),
    /// Match on pay class.
    PayClass(String),
}

impl std::fmt::Display for StaffFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffFilter::JobTitleId(v) => write!(f, "job title id '{v}'"),
            StaffFilter::JobTitleName(v) => write!(f, "job title '{v}'"),
            StaffFilter::OrgId(v) => write!(f, "organization id '{v}'"),
            StaffFilter::OrgName(v) => write!(f, "organization '{v}'"),
            StaffFilter::PayClass(v) => write!(f, "pay class '{v}'"),
        }
    }
}

/// Card identifier state the remote service holds for one pid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCardRecord {
    /// Namespaced pid as the remote service knows it.
    pub pid: String,
    /// Card identifier value.
    pub card: String,
}

/// Successful push response: the remote service's own evaluation of the
/// roster. All four lists are optional; all absent means no change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Users the remote service added.
    pub added: Option<Vec<Identity>>,
    /// Users the remote service updated.
    pub updated: Option<Vec<Identity>>,
    /// Users the remote service deleted.
    pub deleted: Option<Vec<Identity>>,
    /// Users the remote service ignored.
    pub ignored: Option<Vec<Identity>>,
}

impl SyncOutcome {
    /// True when the remote service reported no change at all.
    #[must_use]
    pub fn is_no_change(&self) -> bool {
        self.added.is_none()
            && self.updated.is_none()
            && self.deleted.is_none()
            && self.ignored.is_none()
    }
}

/// Verbatim error envelope from a failed remote call.
///
/// Never retried by the engine; carried into the report unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("remote call failed ({}): {description}", status.map_or_else(|| "no status".to_string(), |s| s.to_string()))]
pub struct SyncFailure {
    /// HTTP status code, absent when the request never reached the server.
    pub status: Option<u16>,
    /// Status text or transport error message.
    pub description: String,
    /// Raw response body.
    pub body: String,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

/// Internal directory (AD) access.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Enumerate the members of a group.
    ///
    /// Fails with [`SourceError::GroupNotFound`] when the group is absent.
    async fn group_members(&self, group: &str) -> Result<Vec<DirectoryMember>, SourceError>;

    /// Look up a single account by name.
    async fn find_member(&self, account: &str) -> Result<Option<DirectoryMember>, SourceError>;

    /// Write and persist the card identifier on an account.
    async fn write_card(&self, account: &str, card: &str) -> Result<(), SourceError>;
}

/// Staff/HR directory access.
#[async_trait]
pub trait StaffClient: Send + Sync {
    /// Run one filtered query over active staff records.
    ///
    /// May fail per call; the aggregator isolates such failures to the
    /// single filter.
    async fn query(&self, filter: &StaffFilter) -> Result<Vec<StaffEmployee>, SourceError>;

    /// Look up a single record by staff number.
    async fn find_by_number(&self, staff_number: &str)
        -> Result<Option<StaffEmployee>, SourceError>;

    /// Write and persist the card identifier on a record.
    async fn write_card(&self, staff_number: &str, card: &str) -> Result<(), SourceError>;
}

/// Remote access-control service.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    /// Push the roster and policy to the synchronization endpoint.
    async fn push(&self, roster: &Roster, policy: &SyncPolicy)
        -> Result<SyncOutcome, SyncFailure>;

    /// Query the card identifiers currently known to the remote service.
    async fn query_cards(&self) -> Result<Vec<RemoteCardRecord>, SyncFailure>;
}

/// Notification delivery error.
#[derive(Debug, Error)]
#[error("failed to send notification: {message}")]
pub struct NotifyError {
    pub message: String,
}

impl NotifyError {
    /// Create a send failure.
    pub fn send(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound notification delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a rendered notification.
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        html: bool,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_filter_display_names_the_category() {
        assert_eq!(
            StaffFilter::JobTitleId("12".to_string()).to_string(),
            "job title id '12'"
        );
        assert_eq!(
            StaffFilter::PayClass("nurse".to_string()).to_string(),
            "pay class 'nurse'"
        );
    }

    #[test]
    fn sync_outcome_no_change() {
        assert!(SyncOutcome::default().is_no_change());
        let outcome = SyncOutcome {
            added: Some(vec![]),
            ..Default::default()
        };
        assert!(!outcome.is_no_change());
    }

    #[test]
    fn sync_failure_display() {
        let failure = SyncFailure {
            status: Some(500),
            description: "Internal Server Error".to_string(),
            body: "boom".to_string(),
            headers: vec![],
        };
        assert_eq!(
            failure.to_string(),
            "remote call failed (500): Internal Server Error"
        );

        let failure = SyncFailure {
            status: None,
            description: "connection refused".to_string(),
            body: String::new(),
            headers: vec![],
        };
        assert_eq!(
            failure.to_string(),
            "remote call failed (no status): connection refused"
        );
    }
}
