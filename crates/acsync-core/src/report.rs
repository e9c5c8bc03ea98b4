//! Structured run outcome handed to the report renderer.
//!
//! The renderer decides presentation; this structure only guarantees that
//! every field a notification needs is exposed in a stable shape.

use serde::{Deserialize, Serialize};

use crate::backprop::CardWrite;
use crate::policy::SyncPolicy;
use crate::traits::{SyncFailure, SyncOutcome};

/// Result of the roster push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushResult {
    /// The remote service accepted and evaluated the roster.
    Success(SyncOutcome),
    /// The push failed; envelope reported verbatim.
    Failure(SyncFailure),
}

/// Everything a notification about one run is rendered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Policy echo.
    pub policy: SyncPolicy,
    /// Configured directory group.
    pub group: String,
    /// Whether an empty roster aborts the run.
    pub fail_on_empty: bool,
    /// Remote host the roster was pushed to.
    pub host: String,
    /// Remote account used for the push.
    pub username: String,
    /// Number of identities in the pushed roster.
    pub roster_size: usize,
    /// Push result.
    pub push: PushResult,
    /// Card query failure, when back-propagation could not read remote
    /// state. Back-propagation was skipped but the run completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_query_failure: Option<SyncFailure>,
    /// Card writes applied by back-propagation.
    pub card_writes: Vec<CardWrite>,
}

impl RunReport {
    /// Whether the push succeeded with no change reported.
    #[must_use]
    pub fn is_no_change(&self) -> bool {
        matches!(&self.push, PushResult::Success(outcome) if outcome.is_no_change())
    }
}
