//! Roster assembly: ordered source queries, first-seen deduplication.
//!
//! Sources run strictly in the configured sequence; the ordering is the
//! precedence rule, not a scheduling detail. A key produced by an earlier
//! source can never be replaced by a later one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult, SourceError};
use crate::identity::Identity;
use crate::traits::{DirectoryClient, StaffClient, StaffFilter};

/// Deduplicated, insertion-ordered identity list.
///
/// Keys (unprefixed local keys) are unique by construction: an identity is
/// only appended when its key has not been seen, and every processed key is
/// marked seen whether or not it produced an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<Identity>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a local key as seen without adding an entry.
    ///
    /// Used for records that are excluded (e.g. disabled accounts) but must
    /// still block later sources from reintroducing the same key.
    pub fn mark_seen(&mut self, key: &str) {
        self.seen.insert(key.to_string());
    }

    /// Whether a local key has already been processed. Case-sensitive.
    #[must_use]
    pub fn is_seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Append an identity if its key is unseen; marks the key seen either
    /// way. Returns whether the identity was appended.
    pub fn push_if_new(&mut self, key: &str, identity: Identity) -> bool {
        if !self.seen.insert(key.to_string()) {
            return false;
        }
        self.entries.push(identity);
        true
    }

    /// The identities in insertion (precedence) order.
    #[must_use]
    pub fn identities(&self) -> &[Identity] {
        &self.entries
    }

    /// Number of identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster holds no identities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The ordered source queries for one run.
#[derive(Debug, Clone)]
pub struct SourcePlan {
    /// Directory group whose members form the first (highest-precedence)
    /// source.
    pub group: String,
    /// Include disabled directory accounts in the roster. When false a
    /// disabled member is excluded but its key still blocks later sources.
    pub include_disabled: bool,
    /// Staff filters, in precedence order.
    pub filters: Vec<StaffFilter>,
    /// Abort with [`CoreError::NoCandidates`] when no source produced any
    /// identity. When unset an empty roster proceeds, which the remote side
    /// may interpret as "delete everyone".
    pub fail_on_empty: bool,
}

impl SourcePlan {
    /// Build the filter sequence from the five configured value lists.
    ///
    /// The category order (job-title id, job-title name, organization id,
    /// organization name, pay class) is the precedence order among
    /// staff-only matches and is fixed.
    #[must_use]
    pub fn staff_filters(
        job_title_ids: &[String],
        job_title_names: &[String],
        org_ids: &[String],
        org_names: &[String],
        pay_classes: &[String],
    ) -> Vec<StaffFilter> {
        let mut filters = Vec::new();
        filters.extend(job_title_ids.iter().cloned().map(StaffFilter::JobTitleId));
        filters.extend(job_title_names.iter().cloned().map(StaffFilter::JobTitleName));
        filters.extend(org_ids.iter().cloned().map(StaffFilter::OrgId));
        filters.extend(org_names.iter().cloned().map(StaffFilter::OrgName));
        filters.extend(pay_classes.iter().cloned().map(StaffFilter::PayClass));
        filters
    }
}

/// Builds the roster from the injected source clients.
pub struct RosterAggregator<'a> {
    directory: &'a dyn DirectoryClient,
    staff: &'a dyn StaffClient,
}

impl<'a> RosterAggregator<'a> {
    /// Create an aggregator over the two source clients.
    #[must_use]
    pub fn new(directory: &'a dyn DirectoryClient, staff: &'a dyn StaffClient) -> Self {
        Self { directory, staff }
    }

    /// Run the plan's queries in order and assemble the roster.
    ///
    /// The directory group query is fatal when the group is missing. Each
    /// staff filter failure is isolated: that filter contributes zero
    /// records and the remaining filters still run.
    pub async fn build(&self, plan: &SourcePlan) -> CoreResult<Roster> {
        let mut roster = Roster::new();

        let members = self
            .directory
            .group_members(&plan.group)
            .await
            .map_err(|err| match err {
                SourceError::GroupNotFound { group } => CoreError::GroupNotFound { group },
                other => CoreError::Directory(other),
            })?;

        for member in &members {
            let key = member.account.trim();
            if key.is_empty() {
                continue;
            }
            if plan.include_disabled || member.enabled {
                if let Some(identity) = Identity::from_directory(member) {
                    if roster.push_if_new(key, identity) {
                        debug!(account = key, "found user in directory group");
                    }
                    continue;
                }
            }
            // Excluded from the roster, but the key still takes precedence.
            roster.mark_seen(key);
        }

        for filter in &plan.filters {
            let employees = match self.staff.query(filter).await {
                Ok(employees) => employees,
                Err(err) => {
                    warn!(%filter, error = %err, "staff query failed; it contributes no records");
                    continue;
                }
            };
            for employee in &employees {
                let key = employee.staff_number.trim();
                if key.is_empty() || roster.is_seen(key) {
                    continue;
                }
                if let Some(identity) = Identity::from_staff(employee) {
                    roster.push_if_new(key, identity);
                    debug!(staff_number = key, %filter, "found user in staff directory");
                }
            }
        }

        if plan.fail_on_empty && roster.is_empty() {
            return Err(CoreError::NoCandidates);
        }

        Ok(roster)
    }
}
