//! Card back-propagation: copy card identifiers assigned by the remote
//! service into the directory and staff records that are missing them.
//!
//! Resolution follows the pid's namespace convention first and falls back
//! to the cross-reference field of whichever side matched, covering remote
//! identities created under one namespace whose counterpart is reachable
//! only via the cross-link.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::identity::{is_blank, Namespace};
use crate::traits::{
    DirectoryClient, DirectoryMember, RemoteCardRecord, StaffClient, StaffEmployee,
};

/// Which back-propagation writes are enabled, and whether each side may
/// overwrite an existing non-blank card value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackPropagation {
    /// Write cards to directory accounts.
    pub write_directory: bool,
    /// Overwrite a directory card even when already set.
    pub override_directory: bool,
    /// Write cards to staff records.
    pub write_staff: bool,
    /// Overwrite a staff card even when already set.
    pub override_staff: bool,
}

impl BackPropagation {
    /// Whether back-propagation runs at all this run.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.write_directory || self.write_staff
    }
}

/// Side of a card write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteTarget {
    /// Directory (AD) account.
    Directory,
    /// Staff (HR) record.
    Staff,
}

impl std::fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteTarget::Directory => f.write_str("directory"),
            WriteTarget::Staff => f.write_str("staff"),
        }
    }
}

/// One applied card write, for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardWrite {
    /// Which system was written.
    pub target: WriteTarget,
    /// Local key of the written record (account or staff number).
    pub key: String,
    /// Card value written.
    pub card: String,
}

/// Resolves remote card records to local records and applies conditional
/// writes.
pub struct CardResolver<'a> {
    directory: &'a dyn DirectoryClient,
    staff: &'a dyn StaffClient,
}

impl<'a> CardResolver<'a> {
    /// Create a resolver over the two source clients.
    #[must_use]
    pub fn new(directory: &'a dyn DirectoryClient, staff: &'a dyn StaffClient) -> Self {
        Self { directory, staff }
    }

    /// Reconcile remote card state into the local systems.
    ///
    /// Running twice against unchanged remote data produces zero writes on
    /// the second run (unless an override flag forces rewrites). Write
    /// failures propagate; earlier writes stay committed.
    pub async fn reconcile(
        &self,
        records: &[RemoteCardRecord],
        opts: &BackPropagation,
    ) -> CoreResult<Vec<CardWrite>> {
        let mut writes = Vec::new();

        for record in records {
            let card = record.card.trim();
            let Some((_, local)) = Namespace::split(record.pid.trim()) else {
                debug!(pid = %record.pid, "skipping remote record with unrecognized pid");
                continue;
            };
            let key = local.trim();
            if key.is_empty() || card.is_empty() {
                continue;
            }

            let (member, employee) = self.resolve(key).await?;
            if member.is_none() && employee.is_none() {
                debug!(pid = %record.pid, "no local record resolved for remote card");
                continue;
            }

            if opts.write_directory {
                if let Some(member) = &member {
                    if opts.override_directory || is_blank(member.card.as_deref()) {
                        self.directory
                            .write_card(&member.account, card)
                            .await
                            .map_err(|source| CoreError::CardWrite {
                                target: WriteTarget::Directory,
                                key: member.account.clone(),
                                source,
                            })?;
                        writes.push(CardWrite {
                            target: WriteTarget::Directory,
                            key: member.account.clone(),
                            card: card.to_string(),
                        });
                    }
                }
            }

            if opts.write_staff {
                if let Some(employee) = &employee {
                    if opts.override_staff || is_blank(employee.card.as_deref()) {
                        self.staff
                            .write_card(&employee.staff_number, card)
                            .await
                            .map_err(|source| CoreError::CardWrite {
                                target: WriteTarget::Staff,
                                key: employee.staff_number.clone(),
                                source,
                            })?;
                        writes.push(CardWrite {
                            target: WriteTarget::Staff,
                            key: employee.staff_number.clone(),
                            card: card.to_string(),
                        });
                    }
                }
            }
        }

        Ok(writes)
    }

    /// Resolve both local records for a stripped key: direct lookup on each
    /// side, then cross-fill through the cross-reference of the side that
    /// matched.
    async fn resolve(
        &self,
        key: &str,
    ) -> CoreResult<(Option<DirectoryMember>, Option<StaffEmployee>)> {
        let mut member = self
            .directory
            .find_member(key)
            .await
            .map_err(CoreError::Directory)?;
        let mut employee = self
            .staff
            .find_by_number(key)
            .await
            .map_err(CoreError::Staff)?;

        match (&member, &employee) {
            (Some(m), None) => {
                if let Some(staff_number) = m.staff_number.as_deref().map(str::trim) {
                    if !staff_number.is_empty() {
                        employee = self
                            .staff
                            .find_by_number(staff_number)
                            .await
                            .map_err(CoreError::Staff)?;
                    }
                }
            }
            (None, Some(e)) => {
                if let Some(account) = e.account.as_deref().map(str::trim) {
                    if !account.is_empty() {
                        member = self
                            .directory
                            .find_member(account)
                            .await
                            .map_err(CoreError::Directory)?;
                    }
                }
            }
            _ => {}
        }

        Ok((member, employee))
    }
}
