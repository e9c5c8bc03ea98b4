//! XML wire types for the remote synchronization protocol.
//!
//! The service speaks a data-contract style XML dialect: a
//! `EvaluateUserCollection` document carries the roster and the evaluation
//! flags; the response is an `EvaluateUserCollectionResult` with four
//! optional user lists. The card query returns a flat `UserDataCollection`.

use serde::{Deserialize, Serialize};

use acsync_core::{EvaluationMode, Identity, Roster, SyncOutcome, SyncPolicy};

/// One user entry on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    /// Namespaced person identifier.
    #[serde(rename = "Pid", default)]
    pub pid: String,
    /// Display name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Phone number.
    #[serde(rename = "Phone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Card identifier.
    #[serde(rename = "Card", default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
}

impl UserData {
    /// Encode an identity for transmission.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            pid: identity.pid.clone(),
            name: identity.display_name.clone(),
            phone: identity.phone.clone(),
            card: identity.card.clone(),
        }
    }

    /// Decode a received entry.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        Identity {
            pid: self.pid,
            display_name: self.name,
            phone: self.phone,
            card: self.card,
        }
    }
}

/// A list of user entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataCollection {
    /// The entries.
    #[serde(rename = "UserData", default)]
    pub users: Vec<UserData>,
}

impl UserDataCollection {
    fn into_identities(self) -> Vec<Identity> {
        self.users.into_iter().map(UserData::into_identity).collect()
    }
}

/// Explicit pid ignore list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreIdList {
    /// Pids the remote service must leave alone.
    #[serde(rename = "ID", default)]
    pub ids: Vec<String>,
}

/// Roster push request document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "EvaluateUserCollection")]
pub struct EvaluateUserCollection {
    /// Space-separated evaluation flag names.
    #[serde(rename = "EvaluationType")]
    pub evaluation_type: String,
    /// Zone the evaluation is limited to.
    #[serde(rename = "ZoneID", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    /// Regex of pids to ignore.
    #[serde(rename = "IgnoreIDRegex", skip_serializing_if = "Option::is_none")]
    pub ignore_id_regex: Option<String>,
    /// Explicit pid ignore list.
    #[serde(rename = "IgnoreIDList", skip_serializing_if = "Option::is_none")]
    pub ignore_id_list: Option<IgnoreIdList>,
    /// Cap on user updates per run.
    #[serde(rename = "MaxSynchronizationLevel")]
    pub max_synchronization_level: u32,
    /// The roster.
    #[serde(rename = "Users")]
    pub users: UserDataCollection,
}

impl EvaluateUserCollection {
    /// Encode a roster and policy into the push document.
    #[must_use]
    pub fn encode(roster: &Roster, policy: &SyncPolicy) -> Self {
        Self {
            evaluation_type: evaluation_flags(policy),
            zone_id: policy.zone_limit.clone(),
            ignore_id_regex: policy.ignore_regex.clone(),
            ignore_id_list: (!policy.ignore_list.is_empty()).then(|| IgnoreIdList {
                ids: policy.ignore_list.clone(),
            }),
            max_synchronization_level: policy.max_level,
            users: UserDataCollection {
                users: roster
                    .identities()
                    .iter()
                    .map(UserData::from_identity)
                    .collect(),
            },
        }
    }
}

/// Push response document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "EvaluateUserCollectionResult")]
pub struct EvaluateUserCollectionResult {
    /// Users added by the remote service.
    #[serde(rename = "AddedUsers", default)]
    pub added_users: Option<UserDataCollection>,
    /// Users updated.
    #[serde(rename = "UpdatedUsers", default)]
    pub updated_users: Option<UserDataCollection>,
    /// Users deleted.
    #[serde(rename = "DeletedUsers", default)]
    pub deleted_users: Option<UserDataCollection>,
    /// Users ignored.
    #[serde(rename = "IgnoredUsers", default)]
    pub ignored_users: Option<UserDataCollection>,
}

impl EvaluateUserCollectionResult {
    /// Map the response into the engine's outcome structure.
    #[must_use]
    pub fn into_outcome(self) -> SyncOutcome {
        SyncOutcome {
            added: self.added_users.map(UserDataCollection::into_identities),
            updated: self.updated_users.map(UserDataCollection::into_identities),
            deleted: self.deleted_users.map(UserDataCollection::into_identities),
            ignored: self.ignored_users.map(UserDataCollection::into_identities),
        }
    }
}

/// Render the policy as the wire's flags string.
///
/// `Test` is mutually exclusive with the add/remove flags; the modifier
/// flags append independently.
#[must_use]
pub fn evaluation_flags(policy: &SyncPolicy) -> String {
    let mut flags = Vec::new();
    match policy.mode {
        EvaluationMode::Test => flags.push("Test"),
        _ => {
            if policy.mode.adds() {
                flags.push("AddNewUsers");
            }
            if policy.mode.removes() {
                flags.push("RemoveNotPresent");
            }
        }
    }
    if policy.zone_limit.is_some() {
        flags.push("LimitToZone");
    }
    if policy.ignore_case {
        flags.push("IgnoreCaseInID");
    }
    if policy.allow_empty_pid {
        flags.push("AllowPidNull");
    }
    flags.join(" ")
}
