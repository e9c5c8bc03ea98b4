//! Identity model and source-record normalization.
//!
//! Every identity pushed to the remote service carries a namespaced person
//! identifier (`pid`): `AD-<account>` for directory accounts, `MA-<number>`
//! for staff records. The prefix encodes provenance and is transmitted
//! as-is; deduplication happens on the unprefixed local key.

use serde::{Deserialize, Serialize};

use crate::traits::{DirectoryMember, StaffEmployee};

/// Provenance namespace of a person identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Internal directory (AD) account, prefix `AD-`.
    Directory,
    /// HR/staff directory record, prefix `MA-`.
    Staff,
}

impl Namespace {
    /// The pid prefix for this namespace.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Namespace::Directory => "AD-",
            Namespace::Staff => "MA-",
        }
    }

    /// Split a namespaced pid into its namespace and local key.
    ///
    /// Returns `None` for unrecognized prefixes or a pid that is nothing
    /// but a prefix.
    #[must_use]
    pub fn split(pid: &str) -> Option<(Namespace, &str)> {
        for ns in [Namespace::Directory, Namespace::Staff] {
            if let Some(local) = pid.strip_prefix(ns.prefix()) {
                if local.trim().is_empty() {
                    return None;
                }
                return Some((ns, local));
            }
        }
        None
    }
}

/// A normalized identity, ready for the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Namespaced person identifier, e.g. `AD-alice` or `MA-500`.
    pub pid: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Phone number, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Card identifier assigned by the remote service, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
}

impl Identity {
    /// Normalize a directory group member.
    ///
    /// Returns `None` when the trimmed account name is empty; such records
    /// never enter the roster.
    #[must_use]
    pub fn from_directory(member: &DirectoryMember) -> Option<Self> {
        let key = member.account.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            pid: format!("{}{key}", Namespace::Directory.prefix()),
            display_name: member.display_name.clone(),
            phone: member.phone.clone(),
            card: None,
        })
    }

    /// Normalize a staff filter match.
    ///
    /// Returns `None` when the trimmed staff number is empty.
    #[must_use]
    pub fn from_staff(employee: &StaffEmployee) -> Option<Self> {
        let key = employee.staff_number.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            pid: format!("{}{key}", Namespace::Staff.prefix()),
            display_name: employee.display_name.clone(),
            phone: employee.phone.clone(),
            card: None,
        })
    }

    /// The namespace encoded in this identity's pid.
    #[must_use]
    pub fn namespace(&self) -> Option<Namespace> {
        Namespace::split(&self.pid).map(|(ns, _)| ns)
    }

    /// The unprefixed local key.
    ///
    /// Falls back to the full pid for unrecognized prefixes.
    #[must_use]
    pub fn local_key(&self) -> &str {
        Namespace::split(&self.pid).map_or(self.pid.as_str(), |(_, local)| local)
    }
}

/// Whether an optional attribute value is absent or blank after trimming.
#[must_use]
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(account: &str) -> DirectoryMember {
        DirectoryMember {
            account: account.to_string(),
            display_name: "Alice Andersen".to_string(),
            phone: Some("5550100".to_string()),
            enabled: true,
            staff_number: None,
            card: None,
        }
    }

    #[test]
    fn namespace_split_recognizes_both_prefixes() {
        assert_eq!(
            Namespace::split("AD-alice"),
            Some((Namespace::Directory, "alice"))
        );
        assert_eq!(Namespace::split("MA-500"), Some((Namespace::Staff, "500")));
    }

    #[test]
    fn namespace_split_rejects_unknown_and_bare_prefixes() {
        assert_eq!(Namespace::split("XX-alice"), None);
        assert_eq!(Namespace::split("alice"), None);
        assert_eq!(Namespace::split("AD-"), None);
        assert_eq!(Namespace::split("MA-  "), None);
    }

    #[test]
    fn from_directory_prefixes_account() {
        let identity = Identity::from_directory(&member("alice")).unwrap();
        assert_eq!(identity.pid, "AD-alice");
        assert_eq!(identity.local_key(), "alice");
        assert_eq!(identity.namespace(), Some(Namespace::Directory));
        assert_eq!(identity.phone.as_deref(), Some("5550100"));
        assert!(identity.card.is_none());
    }

    #[test]
    fn from_directory_drops_blank_account() {
        assert!(Identity::from_directory(&member("")).is_none());
        assert!(Identity::from_directory(&member("   ")).is_none());
    }

    #[test]
    fn from_staff_prefixes_staff_number() {
        let employee = StaffEmployee {
            staff_number: "500".to_string(),
            display_name: "Bob Berg".to_string(),
            phone: None,
            account: Some("bob".to_string()),
            card: None,
        };
        let identity = Identity::from_staff(&employee).unwrap();
        assert_eq!(identity.pid, "MA-500");
        assert_eq!(identity.namespace(), Some(Namespace::Staff));
    }

    #[test]
    fn blankness() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("  ")));
        assert!(!is_blank(Some("X1")));
    }
}
