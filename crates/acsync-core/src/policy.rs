//! Synchronization policy and its encoder.
//!
//! The policy is the flag/option set transmitted with the roster. The
//! remote service's add/update/delete decisions happen behind the REST
//! boundary; this side only normalizes configuration into named fields.

use serde::{Deserialize, Serialize};

/// How the remote service should evaluate the pushed roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Dry run: evaluate but change nothing.
    #[default]
    Test,
    /// Add users not yet present.
    Add,
    /// Remove users not in the roster.
    Remove,
    /// Add and remove.
    AddRemove,
}

impl EvaluationMode {
    /// Parse a configured mode string.
    ///
    /// Case and surrounding whitespace are ignored; anything unrecognized
    /// falls back to [`EvaluationMode::Test`], the safe default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "add" => EvaluationMode::Add,
            "remove" => EvaluationMode::Remove,
            "addremove" => EvaluationMode::AddRemove,
            _ => EvaluationMode::Test,
        }
    }

    /// Whether this mode lets the remote service add new users.
    #[must_use]
    pub fn adds(self) -> bool {
        matches!(self, EvaluationMode::Add | EvaluationMode::AddRemove)
    }

    /// Whether this mode lets the remote service remove absent users.
    #[must_use]
    pub fn removes(self) -> bool {
        matches!(self, EvaluationMode::Remove | EvaluationMode::AddRemove)
    }
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EvaluationMode::Test => "test",
            EvaluationMode::Add => "add",
            EvaluationMode::Remove => "remove",
            EvaluationMode::AddRemove => "addremove",
        };
        f.write_str(name)
    }
}

/// Raw policy values as configured, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawPolicy {
    /// Mode string, e.g. `"AddRemove"`.
    pub mode: String,
    /// Zone id the evaluation is limited to; blank means unrestricted.
    pub zone_limit: String,
    /// Regex of pids the remote service should ignore; blank means none.
    pub ignore_regex: String,
    /// Explicit list of pids to ignore.
    pub ignore_list: Vec<String>,
    /// Compare pids case-insensitively on the remote side.
    pub ignore_case: bool,
    /// Permit entries with an empty pid.
    pub allow_empty_pid: bool,
    /// Cap on user updates per run; negative values clamp to 0.
    pub max_level: i64,
}

/// Normalized synchronization policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// Evaluation mode.
    pub mode: EvaluationMode,
    /// Zone limit, present only when configured non-blank.
    pub zone_limit: Option<String>,
    /// Ignore regex, present only when configured non-blank.
    pub ignore_regex: Option<String>,
    /// Pids to ignore.
    pub ignore_list: Vec<String>,
    /// Case-insensitive pid comparison.
    pub ignore_case: bool,
    /// Permit empty pids.
    pub allow_empty_pid: bool,
    /// Cap on user updates per run.
    pub max_level: u32,
}

impl SyncPolicy {
    /// Encode raw configuration into a normalized policy. Pure.
    #[must_use]
    pub fn from_raw(raw: &RawPolicy) -> Self {
        let non_blank = |value: &str| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        Self {
            mode: EvaluationMode::parse(&raw.mode),
            zone_limit: non_blank(&raw.zone_limit),
            ignore_regex: non_blank(&raw.ignore_regex),
            ignore_list: raw.ignore_list.clone(),
            ignore_case: raw.ignore_case,
            allow_empty_pid: raw.allow_empty_pid,
            max_level: u32::try_from(raw.max_level.max(0)).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_normalizes_case_and_whitespace() {
        assert_eq!(EvaluationMode::parse("  AddRemove "), EvaluationMode::AddRemove);
        assert_eq!(EvaluationMode::parse("ADD"), EvaluationMode::Add);
        assert_eq!(EvaluationMode::parse("remove"), EvaluationMode::Remove);
        assert_eq!(EvaluationMode::parse("test"), EvaluationMode::Test);
    }

    #[test]
    fn mode_parse_defaults_to_test() {
        assert_eq!(EvaluationMode::parse(""), EvaluationMode::Test);
        assert_eq!(EvaluationMode::parse("synchronize"), EvaluationMode::Test);
    }

    #[test]
    fn mode_capabilities() {
        assert!(EvaluationMode::AddRemove.adds());
        assert!(EvaluationMode::AddRemove.removes());
        assert!(EvaluationMode::Add.adds());
        assert!(!EvaluationMode::Add.removes());
        assert!(!EvaluationMode::Test.adds());
        assert!(!EvaluationMode::Test.removes());
    }

    #[test]
    fn from_raw_trims_zone_and_regex() {
        let policy = SyncPolicy::from_raw(&RawPolicy {
            mode: "add".to_string(),
            zone_limit: "  zone-7  ".to_string(),
            ignore_regex: "   ".to_string(),
            ignore_list: vec!["AD-svc".to_string()],
            ignore_case: true,
            allow_empty_pid: false,
            max_level: 5,
        });
        assert_eq!(policy.mode, EvaluationMode::Add);
        assert_eq!(policy.zone_limit.as_deref(), Some("zone-7"));
        assert_eq!(policy.ignore_regex, None);
        assert_eq!(policy.ignore_list, vec!["AD-svc".to_string()]);
        assert_eq!(policy.max_level, 5);
    }

    #[test]
    fn from_raw_clamps_negative_level() {
        let policy = SyncPolicy::from_raw(&RawPolicy {
            max_level: -3,
            ..Default::default()
        });
        assert_eq!(policy.max_level, 0);
        assert_eq!(policy.mode, EvaluationMode::Test);
    }
}
