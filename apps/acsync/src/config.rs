//! Run configuration from environment variables.
//!
//! Every knob of a run lives here as one immutable struct, loaded once in
//! `main` and passed down explicitly.

use acsync_core::{BackPropagation, RawPolicy, SourcePlan};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// LDAP directory settings.
#[derive(Debug, Clone)]
pub struct LdapSettings {
    /// Directory host.
    pub host: String,
    /// Directory port.
    pub port: u16,
    /// Use LDAPS.
    pub use_tls: bool,
    /// Bind DN.
    pub bind_dn: String,
    /// Bind password.
    pub bind_password: String,
    /// Search base.
    pub base_dn: String,
    /// Attribute holding the staff-number cross-reference.
    pub staff_number_attribute: String,
    /// Attribute holding the card identifier.
    pub card_attribute: String,
}

/// SMTP notification settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    pub port: u16,
    /// Optional SMTP credentials.
    pub username: Option<String>,
    /// Optional SMTP credentials.
    pub password: Option<String>,
    /// From address.
    pub from: String,
}

/// Complete configuration of one synchronization run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory group whose members are synchronized.
    pub group: String,
    /// Keep disabled directory accounts in the roster.
    pub include_disabled: bool,

    /// Staff filter values, one list per category, in precedence order.
    pub job_title_ids: Vec<String>,
    pub job_title_names: Vec<String>,
    pub org_ids: Vec<String>,
    pub org_names: Vec<String>,
    pub pay_classes: Vec<String>,

    /// Abort when no source produced any candidate.
    pub fail_on_empty: bool,

    /// Remote synchronization endpoint.
    pub sync_url: String,
    /// Remote card query endpoint.
    pub query_url: String,
    /// Remote basic-auth user name.
    pub username: String,
    /// Remote basic-auth password.
    pub password: String,

    /// Evaluation mode string, normalized by the policy encoder.
    pub mode: String,
    /// Zone limit.
    pub zone_limit: String,
    /// Pid ignore regex; verified to compile at load time.
    pub ignore_regex: String,
    /// Explicit pid ignore list.
    pub ignore_list: Vec<String>,
    /// Case-insensitive pid comparison on the remote side.
    pub ignore_case: bool,
    /// Permit entries with an empty pid.
    pub allow_empty_pid: bool,
    /// Cap on user updates per run.
    pub max_level: i64,

    /// Write remote card values to directory accounts.
    pub card_write_directory: bool,
    /// Overwrite non-blank directory cards.
    pub card_override_directory: bool,
    /// Write remote card values to staff records.
    pub card_write_staff: bool,
    /// Overwrite non-blank staff cards.
    pub card_override_staff: bool,

    /// Send the run notification.
    pub mail_enabled: bool,
    /// Notification recipients.
    pub mail_to: Vec<String>,
    /// Notification subject.
    pub mail_subject: String,
    /// SMTP settings.
    pub smtp: SmtpSettings,

    /// LDAP settings.
    pub ldap: LdapSettings,
    /// Staff directory database URL.
    pub staff_database_url: String,
}

impl RunConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Lets tests supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let required =
            |key: &str| reader(key).map_err(|_| ConfigError::MissingVar(key.to_string()));
        let or_default = |key: &str, default: &str| reader(key).unwrap_or_else(|_| default.to_string());
        let flag = |key: &str, default: bool| {
            reader(key)
                .ok()
                .and_then(|v| v.trim().parse::<bool>().ok())
                .unwrap_or(default)
        };
        let list = |key: &str| {
            reader(key)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        let group = required("ACSYNC_GROUP")?;

        let max_level = or_default("ACSYNC_MAX_LEVEL", "5")
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidValue("ACSYNC_MAX_LEVEL".into(), e.to_string()))?;

        let ignore_regex = or_default("ACSYNC_IGNORE_REGEX", "");
        if !ignore_regex.trim().is_empty() {
            regex::Regex::new(ignore_regex.trim()).map_err(|e| {
                ConfigError::InvalidValue("ACSYNC_IGNORE_REGEX".into(), e.to_string())
            })?;
        }

        let smtp_port = or_default("ACSYNC_SMTP_PORT", "25")
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("ACSYNC_SMTP_PORT".into(), e.to_string()))?;

        let ldap_port = or_default("ACSYNC_LDAP_PORT", "389")
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("ACSYNC_LDAP_PORT".into(), e.to_string()))?;

        Ok(Self {
            group,
            include_disabled: flag("ACSYNC_INCLUDE_DISABLED", false),
            job_title_ids: list("ACSYNC_SOFD_JOB_TITLE_IDS"),
            job_title_names: list("ACSYNC_SOFD_JOB_TITLE_NAMES"),
            org_ids: list("ACSYNC_SOFD_ORG_IDS"),
            org_names: list("ACSYNC_SOFD_ORG_NAMES"),
            pay_classes: list("ACSYNC_SOFD_PAY_CLASSES"),
            fail_on_empty: flag("ACSYNC_FAIL_ON_EMPTY", true),
            sync_url: or_default(
                "ACSYNC_SYNC_URL",
                "https://acct.example/rest/current/users/synchronize",
            ),
            query_url: or_default("ACSYNC_QUERY_URL", "https://acct.example/rest/current/users"),
            username: or_default("ACSYNC_USERNAME", ""),
            password: or_default("ACSYNC_PASSWORD", ""),
            mode: or_default("ACSYNC_MODE", "test"),
            zone_limit: or_default("ACSYNC_ZONE_LIMIT", ""),
            ignore_regex,
            ignore_list: list("ACSYNC_IGNORE_LIST"),
            ignore_case: flag("ACSYNC_IGNORE_CASE", true),
            allow_empty_pid: flag("ACSYNC_ALLOW_EMPTY_PID", false),
            max_level,
            card_write_directory: flag("ACSYNC_CARD_WRITE_AD", false),
            card_override_directory: flag("ACSYNC_CARD_OVERRIDE_AD", false),
            card_write_staff: flag("ACSYNC_CARD_WRITE_SOFD", false),
            card_override_staff: flag("ACSYNC_CARD_OVERRIDE_SOFD", false),
            mail_enabled: flag("ACSYNC_MAIL_ENABLED", true),
            mail_to: list("ACSYNC_MAIL_TO"),
            mail_subject: or_default("ACSYNC_MAIL_SUBJECT", "Access control synchronization"),
            smtp: SmtpSettings {
                host: or_default("ACSYNC_SMTP_HOST", "localhost"),
                port: smtp_port,
                username: reader("ACSYNC_SMTP_USERNAME").ok(),
                password: reader("ACSYNC_SMTP_PASSWORD").ok(),
                from: or_default("ACSYNC_MAIL_FROM", "acsync@localhost"),
            },
            ldap: LdapSettings {
                host: or_default("ACSYNC_LDAP_HOST", "localhost"),
                port: ldap_port,
                use_tls: flag("ACSYNC_LDAP_TLS", false),
                bind_dn: or_default("ACSYNC_LDAP_BIND_DN", ""),
                bind_password: or_default("ACSYNC_LDAP_BIND_PASSWORD", ""),
                base_dn: required("ACSYNC_LDAP_BASE_DN")?,
                staff_number_attribute: or_default("ACSYNC_LDAP_STAFF_NUMBER_ATTR", "employeeNumber"),
                card_attribute: or_default("ACSYNC_LDAP_CARD_ATTR", "pager"),
            },
            staff_database_url: required("ACSYNC_SOFD_DATABASE_URL")?,
        })
    }

    /// The ordered source plan for this run.
    #[must_use]
    pub fn source_plan(&self) -> SourcePlan {
        SourcePlan {
            group: self.group.clone(),
            include_disabled: self.include_disabled,
            filters: SourcePlan::staff_filters(
                &self.job_title_ids,
                &self.job_title_names,
                &self.org_ids,
                &self.org_names,
                &self.pay_classes,
            ),
            fail_on_empty: self.fail_on_empty,
        }
    }

    /// Raw policy values for the encoder.
    #[must_use]
    pub fn raw_policy(&self) -> RawPolicy {
        RawPolicy {
            mode: self.mode.clone(),
            zone_limit: self.zone_limit.clone(),
            ignore_regex: self.ignore_regex.clone(),
            ignore_list: self.ignore_list.clone(),
            ignore_case: self.ignore_case,
            allow_empty_pid: self.allow_empty_pid,
            max_level: self.max_level,
        }
    }

    /// Back-propagation toggles.
    #[must_use]
    pub fn backprop(&self) -> BackPropagation {
        BackPropagation {
            write_directory: self.card_write_directory,
            override_directory: self.card_override_directory,
            write_staff: self.card_write_staff,
            override_staff: self.card_override_staff,
        }
    }
}
