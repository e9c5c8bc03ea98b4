//! LDAP-backed directory client.
//!
//! Resolves the configured group to its DN, enumerates members, and reads
//! and writes the card attribute. Account state (enabled) comes from the
//! `userAccountControl` disable bit.

use std::collections::HashSet;

use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use acsync_core::{DirectoryClient, DirectoryMember, SourceError};

use crate::config::LdapSettings;

const ACCOUNT_DISABLED: u32 = 0x2;

const MEMBER_ATTRS: [&str; 4] = [
    "sAMAccountName",
    "displayName",
    "telephoneNumber",
    "userAccountControl",
];

/// Directory client over an LDAP connection.
pub struct LdapDirectory {
    settings: LdapSettings,
    /// Cached connection, lazily established.
    connection: RwLock<Option<Ldap>>,
}

impl LdapDirectory {
    /// Create a directory client; the connection is established on first
    /// use.
    #[must_use]
    pub fn new(settings: LdapSettings) -> Self {
        Self {
            settings,
            connection: RwLock::new(None),
        }
    }

    async fn get_connection(&self) -> Result<Ldap, SourceError> {
        {
            let guard = self.connection.read().await;
            if let Some(ldap) = guard.as_ref() {
                return Ok(ldap.clone());
            }
        }

        let ldap = self.connect().await?;

        let mut guard = self.connection.write().await;
        *guard = Some(ldap.clone());
        Ok(ldap)
    }

    async fn connect(&self) -> Result<Ldap, SourceError> {
        let scheme = if self.settings.use_tls { "ldaps" } else { "ldap" };
        let url = format!("{scheme}://{}:{}", self.settings.host, self.settings.port);
        debug!(%url, "connecting to directory");

        let conn_settings = LdapConnSettings::new();
        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
            .await
            .map_err(|e| {
                SourceError::backend_with_source(format!("failed to connect to {url}"), e)
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "directory connection driver error");
            }
        });

        ldap.simple_bind(&self.settings.bind_dn, &self.settings.bind_password)
            .await
            .map_err(|e| SourceError::backend_with_source("directory bind failed", e))?
            .success()
            .map_err(|e| SourceError::backend_with_source("directory bind rejected", e))?;

        Ok(ldap)
    }

    fn member_attrs(&self) -> Vec<String> {
        let mut attrs: Vec<String> = MEMBER_ATTRS.iter().map(|a| (*a).to_string()).collect();
        attrs.push(self.settings.staff_number_attribute.clone());
        attrs.push(self.settings.card_attribute.clone());
        attrs
    }

    /// Resolve the DN of a group by name.
    async fn group_dn(&self, group: &str) -> Result<Option<String>, SourceError> {
        let mut ldap = self.get_connection().await?;
        let filter = format!("(&(objectClass=group)(cn={}))", ldap_escape(group));
        let (entries, _) = ldap
            .search(
                &self.settings.base_dn,
                Scope::Subtree,
                &filter,
                vec!["cn"],
            )
            .await
            .map_err(|e| SourceError::backend_with_source("group search failed", e))?
            .success()
            .map_err(|e| SourceError::backend_with_source("group search rejected", e))?;

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| SearchEntry::construct(entry).dn))
    }

    /// Search for user entries matching a filter.
    async fn search_users(&self, filter: &str) -> Result<Vec<SearchEntry>, SourceError> {
        let mut ldap = self.get_connection().await?;
        let (entries, _) = ldap
            .search(
                &self.settings.base_dn,
                Scope::Subtree,
                filter,
                self.member_attrs(),
            )
            .await
            .map_err(|e| SourceError::backend_with_source("user search failed", e))?
            .success()
            .map_err(|e| SourceError::backend_with_source("user search rejected", e))?;

        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }

    fn to_member(&self, entry: &SearchEntry) -> Option<DirectoryMember> {
        let account = attr_first(entry, "sAMAccountName")?;
        let enabled = attr_first(entry, "userAccountControl")
            .and_then(|v| v.parse::<u32>().ok())
            .map_or(true, |uac| uac & ACCOUNT_DISABLED == 0);

        Some(DirectoryMember {
            account,
            display_name: attr_first(entry, "displayName").unwrap_or_default(),
            phone: attr_first(entry, "telephoneNumber"),
            enabled,
            staff_number: attr_first(entry, &self.settings.staff_number_attribute),
            card: attr_first(entry, &self.settings.card_attribute),
        })
    }

    async fn find_entry(&self, account: &str) -> Result<Option<SearchEntry>, SourceError> {
        let filter = format!(
            "(&(objectClass=user)(sAMAccountName={}))",
            ldap_escape(account)
        );
        Ok(self.search_users(&filter).await?.into_iter().next())
    }
}

fn attr_first(entry: &SearchEntry, attribute: &str) -> Option<String> {
    entry
        .attrs
        .get(attribute)
        .and_then(|values| values.first())
        .map(|v| v.to_string())
}

#[async_trait]
impl DirectoryClient for LdapDirectory {
    async fn group_members(&self, group: &str) -> Result<Vec<DirectoryMember>, SourceError> {
        let Some(dn) = self.group_dn(group).await? else {
            return Err(SourceError::GroupNotFound {
                group: group.to_string(),
            });
        };

        let filter = format!("(&(objectClass=user)(memberOf={}))", ldap_escape(&dn));
        let entries = self.search_users(&filter).await?;
        Ok(entries
            .iter()
            .filter_map(|entry| self.to_member(entry))
            .collect())
    }

    async fn find_member(&self, account: &str) -> Result<Option<DirectoryMember>, SourceError> {
        Ok(self
            .find_entry(account)
            .await?
            .as_ref()
            .and_then(|entry| self.to_member(entry)))
    }

    async fn write_card(&self, account: &str, card: &str) -> Result<(), SourceError> {
        let entry = self.find_entry(account).await?.ok_or_else(|| {
            SourceError::backend(format!("account '{account}' disappeared before card write"))
        })?;

        let mut ldap = self.get_connection().await?;
        ldap.modify(
            &entry.dn,
            vec![Mod::Replace(
                self.settings.card_attribute.clone(),
                HashSet::from([card.to_string()]),
            )],
        )
        .await
        .map_err(|e| SourceError::backend_with_source("card modify failed", e))?
        .success()
        .map_err(|e| SourceError::backend_with_source("card modify rejected", e))?;

        debug!(account, card, "wrote card attribute to directory");
        Ok(())
    }
}
