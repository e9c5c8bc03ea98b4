//! REST client for the remote access-control service.
//!
//! Transport only: pushes the roster, queries card state, and turns any
//! non-success response into a verbatim [`SyncFailure`] envelope. Retry is
//! deliberately absent; the host re-triggers whole runs instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use tracing::debug;

use acsync_core::{RemoteCardRecord, RemoteSyncClient, Roster, SyncFailure, SyncOutcome, SyncPolicy};

use crate::config::{RemoteConfig, RemoteError};
use crate::wire::{EvaluateUserCollection, EvaluateUserCollectionResult, UserDataCollection};

/// Remote sync client over HTTP with basic authentication.
pub struct RestRemote {
    config: RemoteConfig,
    client: Client,
}

impl std::fmt::Debug for RestRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemote")
            .field("sync_url", &self.config.sync_url.as_str())
            .field("username", &self.config.username)
            .finish()
    }
}

impl RestRemote {
    /// Create a client for a validated configuration.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self { config, client })
    }

    /// Capture the error envelope of a non-success response.
    async fn failure_from(response: Response) -> SyncFailure {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.text().await.unwrap_or_default();

        SyncFailure {
            status: Some(status.as_u16()),
            description: status.canonical_reason().unwrap_or_default().to_string(),
            body,
            headers,
        }
    }

    /// Envelope for a request that never produced a response.
    fn transport_failure(error: &reqwest::Error) -> SyncFailure {
        SyncFailure {
            status: error.status().map(|s| s.as_u16()),
            description: error.to_string(),
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// Envelope for a success response whose body did not parse.
    fn decode_failure(status: u16, message: String, body: String) -> SyncFailure {
        SyncFailure {
            status: Some(status),
            description: message,
            body,
            headers: Vec::new(),
        }
    }
}

#[async_trait]
impl RemoteSyncClient for RestRemote {
    async fn push(
        &self,
        roster: &Roster,
        policy: &SyncPolicy,
    ) -> Result<SyncOutcome, SyncFailure> {
        let request = EvaluateUserCollection::encode(roster, policy);
        let xml = quick_xml::se::to_string(&request).map_err(|e| SyncFailure {
            status: None,
            description: format!("failed to encode request: {e}"),
            body: String::new(),
            headers: Vec::new(),
        })?;

        debug!(
            url = %self.config.sync_url,
            users = roster.len(),
            flags = %request.evaluation_type,
            "pushing roster"
        );

        let response = self
            .client
            .put(self.config.sync_url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(header::CONTENT_TYPE, "text/xml")
            .header(header::ACCEPT, "application/xml, text/xml")
            .body(xml)
            .send()
            .await
            .map_err(|e| Self::transport_failure(&e))?;

        if !response.status().is_success() {
            return Err(Self::failure_from(response).await);
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_failure(&e))?;
        let result: EvaluateUserCollectionResult = quick_xml::de::from_str(&body)
            .map_err(|e| {
                Self::decode_failure(status, format!("unparsable response body: {e}"), body.clone())
            })?;

        Ok(result.into_outcome())
    }

    async fn query_cards(&self) -> Result<Vec<RemoteCardRecord>, SyncFailure> {
        debug!(url = %self.config.query_url, "querying remote card state");

        let response = self
            .client
            .get(self.config.query_url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(header::ACCEPT, "application/xml, text/xml")
            .send()
            .await
            .map_err(|e| Self::transport_failure(&e))?;

        if !response.status().is_success() {
            return Err(Self::failure_from(response).await);
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_failure(&e))?;
        let collection: UserDataCollection = quick_xml::de::from_str(&body).map_err(|e| {
            Self::decode_failure(status, format!("unparsable response body: {e}"), body.clone())
        })?;

        Ok(collection
            .users
            .into_iter()
            .filter_map(|user| {
                let card = user.card?;
                Some(RemoteCardRecord {
                    pid: user.pid,
                    card,
                })
            })
            .collect())
    }
}
