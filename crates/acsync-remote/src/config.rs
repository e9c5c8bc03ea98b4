//! Remote service connection configuration.

use thiserror::Error;
use url::Url;

/// Configuration error for the remote connection.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A configured URL does not parse.
    #[error("invalid remote URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Credentials contain non-ASCII characters. HTTP basic auth over this
    /// protocol carries ASCII only; this is a configuration error, not a
    /// retry condition.
    #[error("username and password may only contain ASCII characters")]
    NonAsciiCredentials,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

/// Connection settings for the remote access-control service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Synchronization endpoint (roster push, PUT).
    pub sync_url: Url,
    /// Card query endpoint (GET).
    pub query_url: Url,
    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Parse and validate the remote configuration.
    pub fn new(
        sync_url: &str,
        query_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| RemoteError::InvalidUrl {
                url: raw.to_string(),
                message: e.to_string(),
            })
        };
        let config = Self {
            sync_url: parse(sync_url)?,
            query_url: parse(query_url)?,
            username: username.into(),
            password: password.into(),
            timeout_secs: 30,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check invariants the transport relies on.
    pub fn validate(&self) -> Result<(), RemoteError> {
        if !self.username.is_ascii() || !self.password.is_ascii() {
            return Err(RemoteError::NonAsciiCredentials);
        }
        Ok(())
    }

    /// Host portion of the sync endpoint, for report echoes.
    #[must_use]
    pub fn host(&self) -> String {
        self.sync_url.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_urls() {
        let config = RemoteConfig::new(
            "https://acct.example/rest/current/users/synchronize",
            "https://acct.example/rest/current/users",
            "svc",
            "secret",
        )
        .unwrap();
        assert_eq!(config.sync_url.path(), "/rest/current/users/synchronize");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn rejects_malformed_url() {
        let err = RemoteConfig::new("not a url", "https://acct.example/users", "svc", "secret")
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_non_ascii_credentials() {
        let err = RemoteConfig::new(
            "https://acct.example/sync",
            "https://acct.example/users",
            "svc",
            "hemmeligt-kodeord-ø",
        )
        .unwrap_err();
        assert!(matches!(err, RemoteError::NonAsciiCredentials));

        let err = RemoteConfig::new(
            "https://acct.example/sync",
            "https://acct.example/users",
            "særlig",
            "secret",
        )
        .unwrap_err();
        assert!(matches!(err, RemoteError::NonAsciiCredentials));
    }
}
