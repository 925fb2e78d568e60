//! Configuration structures for Grafana clients.
//!
//! [`GrafanaClientConfig`] is the deserializable, validated description of how to reach a
//! Grafana server. It can be loaded from any serde format or from the environment and is
//! turned into a client with
//! [`ServiceClientBuilder::from_config`](crate::client::ServiceClientBuilder::from_config).

use crate::ids::OrgId;
use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the server base URL.
pub const ENV_URL: &str = "GRAFANA_URL";

/// Environment variable holding either `user:password` or an API token.
pub const ENV_AUTH: &str = "GRAFANA_AUTH";

/// Environment variable holding the default organization id.
pub const ENV_ORG_ID: &str = "GRAFANA_ORG_ID";

/// Credential attached to every request.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// API key or service account token, sent as a bearer token.
    Token(SecretString),
    /// HTTP basic authentication.
    Basic {
        /// Login name.
        username: String,
        /// Password.
        password: SecretString,
    },
}

impl Credentials {
    /// Build token credentials.
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SecretString::from(token.into()))
    }

    /// Build basic-auth credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Interpret a `GRAFANA_AUTH` style value: `user:password` selects basic auth,
    /// anything else is a token.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((username, password)) => Self::basic(username, password),
            None => Self::token(value),
        }
    }
}

/// Configuration for a Grafana client instance.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GrafanaClientConfig {
    /// Server base URL, optionally with a sub-path (e.g. `https://example.com/grafana`)
    #[validate(url)]
    pub url: String,

    /// Optional API token
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,

    /// Optional basic-auth login
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,

    /// Organization to act in when a request does not name one
    #[serde(default)]
    pub org_id: Option<OrgId>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Accept only `200 OK` as success (otherwise any 2xx)
    #[serde(default = "default_strict_status")]
    pub strict_status: bool,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_strict_status() -> bool {
    true
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl GrafanaClientConfig {
    /// Create a new client configuration with required parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            url: url.into(),
            api_key: None,
            username: None,
            password: None,
            org_id: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            strict_status: default_strict_status(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Load configuration from `GRAFANA_URL`, `GRAFANA_AUTH` and `GRAFANA_ORG_ID`.
    ///
    /// # Errors
    ///
    /// Returns an error if `GRAFANA_URL` is missing or any value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL variable is missing or any value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Error::ConfigError(format!("{ENV_URL} is not set")))?;

        let mut config = Self::new(url)?;

        if let Some(auth) = lookup(ENV_AUTH).filter(|value| !value.is_empty()) {
            config = config.with_credentials(Credentials::parse(&auth));
        }

        if let Some(org) = lookup(ENV_ORG_ID).filter(|value| !value.trim().is_empty()) {
            let org_id = OrgId::parse_str(&org)
                .map_err(|e| Error::ConfigError(format!("Invalid {ENV_ORG_ID}: {e}")))?;
            config = config.with_org_id(org_id);
        }

        Ok(config)
    }

    /// Set the credentials, replacing any previously configured ones.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        match credentials {
            Credentials::Token(token) => {
                self.api_key = Some(token);
                self.username = None;
                self.password = None;
            }
            Credentials::Basic { username, password } => {
                self.api_key = None;
                self.username = Some(username);
                self.password = Some(password);
            }
        }
        self
    }

    /// Set the default organization.
    #[must_use]
    pub const fn with_org_id(mut self, org_id: OrgId) -> Self {
        self.org_id = Some(org_id);
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Choose between exact `200 OK` and any 2xx as success.
    #[must_use]
    pub const fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_url(&self) -> Result<Url, Error> {
        Url::parse(&self.url).map_err(|e| Error::ConfigError(format!("Invalid Grafana URL: {e}")))
    }

    /// Resolve the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if both a token and a login are set, or if a login has no password.
    pub fn credentials(&self) -> Result<Option<Credentials>, Error> {
        match (&self.api_key, &self.username, &self.password) {
            (Some(_), Some(_), _) => Err(Error::ConfigError(
                "api_key and username are mutually exclusive".to_string(),
            )),
            (Some(token), None, _) => Ok(Some(Credentials::Token(token.clone()))),
            (None, Some(username), Some(password)) => Ok(Some(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            })),
            (None, Some(username), None) => Err(Error::ConfigError(format!(
                "no password configured for user `{username}`"
            ))),
            (None, None, _) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_new_defaults() {
        let config = GrafanaClientConfig::new("http://localhost:3000").unwrap();
        assert!(config.tls_verify);
        assert!(config.strict_status);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.credentials().unwrap().is_none());
    }

    #[test]
    fn test_config_rejects_invalid_url() {
        let err = GrafanaClientConfig::new("not a url").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_config_timeout_range_validated() {
        let config = GrafanaClientConfig::new("http://localhost:3000")
            .unwrap()
            .with_timeout(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup_basic_auth() {
        let config = GrafanaClientConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://grafana.local:3000"),
            (ENV_AUTH, "admin:s3cret"),
            (ENV_ORG_ID, "4"),
        ]))
        .unwrap();

        assert_eq!(config.org_id, Some(OrgId::new(4)));
        match config.credentials().unwrap() {
            Some(Credentials::Basic { username, password }) => {
                assert_eq!(username, "admin");
                assert_eq!(password.expose_secret(), "s3cret");
            }
            other => panic!("expected basic credentials, got {other:?}"),
        }
    }

    #[test]
    fn test_from_lookup_token() {
        let config = GrafanaClientConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://grafana.local:3000"),
            (ENV_AUTH, "glsa_token"),
        ]))
        .unwrap();

        match config.credentials().unwrap() {
            Some(Credentials::Token(token)) => assert_eq!(token.expose_secret(), "glsa_token"),
            other => panic!("expected token credentials, got {other:?}"),
        }
    }

    #[test]
    fn test_from_lookup_requires_url() {
        let err = GrafanaClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, Error::ConfigError("GRAFANA_URL is not set".to_string()));
    }

    #[test]
    fn test_from_lookup_invalid_org_id() {
        let err = GrafanaClientConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://grafana.local:3000"),
            (ENV_ORG_ID, "main"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: GrafanaClientConfig = serde_json::from_value(serde_json::json!({
            "url": "https://example.com/grafana",
            "api_key": "token",
            "org_id": 2,
            "strict_status": false
        }))
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.org_id, Some(OrgId::new(2)));
        assert!(!config.strict_status);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(matches!(
            config.credentials().unwrap(),
            Some(Credentials::Token(_))
        ));
    }

    #[test]
    fn test_credentials_conflicts() {
        let mut config = GrafanaClientConfig::new("http://localhost:3000")
            .unwrap()
            .with_credentials(Credentials::token("t"));
        config.username = Some("admin".to_string());
        assert!(config.credentials().is_err());

        let mut config = GrafanaClientConfig::new("http://localhost:3000").unwrap();
        config.username = Some("admin".to_string());
        assert!(config.credentials().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = GrafanaClientConfig::new("http://localhost:3000")
            .unwrap()
            .with_credentials(Credentials::basic("admin", "hunter2"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("admin"));
    }

    #[test]
    fn test_credentials_parse() {
        assert!(matches!(
            Credentials::parse("user:pass"),
            Credentials::Basic { .. }
        ));
        assert!(matches!(Credentials::parse("abc123"), Credentials::Token(_)));
    }
}
