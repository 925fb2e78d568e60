//! HTTP transport settings and the shared request executor.
//!
//! Every resource call is an [`ApiRequest`] handed to an [`Executor`]. The production
//! executor is [`ServiceClient`], a thin layer over `reqwest` that joins the path onto the
//! configured base URL, attaches credentials, sends the request once and applies the
//! [`StatusPolicy`]. There are no retries.

use crate::config::{Credentials, GrafanaClientConfig};
use crate::error::{Error, Result};
use crate::ids::OrgId;
use crate::query::QueryParams;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Header selecting the organization a request acts in.
pub const ORG_ID_HEADER: &str = "X-Grafana-Org-Id";

const USER_AGENT: &str = concat!("grafana-core/", env!("CARGO_PKG_VERSION"));

/// Rule deciding which HTTP statuses count as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Only `200 OK` is accepted. 201 and 204 are reported as errors.
    #[default]
    ExactOk,
    /// Any 2xx status is accepted.
    AnySuccess,
}

impl StatusPolicy {
    /// Returns true if `status` is a success under this policy.
    #[must_use]
    pub fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::ExactOk => status == StatusCode::OK,
            Self::AnySuccess => status.is_success(),
        }
    }
}

/// HTTP client configuration.
///
/// Configures timeouts, connection pooling, TLS and status handling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Which statuses count as success
    pub status_policy: StatusPolicy,

    /// Verify TLS certificates
    pub tls_verify: bool,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            status_policy: StatusPolicy::ExactOk,
            tls_verify: true,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the status policy.
    #[must_use]
    pub const fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A single call against the Grafana API, relative to the client's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
    headers: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request for `path`, which is resolved against the base URL.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Shorthand for a `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Shorthand for a `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Shorthand for a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a path segment that is percent-encoded when the URL is built.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append query parameters.
    #[must_use]
    pub fn with_query(mut self, params: QueryParams) -> Self {
        self.query.extend(params.into_pairs());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if the value cannot be encoded.
    pub fn with_json<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let bytes =
            serde_json::to_vec(body).map_err(|err| Error::SerializationError(err.to_string()))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Unencoded trailing path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Query pairs in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(&'static str, String)] {
        &self.query
    }

    /// Look up a request header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// JSON payload, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Sends an [`ApiRequest`] and returns the body of an accepted response.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Issue the request exactly once.
    ///
    /// # Errors
    ///
    /// Transport failures and statuses rejected by the status policy.
    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>>;
}

#[async_trait]
impl<E> Executor for Arc<E>
where
    E: Executor + ?Sized,
{
    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>> {
        (**self).execute(request).await
    }
}

/// Execute `request` and decode the response body as JSON.
///
/// # Errors
///
/// Executor errors unchanged, or [`Error::ParseError`] for a body that does not match `R`.
pub async fn execute_json<E, R>(executor: &E, request: ApiRequest) -> Result<R>
where
    E: Executor + ?Sized,
    R: DeserializeOwned,
{
    let body = executor.execute(request).await?;
    serde_json::from_slice(&body).map_err(Error::from)
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    base_url: Url,
    http_config: ClientConfig,
    credentials: Option<Credentials>,
    org_id: Option<OrgId>,
    user_agent: String,
    ca_cert: Option<PathBuf>,
}

impl ServiceClientBuilder {
    /// Create a builder for the specified base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry a path.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            http_config: ClientConfig::new(),
            credentials: None,
            org_id: None,
            user_agent: USER_AGENT.to_string(),
            ca_cert: None,
        })
    }

    /// Create a builder from a validated [`GrafanaClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &GrafanaClientConfig) -> Result<Self> {
        validator::Validate::validate(config)?;

        let status_policy = if config.strict_status {
            StatusPolicy::ExactOk
        } else {
            StatusPolicy::AnySuccess
        };
        let http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_tls_verify(config.tls_verify)
            .with_status_policy(status_policy);

        let mut builder = Self::new(config.parse_url()?.as_str())?.with_http_config(http_config);
        builder.credentials = config.credentials()?;
        builder.org_id = config.org_id;
        builder.ca_cert.clone_from(&config.tls_ca_cert);
        Ok(builder)
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the status policy.
    #[must_use]
    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.http_config.status_policy = policy;
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::basic(username, password));
        self
    }

    /// Configure a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::token(token));
        self
    }

    /// Configure credentials directly.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Send `X-Grafana-Org-Id` on every request that does not set it itself.
    #[must_use]
    pub fn with_org_id(mut self, org_id: OrgId) -> Self {
        self.org_id = Some(org_id);
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Trust an additional PEM encoded CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.ca_cert = Some(path);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate cannot be loaded or the HTTP client cannot be built.
    pub fn build(self) -> Result<ServiceClient> {
        let config = self.http_config;

        let mut builder = ClientBuilder::new()
            .user_agent(self.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .gzip(config.enable_compression);

        if !config.tls_verify {
            warn!(base_url = %self.base_url, "TLS verification disabled for Grafana client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.ca_cert {
            debug!("loading Grafana CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(ServiceClient {
            http,
            base_url: self.base_url,
            credentials: self.credentials,
            org_id: self.org_id,
            config,
        })
    }
}

/// Reqwest-backed [`Executor`].
///
/// Cloning is cheap and shares the connection pool. Nothing is mutated after
/// construction, so one client can serve any number of concurrent tasks.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    org_id: Option<OrgId>,
    config: ClientConfig,
}

impl ServiceClient {
    /// Construct an unauthenticated client for the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        ServiceClientBuilder::new(base_url)?.build()
    }

    /// Start a builder for the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn builder(base_url: impl AsRef<str>) -> Result<ServiceClientBuilder> {
        ServiceClientBuilder::new(base_url)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the HTTP configuration.
    #[must_use]
    pub fn http_config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url> {
        let path = request.path().trim_start_matches('/');
        let mut url = self.base_url.join(path).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid Grafana path `{path}`: {err}"))
        })?;

        if !request.segments().is_empty() {
            url.path_segments_mut()
                .map_err(|()| {
                    Error::InvalidEndpoint(format!("Base URL `{}` cannot carry a path", self.base_url))
                })?
                .pop_if_empty()
                .extend(request.segments());
        }

        Ok(url)
    }
}

#[async_trait]
impl Executor for ServiceClient {
    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let url = self.build_url(&request)?;
        let ApiRequest {
            method,
            path,
            query,
            headers,
            body,
            ..
        } = request;

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");

        if !query.is_empty() {
            builder = builder.query(&query);
        }

        builder = match &self.credentials {
            Some(Credentials::Token(token)) => builder.bearer_auth(token.expose_secret()),
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            None => builder,
        };

        if let Some(org_id) = self.org_id {
            let overridden = headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(ORG_ID_HEADER));
            if !overridden {
                builder = builder.header(ORG_ID_HEADER, org_id.to_string());
            }
        }

        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        if self.config.enable_logging {
            debug!(%method, %path, "Sending Grafana request");
        }

        let response = builder.send().await?;
        let status = response.status();

        if !self.config.status_policy.accepts(status) {
            if self.config.enable_logging {
                debug!(%method, %path, %status, "Grafana request rejected");
            }
            return Err(Error::from_status(status));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid base URL `{raw}`: {err}")))?;

    if url.cannot_be_a_base() {
        return Err(Error::InvalidEndpoint(format!(
            "Base URL `{raw}` cannot carry a path"
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
