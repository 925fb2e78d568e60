//! Asynchronous annotation client implementation.

use crate::models::{Annotation, AnnotationListParams, GraphiteAnnotation};
use crate::Result;
use grafana_core::client::{execute_json, ApiRequest, ClientConfig, Executor};
use grafana_core::config::GrafanaClientConfig;
use grafana_core::ids::{AnnotationId, OrgId, RegionId};
use grafana_core::types::{IdResponse, MessageResponse};
use grafana_core::{Error, ServiceClient, ServiceClientBuilder, StatusPolicy};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("grafana-annotations/", env!("CARGO_PKG_VERSION"));

/// Builder for [`AnnotationClient`].
#[derive(Debug, Clone)]
pub struct AnnotationClientBuilder {
    inner: ServiceClientBuilder,
}

impl AnnotationClientBuilder {
    /// Create a builder for the specified base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder = ServiceClientBuilder::new(base_url)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Create a builder from a loaded configuration.
    pub fn from_config(config: &GrafanaClientConfig) -> Result<Self> {
        let builder = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Override which statuses count as success.
    #[must_use]
    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.inner = self.inner.with_status_policy(policy);
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.inner = self.inner.with_basic_auth(username, password);
        self
    }

    /// Configure a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Act in the given organization.
    #[must_use]
    pub fn with_org_id(mut self, org_id: OrgId) -> Self {
        self.inner = self.inner.with_org_id(org_id);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AnnotationClient> {
        let inner = self.inner.build()?;
        Ok(AnnotationClient { inner })
    }
}

/// Asynchronous client for `/api/annotations`.
///
/// Every method issues exactly one request through the executor `E`.
#[derive(Debug, Clone)]
pub struct AnnotationClient<E = ServiceClient> {
    inner: E,
}

impl AnnotationClient {
    /// Construct an unauthenticated client directly from the base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        AnnotationClientBuilder::new(base_url)?.build()
    }

    /// Start a builder for the base URL.
    pub fn builder(base_url: impl AsRef<str>) -> Result<AnnotationClientBuilder> {
        AnnotationClientBuilder::new(base_url)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }
}

impl<E> AnnotationClient<E>
where
    E: Executor,
{
    /// Wrap an existing executor, e.g. a [`ServiceClient`] shared with other resource clients.
    pub const fn with_executor(inner: E) -> Self {
        Self { inner }
    }

    /// Access the underlying executor.
    pub const fn executor(&self) -> &E {
        &self.inner
    }

    /// List annotations matching `params`.
    pub async fn annotations(&self, params: &AnnotationListParams) -> Result<Vec<Annotation>> {
        self.send_json(ApiRequest::get("api/annotations").with_query(params.to_query()))
            .await
    }

    /// Fetch one annotation by id.
    ///
    /// Grafana has no single-annotation endpoint, so this lists annotations matching
    /// `params` and scans for `id`. Each call issues a fresh list request.
    pub async fn annotation(
        &self,
        id: AnnotationId,
        params: &AnnotationListParams,
    ) -> Result<Annotation> {
        let annotations = self.annotations(params).await?;
        let scanned = annotations.len();

        annotations
            .into_iter()
            .find(|annotation| annotation.id == Some(id))
            .ok_or_else(|| {
                debug!(%id, scanned, "annotation missing from listing");
                Error::NotFound(format!("annotation {id} not found"))
            })
    }

    /// Create an annotation and return its id.
    pub async fn new_annotation(&self, annotation: &Annotation) -> Result<AnnotationId> {
        let request = ApiRequest::post("api/annotations").with_json(annotation)?;
        let created: IdResponse<AnnotationId> = self.send_json(request).await?;
        Ok(created.id)
    }

    /// Create an annotation in Graphite event format and return its id.
    pub async fn new_graphite_annotation(
        &self,
        annotation: &GraphiteAnnotation,
    ) -> Result<AnnotationId> {
        let request = ApiRequest::post("api/annotations/graphite").with_json(annotation)?;
        let created: IdResponse<AnnotationId> = self.send_json(request).await?;
        Ok(created.id)
    }

    /// Replace every property of an existing annotation.
    pub async fn update_annotation(
        &self,
        id: AnnotationId,
        annotation: &Annotation,
    ) -> Result<String> {
        let request = ApiRequest::put(format!("api/annotations/{id}")).with_json(annotation)?;
        self.send_message(request).await
    }

    /// Update the properties of an existing annotation that are set in `annotation`.
    pub async fn patch_annotation(
        &self,
        id: AnnotationId,
        annotation: &Annotation,
    ) -> Result<String> {
        let request = ApiRequest::patch(format!("api/annotations/{id}")).with_json(annotation)?;
        self.send_message(request).await
    }

    /// Delete an annotation.
    pub async fn delete_annotation(&self, id: AnnotationId) -> Result<String> {
        self.send_message(ApiRequest::delete(format!("api/annotations/{id}")))
            .await
    }

    /// Delete both ends of a region annotation.
    pub async fn delete_annotation_by_region_id(&self, id: RegionId) -> Result<String> {
        self.send_message(ApiRequest::delete(format!("api/annotations/region/{id}")))
            .await
    }

    async fn send_message(&self, request: ApiRequest) -> Result<String> {
        let response: MessageResponse = self.send_json(request).await?;
        Ok(response.message)
    }

    async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
    where
        R: DeserializeOwned,
    {
        execute_json(&self.inner, request).await
    }
}
