//! Asynchronous organization client implementation.

use crate::models::{
    AddOrgUserRequest, CreateOrgRequest, CreateOrgResponse, DashboardSearchHit, DataSource, Org,
    OrgUsers,
};
use crate::Result;
use grafana_core::client::{execute_json, ApiRequest, ClientConfig, Executor, ORG_ID_HEADER};
use grafana_core::config::GrafanaClientConfig;
use grafana_core::ids::{OrgId, UserId};
use grafana_core::query::QueryParams;
use grafana_core::{ServiceClient, ServiceClientBuilder, StatusPolicy};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("grafana-orgs/", env!("CARGO_PKG_VERSION"));

/// Builder for [`OrgClient`].
#[derive(Debug, Clone)]
pub struct OrgClientBuilder {
    inner: ServiceClientBuilder,
}

impl OrgClientBuilder {
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
    ///
    /// Most organization endpoints require a server admin, which API tokens cannot be.
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

    /// Act in the given organization when a request does not name one.
    #[must_use]
    pub fn with_org_id(mut self, org_id: OrgId) -> Self {
        self.inner = self.inner.with_org_id(org_id);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<OrgClient> {
        let inner = self.inner.build()?;
        Ok(OrgClient { inner })
    }
}

/// Asynchronous client for `/api/orgs` and the org-scoped listings.
#[derive(Debug, Clone)]
pub struct OrgClient<E = ServiceClient> {
    inner: E,
}

impl OrgClient {
    /// Construct an unauthenticated client directly from the base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        OrgClientBuilder::new(base_url)?.build()
    }

    /// Start a builder for the base URL.
    pub fn builder(base_url: impl AsRef<str>) -> Result<OrgClientBuilder> {
        OrgClientBuilder::new(base_url)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }
}

impl<E> OrgClient<E>
where
    E: Executor,
{
    /// Wrap an existing executor.
    pub const fn with_executor(inner: E) -> Self {
        Self { inner }
    }

    /// Access the underlying executor.
    pub const fn executor(&self) -> &E {
        &self.inner
    }

    /// Fetch an organization by id.
    pub async fn org(&self, id: OrgId) -> Result<Org> {
        self.send_json(ApiRequest::get(format!("api/orgs/{id}")))
            .await
    }

    /// Fetch an organization by name.
    pub async fn org_by_name(&self, name: &str) -> Result<Org> {
        self.send_json(ApiRequest::get("api/orgs/name").with_segment(name))
            .await
    }

    /// List every organization.
    pub async fn orgs(&self) -> Result<Vec<Org>> {
        self.send_json(ApiRequest::get("api/orgs")).await
    }

    /// Create an organization.
    pub async fn new_org(&self, name: &str) -> Result<Org> {
        let request = ApiRequest::post("api/orgs").with_json(&CreateOrgRequest {
            name: name.to_string(),
        })?;
        let created: CreateOrgResponse = self.send_json(request).await?;
        debug!(org_id = %created.org_id, name, "organization created");

        Ok(Org {
            id: created.org_id,
            name: name.to_string(),
        })
    }

    /// Delete an organization. The response body is ignored.
    pub async fn delete_org(&self, id: OrgId) -> Result<()> {
        self.send(ApiRequest::delete(format!("api/orgs/{id}")))
            .await
    }

    /// List the members of an organization.
    pub async fn org_users(&self, id: OrgId) -> Result<OrgUsers> {
        self.send_json(ApiRequest::get(format!("api/orgs/{id}/users")))
            .await
    }

    /// Add an existing user to an organization.
    ///
    /// `role` must be exactly `Admin`, `Editor` or `Viewer`; anything else is
    /// rejected before a request is made.
    pub async fn add_org_user(&self, id: OrgId, login_or_email: &str, role: &str) -> Result<()> {
        let body = AddOrgUserRequest {
            role: role.parse()?,
            login_or_email: login_or_email.to_string(),
        };
        body.validate()?;

        let request = ApiRequest::post(format!("api/orgs/{id}/users")).with_json(&body)?;
        self.send(request).await
    }

    /// Remove a user from an organization.
    pub async fn remove_org_user(&self, id: OrgId, user_id: UserId) -> Result<()> {
        self.send(ApiRequest::delete(format!("api/orgs/{id}/users/{user_id}")))
            .await
    }

    /// List the datasources of an organization.
    pub async fn data_sources_by_org_id(&self, id: OrgId) -> Result<Vec<DataSource>> {
        let request =
            ApiRequest::get("api/datasources").with_header(ORG_ID_HEADER, id.to_string());
        self.send_json(request).await
    }

    /// List the dashboards of an organization.
    pub async fn dashboards_by_org_id(&self, id: OrgId) -> Result<Vec<DashboardSearchHit>> {
        let mut params = QueryParams::new();
        params.push("type", "dash-db");

        let request = ApiRequest::get("api/search")
            .with_query(params)
            .with_header(ORG_ID_HEADER, id.to_string());
        self.send_json(request).await
    }

    async fn send(&self, request: ApiRequest) -> Result<()> {
        self.inner.execute(request).await.map(|_| ())
    }

    async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
    where
        R: DeserializeOwned,
    {
        execute_json(&self.inner, request).await
    }
}

impl Org {
    /// Members of this organization.
    pub async fn users<E: Executor>(&self, client: &OrgClient<E>) -> Result<OrgUsers> {
        client.org_users(self.id).await
    }

    /// Add an existing user to this organization.
    pub async fn add_user<E: Executor>(
        &self,
        client: &OrgClient<E>,
        login_or_email: &str,
        role: &str,
    ) -> Result<()> {
        client.add_org_user(self.id, login_or_email, role).await
    }

    /// Remove a user from this organization.
    pub async fn remove_user<E: Executor>(
        &self,
        client: &OrgClient<E>,
        user_id: UserId,
    ) -> Result<()> {
        client.remove_org_user(self.id, user_id).await
    }

    /// Datasources of this organization.
    pub async fn data_sources<E: Executor>(
        &self,
        client: &OrgClient<E>,
    ) -> Result<Vec<DataSource>> {
        client.data_sources_by_org_id(self.id).await
    }

    /// Dashboards of this organization.
    pub async fn dashboards<E: Executor>(
        &self,
        client: &OrgClient<E>,
    ) -> Result<Vec<DashboardSearchHit>> {
        client.dashboards_by_org_id(self.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrgUser, OrgUserRole};
    use async_trait::async_trait;
    use grafana_core::Error;
    use mockall::mock;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mock! {
        pub Exec {}

        #[async_trait]
        impl Executor for Exec {
            async fn execute(&self, request: ApiRequest) -> grafana_core::Result<Vec<u8>>;
        }
    }

    fn test_client(server: &MockServer) -> OrgClient {
        OrgClient::builder(server.uri())
            .unwrap()
            .with_basic_auth("admin", "admin")
            .build()
            .unwrap()
    }

    fn main_org() -> Org {
        Org {
            id: OrgId::new(1),
            name: "Main Org.".into(),
        }
    }

    #[tokio::test]
    async fn get_org_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orgs/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "name": "Main Org.",
                "address": {"address1": "", "city": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let org = test_client(&server).org(OrgId::new(1)).await.unwrap();
        assert_eq!(org, main_org());
    }

    #[tokio::test]
    async fn get_org_by_name_encodes_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orgs/name/Main%20Org."))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Main Org."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let org = test_client(&server).org_by_name("Main Org.").await.unwrap();
        assert_eq!(org.id, OrgId::new(1));
    }

    #[tokio::test]
    async fn list_orgs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orgs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Main Org."},
                {"id": 2, "name": "ops"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let orgs = test_client(&server).orgs().await.unwrap();
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[1].to_string(), "ops");
    }

    #[tokio::test]
    async fn new_org_uses_returned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orgs"))
            .and(body_json(json!({"name": "ops"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"orgId": 6, "message": "Organization created"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let org = test_client(&server).new_org("ops").await.unwrap();
        assert_eq!(
            org,
            Org {
                id: OrgId::new(6),
                name: "ops".into()
            }
        );
    }

    #[tokio::test]
    async fn delete_org_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/orgs/6"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server).delete_org(OrgId::new(6)).await.unwrap();
    }

    #[tokio::test]
    async fn org_not_found_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orgs/99"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Organization not found"})),
            )
            .mount(&server)
            .await;

        let err = test_client(&server).org(OrgId::new(99)).await.unwrap_err();
        assert_eq!(err, Error::NotFound("404 Not Found".to_string()));
    }

    #[tokio::test]
    async fn org_users_via_accessor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orgs/1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"orgId": 1, "userId": 1, "email": "admin@localhost", "login": "admin", "role": "Admin"},
                {"orgId": 1, "userId": 4, "email": "jo@example.com", "login": "jo", "role": "Viewer"},
                {"orgId": 1, "userId": 6, "email": "svc@example.com", "login": "svc", "role": "None"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let members = main_org().users(&client).await.unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(members.users()[1].id, UserId::new(4));
        assert_eq!(
            members.iter().filter_map(OrgUser::basic_role).collect::<Vec<_>>(),
            vec![OrgUserRole::Admin, OrgUserRole::Viewer]
        );
        assert_eq!(members.users()[2].login, "svc");
    }

    #[tokio::test]
    async fn add_and_remove_user_via_accessor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orgs/1/users"))
            .and(body_json(json!({"role": "Editor", "loginOrEmail": "jo"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "User added to organization"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/orgs/1/users/4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "User removed from organization"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let org = main_org();
        org.add_user(&client, "jo", "Editor").await.unwrap();
        org.remove_user(&client, UserId::new(4)).await.unwrap();
    }

    #[tokio::test]
    async fn add_user_rejects_invalid_role_without_request() {
        let mut exec = MockExec::new();
        exec.expect_execute().never();

        let client = OrgClient::with_executor(exec);
        let err = main_org()
            .add_user(&client, "jo", "Owner")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::ValidationError("invalid role name: Owner".to_string())
        );

        let err = client
            .add_org_user(OrgId::new(1), "", "Viewer")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn data_sources_are_scoped_by_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasources"))
            .and(header("x-grafana-org-id", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 3,
                "uid": "prom-main",
                "orgId": 1,
                "name": "Prometheus",
                "type": "prometheus",
                "url": "http://prometheus:9090",
                "access": "proxy",
                "isDefault": true,
                "jsonData": {"httpMethod": "POST"}
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let sources = main_org().data_sources(&client).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind, "prometheus");
        assert!(sources[0].is_default);
    }

    #[tokio::test]
    async fn dashboards_are_searched_in_org() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("type", "dash-db"))
            .and(header("x-grafana-org-id", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 12,
                "uid": "cpu-overview",
                "title": "CPU Overview",
                "uri": "db/cpu-overview",
                "url": "/d/cpu-overview/cpu-overview",
                "type": "dash-db",
                "tags": ["infra"],
                "isStarred": false,
                "folderId": 2,
                "folderUid": "infra",
                "folderTitle": "Infrastructure"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let dashboards = main_org().dashboards(&client).await.unwrap();
        assert_eq!(dashboards[0].title, "CPU Overview");
        assert_eq!(dashboards[0].folder_uid.as_deref(), Some("infra"));
    }

    #[tokio::test]
    async fn remove_user_maps_forbidden() {
        let mut exec = MockExec::new();
        exec.expect_execute()
            .withf(|request| {
                request.method() == reqwest::Method::DELETE
                    && request.path() == "api/orgs/2/users/9"
            })
            .times(1)
            .returning(|_| Err(Error::Unauthorized("403 Forbidden".to_string())));

        let client = OrgClient::with_executor(exec);
        let err = client
            .remove_org_user(OrgId::new(2), UserId::new(9))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn builder_sets_default_org_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orgs"))
            .and(header("x-grafana-org-id", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 5, "name": "Team"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = OrgClient::builder(server.uri())
            .unwrap()
            .with_org_id(OrgId::new(5))
            .build()
            .unwrap();
        let orgs = client.orgs().await.unwrap();
        assert_eq!(orgs[0].name, "Team");
    }
}
