use crate::config::LookerConfig;
use crate::provider::{CatalogError, CatalogResult, EditableCatalogSession};
use crate::types::{ExploreDefinition, FieldDescriptor};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tokens are renewed this long before the server says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn from_login(login: LoginResponse) -> Self {
        let expires_at = login.expires_in.map(|secs| {
            Instant::now() + Duration::from_secs(secs).saturating_sub(TOKEN_EXPIRY_MARGIN)
        });
        Self {
            value: login.access_token,
            expires_at,
        }
    }

    fn is_fresh(&self) -> bool {
        self.expires_at
            .map_or(true, |expires_at| Instant::now() < expires_at)
    }
}

#[derive(Serialize)]
struct WriteApiSession<'a> {
    workspace_id: &'a str,
}

#[derive(Serialize)]
struct WriteGitBranch<'a> {
    name: &'a str,
}

/// REST client for a Looker instance.
///
/// Logs in lazily with the configured client credentials and reuses the
/// access token until it expires or the server rejects it.
pub struct LookerClient {
    http_client: reqwest::Client,
    api_root: Url,
    config: LookerConfig,
    token: Mutex<Option<AccessToken>>,
}

impl LookerClient {
    pub fn new(config: LookerConfig) -> CatalogResult<Self> {
        config
            .validate()
            .map_err(|message| CatalogError::InvalidConfig { message })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| CatalogError::InvalidConfig {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let api_root =
            Url::parse(&config.api_root()).map_err(|e| CatalogError::InvalidConfig {
                message: format!("Invalid base URL {}: {}", config.base_url, e),
            })?;

        Ok(Self {
            http_client,
            api_root,
            config,
            token: Mutex::new(None),
        })
    }

    pub fn api_root(&self) -> &str {
        self.api_root.as_str()
    }

    /// URL of an endpoint below the API root. Each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> CatalogResult<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidConfig {
                message: format!("Base URL {} cannot carry a path", self.config.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn access_token(&self) -> CatalogResult<String> {
        let mut token = self.token.lock().await;
        if let Some(existing) = token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(existing.value.clone());
        }

        debug!("Logging in to {}", self.config.base_url);
        let response = self
            .http_client
            .post(self.endpoint(&["login"])?)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let response = Self::check_status(response, "login").await?;
        let login: LoginResponse = response.json().await?;
        info!("Authenticated against {}", self.config.base_url);

        let fresh = AccessToken::from_login(login);
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(value)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Send an authorized request, logging in again once if the token is rejected.
    async fn send_authorized<F>(
        &self,
        resource: &str,
        build: F,
    ) -> CatalogResult<reqwest::Response>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.access_token().await?;
        let response = build(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(response, resource).await;
        }

        info!("{} rejected the access token; logging in again", resource);
        self.invalidate_token().await;
        let token = self.access_token().await?;
        let response = build(&token).send().await?;
        Self::check_status(response, resource).await
    }

    async fn check_status(
        response: reqwest::Response,
        resource: &str,
    ) -> CatalogResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("{} returned {}: {}", resource, status, message);

        Err(match status.as_u16() {
            401 | 403 => CatalogError::Authentication {
                message: format!("{} returned {}", resource, status),
            },
            404 => CatalogError::NotFound {
                resource: resource.to_string(),
            },
            code => CatalogError::Api {
                status: code,
                message,
            },
        })
    }

    /// Put the API session into the `dev` workspace.
    pub async fn enter_dev_mode(&self) -> CatalogResult<()> {
        let url = self.endpoint(&["session"])?;
        let body = WriteApiSession {
            workspace_id: "dev",
        };
        self.send_authorized("session", |token| {
            self.http_client
                .patch(url.clone())
                .bearer_auth(token)
                .json(&body)
        })
        .await?;
        Ok(())
    }

    pub async fn checkout_branch(&self, project: &str, branch: &str) -> CatalogResult<()> {
        let resource = format!("projects/{}/git_branch", project);
        let url = self.endpoint(&["projects", project, "git_branch"])?;
        let body = WriteGitBranch { name: branch };
        self.send_authorized(&resource, |token| {
            self.http_client
                .put(url.clone())
                .bearer_auth(token)
                .json(&body)
        })
        .await?;
        Ok(())
    }

    pub async fn lookml_model_explore(
        &self,
        model: &str,
        explore: &str,
    ) -> CatalogResult<ExploreDefinition> {
        let resource = format!("lookml_models/{}/explores/{}", model, explore);
        let url = self.endpoint(&["lookml_models", model, "explores", explore])?;
        let response = self
            .send_authorized(&resource, |token| {
                self.http_client.get(url.clone()).bearer_auth(token)
            })
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl EditableCatalogSession for LookerClient {
    async fn enter_dev_branch(&self, project: &str, branch: &str) -> CatalogResult<()> {
        self.enter_dev_mode().await?;
        self.checkout_branch(project, branch).await?;
        info!("Project {} is on branch {}", project, branch);
        Ok(())
    }

    async fn fetch_explore(
        &self,
        model: &str,
        explore: &str,
    ) -> CatalogResult<Vec<FieldDescriptor>> {
        let definition = self.lookml_model_explore(model, explore).await?;
        let dimensions = definition.dimensions();
        debug!(
            "Explore {}/{} has {} dimensions",
            model,
            definition.name.as_deref().unwrap_or(explore),
            dimensions.len()
        );
        Ok(dimensions)
    }

    fn session_name(&self) -> &'static str {
        "looker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BranchCatalog, CatalogProvider};
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> LookerClient {
        let config = LookerConfig::new()
            .with_base_url(server.url())
            .with_credentials("id", "secret");
        LookerClient::new(config).unwrap()
    }

    async fn mock_login(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/api/4.0/login")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_id".into(), "id".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await
    }

    #[test]
    fn test_client_creation_validates_config() {
        let result = LookerClient::new(LookerConfig::default());
        assert!(matches!(result, Err(CatalogError::InvalidConfig { .. })));

        let config = LookerConfig::new()
            .with_base_url("https://looker.example.com/")
            .with_credentials("id", "secret");
        let client = LookerClient::new(config).unwrap();
        assert_eq!(client.api_root(), "https://looker.example.com/api/4.0/");
        assert_eq!(client.session_name(), "looker");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let config = LookerConfig::new()
            .with_base_url("https://looker.example.com")
            .with_credentials("id", "secret");
        let client = LookerClient::new(config).unwrap();

        let url = client
            .endpoint(&["projects", "sales ops/eu", "git_branch"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://looker.example.com/api/4.0/projects/sales%20ops%2Feu/git_branch"
        );
    }

    #[tokio::test]
    async fn test_explore_path_is_encoded() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let explore = server
            .mock("GET", "/api/4.0/lookml_models/my%20model/explores/orders%2Fv2")
            .with_status(200)
            .with_body(r#"{"fields":{"dimensions":[{"name":"orders.status"}]}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let fields = client.fetch_explore("my model", "orders/v2").await.unwrap();
        assert_eq!(fields.len(), 1);
        explore.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_triggers_new_login() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/api/4.0/login")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":0}"#)
            .expect(2)
            .create_async()
            .await;
        let _explore = server
            .mock("GET", "/api/4.0/lookml_models/ecommerce/explores/orders")
            .with_status(200)
            .with_body(r#"{"fields":{"dimensions":[]}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        client.fetch_explore("ecommerce", "orders").await.unwrap();
        client.fetch_explore("ecommerce", "orders").await.unwrap();

        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_token_retries_login_once() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/api/4.0/login")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
            .expect(2)
            .create_async()
            .await;
        let explore = server
            .mock("GET", "/api/4.0/lookml_models/ecommerce/explores/orders")
            .with_status(401)
            .with_body("Requires authentication")
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.fetch_explore("ecommerce", "orders").await;
        assert!(matches!(result, Err(CatalogError::Authentication { .. })));

        login.assert_async().await;
        explore.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_explore_reads_dimensions() {
        let mut server = mockito::Server::new_async().await;
        let login = mock_login(&mut server).await;
        let explore = server
            .mock("GET", "/api/4.0/lookml_models/ecommerce/explores/orders")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"name":"orders","fields":{"dimensions":[
                    {"name":"orders.status","category":"dimension","tags":["status"]},
                    {"name":"orders.region","category":"dimension","tags":[]}
                ]}}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let fields = client.fetch_explore("ecommerce", "orders").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "orders.status");
        assert!(fields[0].parameter("tags").unwrap().contains("status"));

        // Second call reuses the cached token.
        client.fetch_explore("ecommerce", "orders").await.unwrap();

        login.assert_async().await;
        explore.assert_async().await;
    }

    #[tokio::test]
    async fn test_branch_catalog_switches_session() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let session = server
            .mock("PATCH", "/api/4.0/session")
            .match_body(Matcher::JsonString(r#"{"workspace_id":"dev"}"#.into()))
            .with_status(200)
            .with_body(r#"{"workspace_id":"dev"}"#)
            .create_async()
            .await;
        let branch = server
            .mock("PUT", "/api/4.0/projects/analytics/git_branch")
            .match_body(Matcher::JsonString(r#"{"name":"feature/tags"}"#.into()))
            .with_status(200)
            .with_body(r#"{"name":"feature/tags"}"#)
            .create_async()
            .await;
        let _explore = server
            .mock("GET", "/api/4.0/lookml_models/ecommerce/explores/orders")
            .with_status(200)
            .with_body(r#"{"fields":{"dimensions":[{"name":"orders.status"}]}}"#)
            .create_async()
            .await;

        let catalog = BranchCatalog::new(client_for(&server), "feature/tags");
        let fields = catalog
            .fetch_catalog("analytics", "ecommerce", "orders")
            .await
            .unwrap();
        assert_eq!(fields.len(), 1);

        session.assert_async().await;
        branch.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_failure_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/api/4.0/login")
            .with_status(403)
            .with_body("Forbidden")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.fetch_explore("ecommerce", "orders").await;
        assert!(matches!(result, Err(CatalogError::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_missing_explore_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _explore = server
            .mock("GET", "/api/4.0/lookml_models/ecommerce/explores/nope")
            .with_status(404)
            .with_body(r#"{"message":"Not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.fetch_explore("ecommerce", "nope").await;
        match result {
            Err(CatalogError::NotFound { resource }) => {
                assert_eq!(resource, "lookml_models/ecommerce/explores/nope")
            }
            other => panic!("expected NotFound, got {:?}", other.map(|f| f.len())),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _branch = server
            .mock("PUT", "/api/4.0/projects/analytics/git_branch")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.checkout_branch("analytics", "main").await;
        assert!(matches!(result, Err(CatalogError::Api { status: 500, .. })));
    }
}
