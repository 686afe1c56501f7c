//! Asynchronous connector to a GNS3 server.

use crate::link::Link;
use crate::models::{Compute, ComputeImage, ComputePorts, ServerErrorBody, Version};
use crate::node::Node;
use crate::project::Project;
use crate::template::Template;
use crate::Result;
use gns3_core::client::{is_transient_status, ClientConfig, RetryPolicy, DEFAULT_CONNECT_TIMEOUT};
use gns3_core::config::Gns3ClientConfig;
use gns3_core::uuid::{LinkId, NodeId, ProjectId, TemplateId};
use gns3_core::Error;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("gns3-client/", env!("CARGO_PKG_VERSION"));

/// Builder for [`Gns3Connector`].
#[derive(Debug, Clone)]
pub struct Gns3ConnectorBuilder {
    config: Gns3ClientConfig,
    http_config: ClientConfig,
}

impl Gns3ConnectorBuilder {
    /// Create a builder targeting the given server URL with default settings.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::from_config(Gns3ClientConfig {
            server_url: server_url.into(),
            ..Gns3ClientConfig::default()
        })
    }

    /// Create a builder from a [`Gns3ClientConfig`].
    #[must_use]
    pub fn from_config(config: Gns3ClientConfig) -> Self {
        let http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_retry_policy(RetryPolicy::new().with_max_retries(config.max_retries));

        Self {
            config,
            http_config,
        }
    }

    /// Target another REST API version (defaults to 2).
    #[must_use]
    pub fn with_api_version(mut self, version: u8) -> Self {
        self.config.api_version = version;
        self
    }

    /// Authenticate every request with HTTP basic authentication.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.config = self.config.with_credentials(user, password);
        self
    }

    /// Set whether to verify the server's TLS certificate.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.config.tls_verify = verify;
        self
    }

    /// Trust an additional PEM encoded CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.config.tls_ca_cert = Some(path);
        self
    }

    /// Override the retry policy applied to idempotent requests.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.http_config.retry_policy = policy;
        self
    }

    /// Override the HTTP client configuration used when building the connector.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder and create the [`Gns3Connector`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for an unusable server URL and
    /// [`Error::ConfigError`] for invalid settings or an unreadable CA certificate.
    pub fn build(self) -> Result<Gns3Connector> {
        let base_url = self.config.base_url()?;
        self.config.ensure_valid()?;

        let http_config = self.http_config;
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(http_config.timeout)
            .pool_idle_timeout(http_config.pool_idle_timeout)
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT))
            .gzip(http_config.enable_compression)
            .cookie_store(true);

        if !self.config.tls_verify {
            warn!("TLS verification disabled for GNS3 connector");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.config.tls_ca_cert {
            debug!("loading GNS3 CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read GNS3 CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid GNS3 CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build GNS3 HTTP client: {err}"))
        })?;

        let credentials = self.config.user.clone().map(|user| Credentials {
            user,
            password: Arc::new(
                self.config
                    .password
                    .clone()
                    .unwrap_or_else(|| SecretString::from(String::new())),
            ),
        });

        Ok(Gns3Connector {
            http,
            base_url,
            credentials,
            retry_policy: http_config.retry_policy,
            enable_logging: http_config.enable_logging,
        })
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    user: String,
    password: Arc<SecretString>,
}

/// Asynchronous connector to the REST API of a GNS3 server.
///
/// Cloning is cheap: clones share the underlying connection pool and cookie store.
#[derive(Debug, Clone)]
pub struct Gns3Connector {
    http: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    retry_policy: RetryPolicy,
    enable_logging: bool,
}

impl Gns3Connector {
    /// Create a connector for the given server URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unusable or the HTTP client cannot be built.
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Gns3ConnectorBuilder::new(server_url).build()
    }

    /// Create a connector from a [`Gns3ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &Gns3ClientConfig) -> Result<Self> {
        Gns3ConnectorBuilder::from_config(config.clone()).build()
    }

    /// Start building a connector for the given server URL.
    #[must_use]
    pub fn builder(server_url: impl Into<String>) -> Gns3ConnectorBuilder {
        Gns3ConnectorBuilder::new(server_url)
    }

    /// Versioned API base URL, e.g. `http://gns3server:3080/v2/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host name of the server, as used for console access.
    #[must_use]
    pub fn server_host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// Send a request and return the raw successful response.
    ///
    /// `path` is relative to [`base_url`](Self::base_url). GET, PUT and DELETE are
    /// retried on transient failures; other methods are sent once.
    ///
    /// # Errors
    ///
    /// Returns the mapped error for a non-success status or a transport failure.
    pub async fn http_call<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        params: &[(&str, String)],
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.execute_with_retry(method, path, params, |request| match body {
            Some(payload) => request.json(payload),
            None => request,
        })
        .await
    }

    /// GET a resource and decode its JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.execute_with_retry(Method::GET, path, &[], |r| r).await?;
        decode_json(response, path).await
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http_call(Method::POST, path, Some(body), &[]).await?;
        decode_json(response, path).await
    }

    /// PUT a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http_call(Method::PUT, path, Some(body), &[]).await?;
        decode_json(response, path).await
    }

    /// DELETE a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute_with_retry(Method::DELETE, path, &[], |r| r)
            .await
            .map(drop)
    }

    /// POST an action and return its JSON body, or `None` when the server sent none.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a non-empty body is not JSON.
    pub async fn post_action<B>(&self, path: &str, body: Option<&B>) -> Result<Option<Value>>
    where
        B: Serialize + ?Sized,
    {
        let response = self.http_call(Method::POST, path, body, &[]).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|err| {
            Error::ParseError(format!("Failed to parse GNS3 response for `{path}`: {err}"))
        })
    }

    /// GET a resource as plain text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let response = self.execute_with_retry(Method::GET, path, &[], |r| r).await?;
        Ok(response.text().await?)
    }

    /// POST a plain-text body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn post_text(&self, path: &str, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.execute_with_retry(Method::POST, path, &[], |request| {
            request.header(CONTENT_TYPE, "text/plain").body(text.clone())
        })
        .await
        .map(drop)
    }

    /// Server version.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_version(&self) -> Result<Version> {
        self.get("version").await
    }

    /// All projects known to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        let projects: Vec<Project> = self.get("projects").await?;
        Ok(projects
            .into_iter()
            .map(|project| project.with_connector(self.clone()))
            .collect())
    }

    /// Project with the given name, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        Ok(self
            .get_projects()
            .await?
            .into_iter()
            .find(|project| project.name.as_deref() == Some(name)))
    }

    /// Project with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist.
    pub async fn get_project_by_id(&self, project_id: ProjectId) -> Result<Project> {
        let project: Project = self.get(&format!("projects/{project_id}")).await?;
        Ok(project.with_connector(self.clone()))
    }

    /// Create a project from a JSON-serializable body carrying at least a `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without a name and [`Error::Conflict`]
    /// if the server already has a project with that name.
    pub async fn create_project<B>(&self, body: &B) -> Result<Project>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        require_keys(&body, &["name"])?;

        let project: Project = self.post("projects", &body).await?;
        Ok(project.with_connector(self.clone()))
    }

    /// Delete a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_project(&self, project_id: ProjectId) -> Result<()> {
        self.delete(&format!("projects/{project_id}")).await
    }

    /// All templates known to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_templates(&self) -> Result<Vec<Template>> {
        let templates: Vec<Template> = self.get("templates").await?;
        Ok(templates
            .into_iter()
            .map(|template| template.with_connector(self.clone()))
            .collect())
    }

    /// Template with the given name, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>> {
        Ok(self
            .get_templates()
            .await?
            .into_iter()
            .find(|template| template.name.as_deref() == Some(name)))
    }

    /// Template with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the template does not exist.
    pub async fn get_template_by_id(&self, template_id: TemplateId) -> Result<Template> {
        let template: Template = self.get(&format!("templates/{template_id}")).await?;
        Ok(template.with_connector(self.clone()))
    }

    /// Create a template from a body carrying at least `name` and `template_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if a mandatory key is missing.
    pub async fn create_template<B>(&self, body: &B) -> Result<Template>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        require_keys(&body, &["name", "template_type"])?;

        let template: Template = self.post("templates", &body).await?;
        Ok(template.with_connector(self.clone()))
    }

    /// Update a template with the keys of `body`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_template<B>(&self, template_id: TemplateId, body: &B) -> Result<Template>
    where
        B: Serialize + ?Sized,
    {
        let template: Template = self.put(&format!("templates/{template_id}"), body).await?;
        Ok(template.with_connector(self.clone()))
    }

    /// Delete a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_template(&self, template_id: TemplateId) -> Result<()> {
        self.delete(&format!("templates/{template_id}")).await
    }

    /// All nodes of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_nodes(&self, project_id: ProjectId) -> Result<Vec<Node>> {
        let nodes: Vec<Node> = self.get(&format!("projects/{project_id}/nodes")).await?;
        Ok(nodes
            .into_iter()
            .map(|node| node.with_connector(self.clone()))
            .collect())
    }

    /// Node with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the node does not exist.
    pub async fn get_node_by_id(&self, project_id: ProjectId, node_id: NodeId) -> Result<Node> {
        let node: Node = self
            .get(&format!("projects/{project_id}/nodes/{node_id}"))
            .await?;
        Ok(node.with_connector(self.clone()))
    }

    /// All links of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_links(&self, project_id: ProjectId) -> Result<Vec<Link>> {
        let links: Vec<Link> = self.get(&format!("projects/{project_id}/links")).await?;
        Ok(links
            .into_iter()
            .map(|link| link.with_connector(self.clone()))
            .collect())
    }

    /// Link with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the link does not exist.
    pub async fn get_link_by_id(&self, project_id: ProjectId, link_id: LinkId) -> Result<Link> {
        let link: Link = self
            .get(&format!("projects/{project_id}/links/{link_id}"))
            .await?;
        Ok(link.with_connector(self.clone()))
    }

    /// All computes registered with the controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_computes(&self) -> Result<Vec<Compute>> {
        self.get("computes").await
    }

    /// Compute with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the compute does not exist.
    pub async fn get_compute(&self, compute_id: &str) -> Result<Compute> {
        self.get(&format!("computes/{compute_id}")).await
    }

    /// Images available on a compute for an emulator (`qemu`, `iou`, `docker`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_compute_images(
        &self,
        compute_id: &str,
        emulator: &str,
    ) -> Result<Vec<ComputeImage>> {
        self.get(&format!("computes/{compute_id}/{emulator}/images"))
            .await
    }

    /// Port ranges and used ports of a compute.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_compute_ports(&self, compute_id: &str) -> Result<ComputePorts> {
        self.get(&format!("computes/{compute_id}/ports")).await
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid GNS3 path `{path}`: {err}")))
    }

    async fn execute_with_retry<F>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        prepare: F,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.build_url(path)?;
        let mut attempt = 0;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .query(params)
                .header(ACCEPT, "application/json");

            if let Some(credentials) = &self.credentials {
                request = request.basic_auth(
                    &credentials.user,
                    Some(credentials.password.expose_secret()),
                );
            }
            request = prepare(request);

            if self.enable_logging {
                info!(method = %method, path = %path, attempt, "Sending GNS3 request");
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    map_status_to_error(status, &text)
                }
                Err(err) => Error::from(err),
            };

            attempt += 1;
            if !self.retry_policy.should_retry(&method, &error, attempt) {
                return Err(error);
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            debug!(%error, "Retrying GNS3 request after {:?}", delay);
            if delay > Duration::from_millis(0) {
                sleep(delay).await;
            }
        }
    }
}

async fn decode_json<T>(response: Response, path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    response.json::<T>().await.map_err(|err| {
        Error::ParseError(format!("Failed to parse GNS3 response for `{path}`: {err}"))
    })
}

/// Map an error status to an [`Error`] carrying `[<code>] <server message>`.
fn map_status_to_error(status: StatusCode, text: &str) -> Error {
    let message = serde_json::from_str::<ServerErrorBody>(text)
        .map_or_else(|_| text.trim().to_string(), |body| body.message);
    let detail = format!("[{}] {message}", status.as_u16());

    match status {
        StatusCode::BAD_REQUEST => Error::BadRequest(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidRequest(format!("GNS3 authentication failed: {detail}"))
        }
        StatusCode::NOT_FOUND => Error::NotFound(detail),
        StatusCode::CONFLICT => Error::Conflict(detail),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("GNS3 server temporarily unavailable: {detail}"))
        }
        status if is_transient_status(status) => {
            Error::ServiceUnavailable(format!("GNS3 server error: {detail}"))
        }
        _ => Error::HttpError(format!("GNS3 error: {detail}")),
    }
}

/// Fail with a validation error unless every key is present and non-null.
pub(crate) fn require_keys(body: &Value, keys: &[&str]) -> Result<()> {
    for key in keys {
        if matches!(body.get(key), None | Some(Value::Null)) {
            return Err(Error::ValidationError(format!(
                "Parameter '{key}' is mandatory"
            )));
        }
    }
    Ok(())
}
