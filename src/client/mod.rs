//! Corax REST client
//!
//! One authenticated JSON round trip per call: no retries, no caching.
//! Every request carries the `X-API-Key` header, JSON content negotiation
//! headers and the configured user agent.

pub mod types;

use std::time::Duration;

use reqwest::{
    Client, Method, Response,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use url::Url;

use crate::config::ProviderConfig;
use crate::{Error, Result};

pub use types::*;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Used where a request has no body
const NO_BODY: Option<&()> = None;

/// Client for the Corax API
#[derive(Debug, Clone)]
pub struct CoraxClient {
    http: Client,
    base_url: Url,
}

impl CoraxClient {
    /// Create a client from validated provider configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid endpoint, blank key or a key
    /// that cannot be sent as a header value.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.endpoint_url()?;

        let mut api_key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| Error::Config("api_key contains invalid header characters".to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10).min(config.timeout()))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a request and decode the JSON response
    ///
    /// # Errors
    ///
    /// [`Error::Encode`] when `body` cannot be serialized, [`Error::Transport`]
    /// when the request fails in flight, [`Error::Api`] for a non-2xx status
    /// and [`Error::Decode`] when the body does not match `T`.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let context = format!("{method} {path}");
        let text = self.send(method, path, body).await?;
        serde_json::from_str(&text).map_err(|source| Error::Decode {
            context,
            body: text,
            source,
        })
    }

    /// Send a request whose response body is ignored
    ///
    /// # Errors
    ///
    /// Same as [`CoraxClient::request`], minus decoding.
    pub async fn request_no_content<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(method, path, body).await.map(|_| ())
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let context = format!("{method} {path}");
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("failed to parse path {path}: {e}")))?;

        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(|source| Error::Encode {
                context: context.clone(),
                source,
            })?;
            request = request.body(encoded);
        }

        debug!(method = %method, path = %path, "Sending Corax API request");

        let response = request.send().await.map_err(|source| Error::Transport {
            context: format!("failed to execute request {context}"),
            source,
        })?;

        Self::read_response(response, &context).await
    }

    async fn read_response(response: Response, context: &str) -> Result<String> {
        let status = response.status();
        let text = response.text().await.map_err(|source| Error::Transport {
            context: format!("failed to read response body for {context}"),
            source,
        })?;

        debug!(status = status.as_u16(), request = %context, "Corax API responded");

        if status.is_success() {
            Ok(text)
        } else {
            Err(Error::api(status, text))
        }
    }

    // ------------------------------------------------------------------
    // API keys
    // ------------------------------------------------------------------

    /// `POST /v1/api-keys`
    pub async fn create_api_key(&self, data: &ApiKeyCreate) -> Result<ApiKey> {
        self.request(Method::POST, "/v1/api-keys", Some(data)).await
    }

    /// `GET /v1/api-keys/{id}`
    pub async fn get_api_key(&self, key_id: &str) -> Result<ApiKey> {
        let path = entity_path("/v1/api-keys", "keyID", key_id)?;
        self.request(Method::GET, &path, NO_BODY).await
    }

    /// `DELETE /v1/api-keys/{id}`
    pub async fn delete_api_key(&self, key_id: &str) -> Result<()> {
        let path = entity_path("/v1/api-keys", "keyID", key_id)?;
        self.request_no_content(Method::DELETE, &path, NO_BODY).await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// `POST /v1/projects`
    pub async fn create_project(&self, data: &ProjectCreate) -> Result<Project> {
        self.request(Method::POST, "/v1/projects", Some(data)).await
    }

    /// `GET /v1/projects/{id}`
    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        let path = entity_path("/v1/projects", "projectID", project_id)?;
        self.request(Method::GET, &path, NO_BODY).await
    }

    /// `PUT /v1/projects/{id}`
    pub async fn update_project(&self, project_id: &str, data: &ProjectUpdate) -> Result<Project> {
        let path = entity_path("/v1/projects", "projectID", project_id)?;
        self.request(Method::PUT, &path, Some(data)).await
    }

    /// `DELETE /v1/projects/{id}`
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let path = entity_path("/v1/projects", "projectID", project_id)?;
        self.request_no_content(Method::DELETE, &path, NO_BODY).await
    }

    // ------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------

    /// `POST /v1/capabilities`
    pub async fn create_capability(&self, data: &CapabilityPayload) -> Result<Capability> {
        let raw: CapabilityResponse = self.request(Method::POST, "/v1/capabilities", Some(data)).await?;
        Ok(raw.into())
    }

    /// `GET /v1/capabilities/{id}`
    pub async fn get_capability(&self, capability_id: &str) -> Result<Capability> {
        let path = entity_path("/v1/capabilities", "capabilityID", capability_id)?;
        let raw: CapabilityResponse = self.request(Method::GET, &path, NO_BODY).await?;
        Ok(raw.into())
    }

    /// `PUT /v1/capabilities/{id}`
    pub async fn update_capability(
        &self,
        capability_id: &str,
        data: &CapabilityPayload,
    ) -> Result<Capability> {
        let path = entity_path("/v1/capabilities", "capabilityID", capability_id)?;
        let raw: CapabilityResponse = self.request(Method::PUT, &path, Some(data)).await?;
        Ok(raw.into())
    }

    /// `DELETE /v1/capabilities/{id}`
    pub async fn delete_capability(&self, capability_id: &str) -> Result<()> {
        let path = entity_path("/v1/capabilities", "capabilityID", capability_id)?;
        self.request_no_content(Method::DELETE, &path, NO_BODY).await
    }

    // ------------------------------------------------------------------
    // Model deployments
    // ------------------------------------------------------------------

    /// `POST /v1/model-deployments`
    pub async fn create_model_deployment(&self, data: &ModelDeploymentPayload) -> Result<ModelDeployment> {
        self.request(Method::POST, "/v1/model-deployments", Some(data)).await
    }

    /// `GET /v1/model-deployments/{id}`
    pub async fn get_model_deployment(&self, deployment_id: &str) -> Result<ModelDeployment> {
        let path = entity_path("/v1/model-deployments", "deploymentID", deployment_id)?;
        self.request(Method::GET, &path, NO_BODY).await
    }

    /// `PUT /v1/model-deployments/{id}`
    pub async fn update_model_deployment(
        &self,
        deployment_id: &str,
        data: &ModelDeploymentPayload,
    ) -> Result<ModelDeployment> {
        let path = entity_path("/v1/model-deployments", "deploymentID", deployment_id)?;
        self.request(Method::PUT, &path, Some(data)).await
    }

    /// `DELETE /v1/model-deployments/{id}`
    pub async fn delete_model_deployment(&self, deployment_id: &str) -> Result<()> {
        let path = entity_path("/v1/model-deployments", "deploymentID", deployment_id)?;
        self.request_no_content(Method::DELETE, &path, NO_BODY).await
    }

    // ------------------------------------------------------------------
    // Model providers
    // ------------------------------------------------------------------

    /// `POST /v1/model-providers`
    pub async fn create_model_provider(&self, data: &ModelProviderCreate) -> Result<ModelProvider> {
        self.request(Method::POST, "/v1/model-providers", Some(data)).await
    }

    /// `GET /v1/model-providers/{id}`
    pub async fn get_model_provider(&self, provider_id: &str) -> Result<ModelProvider> {
        let path = entity_path("/v1/model-providers", "providerID", provider_id)?;
        self.request(Method::GET, &path, NO_BODY).await
    }

    /// `PUT /v1/model-providers/{id}`
    pub async fn update_model_provider(
        &self,
        provider_id: &str,
        data: &ModelProviderUpdate,
    ) -> Result<ModelProvider> {
        let path = entity_path("/v1/model-providers", "providerID", provider_id)?;
        self.request(Method::PUT, &path, Some(data)).await
    }

    /// `DELETE /v1/model-providers/{id}`
    pub async fn delete_model_provider(&self, provider_id: &str) -> Result<()> {
        let path = entity_path("/v1/model-providers", "providerID", provider_id)?;
        self.request_no_content(Method::DELETE, &path, NO_BODY).await
    }

    // ------------------------------------------------------------------
    // Capability types
    // ------------------------------------------------------------------

    /// `GET /v1/capability-types`
    pub async fn list_capability_types(&self) -> Result<Vec<CapabilityType>> {
        let list: CapabilityTypeList = self
            .request(Method::GET, "/v1/capability-types", NO_BODY)
            .await?;
        Ok(list.embedded)
    }

    /// `GET /v1/capability-types/{type}`
    pub async fn get_capability_type(&self, capability_type: &str) -> Result<CapabilityType> {
        let path = entity_path("/v1/capability-types", "capabilityType", capability_type)?;
        self.request(Method::GET, &path, NO_BODY).await
    }

    /// `PUT /v1/capability-types/{type}`
    pub async fn set_capability_type_default_model(
        &self,
        capability_type: &str,
        data: &DefaultModelDeploymentUpdate,
    ) -> Result<CapabilityType> {
        let path = entity_path("/v1/capability-types", "capabilityType", capability_type)?;
        self.request(Method::PUT, &path, Some(data)).await
    }
}

/// `{collection}/{id}`, rejecting blank ids before anything is sent
fn entity_path(collection: &str, label: &str, id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::validation(format!("{label} cannot be empty")));
    }
    if id.contains('/') || id.contains('?') || id.contains('#') {
        return Err(Error::validation(format!(
            "{label} contains characters not allowed in a path segment: {id}"
        )));
    }
    Ok(format!("{collection}/{id}"))
}
