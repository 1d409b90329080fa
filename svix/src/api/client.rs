use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::ApiError;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Svix management API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    auth_header: String,
}

/// A fresh 32-character key for one mutating request
pub fn new_idempotency_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl Client {
    pub fn new(server_url: &Url, token: &str) -> Result<Self, ApiError> {
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{} is not an http or https URL",
                server_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("terraform-provider-svix/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::from_parts(
            http_client,
            server_url.as_str().trim_end_matches('/').to_string(),
            token.to_string(),
            format!("Bearer {}", token),
        ))
    }

    fn from_parts(
        http_client: reqwest::Client,
        base_url: String,
        token: String,
        auth_header: String,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                token,
                auth_header,
            }),
        }
    }

    /// Same connection pool, with the token scoped to `environment_id`
    pub fn for_environment(&self, environment_id: &str) -> Self {
        Self::from_parts(
            self.inner.http_client.clone(),
            self.inner.base_url.clone(),
            self.inner.token.clone(),
            format!("Bearer {}|{}", self.inner.token, environment_id),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        let builder = self
            .inner
            .http_client
            .request(method.clone(), &url)
            .header(AUTHORIZATION, &self.inner.auth_header);

        if method == Method::GET {
            builder
        } else {
            builder.header(IDEMPOTENCY_KEY_HEADER, new_idempotency_key())
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::parse_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// POST where the server replies with no content
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        Self::parse_response(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    pub fn authentication(&self) -> super::management::AuthenticationApi<'_> {
        super::management::AuthenticationApi::new(self)
    }

    pub fn environments(&self) -> super::management::EnvironmentApi<'_> {
        super::management::EnvironmentApi::new(self)
    }

    pub fn environment_settings(&self) -> super::management::EnvironmentSettingsApi<'_> {
        super::management::EnvironmentSettingsApi::new(self)
    }

    pub fn event_types(&self) -> super::event_types::EventTypeApi<'_> {
        super::event_types::EventTypeApi::new(self)
    }

    pub fn operational_webhook_endpoints(
        &self,
    ) -> super::operational_webhooks::OperationalWebhookEndpointApi<'_> {
        super::operational_webhooks::OperationalWebhookEndpointApi::new(self)
    }

    pub fn ingest_sources(&self) -> super::ingest::IngestSourceApi<'_> {
        super::ingest::IngestSourceApi::new(self)
    }

    pub fn ingest_endpoints(&self) -> super::ingest::IngestEndpointApi<'_> {
        super::ingest::IngestEndpointApi::new(self)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        tracing::debug!("Response status: {}", status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Remote {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        tracing::trace!("API response body: {}", text);

        serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}", e);
            ApiError::Parse(e.to_string())
        })
    }
}
