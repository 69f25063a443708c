use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use kowkord_types::api::Credential;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// `Gateway` over HTTPS. One shared connection pool, no retries, no caching.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: Client,
    config: ClientConfig,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Issue one call with the credential and identification headers attached.
    pub(crate) async fn request<T, B>(
        &self,
        auth: &Credential,
        method: Method,
        endpoint: &str,
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.config.api_base, endpoint);
        debug!(%method, endpoint, "api request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, auth.expose())
            .header(USER_AGENT, &self.config.user_agent)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(%method, endpoint, "api request failed: {}", e);
            ApiError::from(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%method, endpoint, status = status.as_u16(), "api returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(%method, endpoint, "undecodable response: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        auth: &Credential,
        endpoint: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        self.request::<T, ()>(auth, Method::GET, endpoint, query, None)
            .await
    }
}
