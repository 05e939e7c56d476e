//! HTTP client for the chama REST backend.
//!
//! Every request carries the stored bearer token. Failed responses run the
//! session hooks (logout on 401, alert on 5xx or no response) and are then
//! returned as errors. There are no retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::session::{SessionHooks, TokenStore};

/// Connection settings for [`ApiClient`]
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    hooks: Arc<dyn SessionHooks>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, tokens: TokenStore, hooks: Arc<dyn SessionHooks>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            hooks,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.request(Method::GET, self.url(path)))
            .await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.http.request(Method::POST, self.url(path)).json(body))
            .await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.http.request(Method::PUT, self.url(path)).json(body))
            .await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let builder = match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "request failed without a response");
                let message = format!("Unable to reach the server: {e}");
                self.hooks.on_transport_failure(&message);
                return Err(ApiError::Network(e.to_string()));
            }
        };

        let status = response.status();
        debug!(status = %status, url = %response.url(), "response received");

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let body = if body.trim().is_empty() { "null" } else { body.as_str() };
            return serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            warn!("session rejected by server");
            self.hooks.on_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        if status.is_server_error() {
            warn!(status = %status, %message, "server error");
            self.hooks.on_transport_failure(&message);
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Best-effort message: `message`, then `error`, then the raw body
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
