//! HTTP client for the ShopKart REST API.
//!
//! One inherent `impl ApiClient` block per resource lives in the submodules.
//! Non-2xx answers become [`StorefrontError::Api`] carrying the backend's
//! `message` verbatim; connection failures become [`StorefrontError::Transport`].

mod auth;
mod cart;
mod catalog;
mod orders;
mod payment;
mod profile;
mod stock;

pub use auth::{Credentials, LoginResponse, OtpResponse, Registration};
pub use cart::AddToCart;
pub use payment::{CartSnapshotLine, CodOrderResponse, CreatePaymentOrder, PaymentOrderResponse, PaymentStatusResponse, VerifyPaymentRequest, VerifyPaymentResponse};
pub use profile::NewAddressResponse;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, warn};

use crate::config::Config;
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| StorefrontError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http(http, &config.api_base_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string(), token: None }
    }

    pub fn base_url(&self) -> &str { &self.base_url }
    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn set_token(&mut self, token: Option<String>) { self.token = token; }
    pub fn is_authenticated(&self) -> bool { self.token.is_some() }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Request carrying the bearer token; fails locally for guests.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(StorefrontError::LoginRequired)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = Self::dispatch(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to decode API response: {}", e);
            StorefrontError::Decode(e.to_string())
        })
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<()> {
        Self::dispatch(request).await.map(|_| ())
    }

    async fn dispatch(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            error!("API request failed: {}", e);
            StorefrontError::Transport(e.to_string())
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed: {}", status.canonical_reason().unwrap_or(status.as_str())));
        warn!(status = status.as_u16(), "API rejected request: {}", message);
        Err(StorefrontError::Api { status: status.as_u16(), message })
    }
}
