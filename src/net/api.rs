//! REST API client for the studio backend.
//!
//! DESIGN
//! ======
//! Every method builds its headers through [`build_headers`] and routes the
//! response through [`check_status`], so JSON headers, bearer auth and
//! failure normalization behave the same for every endpoint.
//!
//! ERROR HANDLING
//! ==============
//! Failures come back as a typed [`ApiError`]. Callers branch on
//! [`ApiError::is_unauthorized`] or [`ApiError::kind`] instead of matching
//! on message text. The client never inspects payload shape beyond JSON
//! decoding; deciding what a missing `user` means is the session store's job.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{Ack, Credentials, LoginResponse, MeResponse, ProfileResponse, ProfileUpdate, Registration};
use crate::config::{ClientConfig, endpoints};
use crate::state::token::TokenStore;

// =============================================================================
// ERROR
// =============================================================================

/// Coarse category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No HTTP status available (unreachable, timeout, reset).
    Transport,
    /// A response arrived with a non-success status.
    Status,
    /// The body was not the JSON we expected.
    Decode,
    /// The HTTP client itself could not be built.
    Setup,
}

/// Errors produced by API client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("API request failed: {0}")]
    Transport(String),

    /// The backend returned a non-success HTTP status.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, message: Option<String> },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Transport(_) => ApiErrorKind::Transport,
            Self::Status { .. } => ApiErrorKind::Status,
            Self::Decode(_) => ApiErrorKind::Decode,
            Self::HttpClientBuild(_) => ApiErrorKind::Setup,
        }
    }

    /// HTTP status code, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True only for an explicit HTTP 401 from the backend.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Whether retrying the same request might succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }

    /// Server-provided message for status failures.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() { Self::Decode(e.to_string()) } else { Self::Transport(e.to_string()) }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Backend calls the session store depends on.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/login`.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// `POST /api/register`. Does not touch the stored token.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<LoginResponse, ApiError>;

    /// `GET /api/me` with the stored bearer token.
    async fn fetch_current_user(&self) -> Result<MeResponse, ApiError>;

    /// `PUT /api/profile` with the stored bearer token.
    async fn update_profile(&self, fields: &ProfileUpdate) -> Result<ProfileResponse, ApiError>;

    /// `POST /api/logout` with the stored bearer token.
    async fn logout(&self) -> Result<Ack, ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Build a client for `config`, reading bearer tokens from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config, tokens })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn stored_token(&self) -> Option<String> {
        match self.tokens.get() {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "token read failed; sending request without credentials");
                None
            }
        }
    }

    async fn send<B, T>(&self, method: Method, endpoint: &str, with_auth: bool, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let token = if with_auth { self.stored_token() } else { None };
        let headers = build_headers(with_auth, token.as_deref());

        let mut request = self
            .http
            .request(method, self.config.api_url(endpoint))
            .headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = check_status(response).await?;
        let text = response.text().await?;
        parse_body(&text)
    }
}

#[async_trait::async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = Credentials { email, password };
        self.send(Method::POST, endpoints::LOGIN, false, Some(&body)).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<LoginResponse, ApiError> {
        let body = Registration { name, email, password, password_confirmation };
        self.send(Method::POST, endpoints::REGISTER, false, Some(&body)).await
    }

    async fn fetch_current_user(&self) -> Result<MeResponse, ApiError> {
        self.send::<(), _>(Method::GET, endpoints::ME, true, None).await
    }

    async fn update_profile(&self, fields: &ProfileUpdate) -> Result<ProfileResponse, ApiError> {
        self.send(Method::PUT, endpoints::PROFILE, true, Some(fields)).await
    }

    async fn logout(&self) -> Result<Ack, ApiError> {
        self.send::<(), _>(Method::POST, endpoints::LOGOUT, true, None).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// JSON content-type/accept headers, plus the bearer token when `with_auth`
/// is set and a token is present.
#[must_use]
pub fn build_headers(with_auth: bool, token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if with_auth {
        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("stored token is not a valid header value; omitting Authorization"),
            }
        }
    }
    headers
}

/// Reject non-success responses with their numeric status.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status: status.as_u16(), message: extract_message(&body) })
}

/// Pull `message` out of a JSON error body, if there is one.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(ToOwned::to_owned)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
