//! REST client for the commerce API.
//!
//! Uses `reqwest` for HTTP and caches catalogue metadata with `moka`.
//!
//! Every request carries an `x-request-id` header for correlation with server
//! logs and, once the viewer holds one, a bearer token. Requests race against
//! the client's [`CancellationToken`]; a cancelled request resolves to
//! [`ApiError::Cancelled`] and its response is discarded.
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_client::{ApiClient, ClientConfig};
//!
//! let client = ApiClient::new(&ClientConfig::from_env()?)?;
//! let catalogue = client.get_catalogue_by_slug("spring-wholesale").await?;
//! let page = client.get_catalogue_products(&catalogue.id, 1, 20).await?;
//! ```

mod cache;
mod catalogues;
mod orders;
mod types;

pub use cache::{CacheKey, CacheValue};
pub use types::{CreatedOrder, VerifyAccessResponse};

use std::sync::{Arc, PoisonError, RwLock};

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use types::{DataEnvelope, ErrorEnvelope};

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum number of cached catalogues.
const CACHE_CAPACITY: u64 = 256;

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials valid but access refused.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request was abandoned because its view went away.
    #[error("Request cancelled")]
    Cancelled,

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the failure happened in transport rather than in the API.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::RateLimited(_))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce REST API.
///
/// Cloning is cheap: clones share the HTTP connection pool, cache and bearer
/// token. [`ApiClient::with_cancellation`] derives a clone whose requests are
/// bound to a different cancellation token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    cancel: CancellationToken,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.has_token())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_url.clone(),
                token: RwLock::new(None),
                cache,
            }),
            cancel: CancellationToken::new(),
        })
    }

    /// A clone whose requests are abandoned when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    /// The token requests race against.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Replace the bearer token sent with every request.
    ///
    /// Cached catalogues are dropped when the token actually changes, since
    /// their lock state was decided for the previous viewer.
    pub fn set_token(&self, token: Option<SecretString>) {
        let changed = {
            let mut current = self
                .inner
                .token
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let changed = current.as_ref().map(ExposeSecret::expose_secret)
                != token.as_ref().map(ExposeSecret::expose_secret);
            *current = token;
            changed
        };
        if changed {
            debug!("Bearer token changed, clearing catalogue cache");
            self.inner.cache.invalidate_all();
        }
    }

    /// Whether a bearer token is attached to requests.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }

    /// Build an endpoint URL from path segments, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a request, racing it against the cancellation token.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!("Request cancelled");
                Err(ApiError::Cancelled)
            }
            result = self.send(request) => result,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let mut request = request.header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(parse_error(status, &response_text, &request_id));
        }

        // An empty body reads as JSON null so optional lookups see `None`
        let body = if response_text.trim().is_empty() {
            "null"
        } else {
            response_text.as_str()
        };

        match serde_json::from_str::<DataEnvelope<T>>(body) {
            Ok(envelope) => Ok(envelope.into_inner()),
            Err(e) => {
                error!(
                    error = %e,
                    request_id = %request_id,
                    body = %truncate(&response_text, 500),
                    "Failed to parse API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }
}

/// Map a non-success response to an error.
fn parse_error(status: StatusCode, body: &str, request_id: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(ErrorEnvelope::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => {
            if status.is_server_error() {
                error!(
                    status = %status,
                    request_id = %request_id,
                    body = %truncate(body, 500),
                    "API returned server error"
                );
            }
            ApiError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
