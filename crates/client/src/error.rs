//! Client-level error type.
//!
//! [`ClientError`] unifies the failures of every layer and classifies them so
//! a front-end can decide how to present each one: validation problems are
//! shown next to the input, network problems suggest retrying, domain
//! problems explain what the customer can do, and internal problems are
//! reported to Sentry.

use thiserror::Error;
use vitrine_core::{AccessError, CatalogueError, OrderError, PriceError, StorageError};

use crate::api::ApiError;
use crate::config::ConfigError;

/// How an error should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; show inline and let the user correct it.
    Validation,
    /// Transport failure; the action can be retried.
    Network,
    /// A business rule refused the action.
    Domain,
    /// A bug or broken environment.
    Internal,
}

/// Any failure surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Products were requested before access was granted.
    #[error("This catalogue is private; request access first")]
    AccessRequired,

    /// A requested item is not in the catalogue.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Classify the error for presentation.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Access(AccessError::InvalidTransition { .. })
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Api(ApiError::Parse(_) | ApiError::InvalidUrl(_)) => ErrorKind::Internal,
            Self::Access(_) | Self::Price(_) => ErrorKind::Validation,
            Self::Api(ApiError::Api { status, .. }) if *status == 400 || *status == 422 => {
                ErrorKind::Validation
            }
            Self::Api(ApiError::Http(_) | ApiError::RateLimited(_) | ApiError::Cancelled) => {
                ErrorKind::Network
            }
            Self::Api(ApiError::Api { status, .. }) if *status >= 500 => ErrorKind::Network,
            Self::Api(_)
            | Self::Catalogue(_)
            | Self::Order(_)
            | Self::AccessRequired
            | Self::NotFound(_) => ErrorKind::Domain,
        }
    }

    /// Message suitable for showing to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Http(_)) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Api(ApiError::RateLimited(secs)) => {
                format!("Too many requests. Try again in {secs} seconds.")
            }
            Self::Api(ApiError::Cancelled) => "The request was cancelled.".to_string(),
            Self::Api(
                ApiError::Api { message, .. }
                | ApiError::NotFound(message)
                | ApiError::Unauthorized(message)
                | ApiError::Forbidden(message),
            ) => message.clone(),
            Self::Api(ApiError::Parse(_) | ApiError::InvalidUrl(_))
            | Self::Config(_)
            | Self::Storage(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether clearing the cart lets the customer recover.
    #[must_use]
    pub const fn offers_cart_reset(&self) -> bool {
        match self {
            Self::Order(e) => e.offers_cart_reset(),
            _ => false,
        }
    }

    /// Log the error and, for internal failures, report it to Sentry.
    pub fn report(&self) {
        match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "Internal error");
                sentry::capture_error(self);
            }
            ErrorKind::Network => tracing::warn!(error = %self, "Network error"),
            ErrorKind::Validation | ErrorKind::Domain => {
                tracing::info!(error = %self, "Request refused");
            }
        }
    }
}
