//! Error types for the gateway client.
//!
//! # Design
//! Four families reach callers. `Http` covers any non-2xx response and keeps
//! the raw status and body so the message shown to the user embeds both.
//! `Connectivity` means no response arrived at all. `Precondition` and
//! `Validation` are raised before any request is sent. JSON failures get
//! their own variants.

use thiserror::Error;

/// Message shown to the user when the gateway cannot be reached.
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Please check your internet connection.";

/// Errors returned by `GatewayClient` parse methods and `Gateway` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The gateway returned a non-2xx status. `context` names the failed
    /// action, e.g. `"Login failed"` or `"Failed to fetch orders"`.
    #[error("{context}: {status} {body}")]
    Http {
        context: String,
        status: u16,
        body: String,
    },

    /// The request produced no response.
    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity { detail: String },

    /// A required piece of local state is missing (e.g. no access token).
    #[error("{0}")]
    Precondition(String),

    /// Client-side checks rejected the input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status of an `Http` error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Form and draft checks that block submission without a network call.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("quantity must be greater than zero for {sku}")]
    NonPositiveQuantity { sku: String },

    #[error("quantity {requested} for {sku} exceeds available stock {available}")]
    ExceedsStock {
        sku: String,
        requested: i64,
        available: i64,
    },

    #[error("the order has no products")]
    EmptyDraft,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_embeds_status_and_body() {
        let err = ApiError::Http {
            context: "Failed to fetch orders".to_string(),
            status: 500,
            body: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch orders: 500 Internal Server Error"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn connectivity_error_hides_transport_detail() {
        let err = ApiError::Connectivity {
            detail: "dns error: no such host".to_string(),
        };
        assert_eq!(err.to_string(), CONNECTIVITY_MESSAGE);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn validation_error_is_transparent() {
        let err: ApiError = ValidationError::ExceedsStock {
            sku: "GLV-01".to_string(),
            requested: 12,
            available: 10,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "quantity 12 for GLV-01 exceeds available stock 10"
        );
    }
}
