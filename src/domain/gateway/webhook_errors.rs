//! Webhook error types with HTTP status mapping.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header missing or HMAC mismatch.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Storage failed while applying the event.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the gateway should redeliver.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Maps the error to the status the gateway sees.
    ///
    /// 4xx stops redelivery; 5xx asks for it.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,
            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::ParseError(_) => "MALFORMED_PAYLOAD",
            WebhookError::Database(_) => "DATABASE_ERROR",
        }
    }
}
