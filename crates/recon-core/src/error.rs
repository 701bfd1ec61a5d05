//! # Gateway Error Types
//!
//! Typed error handling for the reconciliation engine.
//! All gateway operations return `Result<T, GatewayError>`.

use thiserror::Error;

/// Core error type for all gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data (caller error, never retried)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Currency not supported by the configured channel
    #[error("Unsupported currency: {currency}")]
    UnsupportedCurrency { currency: String },

    /// Network/HTTP error communicating with the processor (retryable)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Processor declined the payment (terminal)
    #[error("Payment declined: {reason}")]
    Declined { reason: String },

    /// Processor API error not classified as a decline
    #[error("Processor error [{processor}]: {message}")]
    ProcessorError { processor: String, message: String },

    /// Webhook signature did not match the computed digest
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// Webhook body could not be parsed into an event envelope
    #[error("Malformed webhook body: {0}")]
    MalformedBody(String),

    /// A transition would overwrite a terminal payment outcome
    #[error("Invalid transition: payment in state {from} cannot move to {attempted}")]
    InvalidTransition { from: String, attempted: String },

    /// Optimistic version check failed while writing a payment record
    #[error("Concurrent update on payment {payment_id}")]
    StoreConflict { payment_id: String },

    /// Payment record not found
    #[error("Payment not found: {payment_id}")]
    PaymentNotFound { payment_id: String },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    /// Returns true if the caller may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::NetworkError(_) | GatewayError::StoreConflict { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Configuration(_) => 500,
            GatewayError::InvalidRequest(_) => 400,
            GatewayError::UnsupportedCurrency { .. } => 400,
            GatewayError::NetworkError(_) => 503,
            GatewayError::Declined { .. } => 402,
            GatewayError::ProcessorError { .. } => 502,
            GatewayError::InvalidSignature => 400,
            GatewayError::MalformedBody(_) => 400,
            GatewayError::InvalidTransition { .. } => 409,
            GatewayError::StoreConflict { .. } => 409,
            GatewayError::PaymentNotFound { .. } => 404,
            GatewayError::Internal(_) => 500,
            GatewayError::Serialization(_) => 500,
        }
    }

    /// Message safe to show to the paying customer.
    ///
    /// Verification and internal errors are collapsed to a generic line so
    /// details never leak through the checkout surface.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::InvalidRequest(msg) => msg.clone(),
            GatewayError::UnsupportedCurrency { currency } => {
                format!("Currency {} is not supported", currency)
            }
            GatewayError::Declined { reason } => format!("Payment declined: {}", reason),
            GatewayError::NetworkError(_) => {
                "Payment service is temporarily unavailable, please retry".to_string()
            }
            _ => "Payment could not be processed".to_string(),
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
