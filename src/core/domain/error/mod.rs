use thiserror::Error;

/// The main error type for Stratus operations.
///
/// This enum covers everything that can go wrong while talking to an
/// OpenStack cloud: transport failures, authentication failures, API-level
/// rejections, and local validation problems. Reducer code never propagates
/// these; they are folded into the message log and surfaced as toasts.
#[derive(Error, Debug)]
pub enum StratusError {
    /// Transport-level failure: connection refused, DNS, TLS, malformed body.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The identity service rejected the credentials or the token exchange.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A non-success status from an OpenStack service endpoint.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Locally detected invalid input, e.g. an auth URL without a hostname.
    #[error("Validation error: {source}")]
    Validation {
        #[from]
        source: ValidationError,
    },
}

/// Specialized error type for validation failures.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A validation failure for a specific field.
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },
}

/// Type alias for Results that may fail with a StratusError
pub type StratusResult<T> = Result<T, StratusError>;
