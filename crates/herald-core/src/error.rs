use thiserror::Error;

/// Application-wide error types for Herald.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (non-success status, unreadable body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Feed payload is malformed or lacks the `templates`/`items` arrays.
    #[error("Feed parse error: {0}")]
    ParseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Lookup matched no stored record.
    #[error("record not found")]
    RecordNotFound,

    /// The ingestion queue has no receiver any more.
    #[error("Ingestion queue closed")]
    ChannelClosed,
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::ParseError(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout")
                    || msg.contains("connect")
                    || msg.contains("reset")
                    || msg.starts_with("HTTP 5")
            }
            _ => false,
        }
    }

    /// Returns true for the store's "no such record" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::RecordNotFound)
    }
}
