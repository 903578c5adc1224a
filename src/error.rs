use thiserror::Error;

/// Maximum characters to include in error message body for debugging.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the LinuxLink API.
#[derive(Debug, Error)]
pub enum LlapiError {
    /// Credential or context source missing, unreadable or malformed, or the
    /// client was never configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server rejected the request signature (HTTP 401/403).
    #[error("authentication failed (HTTP {status}): {detail}")]
    Authentication { status: u16, detail: String },

    /// Request parameters rejected locally or by the server (HTTP 400/422).
    #[error("validation error: {detail}")]
    Validation { status: Option<u16>, detail: String },

    /// Unknown manifest, report, product, folder or CVE (HTTP 404).
    #[error("not found: {detail}")]
    NotFound { detail: String },

    /// Server-side failure (HTTP 5xx).
    #[error("server error (HTTP {status}): {detail}")]
    Server { status: u16, detail: String },

    /// Transport failure: DNS, TLS, timeout, connection reset.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl LlapiError {
    /// Builds a validation error raised before any request is sent.
    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        LlapiError::Validation {
            status: None,
            detail: detail.into(),
        }
    }

    /// Returns `true` if the error is potentially recoverable by retrying.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlapiError::Network(e) => e.is_timeout() || e.is_connect(),
            LlapiError::Server { .. } => true,

            LlapiError::Configuration(_)
            | LlapiError::Authentication { .. }
            | LlapiError::Validation { .. }
            | LlapiError::NotFound { .. }
            | LlapiError::Protocol(_) => false,
        }
    }

    /// Returns the HTTP status code if the error came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlapiError::Authentication { status, .. } | LlapiError::Server { status, .. } => {
                Some(*status)
            }
            LlapiError::Validation { status, .. } => *status,
            LlapiError::NotFound { .. } => Some(404),
            LlapiError::Network(e) => e.status().map(|s| s.as_u16()),
            LlapiError::Configuration(_) | LlapiError::Protocol(_) => None,
        }
    }
}

/// A specialized Result type for LinuxLink API operations.
pub type Result<T> = std::result::Result<T, LlapiError>;

/// Truncates a string to at most `max_chars` characters on a valid UTF-8 boundary.
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
