use mistral_types::ValidationError;

/// Client-specific result type
pub type Result<T> = std::result::Result<T, MistralClientError>;

/// Errors from the Mistral client
#[derive(Debug, thiserror::Error)]
pub enum MistralClientError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status
    #[error("{status} {error_type}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error type identifier
        error_type: String,
        /// Human-readable error message
        message: String,
    },

    /// Failed to parse a response body or stream chunk
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Parameters rejected by local validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl MistralClientError {
    /// HTTP status of an API error
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
