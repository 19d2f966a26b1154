use thiserror::Error;

/// Longest slice of a provider error body kept as the error's cause.
pub const CAUSE_EXCERPT_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum StabilityError {
    /// Missing credential or an unusable client configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller triggered cancellation before the call completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The provider answered with a non-success status.
    #[error("{message}")]
    ProviderError {
        message: String,
        status: u16,
        cause: Option<String>,
    },

    /// Network-level failure with no cancellation signal behind it.
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl StabilityError {
    pub(crate) fn provider(message: String, status: u16, raw_body: Option<&str>) -> Self {
        StabilityError::ProviderError {
            message,
            status,
            cause: raw_body
                .filter(|body| !body.is_empty())
                .map(|body| excerpt(body, CAUSE_EXCERPT_LIMIT)),
        }
    }

    /// Human readable description, without the variant prefix added by `Display`.
    pub fn message(&self) -> String {
        match self {
            StabilityError::ConfigError(msg) => msg.clone(),
            StabilityError::Cancelled => "Request cancelled".to_string(),
            StabilityError::ProviderError { message, .. } => message.clone(),
            StabilityError::TransportError(msg) => msg.clone(),
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            StabilityError::ProviderError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw provider body excerpt, when one was readable.
    pub fn cause(&self) -> Option<&str> {
        match self {
            StabilityError::ProviderError { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StabilityError::Cancelled)
    }
}

fn excerpt(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, StabilityError>;
