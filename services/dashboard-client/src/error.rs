//! Error types for dashboard client operations

/// Maximum number of characters of a response body carried in an error
pub const EXCERPT_LIMIT: usize = 200;

/// Failure of a single request/response exchange with the dashboard backend
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {excerpt}")]
    Status { status: u16, excerpt: String },

    #[error("Non-JSON: {excerpt}")]
    NotJson {
        content_type: String,
        excerpt: String,
    },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Network(String),
}

impl TransportError {
    /// Build a status error, truncating the body
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            excerpt: excerpt(body),
        }
    }

    /// Build a content-type error, truncating the body
    pub fn not_json(content_type: &str, body: &str) -> Self {
        Self::NotJson {
            content_type: content_type.to_string(),
            excerpt: excerpt(body),
        }
    }

    /// HTTP status of the failed exchange, when one was received
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Errors surfaced by controllers, the job tracker and list refreshers
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// First `EXCERPT_LIMIT` characters of a body (char-boundary safe)
pub fn excerpt(body: &str) -> String {
    body.chars().take(EXCERPT_LIMIT).collect()
}
