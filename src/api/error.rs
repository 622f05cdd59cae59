use serde_json::Value;
use thiserror::Error;

/// Failure reported by an [`HttpTransport`](super::HttpTransport).
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// Decoded response body, when the server sent JSON.
        body: Option<Value>,
    },
}

/// Error surfaced by [`ApiClient`](super::ApiClient) to its callers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("request failed with status {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },
    /// A 401 could not be recovered by refreshing the session.
    #[error("Authentication failed")]
    AuthenticationFailed,
    /// The request body could not be serialized; nothing was sent.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthenticationFailed => Some(401),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    /// Request validation failures come back as 422 with a `detail` array.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Http { status: 422, .. })
    }

    /// Decoded error body, if the server sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(message) => Self::Transport(message),
            TransportError::Status {
                status,
                message,
                body,
            } => Self::Http {
                status,
                message,
                body,
            },
        }
    }
}
