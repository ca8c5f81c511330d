use reqwest::StatusCode;
use serde::Deserialize;

/// ApiError
///
/// Every failure a remote call (or the client-side checks in front of it) can produce.
/// Views never let these escape: each one is converted into a banner string at the
/// component boundary via `user_message`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused connection, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// 401. The token is missing, expired or rejected.
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("authentication required"))]
    Unauthorized { message: Option<String> },

    /// 403. Authenticated, but the role may not perform this call.
    #[error("Forbidden: {}", .message.as_deref().unwrap_or("access denied"))]
    Forbidden { message: Option<String> },

    /// 404.
    #[error("Not found: {}", .message.as_deref().unwrap_or("resource not found"))]
    NotFound { message: Option<String> },

    /// Rejected on the client before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-success status.
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("request failed"))]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// A success status with a body that does not match the expected record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The durable client storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// StorageError
///
/// Failures of the durable key/value store holding the token and theme preference.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Corrupt storage file: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}

/// The `{ "message": "..." }` envelope the backend attaches to 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// from_status
    ///
    /// Maps a non-success status plus the raw response body onto the taxonomy. The
    /// body's `message` field is kept verbatim so banners can show it unchanged.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            StatusCode::FORBIDDEN => ApiError::Forbidden { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            other => ApiError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// The message supplied by the server, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// user_message
    ///
    /// The banner text for this failure: the server's message when present, the
    /// validation text for client-side rejections, otherwise the caller's default.
    pub fn user_message(&self, default: &str) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            other => other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
