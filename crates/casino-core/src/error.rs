use thiserror::Error;

/// Failure of a single backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a status outside 200-299.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A success response whose body is not valid JSON.
    #[error("invalid JSON in response: {0}")]
    Decode(String),

    /// The request could not be assembled (bad header, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Outcome of the login probe when it does not yield a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("invalid credentials or access denied (HTTP {status})")]
    Rejected { status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

/// Durable session storage failure.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}
