use thiserror::Error;

/// Failures surfaced by the PostgREST client.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unique or exclusion constraint violation (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl DatabaseError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => DatabaseError::Auth(message),
            404 => DatabaseError::NotFound(message),
            409 => DatabaseError::Conflict(message),
            _ => DatabaseError::Api { status, message },
        }
    }
}
