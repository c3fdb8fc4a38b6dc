//! Error types for tokengate
//!
//! Token failures (`Malformed`, `InvalidSignature`, `Expired`) are recovered
//! inside the codec and the authentication gate. Facade failures surface to
//! the HTTP layer and map to client-visible status codes.

use hyper::StatusCode;

/// Main error type for tokengate operations
#[derive(Debug, thiserror::Error)]
pub enum TokengateError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("Identity already registered: {0}")]
    DuplicateIdentity(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokengateError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed(_) | Self::InvalidSignature | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PrincipalNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateIdentity(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Hashing(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for error response bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MALFORMED_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Expired => "TOKEN_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PrincipalNotFound(_) => "PRINCIPAL_NOT_FOUND",
            Self::DuplicateIdentity(_) => "USER_EXISTS",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Store(_) => "DB_ERROR",
            Self::Hashing(_) => "HASH_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for TokengateError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for TokengateError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<mongodb::error::Error> for TokengateError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for TokengateError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            // A token we cannot check with our key is as good as forged
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Result type alias for tokengate operations
pub type Result<T> = std::result::Result<T, TokengateError>;
