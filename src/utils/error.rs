use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Bad Request: {message}")]
    BadRequest { message: String },

    #[error("Not Authorized")]
    NotAuthorized,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not Found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal fault: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The closed set of failure kinds a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotAuthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// Generic text used in the response body.
    pub fn reason(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::NotAuthorized => "Not Authorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Internal => "Internal Server Error",
        }
    }
}

/// Response body carried by every failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl LedgerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        LedgerError::BadRequest {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        LedgerError::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::BadRequest { .. } => ErrorKind::BadRequest,
            LedgerError::NotAuthorized => ErrorKind::NotAuthorized,
            LedgerError::Forbidden { .. } => ErrorKind::Forbidden,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::Internal { .. }
            | LedgerError::ConfigError { .. }
            | LedgerError::InvalidConfigValueError { .. }
            | LedgerError::IoError(_)
            | LedgerError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Message safe to hand back to a caller. Internal faults never leak detail.
    pub fn user_friendly_message(&self) -> String {
        match self {
            LedgerError::BadRequest { message }
            | LedgerError::Forbidden { message }
            | LedgerError::NotFound { message }
            | LedgerError::Conflict { message }
                if !message.is_empty() =>
            {
                format!("{}: {}", self.kind().reason(), message)
            }
            _ => self.kind().reason().to_string(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            message: self.user_friendly_message(),
        }
    }
}
