use crate::domain::ports::StoreError;
use thiserror::Error;

/// Failure categories surfaced to callers of the engine.
///
/// Callers (HTTP adapters, the CSV driver) map these onto their own status
/// codes without inspecting individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    QuotaExceeded,
    Internal,
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Malformed pagination cursor")]
    MalformedCursor,
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("Package already purchased")]
    AlreadyPurchased,
    #[error("Account already swiped today")]
    DuplicateSwipe,
    #[error("Login name already registered")]
    DuplicateAccount,
    #[error("Daily swipe limit reached, upgrade your account to get more swipes")]
    QuotaExceeded,
    #[error("Internal error: {0}")]
    InternalError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::ValidationError(_) | MatchError::MalformedCursor => ErrorKind::Validation,
            MatchError::NotFound { .. } => ErrorKind::NotFound,
            MatchError::AlreadyPurchased
            | MatchError::DuplicateSwipe
            | MatchError::DuplicateAccount => ErrorKind::Conflict,
            MatchError::QuotaExceeded => ErrorKind::QuotaExceeded,
            MatchError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Wraps an unexpected condition that has no underlying error value.
    pub fn internal(message: impl Into<String>) -> Self {
        MatchError::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        MatchError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
