use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the workflow operations.
///
/// Conflict and validation errors carry user-facing detail; permission
/// errors stay opaque. Store failures abort the whole operation and roll
/// back the transaction. Notification-dispatch failures are never an
/// `ApiError` at all; they are logged and swallowed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One message per conflicting submitted parcel, e.g.
    /// "Parcel at 1234 Market St already submitted".
    #[error("{}", .0.join("; "))]
    ParcelsAlreadyClaimed(Vec<String>),

    #[error("parcel {0} already exists")]
    Conflict(i64),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Permission denied")]
    Permission,

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}
