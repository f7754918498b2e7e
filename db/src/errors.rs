use sqlx::error::ErrorKind;
use thiserror::Error;

/// Failures of store operations that callers are expected to tell apart.
///
/// Plain lookups keep returning `color_eyre::Result`; this type is for
/// writes whose failure modes map onto distinct responses.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row the caller wanted to remove or change is not there.
    #[error("{0}")]
    NotFound(String),
    /// A referenced recipe, user, ingredient or tag does not exist.
    #[error("{0}")]
    TargetNotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    SelfReference(String),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) => db_err.kind(),
            _ => return Self::Database(err),
        };

        match kind {
            ErrorKind::UniqueViolation => Self::AlreadyExists("Record already exists".to_string()),
            ErrorKind::ForeignKeyViolation => {
                Self::TargetNotFound("Referenced record does not exist".to_string())
            }
            ErrorKind::CheckViolation => Self::Invalid("Value violates a constraint".to_string()),
            _ => Self::Database(err),
        }
    }
}
