//! Store error classification.
//!
//! The store reports constraint failures as distinct variants and leaves
//! their domain meaning to the repositories, which translate them into
//! [`CoreError::Conflict`] or [`CoreError::ReferentialIntegrity`].

use sqlx::error::ErrorKind;
use taskflow_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation(db_err.message().to_string())
                }
                ErrorKind::ForeignKeyViolation => {
                    return StoreError::ForeignKeyViolation(db_err.message().to_string())
                }
                _ => {}
            }
        }
        StoreError::Sqlx(err)
    }
}

/// Error returned by every repository method.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Store(StoreError::from(err))
    }
}

impl DbError {
    pub fn not_found(entity: &'static str, id: taskflow_core::types::DbId) -> Self {
        DbError::Core(CoreError::NotFound { entity, id })
    }

    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            DbError::Core(e) => Some(e),
            DbError::Store(_) => None,
        }
    }
}

/// Translate a uniqueness failure into [`CoreError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> DbError {
    match StoreError::from(err) {
        StoreError::UniqueViolation(_) => DbError::Core(CoreError::Conflict(message())),
        other => DbError::Store(other),
    }
}

/// Translate a foreign-key failure into [`CoreError::ReferentialIntegrity`].
pub(crate) fn integrity_on_foreign_key(
    err: sqlx::Error,
    message: impl FnOnce() -> String,
) -> DbError {
    match StoreError::from(err) {
        StoreError::ForeignKeyViolation(_) => {
            DbError::Core(CoreError::ReferentialIntegrity(message()))
        }
        other => DbError::Store(other),
    }
}
