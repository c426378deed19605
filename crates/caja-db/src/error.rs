//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// A referenced row (e.g. the tenant) does not exist
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A unique constraint rejected the write
    #[error("unique violation: {0}")]
    UniqueViolation(String),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A stored value could not be mapped onto its domain type
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Result alias for repository operations
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Sqlx(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or_default().to_string();
            if db.is_foreign_key_violation() {
                return Self::ForeignKeyViolation(constraint);
            }
            if db.is_unique_violation() {
                return Self::UniqueViolation(constraint);
            }
        }
        Self::Sqlx(err)
    }
}

impl From<caja_types::ParseError> for DbError {
    fn from(err: caja_types::ParseError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!DbError::from(sqlx::Error::RowNotFound).is_transient());
        assert!(!DbError::ForeignKeyViolation("fk".into()).is_transient());
    }
}
