//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when the caller input is malformed.
//! - [`Forbidden`] thrown when the caller lacks access to an existing item.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`Conflict`] thrown when the item changed state under the caller.
//!
//! Storage errors are translated here, so callers only see the kinds above
//! plus [`Database`] for failures nothing else explains.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => return Self::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => return Self::Validation(msg),
            _ => {}
        }
        match err {
            DbErr::RecordNotFound(msg) => Self::KeyNotFound(msg),
            DbErr::RecordNotUpdated => Self::KeyNotFound("record not updated".to_string()),
            other => Self::Database(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_becomes_key_not_found() {
        let err = EngineError::from(DbErr::RecordNotFound("spend".to_string()));
        assert_eq!(err, EngineError::KeyNotFound("spend".to_string()));
    }

    #[test]
    fn unclassified_db_errors_stay_database() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, EngineError::Database(_)));
    }
}
