//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas, y de ahí a los
//! errores de los traits que implementa este crate (`StoreError`,
//! `DomainError`).

use dat_core::StoreError;
use dat_domain::DomainError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("row decode: {0}")]
    Decode(String),
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("configuration: {0}")]
    Config(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound("row".into()),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Decode(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::AlreadyInTransaction => Self::Unknown("already in transaction".into()),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            DieselError::InvalidCString(e) => Self::Unknown(format!("invalid cstring: {e}")),
            DieselError::RollbackTransaction => Self::Unknown("rollback transaction".into()),
            DieselError::NotInTransaction => Self::Unknown("not in transaction".into()),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<DomainError> for PersistenceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(what) => Self::NotFound(what),
            DomainError::Validation(msg) => Self::Invalid(msg),
            DomainError::Storage(msg) => Self::Unknown(msg),
        }
    }
}

impl From<PersistenceError> for DomainError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(what) => DomainError::NotFound(what),
            PersistenceError::Invalid(msg)
            | PersistenceError::UniqueViolation(msg)
            | PersistenceError::CheckViolation(msg)
            | PersistenceError::ForeignKeyViolation(msg) => DomainError::Validation(msg),
            other => DomainError::Storage(other.to_string()),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(what) => StoreError::NotFound(what),
            PersistenceError::TransientIo(msg) => StoreError::Unavailable(msg),
            PersistenceError::SerializationConflict => StoreError::Unavailable("serialization conflict".into()),
            PersistenceError::Config(msg) => StoreError::Unavailable(msg),
            other => StoreError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        assert!(matches!(PersistenceError::from(DieselError::NotFound), PersistenceError::NotFound(_)));
    }

    #[test]
    fn pool_errors_are_store_unavailable() {
        let e: StoreError = PersistenceError::TransientIo("pool timeout".into()).into();
        assert_eq!(e, StoreError::Unavailable("pool timeout".into()));
        let e: StoreError = PersistenceError::Decode("bad type".into()).into();
        assert!(matches!(e, StoreError::Internal(_)));
    }

    #[test]
    fn constraint_errors_are_domain_validation() {
        let e: DomainError = PersistenceError::ForeignKeyViolation("fk".into()).into();
        assert_eq!(e, DomainError::Validation("fk".into()));
        let e: DomainError = PersistenceError::from(DomainError::not_found("actor", "a1")).into();
        assert_eq!(e, DomainError::not_found("actor", "a1"));
    }
}
