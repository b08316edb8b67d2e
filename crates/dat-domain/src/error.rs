use thiserror::Error;

/// Errores del catálogo (actores, instancias y conexiones).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        DomainError::NotFound(format!("{kind} '{id}'"))
    }
}
