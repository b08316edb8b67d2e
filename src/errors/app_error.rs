use dat_adapters::OrchestraError;
use dat_core::{DecodeError, ServiceError};
use dat_domain::DomainError;
use dat_persistence::PersistenceError;
use thiserror::Error;

/// Error de más alto nivel: lo que ve la CLI o la demo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    Invalid(String),
    #[error(transparent)]
    Service(ServiceError),
    #[error(transparent)]
    Orchestra(OrchestraError),
    #[error(transparent)]
    Domain(DomainError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Código de salida de la CLI: 4 para "no se puede operar sobre eso"
    /// (no existe, falta backend), 5 para fallos internos.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound(_) | AppError::Config(_) => 4,
            AppError::Invalid(_) | AppError::Json(_) => 2,
            _ => 5,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        if e.is_not_found() {
            return AppError::NotFound(e.to_string());
        }
        match e {
            ServiceError::Decode(d) => AppError::Invalid(d.to_string()),
            other => AppError::Service(other),
        }
    }
}

impl From<OrchestraError> for AppError {
    fn from(e: OrchestraError) -> Self {
        match e {
            OrchestraError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Orchestra(other),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            DomainError::Validation(msg) => AppError::Invalid(msg),
            other => AppError::Domain(other),
        }
    }
}

impl From<DecodeError> for AppError {
    fn from(e: DecodeError) -> Self {
        AppError::Invalid(e.to_string())
    }
}
