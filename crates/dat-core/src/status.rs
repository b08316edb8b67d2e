//! Inferencia del estado de una ejecución.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decode::decode_log_message;
use crate::record::{LogRecord, MessageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// No se produce en los resúmenes: una ejecución sin marcador de fin es
    /// `Running`. Se conserva para los consumidores del enum.
    Queued,
    Running,
    Success,
    Failure,
    PartialSuccess,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "QUEUED",
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
            RunStatus::PartialSuccess => "PARTIAL_SUCCESS",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tabla de transición. Sin fin siempre es `Running`.
pub fn infer_status(ended: bool, has_errors: bool, records_updated: u64) -> RunStatus {
    match (ended, has_errors, records_updated > 0) {
        (false, _, _) => RunStatus::Running,
        (true, false, true) => RunStatus::Success,
        (true, false, false) => RunStatus::PartialSuccess,
        (true, true, true) => RunStatus::PartialSuccess,
        (true, true, false) => RunStatus::Failure,
    }
}

/// Punto de decisión para `has_errors`.
pub trait ErrorPolicy: Send + Sync {
    fn has_errors(&self, run_records: &[&LogRecord]) -> bool;
}

/// Cuenta registros LOG de nivel ERROR o FATAL. Política por defecto.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelErrorPolicy;

impl ErrorPolicy for LevelErrorPolicy {
    fn has_errors(&self, run_records: &[&LogRecord]) -> bool {
        run_records.iter()
                   .filter(|r| r.message_type == MessageType::Log)
                   .filter_map(|r| decode_log_message(r).ok())
                   .any(|m| m.level.is_error())
    }
}

/// Nunca reporta errores. Reproduce el comportamiento histórico del
/// servicio, donde el predicado era constante.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoErrorsPolicy;

impl ErrorPolicy for NoErrorsPolicy {
    fn has_errors(&self, _run_records: &[&LogRecord]) -> bool {
        false
    }
}
