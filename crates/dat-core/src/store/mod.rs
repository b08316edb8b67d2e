//! Frontera con el almacenamiento de registros de log.

mod memory;

pub use memory::InMemoryLogRecordStore;

use crate::errors::StoreError;
use crate::record::{LogRecord, NewLogRecord};

/// Store append-only de registros. Las lecturas devuelven orden de
/// almacenamiento; el orden lógico lo reconstruye el core.
pub trait LogRecordStore: Send + Sync {
    /// Inserta un registro y lo devuelve con id y timestamps asignados.
    fn append(&self, record: NewLogRecord) -> Result<LogRecord, StoreError>;
    fn list_for_connection(&self, connection_id: &str) -> Result<Vec<LogRecord>, StoreError>;
    fn list_for_run(&self, run_id: &str) -> Result<Vec<LogRecord>, StoreError>;
}

impl<T: LogRecordStore + ?Sized> LogRecordStore for std::sync::Arc<T> {
    fn append(&self, record: NewLogRecord) -> Result<LogRecord, StoreError> {
        (**self).append(record)
    }

    fn list_for_connection(&self, connection_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        (**self).list_for_connection(connection_id)
    }

    fn list_for_run(&self, run_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        (**self).list_for_run(run_id)
    }
}
