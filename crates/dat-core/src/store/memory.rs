use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::LogRecordStore;
use crate::errors::StoreError;
use crate::record::{LogRecord, NewLogRecord};

/// Store en memoria, indexado por `connection_id`. El orden de append es el
/// orden de almacenamiento.
#[derive(Default)]
pub struct InMemoryLogRecordStore {
    inner: DashMap<String, Vec<LogRecord>>,
}

impl InMemoryLogRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta un registro ya materializado (fixtures y cargas offline).
    pub fn insert_raw(&self, record: LogRecord) {
        self.inner.entry(record.connection_id.clone()).or_default().push(record);
    }

    pub fn len(&self) -> usize {
        self.inner.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogRecordStore for InMemoryLogRecordStore {
    fn append(&self, record: NewLogRecord) -> Result<LogRecord, StoreError> {
        let rec = record.into_record(Uuid::new_v4().to_string(), Utc::now());
        self.insert_raw(rec.clone());
        Ok(rec)
    }

    fn list_for_connection(&self, connection_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        Ok(self.inner.get(connection_id).map(|v| v.clone()).unwrap_or_default())
    }

    fn list_for_run(&self, run_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        // Un run_id pertenece a una sola conexión; basta la primera que lo tenga.
        for entry in self.inner.iter() {
            let found: Vec<LogRecord> = entry.value().iter().filter(|r| r.run_id == run_id).cloned().collect();
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}
