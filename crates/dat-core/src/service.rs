//! Servicio de consulta de ejecuciones de una conexión.
//!
//! Cada llamada hace una sola lectura del store y calcula en memoria. Los
//! fallos del store se propagan siempre: un store caído no puede parecer una
//! conexión sin ejecuciones.
use dat_domain::{CatalogStore, Connection, DomainError};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{RunAggregator, RunSummary};
use crate::errors::{DecodeError, StoreError};
use crate::record::{DatMessage, LogRecord, NewLogRecord};
use crate::state::{reduce_stream_states, StreamStateMap};
use crate::store::LogRecordStore;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Domain(DomainError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(what) => ServiceError::NotFound(format!("{what} not found")),
            other => ServiceError::Domain(other),
        }
    }
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_) | ServiceError::Store(StoreError::NotFound(_)))
    }
}

/// Respuesta agregada para una conexión.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRunLogs {
    pub connection_id: String,
    pub total_runs: usize,
    pub runs: Vec<RunSummary>,
}

pub struct RunLogService<S: LogRecordStore, C: CatalogStore> {
    store: S,
    catalog: C,
    aggregator: RunAggregator,
}

impl<S: LogRecordStore, C: CatalogStore> RunLogService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog, aggregator: RunAggregator::default() }
    }

    pub fn with_aggregator(mut self, aggregator: RunAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resuelve la conexión; fuera del workspace indicado cuenta como
    /// inexistente.
    fn scoped_connection(&self, connection_id: &str, workspace_id: Option<&str>) -> Result<Connection, ServiceError> {
        let conn = self.catalog.require_connection(connection_id)?;
        match workspace_id {
            Some(ws) if ws != conn.workspace_id => {
                debug!("connection {connection_id} is not in workspace {ws}");
                Err(ServiceError::NotFound(format!("connection '{connection_id}' not found")))
            }
            _ => Ok(conn),
        }
    }

    fn read_connection(&self, connection_id: &str) -> Result<Vec<LogRecord>, ServiceError> {
        self.store.list_for_connection(connection_id).map_err(|e| {
                                                          error!("list_for_connection {connection_id} failed: {e}");
                                                          ServiceError::Store(e)
                                                      })
    }

    pub fn fetch_run_summaries(&self, connection_id: &str, workspace_id: Option<&str>)
                               -> Result<AggregatedRunLogs, ServiceError> {
        let conn = self.scoped_connection(connection_id, workspace_id)?;
        let records = self.read_connection(&conn.id)?;
        let runs = self.aggregator.summarize_recent_first(records);
        Ok(AggregatedRunLogs { connection_id: conn.id, total_runs: runs.len(), runs })
    }

    pub fn fetch_stream_states(&self, connection_id: &str, workspace_id: Option<&str>)
                               -> Result<StreamStateMap, ServiceError> {
        let conn = self.scoped_connection(connection_id, workspace_id)?;
        let records = self.read_connection(&conn.id)?;
        Ok(reduce_stream_states(&records))
    }

    /// Ingesta: una fila por mensaje recibido.
    pub fn append_message(&self, connection_id: &str, run_id: &str, msg: &DatMessage)
                          -> Result<LogRecord, ServiceError> {
        let conn = self.catalog.require_connection(connection_id)?;
        let new = NewLogRecord::from_message(&conn.id, run_id, msg)?;
        let rec = self.store.append(new)?;
        debug!("append_message connection={} run={} type={}", rec.connection_id, rec.run_id, rec.message_type);
        Ok(rec)
    }

    pub fn connection_logs(&self, connection_id: &str) -> Result<Vec<LogRecord>, ServiceError> {
        let conn = self.catalog.require_connection(connection_id)?;
        self.read_connection(&conn.id)
    }

    pub fn run_logs(&self, run_id: &str) -> Result<Vec<LogRecord>, ServiceError> {
        Ok(self.store.list_for_run(run_id)?)
    }

    pub fn run_summary(&self, run_id: &str) -> Result<Option<RunSummary>, ServiceError> {
        let records = self.run_logs(run_id)?;
        Ok(self.aggregator.summarize_run(run_id, records))
    }
}
