use chrono::{DateTime, Utc};
use dat_core::{LogRecord, LogRecordStore, NewLogRecord, StoreError};
use diesel::prelude::*;
use log::{debug, error};

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::connection_run_logs;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = connection_run_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LogRow {
    pub id: String,
    pub connection_id: String,
    pub run_id: String,
    pub message_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inserción: `id` y timestamps los asigna la base (`DEFAULT`).
#[derive(Insertable, Debug)]
#[diesel(table_name = connection_run_logs)]
pub struct NewLogRow<'a> {
    pub connection_id: &'a str,
    pub run_id: &'a str,
    pub message_type: &'a str,
    pub message: &'a str,
}

impl TryFrom<LogRow> for LogRecord {
    type Error = PersistenceError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let message_type = row.message_type
                              .parse()
                              .map_err(|e| PersistenceError::Decode(format!("row {}: {e}", row.id)))?;
        Ok(LogRecord { id: row.id,
                       connection_id: row.connection_id,
                       run_id: row.run_id,
                       message_type,
                       message: row.message,
                       created_at: row.created_at,
                       updated_at: row.updated_at })
    }
}

fn into_records(rows: Vec<LogRow>) -> Result<Vec<LogRecord>, PersistenceError> {
    rows.into_iter().map(LogRecord::try_from).collect()
}

/// `LogRecordStore` sobre la tabla `connection_run_logs`.
pub struct PgLogRecordStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgLogRecordStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> LogRecordStore for PgLogRecordStore<P> {
    fn append(&self, record: NewLogRecord) -> Result<LogRecord, StoreError> {
        let row = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let inserted = diesel::insert_into(connection_run_logs::table)
                .values(NewLogRow { connection_id: &record.connection_id,
                                    run_id: &record.run_id,
                                    message_type: record.message_type.as_str(),
                                    message: &record.message })
                .returning(LogRow::as_returning())
                .get_result(&mut conn)?;
            Ok(inserted)
        }).map_err(|e| {
              error!("append connection={} run={} failed: {e}", record.connection_id, record.run_id);
              e
          })?;
        debug!("append id={} connection={} run={}", row.id, row.connection_id, row.run_id);
        Ok(LogRecord::try_from(row)?)
    }

    fn list_for_connection(&self, connection_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        let rows = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let rows = connection_run_logs::table
                .filter(connection_run_logs::connection_id.eq(connection_id))
                .order((connection_run_logs::created_at.asc(), connection_run_logs::id.asc()))
                .select(LogRow::as_select())
                .load(&mut conn)?;
            Ok(rows)
        })?;
        Ok(into_records(rows)?)
    }

    fn list_for_run(&self, run_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        let rows = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let rows = connection_run_logs::table
                .filter(connection_run_logs::run_id.eq(run_id))
                .order((connection_run_logs::created_at.asc(), connection_run_logs::id.asc()))
                .select(LogRow::as_select())
                .load(&mut conn)?;
            Ok(rows)
        })?;
        Ok(into_records(rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dat_core::MessageType;

    fn row(message_type: &str) -> LogRow {
        let now = Utc::now();
        LogRow { id: "l1".into(),
                 connection_id: "c1".into(),
                 run_id: "r1".into(),
                 message_type: message_type.into(),
                 message: "{}".into(),
                 created_at: now,
                 updated_at: now }
    }

    #[test]
    fn row_maps_message_type() {
        assert_eq!(LogRecord::try_from(row("STATE")).unwrap().message_type, MessageType::State);
        assert!(matches!(LogRecord::try_from(row("RECORD")), Err(PersistenceError::Decode(_))));
    }
}
