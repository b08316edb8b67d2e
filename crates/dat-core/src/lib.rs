//! dat-core: reconstrucción de ejecuciones a partir del log de una conexión.
//!
//! Flujo: registros crudos -> decodificados -> agrupados por run ->
//! (estado + contador) -> resúmenes. En paralelo, registros STATE ->
//! último checkpoint por stream.
pub mod aggregate;
pub mod constants;
pub mod count;
pub mod decode;
pub mod errors;
pub mod record;
pub mod service;
pub mod state;
pub mod status;
pub mod store;
pub mod timeline;

pub use aggregate::{RunAggregator, RunSummary};
pub use count::{sum_records_updated, CompositeCountExtractor, PatternCountExtractor, RecordCountExtractor,
                StructuredCountExtractor};
pub use decode::{decode_emitted_at, decode_log_body, decode_log_message, decode_state_message};
pub use errors::{DecodeError, StoreError};
pub use record::{DatMessage, LogLevel, LogMessage, LogRecord, MessageType, NewLogRecord, StateMessage,
                 StreamDescriptor};
pub use service::{AggregatedRunLogs, RunLogService, ServiceError};
pub use state::{reduce_stream_states, StreamStateMap};
pub use status::{infer_status, ErrorPolicy, LevelErrorPolicy, NoErrorsPolicy, RunStatus};
pub use store::{InMemoryLogRecordStore, LogRecordStore};
pub use timeline::{group_by_run, sort_by_emitted_at, RunTimeline, SortOrder};
