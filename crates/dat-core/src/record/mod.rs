//! Registros de log y formas de mensaje.

mod message;
mod types;

pub use message::{DatMessage, LogLevel, LogMessage, StateMessage, StreamDescriptor};
pub use types::{LogRecord, MessageType, NewLogRecord};
