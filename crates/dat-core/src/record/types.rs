//! Registro de log tal como lo devuelve el store.
//!
//! Rol en el flujo:
//! - El endpoint de ingesta agrega una fila por mensaje recibido
//!   (append-only, nunca se actualiza).
//! - `created_at`/`updated_at` son metadatos del store: NO sirven para
//!   ordenar (reintentos y escritores concurrentes desordenan la escritura).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DatMessage;
use crate::errors::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Log,
    State,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Log => "LOG",
            MessageType::State => "STATE",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOG" => Ok(MessageType::Log),
            "STATE" => Ok(MessageType::State),
            other => Err(DecodeError::UnknownMessageType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub connection_id: String,
    pub run_id: String,
    pub message_type: MessageType,
    /// JSON serializado; su forma depende de `message_type`.
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Forma de inserción: el store asigna `id` y timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogRecord {
    pub connection_id: String,
    pub run_id: String,
    pub message_type: MessageType,
    pub message: String,
}

impl NewLogRecord {
    /// Convierte el sobre recibido en la fila a insertar, guardando sólo el
    /// payload que corresponde a `msg.kind`.
    pub fn from_message(connection_id: &str, run_id: &str, msg: &DatMessage) -> Result<Self, DecodeError> {
        let payload = match msg.kind {
            MessageType::Log => msg.log.as_ref().map(serde_json::to_string),
            MessageType::State => msg.state.as_ref().map(serde_json::to_string),
        };
        let message = payload.ok_or_else(|| DecodeError::MissingPayload(msg.kind.to_string()))?
                             .map_err(|e| DecodeError::Malformed { record_id: format!("{connection_id}/{run_id}"),
                                                                   reason: e.to_string() })?;
        Ok(Self { connection_id: connection_id.to_string(),
                  run_id: run_id.to_string(),
                  message_type: msg.kind,
                  message })
    }

    /// Materializa la fila con id y timestamps dados (usado por stores).
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> LogRecord {
        LogRecord { id,
                    connection_id: self.connection_id,
                    run_id: self.run_id,
                    message_type: self.message_type,
                    message: self.message,
                    created_at: now,
                    updated_at: now }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LogLevel, LogMessage};
    use serde_json::json;

    #[test]
    fn from_message_stores_inner_payload() {
        let msg = DatMessage::log(LogLevel::Info, "start", 100);
        let rec = NewLogRecord::from_message("c1", "r1", &msg).unwrap();
        assert_eq!(rec.message_type, MessageType::Log);
        let inner: LogMessage = serde_json::from_str(&rec.message).unwrap();
        assert_eq!(inner.message, "start");
        assert_eq!(inner.emitted_at, 100);
    }

    #[test]
    fn from_message_without_payload_fails() {
        let msg = DatMessage { kind: MessageType::State, log: None, state: None };
        assert_eq!(NewLogRecord::from_message("c1", "r1", &msg),
                   Err(DecodeError::MissingPayload("STATE".into())));
    }

    #[test]
    fn state_payload_keeps_stream_and_checkpoint() {
        let msg = DatMessage::state("orders", json!({"cursor": 3}), 7);
        let rec = NewLogRecord::from_message("c1", "r1", &msg).unwrap();
        let v: serde_json::Value = serde_json::from_str(&rec.message).unwrap();
        assert_eq!(v["stream"]["name"], "orders");
        assert_eq!(v["stream_state"], json!({"cursor": 3}));
    }

    #[test]
    fn message_type_parse() {
        assert_eq!("STATE".parse::<MessageType>().unwrap(), MessageType::State);
        assert!("RECORD".parse::<MessageType>().is_err());
    }
}
