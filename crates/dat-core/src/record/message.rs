//! Formas tipadas de los mensajes que emiten los conectores.
//!
//! El payload guardado en `LogRecord::message` es el JSON del mensaje
//! interno (`log` o `state`), no el sobre `DatMessage` completo.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MessageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `true` para niveles que indican un error de la ejecución.
    pub fn is_error(&self) -> bool {
        matches!(self, LogLevel::Fatal | LogLevel::Error)
    }
}

/// Mensaje LOG. `emitted_at` (segundos Unix) lo fija quien emite la línea y
/// es la clave de orden autoritativa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    pub emitted_at: i64,
}

/// Descriptor del stream al que pertenece un checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Mensaje STATE: checkpoint opaco de un stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    pub stream: StreamDescriptor,
    #[serde(default)]
    pub stream_state: Option<Value>,
    pub emitted_at: i64,
}

impl StateMessage {
    /// Un checkpoint ausente, `null` o vacío (`{}`, `[]`, `""`) no aporta
    /// información de reanudación.
    pub fn has_checkpoint(&self) -> bool {
        match &self.stream_state {
            None | Some(Value::Null) => false,
            Some(Value::Object(m)) => !m.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

/// Sobre que publica el conector hacia el endpoint de ingesta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateMessage>,
}

impl DatMessage {
    pub fn log(level: LogLevel, message: &str, emitted_at: i64) -> Self {
        Self { kind: MessageType::Log,
               log: Some(LogMessage { level, message: message.to_string(), stack_trace: None, emitted_at }),
               state: None }
    }

    pub fn state(stream: &str, stream_state: Value, emitted_at: i64) -> Self {
        Self { kind: MessageType::State,
               log: None,
               state: Some(StateMessage { stream: StreamDescriptor { name: stream.to_string(), namespace: None },
                                          stream_state: Some(stream_state),
                                          emitted_at }) }
    }
}
