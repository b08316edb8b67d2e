//! Decodificador de mensajes.
//!
//! Las funciones de timestamp son totales: un payload malformado se degrada a
//! `0` más un `warn!` con la identidad del registro, nunca a un error. El
//! orden de una ejecución no puede fallar por una fila histórica rota.
use log::warn;
use serde_json::Value;

use crate::errors::DecodeError;
use crate::record::{LogMessage, LogRecord, StateMessage};

fn parse_value(record: &LogRecord) -> Result<Value, DecodeError> {
    serde_json::from_str(&record.message).map_err(|e| DecodeError::Malformed { record_id: record.id.clone(),
                                                                               reason: e.to_string() })
}

/// Lectura cruda de `emitted_at` sobre un objeto genérico. Acepta enteros y
/// flotantes (estos se truncan a segundos).
fn raw_emitted_at(value: &Value) -> Option<i64> {
    let field = value.get("emitted_at")?;
    field.as_i64().or_else(|| field.as_f64().map(|f| f as i64))
}

/// Timestamp lógico (segundos Unix) asignado por el productor del mensaje.
///
/// Orden de intentos: forma estricta de `LogMessage`, luego el campo
/// `emitted_at` crudo, y finalmente `0`.
pub fn decode_emitted_at(record: &LogRecord) -> i64 {
    let value = match parse_value(record) {
        Ok(v) => v,
        Err(e) => {
            warn!("decode_emitted_at connection={} run={}: {e}", record.connection_id, record.run_id);
            return 0;
        }
    };
    if let Ok(msg) = serde_json::from_value::<LogMessage>(value.clone()) {
        return msg.emitted_at;
    }
    match raw_emitted_at(&value) {
        Some(ts) => ts,
        None => {
            warn!("decode_emitted_at record={} connection={} run={}: no emitted_at field",
                  record.id, record.connection_id, record.run_id);
            0
        }
    }
}

/// Decodificación estricta de un payload LOG.
pub fn decode_log_message(record: &LogRecord) -> Result<LogMessage, DecodeError> {
    let value = parse_value(record)?;
    serde_json::from_value(value).map_err(|e| DecodeError::Shape { record_id: record.id.clone(),
                                                                   expected: "log message",
                                                                   reason: e.to_string() })
}

/// Cuerpo de texto del mensaje. Si el payload no valida como `LogMessage`
/// se intenta el campo `message` crudo; `None` si no hay texto.
pub fn decode_log_body(record: &LogRecord) -> Option<String> {
    let value = parse_value(record).ok()?;
    if let Ok(msg) = serde_json::from_value::<LogMessage>(value.clone()) {
        return Some(msg.message);
    }
    value.get("message").and_then(Value::as_str).map(str::to_string)
}

/// Decodificación estricta de un payload STATE (requiere `stream.name` y
/// `emitted_at`).
pub fn decode_state_message(record: &LogRecord) -> Result<StateMessage, DecodeError> {
    let value = parse_value(record)?;
    serde_json::from_value(value).map_err(|e| DecodeError::Shape { record_id: record.id.clone(),
                                                                   expected: "state message",
                                                                   reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MessageType;
    use chrono::Utc;
    use serde_json::json;

    fn rec(message: &str) -> LogRecord {
        let now = Utc::now();
        LogRecord { id: "rec-1".into(),
                    connection_id: "c1".into(),
                    run_id: "r1".into(),
                    message_type: MessageType::Log,
                    message: message.into(),
                    created_at: now,
                    updated_at: now }
    }

    #[test]
    fn unparsable_payload_yields_zero() {
        assert_eq!(decode_emitted_at(&rec("not json")), 0);
        assert_eq!(decode_emitted_at(&rec("")), 0);
        assert_eq!(decode_emitted_at(&rec("{\"emitted_at\": ")), 0);
    }

    #[test]
    fn strict_shape_is_preferred() {
        let m = json!({"level": "INFO", "message": "x", "emitted_at": 42}).to_string();
        assert_eq!(decode_emitted_at(&rec(&m)), 42);
    }

    #[test]
    fn falls_back_to_raw_field() {
        // sin `level`: no valida como LogMessage
        let m = json!({"message": "x", "emitted_at": 77}).to_string();
        assert_eq!(decode_emitted_at(&rec(&m)), 77);
        let f = json!({"emitted_at": 12.9}).to_string();
        assert_eq!(decode_emitted_at(&rec(&f)), 12);
    }

    #[test]
    fn missing_field_yields_zero() {
        assert_eq!(decode_emitted_at(&rec(&json!({"message": "x"}).to_string())), 0);
        assert_eq!(decode_emitted_at(&rec("[1,2,3]")), 0);
        assert_eq!(decode_emitted_at(&rec(&json!({"emitted_at": "100"}).to_string())), 0);
    }

    #[test]
    fn body_from_loose_payload() {
        assert_eq!(decode_log_body(&rec(&json!({"message": "Job run ended"}).to_string())).as_deref(),
                   Some("Job run ended"));
        assert_eq!(decode_log_body(&rec("nope")), None);
    }

    #[test]
    fn state_decode_is_strict() {
        let ok = json!({"stream": {"name": "orders"}, "stream_state": {"cursor": 1}, "emitted_at": 10});
        let msg = decode_state_message(&rec(&ok.to_string())).unwrap();
        assert_eq!(msg.stream.name, "orders");
        let missing_stream = json!({"stream_state": {}, "emitted_at": 10});
        assert!(matches!(decode_state_message(&rec(&missing_stream.to_string())),
                         Err(DecodeError::Shape { expected: "state message", .. })));
        assert!(matches!(decode_state_message(&rec("x")), Err(DecodeError::Malformed { .. })));
    }
}
