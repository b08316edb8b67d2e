//! Reducción de checkpoints por stream.
//!
//! Clave: `stream.name`. Por cada clave se queda el payload con mayor
//! `emitted_at`; en empate gana el último procesado. Checkpoints vacíos se
//! descartan antes de comparar, así que nunca pisan uno real.
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::decode::decode_state_message;
use crate::record::{LogRecord, MessageType};

/// Último checkpoint conocido por nombre de stream.
pub type StreamStateMap = BTreeMap<String, Value>;

pub fn reduce_stream_states(records: &[LogRecord]) -> StreamStateMap {
    let mut latest: BTreeMap<String, (i64, Value)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.message_type == MessageType::State) {
        let msg = match decode_state_message(record) {
            Ok(m) => m,
            Err(e) => {
                warn!("reduce_stream_states: skipping record (connection={} run={}): {e}",
                      record.connection_id, record.run_id);
                continue;
            }
        };
        if !msg.has_checkpoint() {
            continue;
        }
        let Some(payload) = msg.stream_state else { continue };
        match latest.get(&msg.stream.name) {
            Some((ts, _)) if *ts > msg.emitted_at => {}
            _ => {
                latest.insert(msg.stream.name, (msg.emitted_at, payload));
            }
        }
    }
    latest.into_iter().map(|(k, (_, v))| (k, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn state(id: &str, stream: &str, ts: i64, payload: Value) -> LogRecord {
        let now = Utc::now();
        LogRecord { id: id.into(),
                    connection_id: "c1".into(),
                    run_id: "r1".into(),
                    message_type: MessageType::State,
                    message: json!({"stream": {"name": stream}, "stream_state": payload, "emitted_at": ts}).to_string(),
                    created_at: now,
                    updated_at: now }
    }

    #[test]
    fn greatest_emitted_at_wins() {
        let out = reduce_stream_states(&[state("b", "orders", 20, json!({"cursor": 2})),
                                         state("a", "orders", 10, json!({"cursor": 1}))]);
        assert_eq!(out.get("orders"), Some(&json!({"cursor": 2})));
    }

    #[test]
    fn tie_is_last_write_wins() {
        let out = reduce_stream_states(&[state("a", "s", 5, json!({"v": "first"})),
                                         state("b", "s", 5, json!({"v": "second"}))]);
        assert_eq!(out["s"], json!({"v": "second"}));
    }

    #[test]
    fn empty_checkpoint_never_overwrites() {
        let out = reduce_stream_states(&[state("a", "s", 1, json!({"cursor": 1})),
                                         state("b", "s", 9, json!({})),
                                         state("c", "t", 3, Value::Null)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out["s"], json!({"cursor": 1}));
    }

    #[test]
    fn log_records_and_bad_payloads_are_ignored() {
        let mut bad = state("x", "s", 1, json!({"cursor": 1}));
        bad.message = "{broken".into();
        let mut log = state("y", "s", 2, json!({"cursor": 2}));
        log.message_type = MessageType::Log;
        assert!(reduce_stream_states(&[bad, log]).is_empty());
    }
}
