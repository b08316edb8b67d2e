//! Extracción y suma del contador de documentos procesados.
//!
//! Valores negativos se recortan a 0: el total nunca decrece. Un cuerpo que
//! no coincide con la estrategia aporta 0 (sin error).
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::constants::{DOCS_PROCESSED_FIELD, PROCESSED_CHUNKS_PATTERN};
use crate::decode::decode_log_body;
use crate::record::{LogRecord, MessageType};

static PROCESSED_CHUNKS_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(PROCESSED_CHUNKS_PATTERN));
static FIRST_INTEGER_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(r"(?P<count>-?\d+)"));

/// Estrategia intercambiable para leer el contador de un cuerpo de log.
pub trait RecordCountExtractor: Send + Sync {
    fn extract(&self, body: &str) -> u64;
}

fn clamp(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// El cuerpo es JSON con un campo numérico (por defecto `n_docs_processed`).
#[derive(Debug, Clone)]
pub struct StructuredCountExtractor {
    pub field: String,
}

impl Default for StructuredCountExtractor {
    fn default() -> Self {
        Self { field: DOCS_PROCESSED_FIELD.to_string() }
    }
}

impl RecordCountExtractor for StructuredCountExtractor {
    fn extract(&self, body: &str) -> u64 {
        let Ok(value) = serde_json::from_str::<Value>(body) else { return 0 };
        match value.get(&self.field) {
            Some(Value::Number(n)) => n.as_u64()
                                       .or_else(|| n.as_i64().map(clamp))
                                       .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 }))
                                       .unwrap_or(0),
            _ => 0,
        }
    }
}

/// El cuerpo es texto libre; se suman las capturas `count` de cada
/// coincidencia (un cuerpo puede reportar varios streams).
#[derive(Debug, Clone)]
pub struct PatternCountExtractor {
    regex: Regex,
    first_only: bool,
}

impl PatternCountExtractor {
    /// Patrón propio. Debe tener el grupo `count` o, si no, un primer grupo.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { regex: Regex::new(pattern)?, first_only: false })
    }

    /// `"Processed {stream}: N document chunks."`
    pub fn processed_chunks() -> Self {
        Self { regex: PROCESSED_CHUNKS_REGEX.clone(), first_only: false }
    }

    /// Primer entero del texto.
    pub fn first_integer() -> Self {
        Self { regex: FIRST_INTEGER_REGEX.clone(), first_only: true }
    }
}

impl RecordCountExtractor for PatternCountExtractor {
    fn extract(&self, body: &str) -> u64 {
        let limit = if self.first_only { 1 } else { usize::MAX };
        self.regex
            .captures_iter(body)
            .take(limit)
            .filter_map(|c| c.name("count").or_else(|| c.get(1)))
            .filter_map(|m| m.as_str().parse::<i64>().ok())
            .map(clamp)
            .fold(0u64, u64::saturating_add)
    }
}

/// Estructurado primero; si aporta 0, el patrón textual.
#[derive(Debug, Clone)]
pub struct CompositeCountExtractor {
    pub structured: StructuredCountExtractor,
    pub pattern: PatternCountExtractor,
}

impl Default for CompositeCountExtractor {
    fn default() -> Self {
        Self { structured: StructuredCountExtractor::default(),
               pattern: PatternCountExtractor::processed_chunks() }
    }
}

impl RecordCountExtractor for CompositeCountExtractor {
    fn extract(&self, body: &str) -> u64 {
        match self.structured.extract(body) {
            0 => self.pattern.extract(body),
            n => n,
        }
    }
}

/// Suma sobre los registros LOG de una ejecución. Los STATE aportan 0 y un
/// registro ilegible también.
pub fn sum_records_updated(run_records: &[&LogRecord], extractor: &dyn RecordCountExtractor) -> u64 {
    run_records.iter()
               .filter(|r| r.message_type == MessageType::Log)
               .filter_map(|r| decode_log_body(r))
               .map(|body| extractor.extract(&body))
               .fold(0u64, u64::saturating_add)
}

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn builtin_regexes_compile() {
        Lazy::force(&PROCESSED_CHUNKS_REGEX);
        Lazy::force(&FIRST_INTEGER_REGEX);
    }

    #[test]
    fn structured_reads_named_field() {
        let ex = StructuredCountExtractor::default();
        assert_eq!(ex.extract(&json!({"n_docs_processed": 7}).to_string()), 7);
        assert_eq!(ex.extract(&json!({"n_docs_processed": -3}).to_string()), 0);
        assert_eq!(ex.extract(&json!({"n_docs_processed": "7"}).to_string()), 0);
        assert_eq!(ex.extract("Processed docs: 4 document chunks."), 0);
    }

    #[test]
    fn processed_chunks_sums_every_stream() {
        let ex = PatternCountExtractor::processed_chunks();
        assert_eq!(ex.extract("Processed orders: 12 document chunks."), 12);
        assert_eq!(ex.extract("Processed a: 2 document chunks. Processed b: 3 document chunks."), 5);
        assert_eq!(ex.extract("Processed orders: twelve document chunks."), 0);
    }

    #[test]
    fn first_integer_clamps_negatives() {
        let ex = PatternCountExtractor::first_integer();
        assert_eq!(ex.extract("wrote 40 rows in 3 batches"), 40);
        assert_eq!(ex.extract("delta -5"), 0);
        assert_eq!(ex.extract("no digits"), 0);
    }

    #[test]
    fn custom_pattern_uses_first_group() {
        let ex = PatternCountExtractor::new(r"upserted (\d+)").unwrap();
        assert_eq!(ex.extract("upserted 9 vectors"), 9);
        assert!(PatternCountExtractor::new("(").is_err());
    }

    #[test]
    fn sum_ignores_state_and_bad_records() {
        let now = Utc::now();
        let mk = |t: MessageType, message: String| LogRecord { id: "x".into(),
                                                                connection_id: "c".into(),
                                                                run_id: "r".into(),
                                                                message_type: t,
                                                                message,
                                                                created_at: now,
                                                                updated_at: now };
        let a = mk(MessageType::Log,
                   json!({"level": "INFO", "message": "Processed s: 4 document chunks.", "emitted_at": 1}).to_string());
        let b = mk(MessageType::Log, "garbage".into());
        let c = mk(MessageType::State,
                   json!({"stream": {"name": "s"}, "stream_state": {"n": 99}, "emitted_at": 2}).to_string());
        let d = mk(MessageType::Log,
                   json!({"level": "INFO", "message": "{\"n_docs_processed\": 6}", "emitted_at": 3}).to_string());
        let total = sum_records_updated(&[&a, &b, &c, &d], &CompositeCountExtractor::default());
        assert_eq!(total, 10);
    }
}
