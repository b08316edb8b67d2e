//! Errores del core.
//!
//! - `DecodeError`: payload malformado. Nunca cruza la frontera de
//!   agregación; se degrada a 0/skip con un diagnóstico.
//! - `StoreError`: fallo leyendo o escribiendo el store. Siempre se propaga.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload in record {record_id}: {reason}")]
    Malformed { record_id: String, reason: String },
    #[error("record {record_id} does not match the {expected} shape: {reason}")]
    Shape { record_id: String, expected: &'static str, reason: String },
    #[error("message of type {0} carries no payload")]
    MissingPayload(String),
    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store internal error: {0}")]
    Internal(String),
}
