//! Agrupación por ejecución y orden lógico.
//!
//! El orden dentro de una ejecución lo da `emitted_at`; el sort es estable,
//! así que empates (incluidos los `0` de payloads ilegibles) conservan el
//! orden de almacenamiento recibido.
use indexmap::IndexMap;
use std::cmp::Reverse;

use crate::decode::decode_emitted_at;
use crate::record::LogRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Particiona por `run_id`. Los grupos aparecen en el orden en que se vio
/// su primer registro y cada grupo conserva el orden de entrada.
pub fn group_by_run(records: Vec<LogRecord>) -> IndexMap<String, Vec<LogRecord>> {
    let mut runs: IndexMap<String, Vec<LogRecord>> = IndexMap::new();
    for record in records {
        runs.entry(record.run_id.clone()).or_default().push(record);
    }
    runs
}

/// Ordena in-place por tiempo lógico (estable).
pub fn sort_by_emitted_at(records: &mut [LogRecord], order: SortOrder) {
    match order {
        SortOrder::Ascending => records.sort_by_cached_key(decode_emitted_at),
        SortOrder::Descending => records.sort_by_cached_key(|r| Reverse(decode_emitted_at(r))),
    }
}

/// Vista ordenada de una ejecución; cada registro se decodifica una vez.
#[derive(Debug, Clone)]
pub struct RunTimeline {
    /// Pares `(emitted_at, registro)` en orden ascendente estable.
    entries: Vec<(i64, LogRecord)>,
}

impl RunTimeline {
    pub fn new(records: Vec<LogRecord>) -> Self {
        let mut entries: Vec<(i64, LogRecord)> = records.into_iter().map(|r| (decode_emitted_at(&r), r)).collect();
        entries.sort_by_key(|(ts, _)| *ts);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registro más antiguo (primero del orden ascendente).
    pub fn earliest(&self) -> Option<(i64, &LogRecord)> {
        self.entries.first().map(|(ts, r)| (*ts, r))
    }

    /// Registro más reciente: cabeza del orden descendente estable, por lo
    /// que en empate gana el que llegó antes al store. Los empates del máximo
    /// quedan juntos al final; se recorre sólo esa cola.
    pub fn latest(&self) -> Option<(i64, &LogRecord)> {
        let max = self.entries.last()?.0;
        let head = self.entries
                       .iter()
                       .rposition(|(ts, _)| *ts != max)
                       .map_or(0, |i| i + 1);
        self.entries.get(head).map(|(ts, r)| (*ts, r))
    }

    pub fn ascending(&self) -> impl Iterator<Item = &LogRecord> {
        self.entries.iter().map(|(_, r)| r)
    }

    pub fn records(&self) -> Vec<&LogRecord> {
        self.ascending().collect()
    }
}
