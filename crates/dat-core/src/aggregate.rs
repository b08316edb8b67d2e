//! Resumen por ejecución: estado, tiempos y contador.
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;

use crate::constants::JOB_RUN_ENDED;
use crate::count::{sum_records_updated, CompositeCountExtractor, RecordCountExtractor};
use crate::decode::decode_log_body;
use crate::record::LogRecord;
use crate::status::{infer_status, ErrorPolicy, LevelErrorPolicy, RunStatus};
use crate::timeline::{group_by_run, RunTimeline};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Segundos entre el primer y el último registro; sólo si terminó.
    pub duration: Option<i64>,
    pub records_updated: u64,
}

pub(crate) fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// `true` si el cuerpo del registro más reciente es exactamente el
/// marcador de cierre.
pub fn is_run_ended(timeline: &RunTimeline) -> bool {
    timeline.latest()
            .and_then(|(_, r)| decode_log_body(r))
            .is_some_and(|body| body == JOB_RUN_ENDED)
}

#[derive(Clone)]
pub struct RunAggregator {
    error_policy: Arc<dyn ErrorPolicy>,
    extractor: Arc<dyn RecordCountExtractor>,
}

impl Default for RunAggregator {
    fn default() -> Self {
        Self::new(Arc::new(LevelErrorPolicy), Arc::new(CompositeCountExtractor::default()))
    }
}

impl RunAggregator {
    pub fn new(error_policy: Arc<dyn ErrorPolicy>, extractor: Arc<dyn RecordCountExtractor>) -> Self {
        Self { error_policy, extractor }
    }

    pub fn with_error_policy(mut self, policy: Arc<dyn ErrorPolicy>) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn RecordCountExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Un resumen por `run_id`, en el orden en que aparece cada ejecución.
    pub fn summarize(&self, records: Vec<LogRecord>) -> Vec<RunSummary> {
        group_by_run(records).into_iter()
                             .filter_map(|(run_id, recs)| self.summarize_timeline(&run_id, &RunTimeline::new(recs)))
                             .map(|(_, summary)| summary)
                             .collect()
    }

    /// Igual que `summarize` pero con la actividad más reciente primero
    /// (mayor `emitted_at` de cada ejecución, orden estable).
    pub fn summarize_recent_first(&self, records: Vec<LogRecord>) -> Vec<RunSummary> {
        let mut runs: Vec<(i64, RunSummary)> =
            group_by_run(records).into_iter()
                                 .filter_map(|(run_id, recs)| self.summarize_timeline(&run_id, &RunTimeline::new(recs)))
                                 .collect();
        runs.sort_by_key(|(latest, _)| Reverse(*latest));
        runs.into_iter().map(|(_, summary)| summary).collect()
    }

    /// `None` sólo si la ejecución no tiene registros.
    pub fn summarize_run(&self, run_id: &str, records: Vec<LogRecord>) -> Option<RunSummary> {
        self.summarize_timeline(run_id, &RunTimeline::new(records)).map(|(_, summary)| summary)
    }

    fn summarize_timeline(&self, run_id: &str, timeline: &RunTimeline) -> Option<(i64, RunSummary)> {
        let (start, _) = timeline.earliest()?;
        let (end, _) = timeline.latest()?;
        let ordered = timeline.records();
        let ended = is_run_ended(timeline);
        let has_errors = ended && self.error_policy.has_errors(&ordered);
        let records_updated = sum_records_updated(&ordered, self.extractor.as_ref());
        let status = infer_status(ended, has_errors, records_updated);
        debug!("summarize_run run={run_id} records={} status={status} updated={records_updated}", timeline.len());
        Some((end,
              RunSummary { id: run_id.to_string(),
                           status,
                           start_time: to_datetime(start),
                           end_time: ended.then(|| to_datetime(end)),
                           // emitted_at extremos (p.ej. flotantes fuera de rango) no deben desbordar
                           duration: ended.then_some(end.saturating_sub(start)),
                           records_updated }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MessageType;
    use serde_json::json;

    fn log(run: &str, ts: i64, level: &str, msg: &str) -> LogRecord {
        let now = Utc::now();
        LogRecord { id: format!("{run}-{ts}"),
                    connection_id: "c1".into(),
                    run_id: run.into(),
                    message_type: MessageType::Log,
                    message: json!({"level": level, "message": msg, "emitted_at": ts}).to_string(),
                    created_at: now,
                    updated_at: now }
    }

    #[test]
    fn ended_run_with_errors_and_no_docs_fails() {
        let out = RunAggregator::default().summarize(vec![log("r", 1, "INFO", "start"),
                                                          log("r", 2, "ERROR", "boom"),
                                                          log("r", 3, "INFO", JOB_RUN_ENDED)]);
        assert_eq!(out[0].status, RunStatus::Failure);
        assert_eq!(out[0].duration, Some(2));
    }

    #[test]
    fn legacy_policy_ignores_errors() {
        let agg = RunAggregator::default().with_error_policy(Arc::new(crate::status::NoErrorsPolicy));
        let out = agg.summarize(vec![log("r", 2, "ERROR", "boom"), log("r", 3, "INFO", JOB_RUN_ENDED)]);
        assert_eq!(out[0].status, RunStatus::PartialSuccess);
    }

    #[test]
    fn near_match_marker_keeps_running() {
        for body in ["Job run ended.", "job run ended", " Job run ended"] {
            let out = RunAggregator::default().summarize(vec![log("r", 1, "INFO", "x"), log("r", 2, "INFO", body)]);
            assert_eq!(out[0].status, RunStatus::Running, "{body}");
            assert!(out[0].end_time.is_none());
        }
    }

    #[test]
    fn marker_must_be_latest_by_emitted_at() {
        // almacenado al final pero emitido antes
        let out = RunAggregator::default().summarize(vec![log("r", 5, "INFO", "still going"),
                                                          log("r", 1, "INFO", JOB_RUN_ENDED)]);
        assert_eq!(out[0].status, RunStatus::Running);
        assert_eq!(out[0].start_time, to_datetime(1));
    }

    #[test]
    fn recent_first_orders_by_latest_activity() {
        let out = RunAggregator::default().summarize_recent_first(vec![log("old", 1, "INFO", "a"),
                                                                       log("new", 50, "INFO", "b"),
                                                                       log("old", 10, "INFO", "c"),
                                                                       log("tie", 50, "INFO", "d")]);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "tie", "old"]);
    }

    #[test]
    fn extreme_emitted_at_does_not_break_other_runs() {
        let now = Utc::now();
        let raw = LogRecord { id: "raw".into(),
                              connection_id: "c1".into(),
                              run_id: "bad".into(),
                              message_type: MessageType::Log,
                              message: json!({"message": "x", "emitted_at": -1e300}).to_string(),
                              created_at: now,
                              updated_at: now };
        let out = RunAggregator::default().summarize(vec![raw,
                                                          log("bad", 1_700_000_000, "INFO", JOB_RUN_ENDED),
                                                          log("ok", 1, "INFO", "start"),
                                                          log("ok", 4, "INFO", JOB_RUN_ENDED)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "bad");
        assert_eq!(out[0].duration, Some(i64::MAX));
        assert_eq!(out[0].start_time, DateTime::UNIX_EPOCH);
        assert_eq!(out[1].id, "ok");
        assert_eq!(out[1].duration, Some(3));
    }

    #[test]
    fn strict_min_timestamp_saturates() {
        let out = RunAggregator::default().summarize(vec![log("r", i64::MIN, "INFO", "start"),
                                                          log("r", i64::MAX, "INFO", JOB_RUN_ENDED)]);
        assert_eq!(out[0].duration, Some(i64::MAX));
        assert_eq!(out[0].status, RunStatus::PartialSuccess);
    }

    #[test]
    fn to_datetime_out_of_range_is_epoch() {
        assert_eq!(to_datetime(i64::MAX), DateTime::UNIX_EPOCH);
    }
}
