//! Envío de tareas al worker.
//!
//! Semántica fire-and-forget, al menos una vez: `submit` devuelve en cuanto
//! la tarea queda encolada; no se espera resultado.
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("task queue unavailable: {0}")]
    Unavailable(String),
    #[error("dispatch rejected: {0}")]
    Rejected(String),
}

pub trait TaskDispatcher: Send + Sync {
    /// Encola `task_name(payload)` en `queue` y devuelve el id de tarea.
    fn submit(&self, task_name: &str, payload: &str, queue: &str) -> Result<String, DispatchError>;
}

impl<T: TaskDispatcher + ?Sized> TaskDispatcher for std::sync::Arc<T> {
    fn submit(&self, task_name: &str, payload: &str, queue: &str) -> Result<String, DispatchError> {
        (**self).submit(task_name, payload, queue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTask {
    pub id: String,
    pub task_name: String,
    pub queue: String,
    pub payload: String,
}

/// Guarda las tareas enviadas (tests y demo).
#[derive(Default)]
pub struct InMemoryDispatcher {
    submitted: Mutex<Vec<SubmittedTask>>,
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<SubmittedTask> {
        self.submitted.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl TaskDispatcher for InMemoryDispatcher {
    fn submit(&self, task_name: &str, payload: &str, queue: &str) -> Result<String, DispatchError> {
        let task = SubmittedTask { id: Uuid::new_v4().to_string(),
                                   task_name: task_name.to_string(),
                                   queue: queue.to_string(),
                                   payload: payload.to_string() };
        let id = task.id.clone();
        self.submitted
            .lock()
            .map_err(|e| DispatchError::Unavailable(e.to_string()))?
            .push(task);
        Ok(id)
    }
}

/// Escribe cada tarea como una línea JSON en stdout. Lo usa la CLI cuando
/// no hay broker.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutDispatcher;

impl TaskDispatcher for StdoutDispatcher {
    fn submit(&self, task_name: &str, payload: &str, queue: &str) -> Result<String, DispatchError> {
        let task = SubmittedTask { id: Uuid::new_v4().to_string(),
                                   task_name: task_name.to_string(),
                                   queue: queue.to_string(),
                                   payload: payload.to_string() };
        let line = serde_json::to_string(&task).map_err(|e| DispatchError::Rejected(e.to_string()))?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|e| DispatchError::Unavailable(e.to_string()))?;
        Ok(task.id)
    }
}
