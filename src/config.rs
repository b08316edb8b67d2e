//! Configuración central de la aplicación.
//!
//! Lee `.env` una sola vez y expone `AppConfig`. La base de datos es
//! opcional: sin `DATABASE_URL` la aplicación sólo puede trabajar en memoria.
use dat_adapters::{DispatchSettings, DEFAULT_WORKER_QUEUE, DEFAULT_WORKER_TASK};
use dat_persistence::DbConfig;
use once_cell::sync::Lazy;
use std::env;

use crate::errors::AppError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

pub const WORKER_QUEUE_VAR: &str = "DATFLOW_WORKER_QUEUE";
pub const WORKER_TASK_VAR: &str = "DATFLOW_WORKER_TASK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: Option<DbConfig>,
    pub dispatch: DispatchSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una fuente de variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database = lookup("DATABASE_URL").map(|url| {
                                                 DbConfig::from_parts(url,
                                                                      lookup("DATABASE_MIN_CONNECTIONS").as_deref(),
                                                                      lookup("DATABASE_MAX_CONNECTIONS").as_deref())
                                             });
        let non_empty = |key: &str, default: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
        };
        Self { database,
               dispatch: DispatchSettings { task_name: non_empty(WORKER_TASK_VAR, DEFAULT_WORKER_TASK),
                                            queue: non_empty(WORKER_QUEUE_VAR, DEFAULT_WORKER_QUEUE) } }
    }

    /// Config de base de datos o error si falta `DATABASE_URL`.
    pub fn require_database(&self) -> Result<&DbConfig, AppError> {
        self.database
            .as_ref()
            .ok_or_else(|| AppError::Config("DATABASE_URL no definido".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let c = cfg(&[]);
        assert!(c.database.is_none());
        assert_eq!(c.dispatch, DispatchSettings::default());
        assert!(matches!(c.require_database(), Err(AppError::Config(_))));
    }

    #[test]
    fn overrides_queue_and_database() {
        let c = cfg(&[("DATABASE_URL", "postgres://u@h/db"),
                      ("DATABASE_MAX_CONNECTIONS", "4"),
                      (WORKER_QUEUE_VAR, "custom-q"),
                      (WORKER_TASK_VAR, " ")]);
        let db = c.require_database().unwrap();
        assert_eq!(db.url, "postgres://u@h/db");
        assert_eq!(db.max_connections, 4);
        assert_eq!(c.dispatch.queue, "custom-q");
        assert_eq!(c.dispatch.task_name, DEFAULT_WORKER_TASK);
    }
}
