//! Configuración de conexión desde variables de entorno.
//! Convención `DATABASE_URL` más tamaños opcionales del pool.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL no definido".into()))?;
        Ok(Self::from_parts(url,
                            env::var("DATABASE_MIN_CONNECTIONS").ok().as_deref(),
                            env::var("DATABASE_MAX_CONNECTIONS").ok().as_deref()))
    }

    /// Valores crudos a configuración; tamaños ilegibles toman el default.
    pub fn from_parts(url: String, min: Option<&str>, max: Option<&str>) -> Self {
        let min_connections = min.and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_MIN_CONNECTIONS);
        let max_connections = max.and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_MAX_CONNECTIONS);
        Self { url, min_connections, max_connections }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_sizes_fall_back_to_defaults() {
        let cfg = DbConfig::from_parts("postgres://x".into(), Some("abc"), None);
        assert_eq!(cfg.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        let cfg = DbConfig::from_parts("postgres://x".into(), Some("1"), Some("4"));
        assert_eq!((cfg.min_connections, cfg.max_connections), (1, 4));
    }
}
