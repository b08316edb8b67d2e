//! Volcado JSON del catálogo y del log de ejecuciones.
//!
//! Permite trabajar sin base de datos: la CLI carga un snapshot con
//! `--input` y la demo arma uno en memoria.
use dat_core::{InMemoryLogRecordStore, LogRecord};
use dat_domain::{Actor, ActorInstance, CatalogStore, Connection, InMemoryCatalog};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::AppError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub actor_instances: Vec<ActorInstance>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Registros en orden de almacenamiento.
    #[serde(default)]
    pub records: Vec<LogRecord>,
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Carga el snapshot en stores en memoria. El orden de inserción respeta
    /// las referencias: actores, instancias, conexiones y luego registros.
    pub fn into_stores(self) -> Result<(InMemoryCatalog, InMemoryLogRecordStore), AppError> {
        let catalog = InMemoryCatalog::new();
        for actor in self.actors {
            catalog.insert_actor(actor)?;
        }
        for instance in self.actor_instances {
            catalog.insert_actor_instance(instance)?;
        }
        for connection in self.connections {
            catalog.insert_connection(connection)?;
        }
        let store = InMemoryLogRecordStore::new();
        let n = self.records.len();
        for record in self.records {
            store.insert_raw(record);
        }
        debug!("snapshot loaded: {n} records");
        Ok((catalog, store))
    }
}
