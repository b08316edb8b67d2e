//! Ensamblado de la aplicación: servicio de ejecuciones y orquestador sobre
//! el mismo catálogo.
use dat_adapters::{ConnectionOrchestrator, ConnectorRegistry, TaskDispatcher};
use dat_core::{LogRecordStore, RunLogService};
use dat_domain::CatalogStore;
use dat_persistence::{build_pool, PgCatalog, PgLogRecordStore, PoolProvider};
use log::info;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::snapshot::Snapshot;

pub type SharedStore = Arc<dyn LogRecordStore>;
pub type SharedCatalog = Arc<dyn CatalogStore>;
pub type SharedDispatcher = Arc<dyn TaskDispatcher>;

pub struct App {
    pub runs: RunLogService<SharedStore, SharedCatalog>,
    pub orchestrator: ConnectionOrchestrator<SharedCatalog, SharedDispatcher>,
}

impl App {
    pub fn new(store: SharedStore,
               catalog: SharedCatalog,
               dispatcher: SharedDispatcher,
               registry: ConnectorRegistry,
               config: &AppConfig)
               -> Self {
        let runs = RunLogService::new(store, catalog.clone());
        let orchestrator =
            ConnectionOrchestrator::new(catalog, dispatcher, registry).with_settings(config.dispatch.clone());
        Self { runs, orchestrator }
    }

    /// Stores en memoria a partir de un snapshot.
    pub fn from_snapshot(snapshot: Snapshot,
                         dispatcher: SharedDispatcher,
                         registry: ConnectorRegistry,
                         config: &AppConfig)
                         -> Result<Self, AppError> {
        let (catalog, store) = snapshot.into_stores()?;
        Ok(Self::new(Arc::new(store), Arc::new(catalog), dispatcher, registry, config))
    }

    /// Backend Postgres; requiere `DATABASE_URL`. Construir el pool corre las
    /// migraciones pendientes.
    pub fn postgres(dispatcher: SharedDispatcher, registry: ConnectorRegistry, config: &AppConfig)
                    -> Result<Self, AppError> {
        let db = config.require_database()?;
        let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
        info!("postgres backend ready (max_connections={})", db.max_connections);
        let store = PgLogRecordStore::new(PoolProvider { pool: pool.clone() });
        let catalog = PgCatalog::new(PoolProvider { pool });
        Ok(Self::new(Arc::new(store), Arc::new(catalog), dispatcher, registry, config))
    }
}
