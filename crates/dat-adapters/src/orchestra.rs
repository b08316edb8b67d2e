//! Orquestación de conexiones: configuración para el worker, disparo de
//! runs y llamadas `check`/`discover` sobre instancias.
use dat_domain::{ActorInstance, ActorType, CatalogStore, Connection, DomainError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::dispatch::{DispatchError, TaskDispatcher};
use crate::registry::{ConnectionStatus, Connector, ConnectorError, ConnectorKey, ConnectorRegistry,
                      ConnectorSpecification};

pub const DEFAULT_WORKER_TASK: &str = "dat_worker_task";
pub const DEFAULT_WORKER_QUEUE: &str = "dat-worker-q";

#[derive(Debug, Error)]
pub enum OrchestraError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Domain(DomainError),
    #[error("no connector registered for {0}")]
    UnknownConnector(String),
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("serialize orchestra config: {0}")]
    Serialize(String),
}

impl From<DomainError> for OrchestraError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(what) => OrchestraError::NotFound(format!("{what} not found")),
            other => OrchestraError::Domain(other),
        }
    }
}

/// Nombre de tarea y cola para los runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub task_name: String,
    pub queue: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self { task_name: DEFAULT_WORKER_TASK.to_string(), queue: DEFAULT_WORKER_QUEUE.to_string() }
    }
}

/// Conexión más la especificación de sus tres actores; es el payload que
/// consume el worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestraConfig {
    #[serde(flatten)]
    pub connection: Connection,
    pub source: ConnectorSpecification,
    pub generator: ConnectorSpecification,
    pub destination: ConnectorSpecification,
}

pub struct ConnectionOrchestrator<C: CatalogStore, D: TaskDispatcher> {
    catalog: C,
    dispatcher: D,
    registry: ConnectorRegistry,
    settings: DispatchSettings,
}

impl<C: CatalogStore, D: TaskDispatcher> ConnectionOrchestrator<C, D> {
    pub fn new(catalog: C, dispatcher: D, registry: ConnectorRegistry) -> Self {
        Self { catalog, dispatcher, registry, settings: DispatchSettings::default() }
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    fn connector_spec(&self, instance: &ActorInstance) -> Result<ConnectorSpecification, OrchestraError> {
        let actor = self.catalog.require_actor(&instance.actor_id)?;
        Ok(ConnectorSpecification { name: actor.name,
                                    module_name: actor.module_name,
                                    connection_specification: instance.configuration.clone() })
    }

    pub fn orchestra_config(&self, connection_id: &str) -> Result<OrchestraConfig, OrchestraError> {
        let connection = self.catalog.require_connection(connection_id)?;
        let mut specs = Vec::with_capacity(3);
        for role in [ActorType::Source, ActorType::Generator, ActorType::Destination] {
            let instance = self.catalog.require_actor_instance(connection.instance_id_for(role))?;
            specs.push(self.connector_spec(&instance)?);
        }
        let mut specs = specs.into_iter();
        match (specs.next(), specs.next(), specs.next()) {
            (Some(source), Some(generator), Some(destination)) => {
                Ok(OrchestraConfig { connection, source, generator, destination })
            }
            _ => Err(OrchestraError::NotFound(format!("actors for connection '{connection_id}' not found"))),
        }
    }

    /// Encola un run para la conexión y devuelve la configuración enviada.
    pub fn trigger_run(&self, connection_id: &str) -> Result<OrchestraConfig, OrchestraError> {
        let config = self.orchestra_config(connection_id)?;
        let payload = serde_json::to_string(&config).map_err(|e| OrchestraError::Serialize(e.to_string()))?;
        let task_id = self.dispatcher.submit(&self.settings.task_name, &payload, &self.settings.queue)?;
        info!("trigger_run connection={connection_id} task={task_id} queue={}", self.settings.queue);
        Ok(config)
    }

    fn connector_for(&self, instance: &ActorInstance) -> Result<(Box<dyn Connector>, ConnectorSpecification), OrchestraError> {
        let spec = self.connector_spec(instance)?;
        let key = ConnectorKey::new(instance.actor_type, &spec.module_name, &spec.name);
        debug!("connector_for instance={} key={key}", instance.id);
        let connector = self.registry
                            .create(&key)
                            .ok_or_else(|| OrchestraError::UnknownConnector(key.to_string()))?;
        Ok((connector, spec))
    }

    pub fn discover_instance(&self, instance_id: &str) -> Result<Value, OrchestraError> {
        let instance = self.catalog.require_actor_instance(instance_id)?;
        let (connector, spec) = self.connector_for(&instance)?;
        Ok(connector.discover(&spec)?)
    }

    pub fn check_instance(&self, instance_id: &str) -> Result<ConnectionStatus, OrchestraError> {
        let instance = self.catalog.require_actor_instance(instance_id)?;
        let (connector, spec) = self.connector_for(&instance)?;
        Ok(connector.check(&spec)?)
    }

    /// Esquema de configuración del conector de un actor.
    pub fn actor_spec(&self, actor_id: &str) -> Result<Value, OrchestraError> {
        let actor = self.catalog.require_actor(actor_id)?;
        let key = ConnectorKey::new(actor.actor_type, &actor.module_name, &actor.name);
        let connector = self.registry
                            .create(&key)
                            .ok_or_else(|| OrchestraError::UnknownConnector(key.to_string()))?;
        Ok(connector.spec())
    }
}
