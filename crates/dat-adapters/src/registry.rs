//! Registro de conectores.
//!
//! Cada conector se registra con una factoría al arrancar el proceso; una
//! petición sólo busca por clave, nunca carga código.
use dat_domain::ActorType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Configuración que recibe un conector: actor más configuración de la
/// instancia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpecification {
    pub name: String,
    pub module_name: String,
    pub connection_specification: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConnectionStatus {
    pub fn succeeded() -> Self {
        Self { status: CheckStatus::Succeeded, message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { status: CheckStatus::Failed, message: Some(message.into()) }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("connector failed: {0}")]
    Failed(String),
}

/// Capacidades de un conector.
pub trait Connector: Send + Sync {
    /// Esquema JSON de la configuración que acepta.
    fn spec(&self) -> Value;
    fn check(&self, config: &ConnectorSpecification) -> Result<ConnectionStatus, ConnectorError>;
    /// Catálogo de streams disponibles.
    fn discover(&self, config: &ConnectorSpecification) -> Result<Value, ConnectorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorKey {
    pub actor_type: ActorType,
    pub module_name: String,
    pub actor_name: String,
}

impl ConnectorKey {
    pub fn new(actor_type: ActorType, module_name: &str, actor_name: &str) -> Self {
        Self { actor_type, module_name: module_name.to_string(), actor_name: actor_name.to_string() }
    }
}

impl fmt::Display for ConnectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.actor_type, self.module_name, self.actor_name)
    }
}

type ConnectorFactory = Box<dyn Fn() -> Box<dyn Connector> + Send + Sync>;

#[derive(Default)]
pub struct ConnectorRegistry {
    factories: HashMap<ConnectorKey, ConnectorFactory>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra (o reemplaza) la factoría para `key`.
    pub fn register<F>(&mut self, key: ConnectorKey, factory: F) -> &mut Self
        where F: Fn() -> Box<dyn Connector> + Send + Sync + 'static
    {
        if self.factories.insert(key.clone(), Box::new(factory)).is_some() {
            log::warn!("connector {key} registered twice; keeping the last factory");
        }
        self
    }

    pub fn contains(&self, key: &ConnectorKey) -> bool {
        self.factories.contains_key(key)
    }

    /// Instancia nueva del conector, o `None` si la clave no está registrada.
    pub fn create(&self, key: &ConnectorKey) -> Option<Box<dyn Connector>> {
        self.factories.get(key).map(|f| f())
    }

    pub fn keys(&self) -> Vec<&ConnectorKey> {
        let mut keys: Vec<&ConnectorKey> = self.factories.keys().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Conector de respuesta fija. Exige que la configuración sea un objeto
/// con las claves de `required`.
#[derive(Debug, Clone)]
pub struct StaticConnector {
    pub spec: Value,
    pub catalog: Value,
    pub required: Vec<String>,
}

impl StaticConnector {
    pub fn new(catalog: Value) -> Self {
        Self { spec: Value::Object(Default::default()), catalog, required: Vec::new() }
    }

    pub fn requiring(mut self, keys: &[&str]) -> Self {
        self.required = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    fn missing_key(&self, config: &ConnectorSpecification) -> Option<String> {
        let obj = config.connection_specification.as_object();
        self.required
            .iter()
            .find(|k| obj.map_or(true, |m| !m.contains_key(k.as_str())))
            .cloned()
    }
}

impl Connector for StaticConnector {
    fn spec(&self) -> Value {
        self.spec.clone()
    }

    fn check(&self, config: &ConnectorSpecification) -> Result<ConnectionStatus, ConnectorError> {
        Ok(match self.missing_key(config) {
            Some(k) => ConnectionStatus::failed(format!("missing '{k}'")),
            None => ConnectionStatus::succeeded(),
        })
    }

    fn discover(&self, config: &ConnectorSpecification) -> Result<Value, ConnectorError> {
        match self.missing_key(config) {
            Some(k) => Err(ConnectorError::InvalidConfig(format!("missing '{k}'"))),
            None => Ok(self.catalog.clone()),
        }
    }
}
