use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ActorType, DomainError, Status};

/// Instanciación configurada de un actor dentro de un workspace.
///
/// `configuration` es la especificación de conexión del conector (opaca
/// para el backend; la valida el propio conector en `check`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorInstance {
    pub id: String,
    pub workspace_id: String,
    pub actor_id: String,
    pub name: String,
    #[serde(default = "empty_configuration")]
    pub configuration: Value,
    pub actor_type: ActorType,
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn empty_configuration() -> Value {
    Value::Object(Default::default())
}

impl ActorInstance {
    pub fn new(workspace_id: &str, actor_id: &str, name: &str, actor_type: ActorType, configuration: Value) -> Self {
        let now = Utc::now();
        Self { id: uuid::Uuid::new_v4().to_string(),
               workspace_id: workspace_id.to_string(),
               actor_id: actor_id.to_string(),
               name: name.to_string(),
               configuration,
               actor_type,
               user_id: None,
               status: Status::Active,
               created_at: now,
               updated_at: now }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.workspace_id.is_empty() || self.actor_id.is_empty() {
            return Err(DomainError::Validation("actor instance needs workspace_id and actor_id".into()));
        }
        if !self.configuration.is_object() {
            return Err(DomainError::Validation("actor instance configuration must be a JSON object".into()));
        }
        Ok(())
    }
}

/// Actualización parcial de una `ActorInstance`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorInstancePatch {
    pub workspace_id: Option<String>,
    pub actor_id: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub actor_type: Option<ActorType>,
    pub status: Option<Status>,
    pub configuration: Option<Value>,
}

impl ActorInstancePatch {
    pub fn apply(&self, instance: &mut ActorInstance) {
        if let Some(v) = &self.workspace_id {
            instance.workspace_id = v.clone();
        }
        if let Some(v) = &self.actor_id {
            instance.actor_id = v.clone();
        }
        if let Some(v) = &self.user_id {
            instance.user_id = Some(v.clone());
        }
        if let Some(v) = &self.name {
            instance.name = v.clone();
        }
        if let Some(v) = self.actor_type {
            instance.actor_type = v;
        }
        if let Some(v) = self.status {
            instance.status = v;
        }
        if let Some(v) = &self.configuration {
            instance.configuration = v.clone();
        }
        instance.updated_at = Utc::now();
    }
}
