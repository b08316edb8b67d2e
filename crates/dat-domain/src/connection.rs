//! Conexión: pipeline que une una instancia source, una generator y una
//! destination dentro de un workspace.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{ActorType, DomainError, Status};

pub const DEFAULT_NAMESPACE_FORMAT: &str = "${SOURCE_NAMESPACE}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    #[default]
    Manual,
    Scheduled,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Manual => "manual",
            ScheduleType::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ScheduleType::Manual),
            "scheduled" => Ok(ScheduleType::Scheduled),
            other => Err(DomainError::Validation(format!("unknown schedule type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cron {
    pub cron_expression: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub cron: Option<Cron>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub workspace_id: String,
    pub source_instance_id: String,
    pub generator_instance_id: String,
    pub destination_instance_id: String,
    pub name: String,
    #[serde(default = "default_namespace_format")]
    pub namespace_format: String,
    pub prefix: Option<String>,
    pub configuration: Option<Value>,
    /// Catálogo de streams seleccionado (opaco, lo produce `discover`).
    pub catalog: Option<Value>,
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_namespace_format() -> String {
    DEFAULT_NAMESPACE_FORMAT.to_string()
}

impl Connection {
    pub fn new(workspace_id: &str, name: &str, source: &str, generator: &str, destination: &str) -> Self {
        let now = Utc::now();
        Self { id: uuid::Uuid::new_v4().to_string(),
               workspace_id: workspace_id.to_string(),
               source_instance_id: source.to_string(),
               generator_instance_id: generator.to_string(),
               destination_instance_id: destination.to_string(),
               name: name.to_string(),
               namespace_format: default_namespace_format(),
               prefix: None,
               configuration: None,
               catalog: None,
               schedule: None,
               schedule_type: ScheduleType::Manual,
               status: Status::Active,
               created_at: now,
               updated_at: now }
    }

    /// Id de la instancia que ocupa el rol `actor_type` en esta conexión.
    pub fn instance_id_for(&self, actor_type: ActorType) -> &str {
        match actor_type {
            ActorType::Source => &self.source_instance_id,
            ActorType::Generator => &self.generator_instance_id,
            ActorType::Destination => &self.destination_instance_id,
        }
    }

    pub fn uses_instance(&self, instance_id: &str) -> bool {
        self.source_instance_id == instance_id
        || self.generator_instance_id == instance_id
        || self.destination_instance_id == instance_id
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.workspace_id.is_empty() {
            return Err(DomainError::Validation("connection workspace_id is empty".into()));
        }
        for (role, id) in [("source", &self.source_instance_id),
                           ("generator", &self.generator_instance_id),
                           ("destination", &self.destination_instance_id)]
        {
            if id.is_empty() {
                return Err(DomainError::Validation(format!("connection {role}_instance_id is empty")));
            }
        }
        if self.schedule_type == ScheduleType::Scheduled
           && self.schedule.as_ref().and_then(|s| s.cron.as_ref()).is_none()
        {
            return Err(DomainError::Validation("scheduled connection requires a cron schedule".into()));
        }
        Ok(())
    }
}

/// Actualización parcial de una `Connection`.
///
/// Las instancias enlazadas y el workspace no son editables: para cambiar
/// el pipeline se crea otra conexión.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPatch {
    pub name: Option<String>,
    pub namespace_format: Option<String>,
    pub prefix: Option<String>,
    pub configuration: Option<Value>,
    pub catalog: Option<Value>,
    pub schedule: Option<Schedule>,
    pub schedule_type: Option<ScheduleType>,
    pub status: Option<Status>,
}

impl ConnectionPatch {
    pub fn is_empty(&self) -> bool {
        *self == ConnectionPatch::default()
    }

    pub fn apply(&self, conn: &mut Connection) {
        if let Some(v) = &self.name {
            conn.name = v.clone();
        }
        if let Some(v) = &self.namespace_format {
            conn.namespace_format = v.clone();
        }
        if let Some(v) = &self.prefix {
            conn.prefix = Some(v.clone());
        }
        if let Some(v) = &self.configuration {
            conn.configuration = Some(v.clone());
        }
        if let Some(v) = &self.catalog {
            conn.catalog = Some(v.clone());
        }
        if let Some(v) = &self.schedule {
            conn.schedule = Some(v.clone());
        }
        if let Some(v) = self.schedule_type {
            conn.schedule_type = v;
        }
        if let Some(v) = self.status {
            conn.status = v;
        }
        conn.updated_at = Utc::now();
    }
}
