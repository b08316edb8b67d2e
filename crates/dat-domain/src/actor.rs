//! Actores: definiciones reutilizables de conectores (source, generator,
//! destination) identificadas por `module_name` + `name`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// Rol de un actor dentro de una conexión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Source,
    Generator,
    Destination,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Source => "source",
            ActorType::Generator => "generator",
            ActorType::Destination => "destination",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(ActorType::Source),
            "generator" => Ok(ActorType::Generator),
            "destination" => Ok(ActorType::Destination),
            other => Err(DomainError::Validation(format!("unknown actor type '{other}'"))),
        }
    }
}

/// Estado de activación compartido por actores, instancias y conexiones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(DomainError::Validation(format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub module_name: String,
    pub icon: Option<String>,
    pub actor_type: ActorType,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Actor {
    pub fn new(name: &str, module_name: &str, actor_type: ActorType) -> Self {
        let now = Utc::now();
        Self { id: uuid::Uuid::new_v4().to_string(),
               name: name.to_string(),
               module_name: module_name.to_string(),
               icon: None,
               actor_type,
               status: Status::Active,
               created_at: now,
               updated_at: now }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("actor name is empty".into()));
        }
        if self.module_name.trim().is_empty() {
            return Err(DomainError::Validation("actor module_name is empty".into()));
        }
        Ok(())
    }
}

/// Actualización parcial de un `Actor`: sólo cambian los campos presentes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorPatch {
    pub name: Option<String>,
    pub module_name: Option<String>,
    pub icon: Option<String>,
    pub actor_type: Option<ActorType>,
    pub status: Option<Status>,
}

impl ActorPatch {
    pub fn apply(&self, actor: &mut Actor) {
        if let Some(v) = &self.name {
            actor.name = v.clone();
        }
        if let Some(v) = &self.module_name {
            actor.module_name = v.clone();
        }
        if let Some(v) = &self.icon {
            actor.icon = Some(v.clone());
        }
        if let Some(v) = self.actor_type {
            actor.actor_type = v;
        }
        if let Some(v) = self.status {
            actor.status = v;
        }
        actor.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_type_roundtrips_through_str() {
        for t in [ActorType::Source, ActorType::Generator, ActorType::Destination] {
            assert_eq!(t.as_str().parse::<ActorType>().unwrap(), t);
        }
        assert!("sink".parse::<ActorType>().is_err());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut actor = Actor::new("S3", "s3", ActorType::Source);
        let patch = ActorPatch { icon: Some("s3.svg".into()), ..Default::default() };
        patch.apply(&mut actor);
        assert_eq!(actor.name, "S3");
        assert_eq!(actor.module_name, "s3");
        assert_eq!(actor.icon.as_deref(), Some("s3.svg"));
        assert_eq!(actor.status, Status::Active);
    }

    #[test]
    fn empty_module_name_is_rejected() {
        let actor = Actor::new("S3", " ", ActorType::Source);
        assert!(matches!(actor.validate(), Err(DomainError::Validation(_))));
    }
}
