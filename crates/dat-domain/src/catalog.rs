//! Catálogo CRUD de actores, instancias y conexiones.
//!
//! El trait `CatalogStore` es la frontera con la capa de persistencia: el
//! backend Postgres vive en `dat-persistence`; aquí sólo está la versión en
//! memoria (tests, CLI offline y demo).
use dashmap::DashMap;
use log::debug;

use crate::{Actor, ActorInstance, ActorInstancePatch, ActorPatch, ActorType, Connection, ConnectionPatch, DomainError, Status};

pub trait CatalogStore: Send + Sync {
    fn get_actor(&self, id: &str) -> Result<Option<Actor>, DomainError>;
    fn list_actors(&self, actor_type: Option<ActorType>) -> Result<Vec<Actor>, DomainError>;
    fn insert_actor(&self, actor: Actor) -> Result<Actor, DomainError>;
    fn update_actor(&self, id: &str, patch: &ActorPatch) -> Result<Actor, DomainError>;
    /// Falla con `Validation` mientras alguna instancia lo referencie.
    fn delete_actor(&self, id: &str) -> Result<(), DomainError>;

    fn get_actor_instance(&self, id: &str) -> Result<Option<ActorInstance>, DomainError>;
    fn list_actor_instances(&self, actor_type: Option<ActorType>) -> Result<Vec<ActorInstance>, DomainError>;
    fn insert_actor_instance(&self, instance: ActorInstance) -> Result<ActorInstance, DomainError>;
    fn update_actor_instance(&self, id: &str, patch: &ActorInstancePatch) -> Result<ActorInstance, DomainError>;
    fn delete_actor_instance(&self, id: &str) -> Result<(), DomainError>;

    fn get_connection(&self, id: &str) -> Result<Option<Connection>, DomainError>;
    fn list_connections(&self, status: Option<Status>) -> Result<Vec<Connection>, DomainError>;
    fn insert_connection(&self, connection: Connection) -> Result<Connection, DomainError>;
    fn update_connection(&self, id: &str, patch: &ConnectionPatch) -> Result<Connection, DomainError>;
    fn delete_connection(&self, id: &str) -> Result<(), DomainError>;
    /// Conexiones que referencian la instancia en cualquiera de sus tres roles.
    fn connections_using_instance(&self, instance_id: &str) -> Result<Vec<Connection>, DomainError>;

    /// Igual que `get_connection` pero convierte la ausencia en `NotFound`.
    fn require_connection(&self, id: &str) -> Result<Connection, DomainError> {
        self.get_connection(id)?.ok_or_else(|| DomainError::not_found("connection", id))
    }

    fn require_actor_instance(&self, id: &str) -> Result<ActorInstance, DomainError> {
        self.get_actor_instance(id)?.ok_or_else(|| DomainError::not_found("actor instance", id))
    }

    fn require_actor(&self, id: &str) -> Result<Actor, DomainError> {
        self.get_actor(id)?.ok_or_else(|| DomainError::not_found("actor", id))
    }
}

// Permite compartir un mismo catálogo entre servicios.
impl<T: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<T> {
    fn get_actor(&self, id: &str) -> Result<Option<Actor>, DomainError> {
        (**self).get_actor(id)
    }

    fn list_actors(&self, actor_type: Option<ActorType>) -> Result<Vec<Actor>, DomainError> {
        (**self).list_actors(actor_type)
    }

    fn insert_actor(&self, actor: Actor) -> Result<Actor, DomainError> {
        (**self).insert_actor(actor)
    }

    fn update_actor(&self, id: &str, patch: &ActorPatch) -> Result<Actor, DomainError> {
        (**self).update_actor(id, patch)
    }

    fn delete_actor(&self, id: &str) -> Result<(), DomainError> {
        (**self).delete_actor(id)
    }

    fn get_actor_instance(&self, id: &str) -> Result<Option<ActorInstance>, DomainError> {
        (**self).get_actor_instance(id)
    }

    fn list_actor_instances(&self, actor_type: Option<ActorType>) -> Result<Vec<ActorInstance>, DomainError> {
        (**self).list_actor_instances(actor_type)
    }

    fn insert_actor_instance(&self, instance: ActorInstance) -> Result<ActorInstance, DomainError> {
        (**self).insert_actor_instance(instance)
    }

    fn update_actor_instance(&self, id: &str, patch: &ActorInstancePatch) -> Result<ActorInstance, DomainError> {
        (**self).update_actor_instance(id, patch)
    }

    fn delete_actor_instance(&self, id: &str) -> Result<(), DomainError> {
        (**self).delete_actor_instance(id)
    }

    fn get_connection(&self, id: &str) -> Result<Option<Connection>, DomainError> {
        (**self).get_connection(id)
    }

    fn list_connections(&self, status: Option<Status>) -> Result<Vec<Connection>, DomainError> {
        (**self).list_connections(status)
    }

    fn insert_connection(&self, connection: Connection) -> Result<Connection, DomainError> {
        (**self).insert_connection(connection)
    }

    fn update_connection(&self, id: &str, patch: &ConnectionPatch) -> Result<Connection, DomainError> {
        (**self).update_connection(id, patch)
    }

    fn delete_connection(&self, id: &str) -> Result<(), DomainError> {
        (**self).delete_connection(id)
    }

    fn connections_using_instance(&self, instance_id: &str) -> Result<Vec<Connection>, DomainError> {
        (**self).connections_using_instance(instance_id)
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    actors: DashMap<String, Actor>,
    instances: DashMap<String, ActorInstance>,
    connections: DashMap<String, Connection>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

// DashMap no garantiza orden de iteración: se ordena por (created_at, id).
fn sorted<T>(items: Vec<T>, key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, String)) -> Vec<T> {
    let mut items = items;
    items.sort_by_key(|i| key(i));
    items
}

impl CatalogStore for InMemoryCatalog {
    fn get_actor(&self, id: &str) -> Result<Option<Actor>, DomainError> {
        Ok(self.actors.get(id).map(|a| a.clone()))
    }

    fn list_actors(&self, actor_type: Option<ActorType>) -> Result<Vec<Actor>, DomainError> {
        let items = self.actors
                        .iter()
                        .filter(|a| actor_type.map_or(true, |t| a.actor_type == t))
                        .map(|a| a.clone())
                        .collect();
        Ok(sorted(items, |a: &Actor| (a.created_at, a.id.clone())))
    }

    fn insert_actor(&self, actor: Actor) -> Result<Actor, DomainError> {
        actor.validate()?;
        if self.actors.contains_key(&actor.id) {
            return Err(DomainError::Validation(format!("actor '{}' already exists", actor.id)));
        }
        self.actors.insert(actor.id.clone(), actor.clone());
        Ok(actor)
    }

    fn update_actor(&self, id: &str, patch: &ActorPatch) -> Result<Actor, DomainError> {
        let mut entry = self.actors.get_mut(id).ok_or_else(|| DomainError::not_found("actor", id))?;
        let mut updated = entry.clone();
        patch.apply(&mut updated);
        updated.validate()?;
        *entry = updated.clone();
        Ok(updated)
    }

    fn delete_actor(&self, id: &str) -> Result<(), DomainError> {
        let in_use = self.instances.iter().filter(|i| i.actor_id == id).count();
        if in_use > 0 {
            return Err(DomainError::Validation(format!("actor '{id}' is used by {in_use} actor instance(s)")));
        }
        self.actors
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("actor", id))
    }

    fn get_actor_instance(&self, id: &str) -> Result<Option<ActorInstance>, DomainError> {
        Ok(self.instances.get(id).map(|i| i.clone()))
    }

    fn list_actor_instances(&self, actor_type: Option<ActorType>) -> Result<Vec<ActorInstance>, DomainError> {
        let items = self.instances
                        .iter()
                        .filter(|i| actor_type.map_or(true, |t| i.actor_type == t))
                        .map(|i| i.clone())
                        .collect();
        Ok(sorted(items, |i: &ActorInstance| (i.created_at, i.id.clone())))
    }

    fn insert_actor_instance(&self, instance: ActorInstance) -> Result<ActorInstance, DomainError> {
        instance.validate()?;
        let actor = self.require_actor(&instance.actor_id)?;
        if actor.actor_type != instance.actor_type {
            return Err(DomainError::Validation(format!("instance type {} does not match actor type {}",
                                                       instance.actor_type, actor.actor_type)));
        }
        if self.instances.contains_key(&instance.id) {
            return Err(DomainError::Validation(format!("actor instance '{}' already exists", instance.id)));
        }
        self.instances.insert(instance.id.clone(), instance.clone());
        Ok(instance)
    }

    fn update_actor_instance(&self, id: &str, patch: &ActorInstancePatch) -> Result<ActorInstance, DomainError> {
        let mut entry = self.instances
                            .get_mut(id)
                            .ok_or_else(|| DomainError::not_found("actor instance", id))?;
        let mut updated = entry.clone();
        patch.apply(&mut updated);
        updated.validate()?;
        *entry = updated.clone();
        Ok(updated)
    }

    fn delete_actor_instance(&self, id: &str) -> Result<(), DomainError> {
        let in_use = self.connections_using_instance(id)?;
        if !in_use.is_empty() {
            return Err(DomainError::Validation(format!("actor instance '{id}' is used by {} connection(s)",
                                                       in_use.len())));
        }
        self.instances
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("actor instance", id))
    }

    fn get_connection(&self, id: &str) -> Result<Option<Connection>, DomainError> {
        Ok(self.connections.get(id).map(|c| c.clone()))
    }

    fn list_connections(&self, status: Option<Status>) -> Result<Vec<Connection>, DomainError> {
        let items = self.connections
                        .iter()
                        .filter(|c| status.map_or(true, |s| c.status == s))
                        .map(|c| c.clone())
                        .collect();
        Ok(sorted(items, |c: &Connection| (c.created_at, c.id.clone())))
    }

    fn insert_connection(&self, connection: Connection) -> Result<Connection, DomainError> {
        connection.validate()?;
        for role in [ActorType::Source, ActorType::Generator, ActorType::Destination] {
            let inst = self.require_actor_instance(connection.instance_id_for(role))?;
            if inst.actor_type != role {
                return Err(DomainError::Validation(format!("instance '{}' is a {}, expected {role}",
                                                           inst.id, inst.actor_type)));
            }
        }
        if self.connections.contains_key(&connection.id) {
            return Err(DomainError::Validation(format!("connection '{}' already exists", connection.id)));
        }
        debug!("insert_connection id={} workspace={}", connection.id, connection.workspace_id);
        self.connections.insert(connection.id.clone(), connection.clone());
        Ok(connection)
    }

    fn update_connection(&self, id: &str, patch: &ConnectionPatch) -> Result<Connection, DomainError> {
        let mut entry = self.connections
                            .get_mut(id)
                            .ok_or_else(|| DomainError::not_found("connection", id))?;
        let mut updated = entry.clone();
        patch.apply(&mut updated);
        updated.validate()?;
        *entry = updated.clone();
        Ok(updated)
    }

    fn delete_connection(&self, id: &str) -> Result<(), DomainError> {
        self.connections
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("connection", id))
    }

    fn connections_using_instance(&self, instance_id: &str) -> Result<Vec<Connection>, DomainError> {
        let items = self.connections
                        .iter()
                        .filter(|c| c.uses_instance(instance_id))
                        .map(|c| c.clone())
                        .collect();
        Ok(sorted(items, |c: &Connection| (c.created_at, c.id.clone())))
    }
}
