//! `CatalogStore` sobre Postgres.
//!
//! Los enums se guardan como texto (CHECK en la migración) y se reparsean al
//! leer; un valor desconocido es un error de decodificación de fila.
use chrono::{DateTime, Utc};
use dat_domain::{Actor, ActorInstance, ActorInstancePatch, ActorPatch, ActorType, CatalogStore, Connection,
                 ConnectionPatch, DomainError, Schedule, Status};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use serde_json::Value;

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{actor_instances, actors, connections};

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = actors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ActorRow {
    pub id: String,
    pub name: String,
    pub module_name: String,
    pub icon: Option<String>,
    pub actor_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = actor_instances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ActorInstanceRow {
    pub id: String,
    pub workspace_id: String,
    pub actor_id: String,
    pub name: String,
    pub configuration: Value,
    pub actor_type: String,
    pub user_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ConnectionRow {
    pub id: String,
    pub workspace_id: String,
    pub source_instance_id: String,
    pub generator_instance_id: String,
    pub destination_instance_id: String,
    pub name: String,
    pub namespace_format: String,
    pub prefix: Option<String>,
    pub configuration: Option<Value>,
    pub catalog: Option<Value>,
    pub schedule: Option<Value>,
    pub schedule_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn decode<T: std::str::FromStr<Err = DomainError>>(raw: &str) -> Result<T, PersistenceError> {
    raw.parse().map_err(|e: DomainError| PersistenceError::Decode(e.to_string()))
}

impl From<&Actor> for ActorRow {
    fn from(a: &Actor) -> Self {
        Self { id: a.id.clone(),
               name: a.name.clone(),
               module_name: a.module_name.clone(),
               icon: a.icon.clone(),
               actor_type: a.actor_type.to_string(),
               status: a.status.to_string(),
               created_at: a.created_at,
               updated_at: a.updated_at }
    }
}

impl TryFrom<ActorRow> for Actor {
    type Error = PersistenceError;

    fn try_from(r: ActorRow) -> Result<Self, Self::Error> {
        Ok(Actor { actor_type: decode(&r.actor_type)?,
                   status: decode(&r.status)?,
                   id: r.id,
                   name: r.name,
                   module_name: r.module_name,
                   icon: r.icon,
                   created_at: r.created_at,
                   updated_at: r.updated_at })
    }
}

impl From<&ActorInstance> for ActorInstanceRow {
    fn from(i: &ActorInstance) -> Self {
        Self { id: i.id.clone(),
               workspace_id: i.workspace_id.clone(),
               actor_id: i.actor_id.clone(),
               name: i.name.clone(),
               configuration: i.configuration.clone(),
               actor_type: i.actor_type.to_string(),
               user_id: i.user_id.clone(),
               status: i.status.to_string(),
               created_at: i.created_at,
               updated_at: i.updated_at }
    }
}

impl TryFrom<ActorInstanceRow> for ActorInstance {
    type Error = PersistenceError;

    fn try_from(r: ActorInstanceRow) -> Result<Self, Self::Error> {
        Ok(ActorInstance { actor_type: decode(&r.actor_type)?,
                           status: decode(&r.status)?,
                           id: r.id,
                           workspace_id: r.workspace_id,
                           actor_id: r.actor_id,
                           name: r.name,
                           configuration: r.configuration,
                           user_id: r.user_id,
                           created_at: r.created_at,
                           updated_at: r.updated_at })
    }
}

impl TryFrom<&Connection> for ConnectionRow {
    type Error = PersistenceError;

    fn try_from(c: &Connection) -> Result<Self, Self::Error> {
        let schedule = c.schedule
                        .as_ref()
                        .map(serde_json::to_value)
                        .transpose()
                        .map_err(|e| PersistenceError::Invalid(format!("schedule: {e}")))?;
        Ok(Self { id: c.id.clone(),
                  workspace_id: c.workspace_id.clone(),
                  source_instance_id: c.source_instance_id.clone(),
                  generator_instance_id: c.generator_instance_id.clone(),
                  destination_instance_id: c.destination_instance_id.clone(),
                  name: c.name.clone(),
                  namespace_format: c.namespace_format.clone(),
                  prefix: c.prefix.clone(),
                  configuration: c.configuration.clone(),
                  catalog: c.catalog.clone(),
                  schedule,
                  schedule_type: c.schedule_type.to_string(),
                  status: c.status.to_string(),
                  created_at: c.created_at,
                  updated_at: c.updated_at })
    }
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = PersistenceError;

    fn try_from(r: ConnectionRow) -> Result<Self, Self::Error> {
        let schedule = r.schedule
                        .map(serde_json::from_value::<Schedule>)
                        .transpose()
                        .map_err(|e| PersistenceError::Decode(format!("connection {} schedule: {e}", r.id)))?;
        Ok(Connection { schedule_type: decode(&r.schedule_type)?,
                        status: decode(&r.status)?,
                        schedule,
                        id: r.id,
                        workspace_id: r.workspace_id,
                        source_instance_id: r.source_instance_id,
                        generator_instance_id: r.generator_instance_id,
                        destination_instance_id: r.destination_instance_id,
                        name: r.name,
                        namespace_format: r.namespace_format,
                        prefix: r.prefix,
                        configuration: r.configuration,
                        catalog: r.catalog,
                        created_at: r.created_at,
                        updated_at: r.updated_at })
    }
}

fn find_actor(tx: &mut PgConnection, id: &str) -> Result<Option<Actor>, PersistenceError> {
    actors::table.find(id)
                 .select(ActorRow::as_select())
                 .first(tx)
                 .optional()?
                 .map(Actor::try_from)
                 .transpose()
}

fn find_instance(tx: &mut PgConnection, id: &str) -> Result<Option<ActorInstance>, PersistenceError> {
    actor_instances::table.find(id)
                          .select(ActorInstanceRow::as_select())
                          .first(tx)
                          .optional()?
                          .map(ActorInstance::try_from)
                          .transpose()
}

fn find_connection(tx: &mut PgConnection, id: &str) -> Result<Option<Connection>, PersistenceError> {
    connections::table.find(id)
                      .select(ConnectionRow::as_select())
                      .first(tx)
                      .optional()?
                      .map(Connection::try_from)
                      .transpose()
}

fn using_instance(tx: &mut PgConnection, instance_id: &str) -> Result<Vec<Connection>, PersistenceError> {
    connections::table.filter(connections::source_instance_id.eq(instance_id)
                                                             .or(connections::generator_instance_id.eq(instance_id))
                                                             .or(connections::destination_instance_id.eq(instance_id)))
                      .order((connections::created_at.asc(), connections::id.asc()))
                      .select(ConnectionRow::as_select())
                      .load(tx)?
                      .into_iter()
                      .map(Connection::try_from)
                      .collect()
}

fn not_found(kind: &str, id: &str) -> PersistenceError {
    DomainError::not_found(kind, id).into()
}

/// Catálogo Postgres. Reglas iguales a `InMemoryCatalog`: tipos de actor
/// coherentes, roles correctos en la conexión y no se borra una instancia en
/// uso.
pub struct PgCatalog<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgCatalog<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Corre `f` en una transacción read-write con reintentos.
    fn tx<T, F>(&self, mut f: F) -> Result<T, DomainError>
        where F: FnMut(&mut PgConnection) -> Result<T, PersistenceError>
    {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| f(tx))
        }).map_err(DomainError::from)
    }
}

impl<P: ConnectionProvider> CatalogStore for PgCatalog<P> {
    fn get_actor(&self, id: &str) -> Result<Option<Actor>, DomainError> {
        self.tx(|tx| find_actor(tx, id))
    }

    fn list_actors(&self, actor_type: Option<ActorType>) -> Result<Vec<Actor>, DomainError> {
        self.tx(|tx| {
                let mut q = actors::table.select(ActorRow::as_select())
                                         .order((actors::created_at.asc(), actors::id.asc()))
                                         .into_boxed();
                if let Some(t) = actor_type {
                    q = q.filter(actors::actor_type.eq(t.as_str()));
                }
                q.load(tx)?.into_iter().map(Actor::try_from).collect()
            })
    }

    fn insert_actor(&self, actor: Actor) -> Result<Actor, DomainError> {
        actor.validate()?;
        let row = ActorRow::from(&actor);
        self.tx(|tx| {
                diesel::insert_into(actors::table).values(&row).execute(tx)?;
                Ok(())
            })?;
        Ok(actor)
    }

    fn update_actor(&self, id: &str, patch: &ActorPatch) -> Result<Actor, DomainError> {
        self.tx(|tx| {
                let mut actor = find_actor(tx, id)?.ok_or_else(|| not_found("actor", id))?;
                patch.apply(&mut actor);
                actor.validate()?;
                diesel::update(actors::table.find(id)).set(&ActorRow::from(&actor)).execute(tx)?;
                Ok(actor)
            })
    }

    fn delete_actor(&self, id: &str) -> Result<(), DomainError> {
        self.tx(|tx| {
                // la FK es ON DELETE RESTRICT; se valida antes para dar un error de dominio claro
                let in_use: i64 = actor_instances::table.filter(actor_instances::actor_id.eq(id))
                                                        .count()
                                                        .get_result(tx)?;
                if in_use > 0 {
                    return Err(PersistenceError::Invalid(format!("actor '{id}' is used by {in_use} actor instance(s)")));
                }
                match diesel::delete(actors::table.find(id)).execute(tx)? {
                    0 => Err(not_found("actor", id)),
                    _ => Ok(()),
                }
            })
    }

    fn get_actor_instance(&self, id: &str) -> Result<Option<ActorInstance>, DomainError> {
        self.tx(|tx| find_instance(tx, id))
    }

    fn list_actor_instances(&self, actor_type: Option<ActorType>) -> Result<Vec<ActorInstance>, DomainError> {
        self.tx(|tx| {
                let mut q = actor_instances::table.select(ActorInstanceRow::as_select())
                                                  .order((actor_instances::created_at.asc(), actor_instances::id.asc()))
                                                  .into_boxed();
                if let Some(t) = actor_type {
                    q = q.filter(actor_instances::actor_type.eq(t.as_str()));
                }
                q.load(tx)?.into_iter().map(ActorInstance::try_from).collect()
            })
    }

    fn insert_actor_instance(&self, instance: ActorInstance) -> Result<ActorInstance, DomainError> {
        instance.validate()?;
        let row = ActorInstanceRow::from(&instance);
        self.tx(|tx| {
                let actor = find_actor(tx, &instance.actor_id)?.ok_or_else(|| not_found("actor", &instance.actor_id))?;
                if actor.actor_type != instance.actor_type {
                    return Err(PersistenceError::Invalid(format!("instance type {} does not match actor type {}",
                                                                 instance.actor_type, actor.actor_type)));
                }
                diesel::insert_into(actor_instances::table).values(&row).execute(tx)?;
                Ok(())
            })?;
        Ok(instance)
    }

    fn update_actor_instance(&self, id: &str, patch: &ActorInstancePatch) -> Result<ActorInstance, DomainError> {
        self.tx(|tx| {
                let mut instance = find_instance(tx, id)?.ok_or_else(|| not_found("actor instance", id))?;
                patch.apply(&mut instance);
                instance.validate()?;
                diesel::update(actor_instances::table.find(id)).set(&ActorInstanceRow::from(&instance))
                                                                .execute(tx)?;
                Ok(instance)
            })
    }

    fn delete_actor_instance(&self, id: &str) -> Result<(), DomainError> {
        self.tx(|tx| {
                let in_use = using_instance(tx, id)?;
                if !in_use.is_empty() {
                    return Err(PersistenceError::Invalid(format!("actor instance '{id}' is used by {} connection(s)",
                                                                 in_use.len())));
                }
                match diesel::delete(actor_instances::table.find(id)).execute(tx)? {
                    0 => Err(not_found("actor instance", id)),
                    _ => Ok(()),
                }
            })
    }

    fn get_connection(&self, id: &str) -> Result<Option<Connection>, DomainError> {
        self.tx(|tx| find_connection(tx, id))
    }

    fn list_connections(&self, status: Option<Status>) -> Result<Vec<Connection>, DomainError> {
        self.tx(|tx| {
                let mut q = connections::table.select(ConnectionRow::as_select())
                                              .order((connections::created_at.asc(), connections::id.asc()))
                                              .into_boxed();
                if let Some(s) = status {
                    q = q.filter(connections::status.eq(s.as_str()));
                }
                q.load(tx)?.into_iter().map(Connection::try_from).collect()
            })
    }

    fn insert_connection(&self, connection: Connection) -> Result<Connection, DomainError> {
        connection.validate()?;
        let row = ConnectionRow::try_from(&connection)?;
        self.tx(|tx| {
                for role in [ActorType::Source, ActorType::Generator, ActorType::Destination] {
                    let id = connection.instance_id_for(role);
                    let inst = find_instance(tx, id)?.ok_or_else(|| not_found("actor instance", id))?;
                    if inst.actor_type != role {
                        return Err(PersistenceError::Invalid(format!("instance '{}' is a {}, expected {role}",
                                                                     inst.id, inst.actor_type)));
                    }
                }
                diesel::insert_into(connections::table).values(&row).execute(tx)?;
                Ok(())
            })?;
        debug!("insert_connection id={} workspace={}", connection.id, connection.workspace_id);
        Ok(connection)
    }

    fn update_connection(&self, id: &str, patch: &ConnectionPatch) -> Result<Connection, DomainError> {
        self.tx(|tx| {
                let mut connection = find_connection(tx, id)?.ok_or_else(|| not_found("connection", id))?;
                patch.apply(&mut connection);
                connection.validate()?;
                diesel::update(connections::table.find(id)).set(&ConnectionRow::try_from(&connection)?)
                                                            .execute(tx)?;
                Ok(connection)
            })
    }

    fn delete_connection(&self, id: &str) -> Result<(), DomainError> {
        self.tx(|tx| match diesel::delete(connections::table.find(id)).execute(tx)? {
                    0 => Err(not_found("connection", id)),
                    _ => Ok(()),
                })
    }

    fn connections_using_instance(&self, instance_id: &str) -> Result<Vec<Connection>, DomainError> {
        self.tx(|tx| using_instance(tx, instance_id))
    }
}
