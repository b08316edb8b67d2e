// dat-domain library entry point
pub mod actor;
pub mod actor_instance;
pub mod catalog;
pub mod connection;
pub mod error;
pub use actor::{Actor, ActorPatch, ActorType, Status};
pub use actor_instance::{ActorInstance, ActorInstancePatch};
pub use catalog::{CatalogStore, InMemoryCatalog};
pub use connection::{Connection, ConnectionPatch, Cron, Schedule, ScheduleType, DEFAULT_NAMESPACE_FORMAT};
pub use error::DomainError;
