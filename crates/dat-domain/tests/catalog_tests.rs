use dat_domain::{Actor, ActorInstance, ActorType, CatalogStore, Connection, ConnectionPatch, DomainError, InMemoryCatalog, Status};
use serde_json::json;

fn seeded() -> (InMemoryCatalog, Connection) {
    let catalog = InMemoryCatalog::new();
    let mut ids = Vec::new();
    for (t, module) in [(ActorType::Source, "website_crawler"),
                        (ActorType::Generator, "openai"),
                        (ActorType::Destination, "pinecone")]
    {
        let actor = catalog.insert_actor(Actor::new(module, module, t)).expect("actor");
        let inst = catalog.insert_actor_instance(ActorInstance::new("w1", &actor.id, module, t, json!({})))
                          .expect("instance");
        ids.push(inst.id);
    }
    let conn = catalog.insert_connection(Connection::new("w1", "crawl", &ids[0], &ids[1], &ids[2]))
                      .expect("connection");
    (catalog, conn)
}

#[test]
fn update_connection_applies_patch_only() {
    let (catalog, conn) = seeded();
    let patch = ConnectionPatch { name: Some("renamed".into()), ..Default::default() };
    let updated = catalog.update_connection(&conn.id, &patch).unwrap();
    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.source_instance_id, conn.source_instance_id);
    assert_eq!(catalog.require_connection(&conn.id).unwrap().name, "renamed");
}

#[test]
fn connection_with_wrong_roles_is_rejected() {
    let (catalog, conn) = seeded();
    // source y destination intercambiados
    let swapped = Connection::new("w1", "bad", &conn.destination_instance_id, &conn.generator_instance_id, &conn.source_instance_id);
    assert!(matches!(catalog.insert_connection(swapped), Err(DomainError::Validation(_))));
}

#[test]
fn instance_in_use_cannot_be_deleted() {
    let (catalog, conn) = seeded();
    let err = catalog.delete_actor_instance(&conn.generator_instance_id).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    catalog.delete_connection(&conn.id).unwrap();
    catalog.delete_actor_instance(&conn.generator_instance_id).unwrap();
    assert!(catalog.get_actor_instance(&conn.generator_instance_id).unwrap().is_none());
}

#[test]
fn list_filters_by_status_and_type() {
    let (catalog, conn) = seeded();
    assert_eq!(catalog.list_connections(Some(Status::Active)).unwrap().len(), 1);
    catalog.update_connection(&conn.id, &ConnectionPatch { status: Some(Status::Inactive), ..Default::default() })
           .unwrap();
    assert!(catalog.list_connections(Some(Status::Active)).unwrap().is_empty());
    assert_eq!(catalog.list_actor_instances(Some(ActorType::Destination)).unwrap().len(), 1);
    assert_eq!(catalog.connections_using_instance(&conn.source_instance_id).unwrap().len(), 1);
}

#[test]
fn missing_connection_is_not_found() {
    let catalog = InMemoryCatalog::new();
    assert!(matches!(catalog.require_connection("nope"), Err(DomainError::NotFound(_))));
    assert!(matches!(catalog.update_connection("nope", &ConnectionPatch::default()), Err(DomainError::NotFound(_))));
}

#[test]
fn actor_in_use_cannot_be_deleted() {
    let (catalog, conn) = seeded();
    let inst = catalog.require_actor_instance(&conn.source_instance_id).unwrap();
    assert!(matches!(catalog.delete_actor(&inst.actor_id), Err(DomainError::Validation(_))));

    catalog.delete_connection(&conn.id).unwrap();
    catalog.delete_actor_instance(&inst.id).unwrap();
    catalog.delete_actor(&inst.actor_id).unwrap();
    assert!(catalog.get_actor(&inst.actor_id).unwrap().is_none());
    assert!(matches!(catalog.delete_actor(&inst.actor_id), Err(DomainError::NotFound(_))));
}

#[test]
fn duplicate_instance_and_connection_ids_are_rejected() {
    let (catalog, conn) = seeded();
    let mut inst = catalog.require_actor_instance(&conn.source_instance_id).unwrap();
    inst.name = "other".into();
    assert!(matches!(catalog.insert_actor_instance(inst), Err(DomainError::Validation(_))));
    assert_eq!(catalog.require_actor_instance(&conn.source_instance_id).unwrap().name, "website_crawler");

    let mut dup = conn.clone();
    dup.name = "other".into();
    assert!(matches!(catalog.insert_connection(dup), Err(DomainError::Validation(_))));
    assert_eq!(catalog.require_connection(&conn.id).unwrap().name, "crawl");
}
