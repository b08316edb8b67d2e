
use dat_domain::{ActorInstancePatch, ActorType, CatalogStore, ConnectionPatch, DomainError, Status};
use dat_persistence::{PgCatalog, PoolProvider};
use serde_json::json;
use test_support::{seed_connection, with_pool};

#[test]
fn connection_roundtrip_and_patch() {
    with_pool(|pool| {
        let catalog = PgCatalog::new(PoolProvider { pool: pool.clone() });
        let conn = seed_connection(&catalog, "ws-cat");
        let loaded = catalog.require_connection(&conn.id).unwrap();
        assert_eq!(loaded.namespace_format, "${SOURCE_NAMESPACE}");
        assert_eq!(loaded.source_instance_id, conn.source_instance_id);

        let patch = ConnectionPatch { prefix: Some("p_".into()), status: Some(Status::Inactive), ..Default::default() };
        let updated = catalog.update_connection(&conn.id, &patch).unwrap();
        assert_eq!(updated.prefix.as_deref(), Some("p_"));
        assert_eq!(updated.name, "pg-test");
        assert_eq!(catalog.require_connection(&conn.id).unwrap().status, Status::Inactive);
    });
}

#[test]
fn instance_rules_match_in_memory() {
    with_pool(|pool| {
        let catalog = PgCatalog::new(PoolProvider { pool: pool.clone() });
        let conn = seed_connection(&catalog, "ws-rules");
        let err = catalog.delete_actor_instance(&conn.destination_instance_id).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let patch = ActorInstancePatch { configuration: Some(json!({"k": 2})), ..Default::default() };
        let inst = catalog.update_actor_instance(&conn.destination_instance_id, &patch).unwrap();
        assert_eq!(inst.configuration, json!({"k": 2}));
        assert_eq!(inst.actor_type, ActorType::Destination);

        catalog.delete_connection(&conn.id).unwrap();
        catalog.delete_actor_instance(&conn.destination_instance_id).unwrap();
        assert!(catalog.get_actor_instance(&conn.destination_instance_id).unwrap().is_none());
        assert!(matches!(catalog.delete_connection(&conn.id), Err(DomainError::NotFound(_))));
    });
}

#[test]
fn actor_delete_is_restricted_while_instances_exist() {
    with_pool(|pool| {
        let catalog = PgCatalog::new(PoolProvider { pool: pool.clone() });
        let conn = seed_connection(&catalog, "ws-del-actor");
        let inst = catalog.require_actor_instance(&conn.generator_instance_id).unwrap();
        assert!(matches!(catalog.delete_actor(&inst.actor_id), Err(DomainError::Validation(_))));

        catalog.delete_connection(&conn.id).unwrap();
        catalog.delete_actor_instance(&inst.id).unwrap();
        catalog.delete_actor(&inst.actor_id).unwrap();
        assert!(catalog.get_actor(&inst.actor_id).unwrap().is_none());
        assert!(matches!(catalog.delete_actor(&inst.actor_id), Err(DomainError::NotFound(_))));
    });
}

#[test]
fn duplicate_ids_are_rejected() {
    with_pool(|pool| {
        let catalog = PgCatalog::new(PoolProvider { pool: pool.clone() });
        let conn = seed_connection(&catalog, "ws-dup");
        let inst = catalog.require_actor_instance(&conn.source_instance_id).unwrap();
        assert!(matches!(catalog.insert_actor_instance(inst), Err(DomainError::Validation(_))));
        assert!(matches!(catalog.insert_connection(conn), Err(DomainError::Validation(_))));
    });
}
