use dat_adapters::{CheckStatus, ConnectionOrchestrator, ConnectorKey, ConnectorRegistry, DispatchSettings,
                   InMemoryDispatcher, OrchestraConfig, OrchestraError, StaticConnector};
use dat_domain::{Actor, ActorInstance, ActorType, CatalogStore, Connection, InMemoryCatalog};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    catalog: Arc<InMemoryCatalog>,
    connection: Connection,
    source_instance: String,
    source_actor: String,
}

fn fixture() -> Fixture {
    let catalog = Arc::new(InMemoryCatalog::new());
    let mut instances = Vec::new();
    let mut actors = Vec::new();
    for (t, module, name, cfg) in [(ActorType::Source, "website_crawler", "WebsiteCrawler", json!({"site_url": "https://x"})),
                                   (ActorType::Generator, "openai", "OpenAI", json!({"model": "m"})),
                                   (ActorType::Destination, "pinecone", "Pinecone", json!({"index": "i"}))]
    {
        let actor = catalog.insert_actor(Actor::new(name, module, t)).unwrap();
        let inst = catalog.insert_actor_instance(ActorInstance::new("w1", &actor.id, module, t, cfg)).unwrap();
        actors.push(actor.id);
        instances.push(inst.id);
    }
    let connection = catalog.insert_connection(Connection::new("w1", "crawl", &instances[0], &instances[1], &instances[2]))
                            .unwrap();
    Fixture { catalog, connection, source_instance: instances[0].clone(), source_actor: actors[0].clone() }
}

fn registry() -> ConnectorRegistry {
    let mut reg = ConnectorRegistry::new();
    reg.register(ConnectorKey::new(ActorType::Source, "website_crawler", "WebsiteCrawler"), || {
           Box::new(StaticConnector { spec: json!({"required": ["site_url"]}),
                                      catalog: json!({"document_streams": [{"name": "pages"}]}),
                                      required: vec!["site_url".into()] })
       });
    reg
}

#[test]
fn orchestra_config_resolves_three_roles() {
    let f = fixture();
    let orch = ConnectionOrchestrator::new(f.catalog.clone(), InMemoryDispatcher::new(), registry());
    let cfg = orch.orchestra_config(&f.connection.id).unwrap();
    assert_eq!(cfg.source.module_name, "website_crawler");
    assert_eq!(cfg.generator.name, "OpenAI");
    assert_eq!(cfg.destination.connection_specification, json!({"index": "i"}));

    // el payload lleva los campos de la conexión aplanados
    let v = serde_json::to_value(&cfg).unwrap();
    assert_eq!(v["id"], json!(f.connection.id));
    assert_eq!(v["namespace_format"], json!("${SOURCE_NAMESPACE}"));
}

#[test]
fn trigger_run_submits_config_to_worker_queue() {
    let f = fixture();
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let orch = ConnectionOrchestrator::new(f.catalog.clone(), dispatcher.clone(), registry());
    let cfg = orch.trigger_run(&f.connection.id).unwrap();
    let tasks = dispatcher.submitted();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_name, "dat_worker_task");
    assert_eq!(tasks[0].queue, "dat-worker-q");
    let sent: OrchestraConfig = serde_json::from_str(&tasks[0].payload).unwrap();
    assert_eq!(sent, cfg);
}

#[test]
fn dispatch_settings_override_queue() {
    let f = fixture();
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let orch = ConnectionOrchestrator::new(f.catalog.clone(), dispatcher.clone(), registry())
        .with_settings(DispatchSettings { task_name: "t".into(), queue: "q".into() });
    orch.trigger_run(&f.connection.id).unwrap();
    assert_eq!(dispatcher.submitted()[0].queue, "q");
}

#[test]
fn discover_and_check_use_registered_connector() {
    let f = fixture();
    let orch = ConnectionOrchestrator::new(f.catalog.clone(), InMemoryDispatcher::new(), registry());
    assert_eq!(orch.discover_instance(&f.source_instance).unwrap()["document_streams"][0]["name"], "pages");
    assert_eq!(orch.check_instance(&f.source_instance).unwrap().status, CheckStatus::Succeeded);
    assert_eq!(orch.actor_spec(&f.source_actor).unwrap()["required"][0], "site_url");
    // generator sin conector registrado
    let err = orch.discover_instance(&f.connection.generator_instance_id).unwrap_err();
    assert!(matches!(err, OrchestraError::UnknownConnector(ref k) if k == "generator/openai/OpenAI"));
}

#[test]
fn missing_connection_is_not_found() {
    let f = fixture();
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let orch = ConnectionOrchestrator::new(f.catalog, dispatcher.clone(), registry());
    assert!(matches!(orch.trigger_run("nope"), Err(OrchestraError::NotFound(_))));
    assert!(dispatcher.submitted().is_empty());
}
