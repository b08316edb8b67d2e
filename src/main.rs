use std::sync::Arc;

use dat_adapters::{ConnectorKey, ConnectorRegistry, InMemoryDispatcher, StaticConnector};
use dat_core::{DatMessage, LogLevel};
use dat_domain::{Actor, ActorInstance, ActorType, CatalogStore, Connection};
use datflow::{App, AppConfig, AppError, Snapshot};
use log::error;
use serde_json::{json, to_string_pretty};

/// Registro con un conector fijo por rol, suficiente para la demo.
fn demo_registry() -> ConnectorRegistry {
    let mut registry = ConnectorRegistry::new();
    for (t, module, name) in [(ActorType::Source, "website_crawler", "WebsiteCrawler"),
                              (ActorType::Generator, "openai", "OpenAI"),
                              (ActorType::Destination, "pinecone", "Pinecone")]
    {
        registry.register(ConnectorKey::new(t, module, name),
                          || Box::new(StaticConnector::new(json!({"streams": [{"name": "pages"}]}))));
    }
    registry
}

/// Crea actores, instancias y una conexión; devuelve el id de la conexión.
fn seed_catalog(catalog: &dyn CatalogStore) -> Result<String, AppError> {
    let mut ids = Vec::new();
    for (t, module, name) in [(ActorType::Source, "website_crawler", "WebsiteCrawler"),
                              (ActorType::Generator, "openai", "OpenAI"),
                              (ActorType::Destination, "pinecone", "Pinecone")]
    {
        let actor = catalog.insert_actor(Actor::new(name, module, t))?;
        let config = json!({"site_url": "https://example.com"});
        let inst = catalog.insert_actor_instance(ActorInstance::new("demo-ws", &actor.id, module, t, config))?;
        ids.push(inst.id);
    }
    let conn = catalog.insert_connection(Connection::new("demo-ws", "docs to vectors", &ids[0], &ids[1], &ids[2]))?;
    Ok(conn.id)
}

/// Dos ejecuciones: una termina bien con 12 documentos y otra falla.
fn ingest_demo_runs(app: &App, connection_id: &str) -> Result<(), AppError> {
    let ok_run = [DatMessage::log(LogLevel::Info, "Job run started", 1_700_000_000),
                  DatMessage::state("pages", json!({"cursor": 40}), 1_700_000_010),
                  DatMessage::log(LogLevel::Info, "{\"n_docs_processed\": 12}", 1_700_000_020),
                  DatMessage::log(LogLevel::Info, "Job run ended", 1_700_000_030)];
    for msg in &ok_run {
        app.runs.append_message(connection_id, "run-ok", msg)?;
    }
    let failed_run = [DatMessage::log(LogLevel::Info, "Job run started", 1_700_000_100),
                      DatMessage::log(LogLevel::Error, "rate limited by provider", 1_700_000_110)];
    for msg in &failed_run {
        app.runs.append_message(connection_id, "run-failed", msg)?;
    }
    Ok(())
}

fn run_demo(app: &App, connection_id: &str, label: &str) -> Result<(), AppError> {
    ingest_demo_runs(app, connection_id)?;

    let summaries = app.runs.fetch_run_summaries(connection_id, Some("demo-ws"))?;
    println!("[{label}] runs: {}", to_string_pretty(&summaries)?);

    let states = app.runs.fetch_stream_states(connection_id, None)?;
    println!("[{label}] stream states: {}", to_string_pretty(&states)?);

    let config = app.orchestrator.trigger_run(connection_id)?;
    println!("[{label}] run encolado para '{}' (source={})", config.connection.name, config.source.module_name);

    Ok(())
}

fn in_memory_demo(config: &AppConfig) -> Result<(), AppError> {
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let app = App::from_snapshot(Snapshot::default(), dispatcher.clone(), demo_registry(), config)?;
    let connection_id = seed_catalog(app.runs.catalog().as_ref())?;
    run_demo(&app, &connection_id, "memoria")?;
    println!("[memoria] tareas enviadas: {}", dispatcher.submitted().len());
    Ok(())
}

#[cfg(feature = "pg_demo")]
fn pg_demo(config: &AppConfig) -> Result<(), AppError> {
    let app = App::postgres(Arc::new(InMemoryDispatcher::new()), demo_registry(), config)?;
    let connection_id = seed_catalog(app.runs.catalog().as_ref())?;
    run_demo(&app, &connection_id, "postgres")
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = AppConfig::from_env();

    if let Err(e) = in_memory_demo(&config) {
        error!("demo en memoria falló: {e}");
        std::process::exit(e.exit_code());
    }

    #[cfg(feature = "pg_demo")]
    {
        if let Err(e) = pg_demo(&config) {
            error!("demo postgres falló: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
