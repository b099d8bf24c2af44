use clap::Parser;
use fleet_coordinator::config::NodeConfig;
use fleet_coordinator::executor::LocalEngine;
use fleet_coordinator::executor::jobs::register_builtin_jobs;
use fleet_coordinator::executor::registry::JobHandlerRegistry;
use fleet_coordinator::membership::heartbeat::HeartbeatPublisher;
use fleet_coordinator::membership::sampler::SystemSampler;
use fleet_coordinator::membership::service::FleetView;
use fleet_coordinator::server::{AppState, build_router, serve};
use fleet_coordinator::shutdown::install_shutdown_handler;
use fleet_coordinator::storage::{MemoryStore, SharedStore};
use fleet_coordinator::streaming::StreamSettings;
use fleet_coordinator::tasks::TaskRegistry;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::parse();
    config.validate().map_err(anyhow::Error::msg)?;

    let node_id = config.resolve_node_id();
    tracing::info!("Starting node {} on {}", node_id, config.bind);

    let shutdown = install_shutdown_handler();

    // 1. Shared store:
    let store = connect_store(&config).await?;

    // 2. Execution engine:
    let handlers = JobHandlerRegistry::new();
    register_builtin_jobs(&handlers);
    tracing::info!("Job handlers: {:?}", handlers.list_handlers());
    let engine = LocalEngine::new(node_id.clone(), store.clone(), handlers, config.workers);
    let workers = engine.start(shutdown.clone());

    // 3. Heartbeats:
    let sampler = Box::new(SystemSampler::new());
    let publisher = HeartbeatPublisher::new(node_id.clone(), store.clone(), sampler)
        .with_timing(config.heartbeat_interval(), config.node_ttl());
    let heartbeat = tokio::spawn(publisher.run(shutdown.clone()));

    // 4. HTTP Router:
    let state = AppState {
        node_id,
        fleet: FleetView::new(store.clone()),
        registry: TaskRegistry::new(store.clone(), engine),
        stream: StreamSettings {
            interval: config.stream_interval(),
            shutdown: shutdown.clone(),
        },
    };
    let app = build_router(state, &config.cors_origins);

    // 5. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    serve(listener, app, shutdown.clone()).await?;

    // The server can also stop on its own; make sure background loops follow.
    shutdown.cancel();
    if let Err(e) = heartbeat.await {
        tracing::error!("Heartbeat publisher task failed: {}", e);
    }
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!("Job worker task failed: {}", e);
        }
    }

    tracing::info!("Node stopped");

    Ok(())
}

async fn connect_store(config: &NodeConfig) -> anyhow::Result<Arc<dyn SharedStore>> {
    match &config.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            let store = fleet_coordinator::storage::redis::RedisStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => anyhow::bail!("--redis-url was given but this build lacks the `redis` feature"),
        None => {
            tracing::warn!(
                "No shared store configured; running standalone with an in-process store"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
