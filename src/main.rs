use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use route_mesh::adapters::inbound::{build_router, AppState};
use route_mesh::adapters::outbound::{build_optimizer, init_combined_logger, InMemoryAgentStore};
use route_mesh::application::CoordinationService;
use route_mesh::config::DEFAULT_CONFIG_FILE;
use route_mesh::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config_path =
        std::env::var("ROUTE_MESH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = Config::load(&config_path)?;

    // Leaves the `log` facade free for the fast_log file appender.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting route-mesh");

    let logger = init_combined_logger(&config.logging);

    let service = Arc::new(
        CoordinationService::new(
            Arc::new(InMemoryAgentStore::new()),
            build_optimizer(&config.optimizer),
            logger,
            config.coordination.clone(),
            config.demo.grid(),
        )
        .with_demo_limit(config.demo.max_count),
    );
    let app = build_router(AppState::new(service, config.demo.default_count));

    let addr = config.server.socket_addr()?;
    info!("Listening on http://{}", addr);
    info!("  GET  /ws/agent        - agent WebSocket");
    info!("  POST /optimise        - batch route optimisation");
    info!("  GET  /demo?num_cars=N - spawn synthetic agents");
    info!("  GET  /health          - liveness check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Shutting down route-mesh");
    Ok(())
}
