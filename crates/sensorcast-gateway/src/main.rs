use clap::Parser;
use sensorcast_broadcast::TokioScheduler;
use sensorcast_core::SensorcastConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod app;
mod http;
mod streams;
mod ws;

#[derive(Parser)]
#[command(author, version, about = "Simulated sensor streams over WebSocket")]
struct Cli {
    /// Config file (default: $SENSORCAST_CONFIG, then ~/.sensorcast/sensorcast.toml)
    #[arg(long)]
    config: Option<String>,
    /// Override gateway.port from the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sensorcast_gateway=info,sensorcast_broadcast=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // config path: --config > SENSORCAST_CONFIG env > ~/.sensorcast/sensorcast.toml
    let config_path = cli
        .config
        .or_else(|| std::env::var("SENSORCAST_CONFIG").ok());
    let mut config = SensorcastConfig::load(config_path.as_deref())?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;

    let state = Arc::new(app::AppState::build(config, &TokioScheduler)?);
    let router = app::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("sensorcast gateway listening on {}", addr);

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown requested");
            shutdown_state.stop_all();
        })
        .await?;

    info!("sensorcast gateway stopped");
    Ok(())
}
