//! Binary entry point: loads configuration, bootstraps the service bundle
//! (`state::AppState`), assembles the `axum` router, and serves until
//! `SIGINT`/`SIGTERM` (SPEC_FULL.md §A.1, §B "Graceful shutdown").

use clap::Parser;

use trellis_server::config::{Cli, Config};
use trellis_server::state::AppState;
use trellis_server::{build_router, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    observability::init_tracing(config.log_format);

    tracing::info!(base_url = %config.base_url, bind = %config.bind_address, "starting trellis-server");

    let state = AppState::bootstrap(config).await?;
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.bind_address).await?;
    tracing::info!(addr = %state.config.bind_address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}
