//! bpmn-gateway server
//!
//! Serves the start-process form and API, and runs the external task worker
//! in the background. Configuration comes from the environment (see
//! `GatewayConfig`); a `.env` file is honoured.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bpmn_gateway::{
    build_router, AppState, EngineApi, ExternalTaskWorker, GatewayConfig, ProcessTrigger,
    RestEngineClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bpmn_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env().context("Loading gateway configuration")?;
    tracing::info!(
        engine = %config.engine.base_url,
        process_key = %config.process.key,
        "Configuration loaded"
    );

    let engine: Arc<dyn EngineApi> = Arc::new(
        RestEngineClient::new(&config.engine.base_url, config.engine.timeout())
            .context("Building engine client")?,
    );

    // Start the external task worker as a background task
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = if config.worker.enabled {
        let worker = ExternalTaskWorker::new(Arc::clone(&engine), &config.worker);
        Some(tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        }))
    } else {
        tracing::info!("External task worker disabled");
        None
    };

    let state = AppState::new(ProcessTrigger::new(engine, config.process.key.clone()));
    let app = build_router(state, &config.public_dir);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Binding {}", config.bind_addr))?;
    tracing::info!("bpmn-gateway listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Stop the worker; an in-flight cycle is abandoned and its tasks are
    // left to lock expiry.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "External task worker ended abnormally");
        }
    }

    tracing::info!("bpmn-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
