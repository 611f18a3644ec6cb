use tracing_subscriber::EnvFilter;

use vaayu_server::{build_router, AiClient, AppState, DocumentStore, FcmSender, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Missing credentials abort here rather than degrading silently.
    let config = ServerConfig::from_env()?;

    let docs = DocumentStore::new(&config.db_path)?;
    let ai = AiClient::new(&config.ai_service_url)?;
    let push = FcmSender::new(config.fcm_server_key.clone())?;

    let app = build_router(AppState { ai, push, docs });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Vaayu backend listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install signal handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
