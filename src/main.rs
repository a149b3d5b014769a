use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use therapy_chatbot_backend::{
    config::Config,
    routes::create_router,
    services::dialogflow::DialogflowClient,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,therapy_chatbot_backend=debug")),
        )
        .init();

    let config = Config::from_env()?;
    let client = DialogflowClient::from_config(&config).context("building Dialogflow client")?;
    info!(token_source = ?client.tokens().source(), "Dialogflow client ready");

    let port = config.port;
    let project_set = config.project_id.is_some();
    let credentials_set = config.credentials_path.is_some();

    let state = Arc::new(AppState::new(config, Arc::new(client)));
    let app = create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;

    info!("Server running on port {port}");
    info!("Health check: http://localhost:{port}");
    info!("Chat endpoint: http://localhost:{port}/chat");
    info!(
        project_id = if project_set { "set" } else { "missing" },
        credentials = if credentials_set { "set" } else { "missing" },
        "Configuration"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
