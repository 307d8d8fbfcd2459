use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
#[cfg(test)]
mod test_support;
mod tts;

use api::routes::{create_router, AppState};
use config::Config;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = tts::ensure_temp_dir(&config.temp_dir) {
        tracing::error!(
            "Failed to create or access temp directory {}: {}",
            config.temp_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let state = Arc::new(AppState::new(config));

    // Refuse to start if the synthesis tool is missing
    if let Err(e) = state.tts.probe().await {
        tracing::error!("Kokoro command not found or not working properly: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Kokoro TTS Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Starting server on http://{}:{}",
        state.config.host,
        state.config.port
    );
    tracing::info!("Available voices: {}", state.config.allowed_voices.join(", "));
    tracing::info!("Default voice: {}", state.config.default_voice);
    tracing::info!("Using temp directory: {}", state.config.temp_dir.display());
    tracing::info!("Supported format: WAV only");

    let listener = match bind(&state.config.host, state.config.port).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(
                "Failed to bind to {}:{}: {}",
                state.config.host,
                state.config.port,
                e
            );
            std::process::exit(1);
        }
    };

    let app = create_router(state);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

/// Bind the listener; `host` may be an IP literal (v4 or v6) or a hostname.
async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}
