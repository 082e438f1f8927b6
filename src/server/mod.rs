use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use vidforge_av::{resolve_ffmpeg, TranscodeSettings, Transcoder};

pub mod error;
pub mod routes;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub transcoder: Arc<Transcoder>,
    pub config: Arc<Config>,
}

impl AppContext {
    /// Resolve ffmpeg and fix the encoder and watermark strategy for the
    /// lifetime of the process.
    pub fn from_config(config: Config) -> Result<Self> {
        let ffmpeg = resolve_ffmpeg(config.tools.ffmpeg_path.as_deref())
            .context("ffmpeg is required to start the server")?;
        Ok(Self::with_ffmpeg(config, ffmpeg))
    }

    pub fn with_ffmpeg(config: Config, ffmpeg: std::path::PathBuf) -> Self {
        let settings = TranscodeSettings {
            encoder: config.encoder.clone(),
            watermark: config.watermark.resolve(),
        };
        tracing::info!(
            "Encoder mode {:?}, ffmpeg at {}",
            settings.encoder.mode,
            ffmpeg.display()
        );
        let transcoder =
            Transcoder::new(ffmpeg, Arc::new(settings)).with_timeout(config.tools.timeout());
        Self {
            transcoder: Arc::new(transcoder),
            config: Arc::new(config),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes::video_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(config)?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
