//! HTTP server for the GrooveLog REST API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use database::Store;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable permissive CORS.
    pub cors: bool,
    /// Owner of songs created without an `x-user-id` header.
    pub default_user_id: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors: true,
            default_user_id: 1,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    cors: Option<bool>,
    default_user_id: Option<i32>,
}

impl ServerConfigBuilder {
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    pub fn default_user_id(mut self, user_id: i32) -> Self {
        self.default_user_id = Some(user_id);
        self
    }

    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            addr: self.addr.unwrap_or(defaults.addr),
            cors: self.cors.unwrap_or(defaults.cors),
            default_user_id: self.default_user_id.unwrap_or(defaults.default_user_id),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: ServerConfig,
}

pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let state = Arc::new(AppState {
            store,
            config: config.clone(),
        });
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(handlers::root))
            .route("/songs", get(handlers::list_songs).post(handlers::create_song))
            .route("/songs/:id", delete(handlers::delete_song))
            .route("/songs/:id/status", patch(handlers::update_song_status))
            .route("/instruments", get(handlers::list_instruments))
            .route("/instruments/:id", patch(handlers::update_instrument_progress))
            .route("/users", post(handlers::create_user))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Serves until Ctrl+C or SIGTERM.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        tracing::info!(addr = %self.config.addr, "GrooveLog API listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
