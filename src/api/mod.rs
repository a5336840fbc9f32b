//! HTTP API server for the voice relay

pub mod health;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::provider::ReplyGenerator;
use crate::relay::VoiceRelay;
use crate::session::SessionStore;

/// Shared state for API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub relay: VoiceRelay,
    /// Model identifier reported by `/status`
    pub model: String,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    generator: Arc<dyn ReplyGenerator>,
    sessions: SessionStore,
    host: String,
    port: u16,
    model: String,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(generator: Arc<dyn ReplyGenerator>, port: u16) -> Self {
        Self {
            generator,
            sessions: SessionStore::new(),
            host: "0.0.0.0".to_string(),
            port,
            model: crate::config::DEFAULT_MODEL.to_string(),
            static_dir: None,
        }
    }

    /// Set the bind address
    #[must_use]
    pub fn host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Use an existing session store
    #[must_use]
    pub fn sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    /// Set the model identifier reported by `/status`
    #[must_use]
    pub fn model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the static files directory for serving the web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            relay: VoiceRelay::new(self.sessions, self.generator),
            model: self.model,
        });

        ApiServer {
            state,
            host: self.host,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub const fn state(&self) -> &Arc<ApiState> {
        &self.state
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .nest("/api/voice", voice::router(self.state.clone()))
            .merge(health::router())
            .merge(health::status_router(self.state.clone()));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // The browser page may be served from another origin
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server until ctrl-c
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Server(format!("failed to bind {addr}: {e}")))?;

        tracing::info!(
            addr = %addr,
            provider = self.state.relay.mode(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown requested");
                }
            })
            .await
            .map_err(|e| crate::Error::Server(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
