//! Application startup and lifecycle management.

use crate::config::StudentConfig;
use crate::handlers;
use crate::services::{GenerationClient, StudentStore};
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: StudentConfig,
    pub store: StudentStore,
    pub generator: GenerationClient,
}

impl AppState {
    /// Fresh, empty store plus a generation client built from `config`.
    pub fn new(config: StudentConfig) -> Result<Self, AppError> {
        let generator = GenerationClient::new(config.generation.clone()).map_err(|e| {
            tracing::error!("Failed to build generation client: {}", e);
            AppError::ConfigError(e.into())
        })?;

        Ok(Self {
            config,
            store: StudentStore::new(),
            generator,
        })
    }
}

/// Build the HTTP router for `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::docs::documentation_page))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/students",
            get(handlers::students::list_students).post(handlers::students::create_student),
        )
        .route(
            "/students/:id",
            get(handlers::students::get_student)
                .put(handlers::students::update_student)
                .delete(handlers::students::delete_student),
        )
        .route(
            "/students/:id/summary",
            get(handlers::summary::get_student_summary),
        )
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: StudentConfig) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let state = AppState::new(config)?;

        tracing::info!(
            url = %state.config.generation.url,
            model = %state.config.generation.model,
            max_concurrent = state.config.generation.max_concurrent,
            "Initialized generation client"
        );

        // Port 0 = random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Student service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
