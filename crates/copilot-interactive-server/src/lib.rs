//! HTTP front end for human-in-the-loop input.
//!
//! Callers POST a context and block until the operator answers at the terminal,
//! the local assistant answers for them, or the default is chosen. Every input
//! request completes with `200` and an `{input, source}` body; only requests the
//! framework cannot decode are rejected.

pub mod error;

pub use error::{Result, ServerError};

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use copilot_interactive_core::text::sanitize_input;
use copilot_interactive_core::{HealthStatus, InputRequest, InputResult, InputService, Settings};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            max_body_size: 1024 * 1024,
            enable_logging: true,
        }
    }
}

impl ServerConfig {
    /// Configuration listening on `app_host:app_port`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::default().with_bind_addr(settings.bind_addr()?))
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}

#[derive(Clone)]
pub struct AppState {
    pub input_service: Arc<InputService>,
}

/// Handler for `POST /user-input`. The whole body is the context.
async fn user_input_handler(State(state): State<AppState>, body: String) -> Json<InputResult> {
    let context = sanitize_input(&body);
    log::debug!("Input context: {:?}", context);
    Json(state.input_service.get_user_input(&context).await)
}

/// Handler for `POST /user-input/json`.
async fn user_input_json_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InputRequest>, JsonRejection>,
) -> Result<Json<InputResult>> {
    let Json(request) = payload.map_err(|rejection| {
        log::warn!("Rejected input request: {}", rejection.body_text());
        ServerError::invalid_request(rejection.status(), rejection.body_text())
    })?;
    log::debug!("Input context: {:?}", request.context);
    Ok(Json(state.input_service.get_user_input(&request.context).await))
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus::healthy(env!("CARGO_PKG_VERSION")))
}

pub struct InteractiveServer {
    input_service: Arc<InputService>,
    config: ServerConfig,
}

impl InteractiveServer {
    pub fn new(input_service: Arc<InputService>) -> Self {
        Self {
            input_service,
            config: ServerConfig::default(),
        }
    }

    pub fn with_config(input_service: Arc<InputService>, config: ServerConfig) -> Self {
        Self {
            input_service,
            config,
        }
    }

    /// Build the Axum router with all routes and middleware.
    ///
    /// No CORS layer is installed, so browsers keep blocking cross-origin pages
    /// from reading operator answers.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            input_service: self.input_service.clone(),
        };

        let mut router = Router::new()
            .route("/user-input", post(user_input_handler))
            .route("/user-input/json", post(user_input_json_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.max_body_size));

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    // Health checks are polled; keep them out of the info log.
                    let quiet = uri.path() == HEALTH_PATH;
                    if quiet {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    let duration = start.elapsed();

                    if quiet {
                        log::debug!("Response {} completed in {:?}", request_id, duration);
                    } else {
                        log::info!(
                            "Response {} completed in {:?} with {}",
                            request_id,
                            duration,
                            response.status()
                        );
                    }

                    response
                },
            ));
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown_signal` resolves. In-flight requests are allowed to
    /// finish.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.bind_addr,
                source,
            })?;
        self.serve_listener(listener, shutdown_signal).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        match listener.local_addr() {
            Ok(addr) => {
                log::info!("Listening on {}", addr);
                log::info!("Health check: http://{}{}", addr, HEALTH_PATH);
            }
            Err(e) => log::warn!("Listening on an unknown address: {}", e),
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
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
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
