//! Application startup and lifecycle management.

use crate::config::{AllowedOrigins, CorsConfig, FailureStatus, SentimentConfig};
use crate::handlers::{analysis, health};
use crate::services::metrics;
use crate::services::providers::groq::{GroqConfig, GroqProvider};
use crate::services::providers::CompletionProvider;
use crate::services::SentimentRelay;
use axum::http::{HeaderValue, Request};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub relay: SentimentRelay,
    pub failure_status: FailureStatus,
}

/// Build the HTTP router with all middleware applied.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(health::root_status))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics_handler))
        .route("/process_text", post(analysis::process_text))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(cors))
}

/// Translate the CORS settings into a layer.
///
/// `Any` together with credentials mirrors the request, since browsers reject
/// a literal `*` on credentialed responses.
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = match &cors.allowed_origins {
        AllowedOrigins::Any if cors.allow_credentials => AllowOrigin::mirror_request(),
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(origins) => AllowOrigin::list(origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        })),
    };

    let layer = CorsLayer::new().allow_origin(origin);

    if cors.allow_credentials {
        layer
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    } else {
        layer.allow_methods(Any).allow_headers(Any)
    }
}

pub async fn shutdown_signal() {
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
    router: Router,
}

impl Application {
    /// Build the application with the Groq provider described by `config`.
    pub async fn build(config: SentimentConfig) -> Result<Self, AppError> {
        let provider = GroqProvider::new(GroqConfig {
            api_key: config.upstream.api_key.clone(),
            base_url: config.upstream.base_url.clone(),
            model: config.upstream.model.clone(),
            timeout: config.upstream.timeout,
        })
        .map_err(|e| {
            tracing::error!("Failed to create HTTP client: {}", e);
            AppError::InternalError(anyhow::Error::new(e))
        })?;

        tracing::info!(
            model = %config.upstream.model,
            base_url = %config.upstream.base_url,
            timeout_secs = config.upstream.timeout.as_secs(),
            "Initialized Groq provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an arbitrary provider.
    pub async fn build_with_provider(
        config: SentimentConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self, AppError> {
        metrics::init_metrics();

        let state = AppState {
            service_name: config.service_name.clone(),
            relay: SentimentRelay::new(provider, config.upstream.temperature),
            failure_status: config.failure_status,
        };
        let router = build_router(state, &config.cors);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Sentiment service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
