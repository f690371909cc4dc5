//! HTTP server using axum

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::proxy::RpcProxy;
use crate::rate::{shared_rate, BlockTimeEstimator, RateReader, DEFAULT_RATE};
use crate::registry::Registry;

pub struct Server {
    proxy: Arc<RpcProxy>,
    shutdown: watch::Sender<bool>,
}

impl Server {
    /// Wires the estimator, registry and dispatcher together and spawns
    /// the sampling task.
    pub fn new(config: ProxyConfig) -> Self {
        let (writer, reader) = shared_rate(DEFAULT_RATE);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let estimator =
            BlockTimeEstimator::new(config.upstream_url.clone(), writer, config.sample_interval);
        tokio::spawn(estimator.run(shutdown_rx));

        let proxy = Arc::new(RpcProxy::new(
            Registry::builtin(reader),
            config.upstream_url,
        ));

        Self { proxy, shutdown }
    }

    /// Builds a server around an externally owned rate snapshot; no
    /// estimator task is spawned.
    pub fn with_reader(upstream_url: String, reader: RateReader) -> Self {
        let (shutdown, _) = watch::channel(false);
        let proxy = Arc::new(RpcProxy::new(Registry::builtin(reader), upstream_url));
        Self { proxy, shutdown }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handle_rpc))
            .route("/health", get(health))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.proxy.clone())
    }

    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("insight proxy listening on {}", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Stop the estimator once the listener is gone.
        let _ = self.shutdown.send(true);
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn handle_rpc(
    State(proxy): State<Arc<RpcProxy>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    proxy.handle(headers, body).await
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
