//! HTTP liveness endpoint.
//!
//! A single static route lets deployment tooling (and curious humans) check
//! that the relay process is up without opening a WebSocket.  CORS is
//! permissive because the browser frontend is served from a different origin
//! in every deployment (dev server, kiosk, LAN host).
//!
//! This is deliberately thin glue: no state, no JSON, no versioning.  The
//! scan path never touches it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::domain::config::RelayConfig;

/// Body returned by `GET /`.
pub const STATUS_MESSAGE: &str = "Scan relay server is running...";

/// Serves the liveness route until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the HTTP port cannot be bound — a fail-fast startup
/// condition like the other listeners.
pub async fn run_status_server(
    config: Arc<RelayConfig>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/", get(|| async { STATUS_MESSAGE }))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.http_bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_bind_addr))?;

    info!("HTTP status endpoint on {}", config.http_bind_addr);

    // Poll the shared flag so Ctrl+C stops this server along with the accept
    // loops.
    let shutdown = async move {
        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping HTTP status endpoint");
                break;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP status server failed")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_status_route_returns_static_message() {
        // Arrange: serve on an ephemeral port.
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        let config = Arc::new(RelayConfig {
            http_bind_addr: addr,
            ..RelayConfig::default()
        });
        let running = Arc::new(AtomicBool::new(true));
        tokio::spawn(run_status_server(config, Arc::clone(&running)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Act: a minimal raw HTTP/1.1 request.
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        // Assert
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(STATUS_MESSAGE));

        running.store(false, Ordering::Relaxed);
    }
}
