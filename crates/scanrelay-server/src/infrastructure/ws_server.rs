//! WebSocket broadcast server: accept loop and per-subscriber session tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured broadcast address.
//! 2. Accepting incoming TCP connections from browsers.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Registering the session as a hub subscriber and pumping every
//!    broadcast message onto the socket as a text frame.
//! 5. Draining inbound frames purely to notice when the browser leaves —
//!    subscribers only listen, the relay never acts on what they send.
//! 6. Unsubscribing when the session ends, however it ends.
//!
//! # Scalability
//!
//! Each browser session runs in its own Tokio task.  The accept loop never
//! blocks: it accepts a connection and immediately spawns a task for it
//! before accepting the next one, so one slow browser never delays another.
//!
//! # Shutdown
//!
//! The accept loop polls a shared `AtomicBool` between accepts (with a short
//! accept timeout so the flag is observed even when nobody is connecting).
//! No drain is needed on shutdown — delivery is fire-and-forget.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::domain::config::RelayConfig;
use crate::infrastructure::hub::Hub;

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the WebSocket accept loop until `running` is set to `false`.
///
/// Binds a TCP listener on `config.ws_bind_addr` and accepts incoming
/// connections in a loop.  Each accepted connection is handed off to a
/// dedicated Tokio task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use).  Binding is the only fatal failure here; per-session
/// problems are logged and contained.
pub async fn run_ws_server(
    config: Arc<RelayConfig>,
    hub: Hub,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.ws_bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind WebSocket broadcast listener on {}",
                config.ws_bind_addr
            )
        })?;

    info!("WebSocket broadcast listening on {}", config.ws_bind_addr);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping WebSocket accept loop");
            break;
        }

        // A short timeout on `accept()` lets the loop observe the `running`
        // flag even when no browsers are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("new subscriber connection from {peer_addr}");
                let hub = hub.clone();

                tokio::spawn(async move {
                    handle_subscriber_session(stream, peer_addr, hub).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g., too many open file
                // descriptors).  Log and keep accepting.
                error!("WebSocket accept error: {e}");
            }
            Err(_) => {
                // Timeout — no new connection in the last 200 ms.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Top-level handler for a single subscriber session.
///
/// Wraps [`run_session`] and logs the outcome.  The outer/inner pair lets
/// `run_session` use `?` for clean error propagation while errors are logged
/// here, in the task entry point.
async fn handle_subscriber_session(raw_stream: TcpStream, peer_addr: SocketAddr, hub: Hub) {
    match run_session(raw_stream, peer_addr, hub).await {
        Ok(()) => info!("subscriber {peer_addr} disconnected"),
        Err(e) => warn!("subscriber {peer_addr} session ended with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one subscriber session.
///
/// 1. Completes the WebSocket upgrade handshake.
/// 2. Subscribes to the hub, obtaining this session's message receiver.
/// 3. Concurrently pumps hub messages to the socket and watches the inbound
///    side for the browser closing.
/// 4. Unsubscribes on the way out (covers both exit paths; a send to an
///    already-pruned id is a no-op).
async fn run_session(raw_stream: TcpStream, peer_addr: SocketAddr, hub: Hub) -> anyhow::Result<()> {
    // `accept_async` reads the browser's HTTP Upgrade request and sends the
    // "101 Switching Protocols" response.
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (subscriber_id, mut messages) = hub.subscribe();
    info!("subscriber session established: {peer_addr} ({subscriber_id})");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // ── Task A: hub → browser pump ─────────────────────────────────────────────
    //
    // Receives broadcast messages from this subscriber's channel and writes
    // them to the socket as text frames.  Ends when the hub side closes the
    // channel or a write fails (browser gone).
    let pump = async {
        while let Some(text) = messages.recv().await {
            if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                debug!("subscriber {subscriber_id}: send failed ({e}); ending session");
                break;
            }
        }
    };

    // ── Task B: inbound drain ──────────────────────────────────────────────────
    //
    // Subscribers are listen-only; inbound frames are read solely so the
    // session notices Close frames and dropped connections promptly.
    let drain = async {
        loop {
            match ws_rx.next().await {
                Some(Ok(WsMessage::Close(_))) => {
                    debug!("subscriber {subscriber_id}: Close frame received");
                    break;
                }
                Some(Ok(frame)) => {
                    // Text/Binary/Ping/Pong from a subscriber carry no
                    // meaning for the relay.
                    debug!(
                        "subscriber {subscriber_id}: ignoring inbound frame ({} bytes)",
                        frame.len()
                    );
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    debug!("subscriber {subscriber_id}: connection closed");
                    break;
                }
                Some(Err(e)) => {
                    // Protocol violations included: a misbehaving client is
                    // worth a warning, not a silent drop.
                    warn!("subscriber {subscriber_id}: WebSocket error: {e}");
                    break;
                }
                None => {
                    debug!("subscriber {subscriber_id}: stream ended");
                    break;
                }
            }
        }
    };

    // Whichever side finishes first ends the session; the other future is
    // dropped (cancelled) by `select!`.
    tokio::select! {
        _ = pump => {}
        _ = drain => {}
    }

    hub.unsubscribe(subscriber_id);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
