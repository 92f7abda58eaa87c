//! Scan Relay server — entry point.
//!
//! This binary ingests scan events from three kinds of physical input devices
//! and broadcasts each completed scan to every connected browser as a plain
//! text WebSocket message.
//!
//! # Why a relay process?
//!
//! Web browsers cannot open raw TCP sockets, read `/dev/input` device nodes,
//! or talk to the PC/SC smart card daemon.  The relay owns all three device
//! surfaces and exposes exactly one thing browsers CAN use: a WebSocket
//! broadcast channel.
//!
//! # Usage
//!
//! ```text
//! scanrelay-server [OPTIONS]
//!
//! Options:
//!   --ws-port         <PORT>  WebSocket broadcast port [default: 8000]
//!   --scanner-port    <PORT>  Scanner TCP ingest port [default: 3002]
//!   --http-port       <PORT>  HTTP liveness port [default: 3001]
//!   --bind            <IP>    Bind address for all listeners [default: 0.0.0.0]
//!   --keyboard-device <PATH>  Wedge input device node [default: /dev/input/event15]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                     | Default              |
//! |------------------------------|----------------------|
//! | `SCANRELAY_WS_PORT`          | `8000`               |
//! | `SCANRELAY_SCANNER_PORT`     | `3002`               |
//! | `SCANRELAY_HTTP_PORT`        | `3001`               |
//! | `SCANRELAY_BIND`             | `0.0.0.0`            |
//! | `SCANRELAY_KEYBOARD_DEVICE`  | `/dev/input/event15` |
//!
//! # Architecture overview
//!
//! ```text
//! TCP scanner (port 3002)  ─┐
//! /dev/input/event15       ─┤─▶ dispatch channel ─▶ hub ─▶ browsers (port 8000)
//! PC/SC NFC reader         ─┘
//!
//! HTTP GET / (port 3001)   ─▶ static liveness string
//! ```
//!
//! # Privileges
//!
//! Opening the keyboard device node and issuing the exclusive grab normally
//! require root.  Run unprivileged and the keyboard adapter disables itself
//! with a warning; everything else still works.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scanrelay_server::application::run_dispatcher;
use scanrelay_server::domain::RelayConfig;
use scanrelay_server::infrastructure::keyboard::start_keyboard_adapter;
use scanrelay_server::infrastructure::nfc::start_nfc_adapter;
use scanrelay_server::infrastructure::{
    run_scanner_listener, run_status_server, run_ws_server, Hub,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Scan Relay server.
///
/// Relays barcode/keyboard-wedge/NFC scan events to browsers over a
/// WebSocket broadcast channel.
#[derive(Debug, Parser)]
#[command(
    name = "scanrelay-server",
    about = "Relay scan events from physical input devices to browsers",
    version
)]
struct Cli {
    /// TCP port for the WebSocket broadcast server.
    ///
    /// Browsers subscribe via `ws://host:PORT`.
    #[arg(long, default_value_t = 8000, env = "SCANRELAY_WS_PORT")]
    ws_port: u16,

    /// TCP port network barcode scanners connect to.
    #[arg(long, default_value_t = 3002, env = "SCANRELAY_SCANNER_PORT")]
    scanner_port: u16,

    /// TCP port of the HTTP liveness endpoint.
    #[arg(long, default_value_t = 3001, env = "SCANRELAY_HTTP_PORT")]
    http_port: u16,

    /// IP address all three listeners bind to.
    ///
    /// Use `0.0.0.0` to accept connections from any interface, or
    /// `127.0.0.1` for local-only operation.
    #[arg(long, default_value = "0.0.0.0", env = "SCANRELAY_BIND")]
    bind: String,

    /// Path of the keyboard-wedge input device node.
    ///
    /// Find yours with `cat /proc/bus/input/devices`.
    #[arg(
        long,
        default_value = "/dev/input/event15",
        env = "SCANRELAY_KEYBOARD_DEVICE"
    )]
    keyboard_device: PathBuf,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let parse_addr = |port: u16| -> anyhow::Result<SocketAddr> {
            format!("{}:{}", self.bind, port)
                .parse()
                .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, port))
        };

        Ok(RelayConfig {
            ws_bind_addr: parse_addr(self.ws_port)?,
            scanner_bind_addr: parse_addr(self.scanner_port)?,
            http_bind_addr: parse_addr(self.http_port)?,
            keyboard_device: self.keyboard_device,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; log level follows `RUST_LOG`.
/// 2. CLI arguments are parsed into a [`RelayConfig`].
/// 3. The hub, the dispatch channel, and the single dispatcher task are
///    created — the ordered path every adapter feeds.
/// 4. The keyboard and NFC adapters start (each may disable itself).
/// 5. The scanner listener, the HTTP endpoint, and the WebSocket broadcast
///    server start; a Ctrl+C handler clears the shared running flag, which
///    winds down all three accept loops.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let config = Arc::new(cli.into_relay_config()?);

    info!(
        "scan relay starting — ws={}, scanner={}, http={}",
        config.ws_bind_addr, config.scanner_bind_addr, config.http_bind_addr
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_ctrlc = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_ctrlc.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── The ordered dispatch path ──────────────────────────────────────────────
    //
    // Every adapter sends completed scans into this one channel; the single
    // dispatcher task fans them out, which fixes broadcast order.
    let hub = Hub::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_dispatcher(events_rx, hub.clone()));

    // ── Device adapters ────────────────────────────────────────────────────────
    //
    // Failure of either device adapter disables that adapter ONLY; the
    // listeners below must still come up.
    if let Err(e) = start_keyboard_adapter(&config, events_tx.clone()) {
        warn!("keyboard adapter disabled: {e}");
    }
    start_nfc_adapter(events_tx.clone());

    // ── Listeners ──────────────────────────────────────────────────────────────
    //
    // `try_join!` over the listener futures themselves (not spawned handles)
    // short-circuits on the first `Err`: a bind failure in any listener
    // cancels the other two and aborts startup with the bind error, instead
    // of limping along half-deaf.
    tokio::try_join!(
        run_ws_server(Arc::clone(&config), hub, Arc::clone(&running)),
        run_scanner_listener(Arc::clone(&config), events_tx, Arc::clone(&running)),
        run_status_server(config, Arc::clone(&running)),
    )?;

    info!("scan relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
