//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It can be constructed from CLI arguments (preferred for production) or
//! from sensible defaults (useful for local development and tests).
//!
//! # Design rationale
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) makes the relay easy to embed in tests.
//! The binary entry point is responsible for populating the struct from CLI
//! args or environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// All runtime configuration for the scan relay.
///
/// Build this struct once at startup (via CLI args or defaults) and then wrap
/// it in an `Arc` so it can be shared cheaply across all component tasks.
///
/// # Example
///
/// ```rust
/// use scanrelay_server::domain::RelayConfig;
///
/// // Defaults are suitable for local development:
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 8000);
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The address and port the WebSocket broadcast server binds to.
    ///
    /// Browsers subscribe here (`ws://host:8000` by default).  `0.0.0.0`
    /// accepts connections from any network interface.
    pub ws_bind_addr: SocketAddr,

    /// The address and port the scanner TCP listener binds to.
    ///
    /// Network barcode scanners (e.g. a Matrix-series fixed scanner) connect
    /// here and write newline-terminated codes.
    pub scanner_bind_addr: SocketAddr,

    /// The address and port of the HTTP liveness endpoint.
    pub http_bind_addr: SocketAddr,

    /// Filesystem path of the keyboard-wedge input device node.
    ///
    /// Opening it (and issuing the exclusive grab) requires elevated
    /// privileges; failure disables the keyboard adapter only.
    pub keyboard_device: PathBuf,
}

impl Default for RelayConfig {
    /// Returns a `RelayConfig` matching the deployed relay's fixed ports.
    ///
    /// | Field            | Default               |
    /// |------------------|-----------------------|
    /// | ws_bind_addr     | `0.0.0.0:8000`        |
    /// | scanner_bind_addr| `0.0.0.0:3002`        |
    /// | http_bind_addr   | `0.0.0.0:3001`        |
    /// | keyboard_device  | `/dev/input/event15`  |
    fn default() -> Self {
        Self {
            // The `.parse().unwrap()` calls here are safe because these are
            // compile-time-known valid socket address strings.
            ws_bind_addr: "0.0.0.0:8000".parse().unwrap(),
            scanner_bind_addr: "0.0.0.0:3002".parse().unwrap(),
            http_bind_addr: "0.0.0.0:3001".parse().unwrap(),
            keyboard_device: PathBuf::from("/dev/input/event15"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
