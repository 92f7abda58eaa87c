//! Infrastructure layer for scanrelay-server.
//!
//! The infrastructure layer handles all I/O: accepting WebSocket subscribers,
//! accepting scanner TCP connections, reading the raw keyboard device,
//! watching the PC/SC reader, and serving the HTTP liveness route.
//!
//! # Responsibilities
//!
//! - Binding listeners and performing handshakes
//! - Spawning per-connection Tokio tasks and the blocking device worker
//! - Owning the subscriber set and fanning out broadcasts
//! - Handling the graceful shutdown flag
//!
//! # What does NOT belong here?
//!
//! - Scan assembly (that is `scanrelay_core::Accumulator`)
//! - Deciding which reader events become scans (application layer)
//! - Configuration parsing (done in `main.rs`)

pub mod http_status;
pub mod hub;
pub mod keyboard;
pub mod nfc;
pub mod tcp_listener;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use http_status::run_status_server;
pub use hub::Hub;
pub use tcp_listener::run_scanner_listener;
pub use ws_server::run_ws_server;
