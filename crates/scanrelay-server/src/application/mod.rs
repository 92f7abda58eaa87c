//! Application layer for scanrelay-server.
//!
//! The application layer orchestrates the business logic: it knows *what* to
//! do with a completed scan or a reader notification, but delegates *how*
//! bytes move (sockets, device files, WebSocket frames) to the
//! infrastructure layer.
//!
//! # Responsibilities
//!
//! - Formatting a [`scanrelay_core::ScanEvent`] into its wire message
//! - Running the single ordered dispatch loop from adapters into the hub
//! - Deciding which NFC reader notifications become scan events
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or device files (that is infrastructure)
//! - WebSocket framing (handled by tokio-tungstenite)
//! - PC/SC calls (handled by `infrastructure::nfc`)

pub mod relay;

// Re-export so callers can write `application::run_dispatcher` instead of the
// longer path.
pub use relay::{format_scan_message, handle_reader_event, run_dispatcher};
