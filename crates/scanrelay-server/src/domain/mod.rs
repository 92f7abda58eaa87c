//! Domain layer for scanrelay-server.
//!
//! The domain layer contains pure business-logic types that have no
//! dependencies on I/O, networking, or external frameworks.  This makes them
//! easy to test in isolation and portable to any runtime or platform.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - The NFC reader event model (what a reader can tell us, independent of
//!   which PC/SC binding produced it)
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading
//! - Anything that could block or fail due to external state

pub mod config;
pub mod reader;

// Re-export the most commonly needed types at the domain module boundary.
pub use config::RelayConfig;
pub use reader::{CardStandard, ReaderEvent};
