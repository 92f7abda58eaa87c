//! scanrelay-server library crate.
//!
//! This crate relays scan events from physical input devices (a TCP-attached
//! barcode scanner, a raw keyboard-wedge HID device, and a PC/SC NFC reader)
//! to web browsers over a plain-text WebSocket broadcast channel.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! TCP scanner ──┐
//! /dev/input  ──┤  adapters feed one ordered dispatch channel
//! NFC reader  ──┘
//!         ↓
//! [scanrelay-server]
//!   ├── domain/           Pure types: RelayConfig, NFC reader events
//!   ├── application/      Event formatting + the ordered dispatch loop
//!   └── infrastructure/
//!         ├── hub/        Subscriber set + fan-out broadcast
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         ├── tcp_listener/ Scanner TCP accept loop
//!         ├── keyboard/   Raw input device grab + blocking read loop
//!         ├── nfc/        PC/SC reader event source (feature "pcsc")
//!         └── http_status/ Liveness route (axum + CORS)
//!         ↓
//! Browsers (plain text over WebSocket, port 8000)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `scanrelay-core`, plus the tokio
//!   channel types it dispatches through.
//! - `infrastructure` depends on all other layers plus `tokio`,
//!   `tungstenite`, and `axum`.
//!
//! # Delivery semantics
//!
//! Fire-and-forget, at-most-once per scan per subscriber: a completed scan is
//! pushed once to every subscriber whose channel is still open; nobody is
//! retried, queued for, or waited on.  All adapters funnel into one dispatch
//! channel consumed by a single task, so every subscriber observes events in
//! completion order.

/// Domain layer: pure business-logic types (no I/O).
pub mod domain;

/// Application layer: event formatting and ordered dispatch.
pub mod application;

/// Infrastructure layer: device adapters, broadcast hub, and servers.
pub mod infrastructure;
