//! # scanrelay-core
//!
//! Shared library for Scan Relay containing the scan event model, the scan
//! accumulator, the raw input record decoder, and the Linux keycode
//! translation table.
//!
//! This crate is used by the server binary.  It has zero dependencies on OS
//! APIs, network sockets, or the async runtime.
//!
//! # Architecture overview (for beginners)
//!
//! Scan Relay is a small hub that sits between physical scanning hardware and
//! web browsers.  Three kinds of devices feed it:
//!
//! - A **network barcode scanner** that opens a TCP connection and writes the
//!   scanned code as raw bytes terminated by a newline.
//! - A **keyboard-wedge scanner** that pretends to be a USB keyboard: each
//!   character of the barcode arrives as a key press, and the scan ends with
//!   an Enter key press.
//! - An **NFC reader** that reports a card's unique identifier in one shot.
//!
//! All three are normalized into a single [`ScanEvent`] value which the server
//! broadcasts to every connected browser.
//!
//! This crate (`scanrelay-core`) is the pure foundation.  It defines:
//!
//! - **`event`** – The [`ScanEvent`] value and its [`ScanSource`] tag.
//!
//! - **`accumulator`** – The stateful buffer that assembles partial input
//!   (byte chunks or individual key presses) into one complete scan code.
//!
//! - **`rawkey`** – The decoder for fixed-size Linux `input_event` records as
//!   read from a `/dev/input/event*` character device.
//!
//! - **`keymap`** – The static Linux keycode → character table used by the
//!   keyed-event accumulation mode.

// Declare the four top-level modules.
pub mod accumulator;
pub mod event;
pub mod keymap;
pub mod rawkey;

// Re-export the most-used types at the crate root so callers can write
// `scanrelay_core::ScanEvent` instead of `scanrelay_core::event::ScanEvent`.
pub use accumulator::Accumulator;
pub use event::{ScanEvent, ScanSource};
pub use rawkey::{KeyRecord, INPUT_EVENT_SIZE};
