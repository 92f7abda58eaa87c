//! Scan dispatch: the single ordered path from adapters to subscribers.
//!
//! # Why one dispatch channel? (for beginners)
//!
//! The three device adapters run concurrently — TCP connections each have
//! their own task, the keyboard loop runs on a blocking worker, and the NFC
//! source runs on another.  If each of them called the hub directly, two
//! scans completing at the same instant could interleave differently for
//! different subscribers.  Instead every adapter sends its completed
//! [`ScanEvent`] into ONE unbounded mpsc channel, and a single dispatcher
//! task drains it.  Whatever order events enter the channel is the order
//! every subscriber sees them in.
//!
//! The channel is unbounded so an adapter's `send` never blocks or yields:
//! a slow browser can never stall scan ingestion.  Scan traffic is
//! human-paced (a few events per second at worst), so the unbounded buffer
//! is not a practical memory risk.
//!
//! # Wire format
//!
//! The browser-facing message is plain text with a per-source label, kept
//! byte-compatible with what the deployed frontend already parses:
//!
//! | Source   | Message                      |
//! |----------|------------------------------|
//! | Tcp      | `<code>` (bare)              |
//! | Keyboard | `Scanned barcode: <code>`    |
//! | Nfc      | `NFC Card UID: <uid>`        |

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use scanrelay_core::{ScanEvent, ScanSource};

use crate::domain::reader::{CardStandard, ReaderEvent, AID_NOISE_MESSAGE};
use crate::infrastructure::hub::Hub;

/// Formats a scan event as the plain-text message broadcast to subscribers.
///
/// No envelope, no sequence numbers — the frontend displays the string as-is.
pub fn format_scan_message(event: &ScanEvent) -> String {
    match event.source {
        ScanSource::Tcp => event.payload.clone(),
        ScanSource::Keyboard => format!("Scanned barcode: {}", event.payload),
        ScanSource::Nfc => format!("NFC Card UID: {}", event.payload),
    }
}

/// Runs the dispatch loop: receives completed scans and broadcasts each one.
///
/// This is the ONLY place that calls [`Hub::broadcast`] at runtime, which is
/// what makes per-subscriber event ordering deterministic.  The loop ends
/// when every adapter's sender has been dropped (i.e. at shutdown).
pub async fn run_dispatcher(mut rx: mpsc::UnboundedReceiver<ScanEvent>, hub: Hub) {
    while let Some(event) = rx.recv().await {
        let message = format_scan_message(&event);
        let delivered = hub.broadcast(&message);
        info!(
            source = %event.source,
            payload = %event.payload,
            delivered,
            "scan broadcast"
        );
    }
    debug!("all adapter senders dropped; dispatcher exiting");
}

/// Decides what to do with one NFC reader notification.
///
/// Only a card speaking ISO 14443-3 becomes a scan event — single-shot, no
/// accumulation, no terminator.  Everything else is logged (or, for the
/// expected AID noise, deliberately not logged) and dropped.
pub fn handle_reader_event(event: ReaderEvent, tx: &mpsc::UnboundedSender<ScanEvent>) {
    match event {
        ReaderEvent::ReaderAttached { name } => {
            info!(reader = %name, "NFC reader connected, waiting for card");
        }
        ReaderEvent::CardPresent { standard, uid } => {
            if standard == CardStandard::Iso14443Part3 {
                info!(%uid, "badge card detected");
                // A closed channel means the dispatcher is gone (shutdown);
                // dropping the event is correct fire-and-forget behavior.
                let _ = tx.send(ScanEvent::now(ScanSource::Nfc, uid));
            } else {
                info!(%standard, "ignoring non-badge card");
            }
        }
        ReaderEvent::CardRemoved => {
            debug!("card removed");
        }
        ReaderEvent::ReaderError { message } => {
            // Every ISO 14443-4 tap produces this exact message because the
            // relay never configures an AID; it is noise, not a fault.
            if message != AID_NOISE_MESSAGE {
                warn!(%message, "NFC reader error");
            }
        }
        ReaderEvent::ReaderDetached { name } => {
            info!(reader = %name, "NFC reader removed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
