//! The normalized scan event value and its source tag.
//!
//! Every input modality — TCP byte stream, keyboard-wedge device, NFC reader —
//! ultimately produces one [`ScanEvent`] per completed scan.  The event is an
//! immutable value: it has no identity beyond its payload, and duplicate
//! scans are deliberately NOT deduplicated (scanning the same barcode twice
//! is two events, because it was two physical scans).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Which physical input modality produced a scan.
///
/// The tag travels with every [`ScanEvent`] so the broadcast layer can pick
/// the matching wire label (bare code for TCP, `"Scanned barcode: …"` for the
/// keyboard wedge, `"NFC Card UID: …"` for cards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanSource {
    /// A TCP-attached scanner writing newline-terminated codes.
    Tcp,
    /// A raw keyboard-emulating HID device read from `/dev/input`.
    Keyboard,
    /// A PC/SC NFC reader reporting card UIDs.
    Nfc,
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanSource::Tcp => write!(f, "tcp"),
            ScanSource::Keyboard => write!(f, "keyboard"),
            ScanSource::Nfc => write!(f, "nfc"),
        }
    }
}

/// One completed scan, produced exactly once per terminator (or per card tap).
///
/// # Invariants
///
/// - `payload` never contains the terminator character; the accumulator strips
///   it before constructing the event.
/// - `timestamp_ms` is taken at completion time, not at first-byte time.
///
/// # Example
///
/// ```rust
/// use scanrelay_core::{ScanEvent, ScanSource};
///
/// let event = ScanEvent::now(ScanSource::Tcp, "ABC123".to_string());
/// assert_eq!(event.source, ScanSource::Tcp);
/// assert_eq!(event.payload, "ABC123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// The input modality that produced this scan.
    pub source: ScanSource,
    /// The decoded text of the scan (barcode contents or card UID).
    pub payload: String,
    /// Unix epoch milliseconds at the moment the scan completed.
    pub timestamp_ms: u64,
}

impl ScanEvent {
    /// Builds a scan event stamped with the current wall-clock time.
    pub fn now(source: ScanSource, payload: String) -> Self {
        // A clock before the Unix epoch would make `duration_since` fail;
        // fall back to 0 rather than panicking in that pathological case.
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            source,
            payload,
            timestamp_ms,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
