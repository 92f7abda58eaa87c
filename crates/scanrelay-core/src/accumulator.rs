//! The scan accumulator: partial input in, completed scans out.
//!
//! # Why an accumulator is needed (for beginners)
//!
//! Neither input modality delivers a whole barcode at once:
//!
//! - **TCP** is a stream protocol.  One `read()` may return half a barcode,
//!   or a barcode and a half.  The only framing is a newline terminator.
//! - **Keyboard wedge** devices "type" the code one key press at a time and
//!   finish with Enter.
//!
//! The accumulator owns the in-progress buffer for one device session and
//! recognizes scan completion.  Its lifecycle per session is a two-state
//! machine:
//!
//! ```text
//! IDLE ──first character──▶ ACCUMULATING ──terminator──▶ IDLE (event emitted)
//! ```
//!
//! There is no error state: undecodable or unmapped input is silently
//! ignored and the machine stays where it is.
//!
//! # The "clear entirely on terminator" policy
//!
//! In byte-stream mode, when a chunk contains a terminator the WHOLE buffer is
//! cleared — including any bytes that arrived AFTER the terminator in the same
//! chunk.  If two scans ever arrive coalesced in one TCP segment, the start of
//! the second scan is dropped.  This mirrors the deployed scanner protocol
//! (the Matrix-series scanners send one code per segment and wait for the
//! next trigger pull), and changing it would alter observable behavior for
//! existing installations.  Do not "fix" this without coordinating a protocol
//! review.
//!
//! A second inherited boundary: chunks are UTF-8 decoded one read at a time,
//! so a multi-byte character split across two reads becomes two U+FFFD
//! replacement characters.  Real scanner payloads are ASCII, where no split
//! can occur.

use tracing::trace;

use crate::event::{ScanEvent, ScanSource};
use crate::keymap;
use crate::rawkey::KeyRecord;

/// Line terminator for byte-stream (TCP) scans.
const BYTE_TERMINATOR: char = '\n';

/// Per-session scan assembly state.
///
/// Create one `Accumulator` when a device session opens (a TCP connection is
/// accepted, the keyboard device is grabbed) and drop it when the session
/// ends.  The buffer it owns always holds a prefix of one not-yet-terminated
/// scan; emitted payloads never include the terminator.
///
/// # Example
///
/// ```rust
/// use scanrelay_core::{Accumulator, ScanSource};
///
/// let mut acc = Accumulator::new(ScanSource::Tcp);
/// assert!(acc.feed_bytes(b"ABC").is_none());
/// let event = acc.feed_bytes(b"123\n").expect("terminator completes the scan");
/// assert_eq!(event.payload, "ABC123");
/// ```
#[derive(Debug)]
pub struct Accumulator {
    /// Which adapter owns this accumulator; stamped onto every emitted event.
    source: ScanSource,
    /// Characters of the scan in progress.
    buffer: String,
}

impl Accumulator {
    /// Creates an empty accumulator tagged with the owning input source.
    pub fn new(source: ScanSource) -> Self {
        Self {
            source,
            buffer: String::new(),
        }
    }

    /// Number of characters currently buffered (exposed for tests and logs).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds a chunk of raw bytes (byte-stream mode, TCP scanners).
    ///
    /// The chunk is appended to the buffer (lossy UTF-8: a scanner glitch
    /// byte becomes U+FFFD rather than an error).  Decoding is per chunk, so
    /// a multi-byte UTF-8 character split across two reads decodes as two
    /// replacement characters — inherited from the deployed relay's
    /// chunk-at-a-time decoding, and harmless for the ASCII payloads real
    /// scanners send.  If the buffer now contains
    /// a newline, the text before the FIRST newline is trimmed of surrounding
    /// whitespace and emitted as a completed scan, and the entire buffer is
    /// cleared (see the module docs for why trailing bytes are dropped).
    ///
    /// Returns `None` while the scan is still incomplete.  Without a
    /// terminator the buffer grows without bound; the relay accepts that
    /// resource risk because real scanners always terminate.
    ///
    /// A scan that trims to the empty string is still emitted — a bare
    /// newline is a valid (empty) scan on the wire and is relayed as such.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Option<ScanEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let terminator_at = self.buffer.find(BYTE_TERMINATOR)?;

        let payload = self.buffer[..terminator_at].trim().to_string();
        // Clear entirely: anything after the terminator in this same chunk is
        // intentionally discarded (compatibility policy, see module docs).
        self.buffer.clear();

        trace!(source = %self.source, len = payload.len(), "scan completed (byte stream)");
        Some(ScanEvent::now(self.source, payload))
    }

    /// Feeds one decoded input record (keyed-event mode, keyboard wedge).
    ///
    /// Only key-down transitions are actionable; releases and auto-repeats
    /// return `None` without touching the buffer.  A press of the terminator
    /// key (Enter) completes the scan; a press of a mapped key appends its
    /// character; a press of an unmapped key is ignored.
    pub fn feed_key(&mut self, record: &KeyRecord) -> Option<ScanEvent> {
        if !record.is_key_press() {
            return None;
        }

        if record.code == keymap::TERMINATOR_CODE {
            let payload = std::mem::take(&mut self.buffer);
            trace!(source = %self.source, len = payload.len(), "scan completed (keyed)");
            return Some(ScanEvent::now(self.source, payload));
        }

        if let Some(c) = keymap::char_for_code(record.code) {
            self.buffer.push(c);
        }
        // Unmapped codes fall through silently: no character, no error.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
