//! The NFC reader event model.
//!
//! # Why an event model instead of direct PC/SC calls? (for beginners)
//!
//! Smart card readers are driven by a notification API: the PC/SC daemon
//! tells you when a reader appears, when a card lands on it, when the card is
//! lifted, and when the reader goes away.  Rather than scattering PC/SC
//! types through the relay, the hardware binding translates every
//! notification into one of the [`ReaderEvent`] variants below.  The
//! application layer then decides which events become scans — and that
//! decision logic is testable without any hardware or the `pcsc` feature.
//!
//! # Card standard filtering
//!
//! The relay only accepts **ISO 14443-3** cards (contactless storage cards —
//! MIFARE Classic/Ultralight and friends, the kind used as badge tokens).
//! ISO 14443-4 cards (contactless smart cards with an application processor,
//! e.g. bank cards) are deliberately ignored: their UIDs are often randomized
//! per tap and they are not badge tokens.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The reader-error message produced for every ISO 14443-4 card tap when no
/// application identifier is configured.
///
/// The relay never configures an AID (it only wants Part-3 storage cards), so
/// this message is expected noise on every non-badge tap and is filtered out
/// of the logs rather than reported as a reader fault.
pub const AID_NOISE_MESSAGE: &str = "Cannot process ISO 14443-4 tag because AID was not set.";

/// Which ISO 14443 part a presented card speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStandard {
    /// ISO 14443-3: contactless storage card (MIFARE family).  The only
    /// standard the relay turns into scan events.
    Iso14443Part3,
    /// ISO 14443-4: contactless smart card with an application layer.
    Iso14443Part4,
    /// Anything the ATR does not identify.
    Unknown,
}

impl fmt::Display for CardStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardStandard::Iso14443Part3 => write!(f, "ISO 14443-3"),
            CardStandard::Iso14443Part4 => write!(f, "ISO 14443-4"),
            CardStandard::Unknown => write!(f, "unknown"),
        }
    }
}

/// One notification from the NFC reader layer.
///
/// The hardware binding (see `infrastructure::nfc`) produces these; the
/// shared handler in `application::relay` consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A reader was discovered and is waiting for cards.
    ReaderAttached {
        /// Reader name as reported by the PC/SC daemon.
        name: String,
    },
    /// A card was placed on the reader.
    CardPresent {
        /// The card's protocol standard, classified from its ATR.
        standard: CardStandard,
        /// The card UID, formatted as uppercase hex without separators.
        uid: String,
    },
    /// The card was lifted off the reader.
    CardRemoved,
    /// The reader reported an error.
    ReaderError {
        /// Human-readable error message from the reader layer.
        message: String,
    },
    /// The reader was unplugged or the PC/SC daemon lost it.
    ReaderDetached {
        /// Reader name as reported by the PC/SC daemon.
        name: String,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
