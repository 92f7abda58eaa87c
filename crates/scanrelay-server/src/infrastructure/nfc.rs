//! NFC adapter: PC/SC reader monitoring and card UID extraction.
//!
//! # How card detection works (for beginners)
//!
//! PC/SC is the standard smart card API (`pcscd` on Linux).  Instead of
//! polling a device file, you ask the daemon to *block until something
//! changes*: a reader appears, a card lands on it, the card is lifted, the
//! reader is unplugged.  This module runs that wait loop on a blocking
//! worker and translates every change into a
//! [`ReaderEvent`](crate::domain::reader::ReaderEvent), which the shared
//! handler in `application::relay` turns into scan events (or ignores).
//!
//! Reading the UID is a single APDU exchange: the PC/SC "GET DATA" command
//! `FF CA 00 00 00` returns the card UID followed by the status word
//! `90 00`.
//!
//! # Standard classification
//!
//! The relay only accepts ISO 14443-3 storage cards.  Which standard a card
//! speaks is read from its ATR: PC/SC part 3 requires contactless storage
//! cards to present the registered-application ATR form
//! `3B 8F 80 01 80 4F …`, so that prefix means Part 3; any other ISO-style
//! ATR (leading `3B`) is taken to be a Part 4 smart card.
//!
//! # Feature gating
//!
//! Only the `pcsc`-driven wait loop needs the PC/SC client library at build
//! time, so it sits behind the non-default `pcsc` cargo feature.  The ATR
//! classifier and the UID response parser are plain functions, compiled and
//! tested unconditionally.  Without the feature, [`start_nfc_adapter`] logs
//! that NFC support is compiled out and the relay runs with the other
//! adapters — the same "this adapter only" degradation used when the
//! keyboard device is missing.

use tokio::sync::mpsc;
use tracing::info;

use scanrelay_core::ScanEvent;

use crate::domain::reader::CardStandard;

/// PC/SC GET DATA command returning the card UID.
pub const GET_UID_APDU: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// ATR prefix mandated by PC/SC part 3 for contactless storage cards.
const STORAGE_CARD_ATR_PREFIX: [u8; 6] = [0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F];

/// Classifies a card's ISO 14443 standard from its ATR.
pub fn classify_atr(atr: &[u8]) -> CardStandard {
    if atr.len() >= STORAGE_CARD_ATR_PREFIX.len()
        && atr[..STORAGE_CARD_ATR_PREFIX.len()] == STORAGE_CARD_ATR_PREFIX
    {
        CardStandard::Iso14443Part3
    } else if atr.first() == Some(&0x3B) {
        CardStandard::Iso14443Part4
    } else {
        CardStandard::Unknown
    }
}

/// Extracts the UID from a GET DATA response APDU.
///
/// A successful response is the UID bytes followed by the status word
/// `90 00`.  Returns the UID as uppercase hex without separators, or `None`
/// for error status words and empty UIDs (malformed responses are dropped,
/// never surfaced).
pub fn parse_uid_response(rapdu: &[u8]) -> Option<String> {
    let (uid, status) = rapdu.split_at(rapdu.len().checked_sub(2)?);
    if status != [0x90, 0x00] || uid.is_empty() {
        return None;
    }

    Some(uid.iter().map(|b| format!("{b:02X}")).collect())
}

// ── PC/SC-backed event source (feature "pcsc") ────────────────────────────────

#[cfg(feature = "pcsc")]
mod pcsc_source {
    use std::time::Duration;

    use thiserror::Error;
    use tokio::sync::mpsc;
    use tracing::debug;

    use pcsc::{
        Context, Protocols, ReaderState, Scope, ShareMode, State, MAX_BUFFER_SIZE,
        PNP_NOTIFICATION,
    };

    use scanrelay_core::ScanEvent;

    use crate::application::relay::handle_reader_event;
    use crate::domain::reader::ReaderEvent;

    use super::{classify_atr, parse_uid_response, GET_UID_APDU};

    /// How long one `get_status_change` wait may block before the loop
    /// re-checks the dispatch channel.
    const STATUS_POLL: Duration = Duration::from_millis(500);

    /// Why the NFC adapter could not start or keep running.
    #[derive(Debug, Error)]
    pub enum NfcError {
        /// No connection to the PC/SC daemon (`pcscd` not running, or no
        /// smart card service on this host).
        #[error("failed to establish PC/SC context: {0}")]
        Establish(pcsc::Error),

        /// Reader enumeration failed after the context was up.
        #[error("failed to list PC/SC readers: {0}")]
        ListReaders(pcsc::Error),
    }

    /// The blocking reader-monitor loop.
    ///
    /// Mirrors the canonical PC/SC monitor pattern: keep one
    /// [`ReaderState`] per known reader plus the PnP pseudo-reader, wait for
    /// a state change, and translate each change into a [`ReaderEvent`].
    /// Exits when the dispatch channel closes (shutdown).
    pub fn reader_loop(events: mpsc::UnboundedSender<ScanEvent>) -> Result<(), NfcError> {
        let ctx = Context::establish(Scope::User).map_err(NfcError::Establish)?;

        let mut readers_buf = [0u8; 2048];
        let mut reader_states = vec![ReaderState::new(PNP_NOTIFICATION(), State::UNAWARE)];

        loop {
            if events.is_closed() {
                debug!("dispatch channel closed; NFC monitor exiting");
                return Ok(());
            }

            // Drop readers the daemon no longer knows about.
            reader_states.retain(|rs: &ReaderState| {
                let dead = rs.event_state().intersects(State::UNKNOWN | State::IGNORE);
                if dead && rs.name() != PNP_NOTIFICATION() {
                    handle_reader_event(
                        ReaderEvent::ReaderDetached {
                            name: rs.name().to_string_lossy().into_owned(),
                        },
                        &events,
                    );
                }
                !dead
            });

            // Register readers that appeared since the last pass.
            let names = ctx
                .list_readers(&mut readers_buf)
                .map_err(NfcError::ListReaders)?;
            for name in names {
                if !reader_states.iter().any(|rs| rs.name() == name) {
                    handle_reader_event(
                        ReaderEvent::ReaderAttached {
                            name: name.to_string_lossy().into_owned(),
                        },
                        &events,
                    );
                    reader_states.push(ReaderState::new(name, State::UNAWARE));
                }
            }

            for rs in &mut reader_states {
                rs.sync_current_state();
            }

            match ctx.get_status_change(STATUS_POLL, &mut reader_states) {
                Ok(()) => {}
                Err(pcsc::Error::Timeout) => continue,
                Err(e) => {
                    handle_reader_event(
                        ReaderEvent::ReaderError {
                            message: e.to_string(),
                        },
                        &events,
                    );
                    continue;
                }
            }

            for rs in &reader_states {
                if rs.name() == PNP_NOTIFICATION() || !rs.event_state().contains(State::CHANGED) {
                    continue;
                }

                if rs.event_state().contains(State::PRESENT) {
                    let standard = classify_atr(rs.atr());
                    match read_card_uid(&ctx, rs.name()) {
                        Ok(uid) => handle_reader_event(
                            ReaderEvent::CardPresent { standard, uid },
                            &events,
                        ),
                        Err(message) => {
                            handle_reader_event(ReaderEvent::ReaderError { message }, &events)
                        }
                    }
                } else if rs.event_state().contains(State::EMPTY) {
                    handle_reader_event(ReaderEvent::CardRemoved, &events);
                }
            }
        }
    }

    /// Connects to the presented card and reads its UID with GET DATA.
    fn read_card_uid(ctx: &Context, reader: &std::ffi::CStr) -> Result<String, String> {
        let card = ctx
            .connect(reader, ShareMode::Shared, Protocols::ANY)
            .map_err(|e| format!("failed to connect to card: {e}"))?;

        let mut rapdu_buf = [0u8; MAX_BUFFER_SIZE];
        let rapdu = card
            .transmit(&GET_UID_APDU, &mut rapdu_buf)
            .map_err(|e| format!("UID APDU failed: {e}"))?;

        parse_uid_response(rapdu).ok_or_else(|| "card returned no UID".to_string())
    }
}

/// Starts the NFC adapter on a blocking worker.
///
/// Degrades like every other adapter: if the PC/SC context cannot be
/// established or is lost, the failure is logged and only NFC stays down.
#[cfg(feature = "pcsc")]
pub fn start_nfc_adapter(events: mpsc::UnboundedSender<ScanEvent>) {
    info!("waiting for NFC reader connection");
    tokio::task::spawn_blocking(move || {
        if let Err(e) = pcsc_source::reader_loop(events) {
            tracing::warn!("NFC adapter stopped: {e}; continuing without NFC");
        }
    });
}

/// Feature-off stub: the relay runs without NFC.
#[cfg(not(feature = "pcsc"))]
pub fn start_nfc_adapter(_events: mpsc::UnboundedSender<ScanEvent>) {
    info!("NFC support compiled out (enable the `pcsc` feature); continuing without NFC");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// ATR of a MIFARE Classic 1K on an ACR122U — the badge card in
    /// production use.
    const MIFARE_CLASSIC_ATR: [u8; 20] = [
        0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06, 0x03, 0x00,
        0x01, 0x00, 0x00, 0x00, 0x00, 0x6A,
    ];

    #[test]
    fn test_storage_card_atr_classifies_as_part3() {
        assert_eq!(
            classify_atr(&MIFARE_CLASSIC_ATR),
            CardStandard::Iso14443Part3
        );
    }

    #[test]
    fn test_smart_card_atr_classifies_as_part4() {
        // A typical EMV contactless ATR: ISO form but not the storage-card
        // registered-application shape.
        let atr = [0x3B, 0x88, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09];
        assert_eq!(classify_atr(&atr), CardStandard::Iso14443Part4);
    }

    #[test]
    fn test_garbage_atr_classifies_as_unknown() {
        assert_eq!(classify_atr(&[]), CardStandard::Unknown);
        assert_eq!(classify_atr(&[0x00, 0x01, 0x02]), CardStandard::Unknown);
    }

    #[test]
    fn test_short_storage_prefix_is_not_part3() {
        // Fewer bytes than the full registered-application prefix must not
        // be promoted to Part 3.
        assert_eq!(
            classify_atr(&[0x3B, 0x8F, 0x80]),
            CardStandard::Iso14443Part4
        );
    }

    #[test]
    fn test_uid_response_formats_uppercase_hex() {
        // A 4-byte MIFARE UID followed by the success status word.
        let rapdu = [0x04, 0xA1, 0xB2, 0xC3, 0x90, 0x00];
        assert_eq!(parse_uid_response(&rapdu), Some("04A1B2C3".to_string()));
    }

    #[test]
    fn test_seven_byte_uid_parses() {
        // NTAG/Ultralight cards carry 7-byte UIDs.
        let rapdu = [0x04, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x90, 0x00];
        assert_eq!(parse_uid_response(&rapdu), Some("04123456789ABC".to_string()));
    }

    #[test]
    fn test_error_status_word_returns_none() {
        // 63 00 = warning/error; no UID must be surfaced.
        assert_eq!(parse_uid_response(&[0x63, 0x00]), None);
        assert_eq!(parse_uid_response(&[0x04, 0xA1, 0x6A, 0x81]), None);
    }

    #[test]
    fn test_empty_or_truncated_response_returns_none() {
        assert_eq!(parse_uid_response(&[]), None);
        assert_eq!(parse_uid_response(&[0x90]), None);
        // Status word alone means a zero-length UID: nothing to relay.
        assert_eq!(parse_uid_response(&[0x90, 0x00]), None);
    }
}
