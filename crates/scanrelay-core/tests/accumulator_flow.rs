//! Integration tests for the full decode → accumulate → emit path.
//!
//! # Purpose
//!
//! These tests exercise the core crate through its *public* API the same way
//! the server's device adapters use it: raw bytes (or raw 24-byte input
//! records) go in, completed [`ScanEvent`]s come out.  They verify:
//!
//! - The byte-stream path end to end, including chunking at awkward
//!   boundaries and the documented "clear entirely on terminator" policy.
//! - The keyed-event path end to end, from raw record bytes through the
//!   keycode table to the emitted payload.
//! - That the two modes are independent: an accumulator only ever emits
//!   events tagged with its own source.

use scanrelay_core::rawkey::INPUT_EVENT_SIZE;
use scanrelay_core::{Accumulator, KeyRecord, ScanSource};

/// Encodes one raw input record the way the kernel would deliver it.
fn raw_record(event_type: u16, code: u16, value: i32) -> [u8; INPUT_EVENT_SIZE] {
    let mut buf = [0u8; INPUT_EVENT_SIZE];
    buf[16..18].copy_from_slice(&event_type.to_le_bytes());
    buf[18..20].copy_from_slice(&code.to_le_bytes());
    buf[20..24].copy_from_slice(&value.to_le_bytes());
    buf
}

/// Feeds a press+release pair for `code`, as a real key tap produces both.
fn tap(acc: &mut Accumulator, code: u16) -> Option<scanrelay_core::ScanEvent> {
    let down = KeyRecord::decode(&raw_record(1, code, 1)).unwrap();
    let up = KeyRecord::decode(&raw_record(1, code, 0)).unwrap();

    let event = acc.feed_key(&down);
    assert!(acc.feed_key(&up).is_none(), "release must never emit");
    event
}

// ── Byte-stream scenarios ─────────────────────────────────────────────────────

/// The canonical TCP flow: input "ABC123\n" yields exactly one event
/// {Tcp, "ABC123"}.
#[test]
fn test_tcp_scenario_abc123() {
    let mut acc = Accumulator::new(ScanSource::Tcp);

    let event = acc.feed_bytes(b"ABC123\n").expect("one event");

    assert_eq!(event.source, ScanSource::Tcp);
    assert_eq!(event.payload, "ABC123");
}

/// Any byte sequence with exactly one terminator yields exactly one event,
/// regardless of how the bytes are chunked.
#[test]
fn test_one_terminator_one_event_across_all_chunkings() {
    let input = b"WIDGET-9942\n";

    for split in 0..input.len() {
        let mut acc = Accumulator::new(ScanSource::Tcp);
        let mut events = Vec::new();

        events.extend(acc.feed_bytes(&input[..split]));
        events.extend(acc.feed_bytes(&input[split..]));

        assert_eq!(events.len(), 1, "split at {split}");
        assert_eq!(events[0].payload, "WIDGET-9942", "split at {split}");
    }
}

/// Sequences with no terminator emit nothing; the buffer holds every byte fed.
#[test]
fn test_no_terminator_no_event() {
    let mut acc = Accumulator::new(ScanSource::Tcp);
    let mut total = 0;

    for chunk in [&b"AAAA"[..], b"BB", b"CCCCCC"] {
        assert!(acc.feed_bytes(chunk).is_none());
        total += chunk.len();
        assert_eq!(acc.buffered_len(), total);
    }
}

/// Back-to-back scans in separate chunks each come through intact.
#[test]
fn test_sequential_scans_emit_in_order() {
    let mut acc = Accumulator::new(ScanSource::Tcp);

    let first = acc.feed_bytes(b"ONE\n").unwrap();
    let second = acc.feed_bytes(b"TWO\n").unwrap();
    let third = acc.feed_bytes(b"THREE\n").unwrap();

    assert_eq!(first.payload, "ONE");
    assert_eq!(second.payload, "TWO");
    assert_eq!(third.payload, "THREE");
    assert!(first.timestamp_ms <= second.timestamp_ms);
    assert!(second.timestamp_ms <= third.timestamp_ms);
}

/// The compatibility policy: a second scan coalesced into the same chunk as
/// the first scan's terminator loses its leading bytes.
#[test]
fn test_coalesced_chunk_drops_trailing_partial_scan() {
    let mut acc = Accumulator::new(ScanSource::Tcp);

    let event = acc.feed_bytes(b"KEEP\nDROPPED").unwrap();

    assert_eq!(event.payload, "KEEP");
    assert_eq!(acc.buffered_len(), 0, "buffer must be cleared entirely");
}

// ── Keyed-event scenarios ─────────────────────────────────────────────────────

/// The canonical wedge flow: keyed sequence h, i, Enter yields
/// {Keyboard, "hi"}.
#[test]
fn test_keyboard_scenario_hi() {
    let mut acc = Accumulator::new(ScanSource::Keyboard);

    assert!(tap(&mut acc, 35).is_none()); // KEY_H
    assert!(tap(&mut acc, 23).is_none()); // KEY_I
    let event = tap(&mut acc, 28).expect("Enter completes"); // KEY_ENTER

    assert_eq!(event.source, ScanSource::Keyboard);
    assert_eq!(event.payload, "hi");
}

/// A realistic wedge burst: digits with interleaved EV_SYN sync records and
/// an unmapped shift key, terminated by Enter.
#[test]
fn test_keyboard_burst_with_noise_records() {
    let mut acc = Accumulator::new(ScanSource::Keyboard);

    for code in [5u16, 6, 7] {
        // Every kernel key event is followed by an EV_SYN (type 0) record.
        tap(&mut acc, code);
        let syn = KeyRecord::decode(&raw_record(0, 0, 0)).unwrap();
        assert!(acc.feed_key(&syn).is_none());
    }

    tap(&mut acc, 42); // KEY_LEFTSHIFT — unmapped, must be inert

    let event = tap(&mut acc, 28).unwrap();
    assert_eq!(event.payload, "456");
}

/// Truncated device reads decode to nothing and therefore feed nothing.
#[test]
fn test_truncated_record_is_dropped_before_accumulation() {
    let full = raw_record(1, 30, 1);
    assert!(KeyRecord::decode(&full[..INPUT_EVENT_SIZE - 4]).is_none());
}

// ── Mode independence ─────────────────────────────────────────────────────────

/// Each accumulator stamps events with its own source; payload content never
/// changes the tag.
#[test]
fn test_source_tag_follows_accumulator_not_payload() {
    let mut tcp = Accumulator::new(ScanSource::Tcp);
    let mut kbd = Accumulator::new(ScanSource::Keyboard);

    let from_tcp = tcp.feed_bytes(b"hi\n").unwrap();
    tap(&mut kbd, 35);
    tap(&mut kbd, 23);
    let from_kbd = tap(&mut kbd, 28).unwrap();

    assert_eq!(from_tcp.payload, from_kbd.payload);
    assert_eq!(from_tcp.source, ScanSource::Tcp);
    assert_eq!(from_kbd.source, ScanSource::Keyboard);
}
