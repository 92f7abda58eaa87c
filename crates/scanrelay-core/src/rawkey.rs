//! Decoder for raw Linux `input_event` records.
//!
//! # What is an input_event record? (for beginners)
//!
//! When you read from a `/dev/input/event*` character device, the kernel hands
//! you a stream of fixed-size binary records, one per hardware event.  On a
//! 64-bit system each record is 24 bytes laid out as:
//!
//! | Bytes  | Field         | Meaning                                   |
//! |--------|---------------|-------------------------------------------|
//! | 0–15   | `timeval`     | Kernel timestamp (seconds + microseconds) |
//! | 16–17  | `type` (u16)  | Event class — `EV_KEY` (1) for keys       |
//! | 18–19  | `code` (u16)  | Which key — e.g. `KEY_A` = 30             |
//! | 20–23  | `value` (i32) | 1 = pressed, 0 = released, 2 = auto-repeat|
//!
//! All fields are little-endian on the platforms this server targets.
//!
//! The kernel timestamp is not used by the relay (events are stamped at scan
//! completion time instead), so the decoder skips straight to offset 16.
//!
//! # Why not a `#[repr(C)]` struct cast?
//!
//! Decoding by explicit offset keeps the code free of `unsafe` and of any
//! dependence on the exact C struct padding, at the cost of three slice reads
//! per record.  For keyboard-rate input that cost is irrelevant.

/// Size in bytes of one `struct input_event` on a 64-bit kernel ABI.
pub const INPUT_EVENT_SIZE: usize = 24;

/// Event type for key press/release events (`EV_KEY` in `<linux/input.h>`).
pub const EV_KEY: u16 = 1;

/// `value` field of a key-down transition (as opposed to release = 0 and
/// auto-repeat = 2).
pub const KEY_PRESSED: i32 = 1;

/// Byte offset of the `type` field within a record.
const TYPE_OFFSET: usize = 16;
/// Byte offset of the `code` field within a record.
const CODE_OFFSET: usize = 18;
/// Byte offset of the `value` field within a record.
const VALUE_OFFSET: usize = 20;

/// Decoded view of one raw input record.
///
/// Only the three fields the accumulator cares about are carried; the kernel
/// timestamp is dropped at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRecord {
    /// Event class (`EV_KEY` = 1 for key transitions).
    pub event_type: u16,
    /// Kernel key code (e.g. `KEY_1` = 2, `KEY_ENTER` = 28).
    pub code: u16,
    /// Transition value: 1 = pressed, 0 = released, 2 = auto-repeat.
    pub value: i32,
}

impl KeyRecord {
    /// Decodes one record from a raw byte buffer.
    ///
    /// Returns `None` if the buffer is shorter than [`INPUT_EVENT_SIZE`] —
    /// a truncated read is treated as malformed input and silently dropped,
    /// matching the relay's "ignore what you cannot decode" policy.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < INPUT_EVENT_SIZE {
            return None;
        }

        // Slices of statically known length; `try_into` cannot fail here but
        // the `ok()?` keeps the decoder panic-free by construction.
        let event_type = u16::from_le_bytes(buf[TYPE_OFFSET..TYPE_OFFSET + 2].try_into().ok()?);
        let code = u16::from_le_bytes(buf[CODE_OFFSET..CODE_OFFSET + 2].try_into().ok()?);
        let value = i32::from_le_bytes(buf[VALUE_OFFSET..VALUE_OFFSET + 4].try_into().ok()?);

        Some(Self {
            event_type,
            code,
            value,
        })
    }

    /// True when this record is a key-down transition (`EV_KEY` + pressed).
    ///
    /// Releases and auto-repeats return `false`; they never contribute
    /// characters to a scan.
    pub fn is_key_press(&self) -> bool {
        self.event_type == EV_KEY && self.value == KEY_PRESSED
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
