//! Linux kernel keycode → character translation table.
//!
//! Keycode values are defined in `<linux/input-event-codes.h>`.
//!
//! # What is a keycode? (for beginners)
//!
//! The kernel identifies keys by **physical position numbers**, not by the
//! characters they produce.  For example:
//!
//! | Keycode name | Value | Character (US layout) |
//! |--------------|-------|-----------------------|
//! | `KEY_1`      | 2     | '1'                   |
//! | `KEY_Q`      | 16    | 'q'                   |
//! | `KEY_A`      | 30    | 'a'                   |
//! | `KEY_ENTER`  | 28    | — (scan terminator)   |
//!
//! A keyboard-wedge barcode scanner "types" the barcode one key at a time and
//! finishes with Enter, so this table only needs the characters such scanners
//! emit: digits and lowercase letters.  Modifier handling (Shift producing
//! uppercase or symbols) is deliberately absent — wedge scanners configured
//! for this relay send unshifted keys only.
//!
//! Keycodes outside the table translate to `None` and are silently ignored by
//! the accumulator; they never contribute to or corrupt a scan in progress.

/// Keycode of the scan terminator key (`KEY_ENTER`).
///
/// When the wedge device presses this key the accumulator completes the scan
/// instead of appending a character.
pub const TERMINATOR_CODE: u16 = 28;

/// Translates a Linux kernel keycode to the character it produces.
///
/// Returns `None` for the terminator key and for any key with no mapping.
///
/// # Panics
///
/// This function never panics.
pub fn char_for_code(code: u16) -> Option<char> {
    match code {
        // Digit row (KEY_1..KEY_0, keycodes 2-11)
        2 => Some('1'),  // KEY_1
        3 => Some('2'),  // KEY_2
        4 => Some('3'),  // KEY_3
        5 => Some('4'),  // KEY_4
        6 => Some('5'),  // KEY_5
        7 => Some('6'),  // KEY_6
        8 => Some('7'),  // KEY_7
        9 => Some('8'),  // KEY_8
        10 => Some('9'), // KEY_9
        11 => Some('0'), // KEY_0

        // Top letter row (KEY_Q..KEY_P, keycodes 16-25)
        16 => Some('q'), // KEY_Q
        17 => Some('w'), // KEY_W
        18 => Some('e'), // KEY_E
        19 => Some('r'), // KEY_R
        20 => Some('t'), // KEY_T
        21 => Some('y'), // KEY_Y
        22 => Some('u'), // KEY_U
        23 => Some('i'), // KEY_I
        24 => Some('o'), // KEY_O
        25 => Some('p'), // KEY_P

        // Home letter row (KEY_A..KEY_L, keycodes 30-38)
        30 => Some('a'), // KEY_A
        31 => Some('s'), // KEY_S
        32 => Some('d'), // KEY_D
        33 => Some('f'), // KEY_F
        34 => Some('g'), // KEY_G
        35 => Some('h'), // KEY_H
        36 => Some('j'), // KEY_J
        37 => Some('k'), // KEY_K
        38 => Some('l'), // KEY_L

        // Bottom letter row (KEY_Z..KEY_M, keycodes 44-50)
        44 => Some('z'), // KEY_Z
        45 => Some('x'), // KEY_X
        46 => Some('c'), // KEY_C
        47 => Some('v'), // KEY_V
        48 => Some('b'), // KEY_B
        49 => Some('n'), // KEY_N
        50 => Some('m'), // KEY_M

        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
