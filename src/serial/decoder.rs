//! Keystroke-stream command decoding.
//!
//! Each leading byte decodes to at most one action:
//!
//! | Byte(s)                    | Action                   |
//! |----------------------------|--------------------------|
//! | `0x20..=0x7E`              | single mapped keypress   |
//! | `0x0D`                     | Enter                    |
//! | `0x00 <mod> <code>`        | one-shot raw report      |
//! | `0xFF <mod> <code1..code6>`| one-shot full report     |
//! | anything else              | ignored                  |

use crate::hid::keyboard::KeyboardReport;
use crate::hid::keymap::{self, KEY_ENTER};
use crate::serial::SerialPort;

/// Leading byte of the raw single-key command.
const CMD_RAW_KEY: u8 = 0x00;

/// Leading byte of the raw full-report command.
const CMD_RAW_REPORT: u8 = 0xFF;

/// Carriage return, sent by line-oriented senders for Enter.
const CR: u8 = 0x0D;

/// A decoded serial command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// A keystroke destined for the report assembler.
    Key { modifier: u8, code: u8 },
    /// A sender-built report transmitted as-is, press only: the sender
    /// is responsible for its own key-up.
    OneShot(KeyboardReport),
}

/// Decode the action starting with `first`.
///
/// The follow-up bytes of the raw commands are read blocking, with no
/// timeout; a sender that stalls mid-command suspends the decoder
/// until the remaining bytes show up.  Unmapped bytes decode to
/// `None` without consuming anything further.
pub fn decode(first: u8, serial: &mut impl SerialPort) -> Option<Command> {
    match first {
        CR => Some(Command::Key {
            modifier: 0,
            code: KEY_ENTER,
        }),
        CMD_RAW_KEY => {
            let modifier = serial.wait_byte();
            let code = serial.wait_byte();
            Some(Command::OneShot(KeyboardReport::with_key(modifier, code)))
        }
        CMD_RAW_REPORT => {
            let mut report = KeyboardReport::empty();
            report.modifier = serial.wait_byte();
            for slot in report.keycodes.iter_mut() {
                *slot = serial.wait_byte();
            }
            Some(Command::OneShot(report))
        }
        _ => keymap::scan_code(first).map(|(modifier, code)| Command::Key { modifier, code }),
    }
}
