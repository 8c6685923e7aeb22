//! Pending-report accumulation and flush policy.
//!
//! Printable keystrokes arriving in a burst are batched into a single
//! report until a conflict forces a flush: a key code the report
//! already carries, a modifier change, or all six slots taken.  An
//! idle serial line flushes whatever is pending (the burst is over).
//!
//! A flush always transmits the accumulated press report followed by
//! an all-zero release report, so the host never observes keys held
//! down across batches.

use heapless::Vec;

use crate::error::Error;
use crate::hid::keyboard::KeyboardReport;

/// Maximum simultaneous non-modifier keys in a boot report.
pub const MAX_KEYS_IN_REPORT: usize = 6;

/// Where finished reports go.  One call loads the IN endpoint and
/// waits for the host's acknowledgment.
pub trait ReportSink {
    fn send(&mut self, report: &KeyboardReport) -> Result<(), Error>;
}

/// Accumulates decoded keystrokes into the next report to transmit.
///
/// Invariants: the pending key codes are pairwise distinct, and a
/// single modifier bitmask applies to the whole pending report.
#[derive(Default)]
pub struct ReportAssembler {
    modifier: u8,
    codes: Vec<u8, MAX_KEYS_IN_REPORT>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no keystrokes are pending.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Drop any accumulated state without transmitting.
    pub fn reset(&mut self) {
        self.modifier = 0;
        self.codes.clear();
    }

    /// Add one keystroke to the pending report.
    ///
    /// Flushes first when the report could not represent the key (the
    /// code already occupies a slot, or the modifier differs from the
    /// accumulated one), and flushes afterwards once all six slots are
    /// taken.
    pub fn push_key(
        &mut self,
        modifier: u8,
        code: u8,
        sink: &mut impl ReportSink,
    ) -> Result<(), Error> {
        if self.codes.contains(&code) {
            self.flush(sink)?;
        }
        if !self.codes.is_empty() && self.modifier != modifier {
            self.flush(sink)?;
        }
        self.modifier = modifier;
        // A slot is always free here: full reports were flushed on the
        // push that filled them.
        let _ = self.codes.push(code);
        if self.codes.is_full() {
            self.flush(sink)?;
        }
        Ok(())
    }

    /// Transmit the pending press report followed by an all-zero
    /// release report.  No-op when nothing is pending.
    ///
    /// The pending state is cleared before the first transmit, so the
    /// assembler is empty again whatever the transmit outcome.
    pub fn flush(&mut self, sink: &mut impl ReportSink) -> Result<(), Error> {
        if self.codes.is_empty() {
            return Ok(());
        }
        let mut press = KeyboardReport::empty();
        press.modifier = self.modifier;
        press.keycodes[..self.codes.len()].copy_from_slice(&self.codes);
        self.reset();

        sink.send(&press)?;
        sink.send(&KeyboardReport::empty())
    }
}
