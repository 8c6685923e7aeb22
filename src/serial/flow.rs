//! Software flow control (XON/XOFF) with a hysteresis band.

use crate::config::{XOFF, XON};

/// Watches the receive-buffer fill level and tells the sender to pause
/// once the buffer is more than half full, resuming only after it has
/// drained below a quarter.  The gap between the two thresholds keeps
/// the control bytes from chattering around a single boundary; exactly
/// one byte is emitted per edge.
pub struct FlowController {
    high: usize,
    low: usize,
    xoff_sent: bool,
}

impl FlowController {
    /// `capacity` is the receive buffer's total size.
    pub fn new(capacity: usize) -> Self {
        Self {
            high: capacity / 2,
            low: capacity / 4,
            xoff_sent: false,
        }
    }

    /// Compare the fill level against the thresholds.  Returns the
    /// control byte to send back, if the level just crossed an edge.
    pub fn update(&mut self, fill: usize) -> Option<u8> {
        if !self.xoff_sent && fill > self.high {
            self.xoff_sent = true;
            Some(XOFF)
        } else if self.xoff_sent && fill < self.low {
            self.xoff_sent = false;
            Some(XON)
        } else {
            None
        }
    }

    /// True while the sender has been told to pause.
    pub fn paused(&self) -> bool {
        self.xoff_sent
    }
}
