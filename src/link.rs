//! Host-link supervision.
//!
//! Tracks whether the USB host is present and reachable.  Two pieces:
//!
//! - [`LinkSignal`] is the single cross-context communication point:
//!   the frame-timing handler samples the SOF counter into it, the
//!   bridge loop reads it.  Each flag has one writer and one reader,
//!   so relaxed atomics are enough.
//! - [`LinkMonitor`] is the bridge-owned state machine over
//!   [`LinkState`], including the acknowledgment wait that link loss
//!   can abort.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::FRAMES_OFFLINE_THRESHOLD;
use crate::error::Error;

/// Link presence, plus two cosmetic sub-states of being online used
/// only for indicator feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No host, or the host stopped ticking.  Sink state until the
    /// next configuration event.
    Offline,
    /// Configured and reachable.
    Online,
    /// Online, a report transfer is outstanding.
    TransmitActive,
    /// Online, no transfer outstanding.
    TransmitIdle,
}

/// Flags shared between the frame-sampling handler and the bridge
/// loop.  `lost` is written by the handler and cleared by the bridge;
/// `online` the other way round.
pub struct LinkSignal {
    online: AtomicBool,
    lost: AtomicBool,
}

impl LinkSignal {
    pub const fn new() -> Self {
        Self {
            online: AtomicBool::new(false),
            lost: AtomicBool::new(false),
        }
    }

    /// Feed one sampling window's SOF frame count.  Called from the
    /// frame-timer context.  Raises the sticky lost flag when the
    /// host stops ticking while the link is up.
    pub fn sample_frame_window(&self, frames: u32) {
        if self.online.load(Ordering::Relaxed) && frames < FRAMES_OFFLINE_THRESHOLD {
            self.lost.store(true, Ordering::Relaxed);
        }
    }

    /// Has loss been flagged since the link last came up?
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Relaxed)
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    fn clear_lost(&self) {
        self.lost.store(false, Ordering::Relaxed);
    }
}

impl Default for LinkSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Bridge-owned link state machine.
pub struct LinkMonitor<'a> {
    state: LinkState,
    signal: &'a LinkSignal,
}

impl<'a> LinkMonitor<'a> {
    pub fn new(signal: &'a LinkSignal) -> Self {
        Self {
            state: LinkState::Offline,
            signal,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state != LinkState::Offline
    }

    /// Offline→Online entry: forget any stale loss and publish the
    /// onlineness the sampler conditions on.
    pub fn bring_online(&mut self) {
        self.signal.clear_lost();
        self.signal.set_online(true);
        self.state = LinkState::Online;
    }

    pub fn set_offline(&mut self) {
        self.signal.set_online(false);
        self.state = LinkState::Offline;
    }

    /// Loop-top check: has the sampler flagged loss since last poll?
    /// Transitions to Offline when it has.
    pub fn poll_lost(&mut self) -> bool {
        if self.is_online() && self.signal.is_lost() {
            self.set_offline();
            return true;
        }
        false
    }

    /// Mark a transfer outstanding.  Indicator-only sub-state.
    pub fn begin_transfer(&mut self) {
        if self.is_online() {
            self.state = LinkState::TransmitActive;
        }
    }

    /// Mark the link idle again after a completed transfer.
    pub fn end_transfer(&mut self) {
        if self.is_online() {
            self.state = LinkState::TransmitIdle;
        }
    }

    /// Busy-wait until the endpoint acknowledges or the link drops.
    ///
    /// There is deliberately no wall-clock timeout: link loss is the
    /// only cancellation path.  On loss the state machine transitions
    /// to Offline and the in-flight report counts as undelivered.
    pub fn wait_for_ack(&mut self, mut acked: impl FnMut() -> bool) -> Result<(), Error> {
        loop {
            if self.signal.is_lost() {
                self.set_offline();
                return Err(Error::LinkLost);
            }
            if acked() {
                return Ok(());
            }
        }
    }
}
