//! Status-light policy.

use crate::config::{LED_LEVEL_IDLE, LED_LEVEL_OFFLINE, LED_LEVEL_TRANSMIT};
use crate::link::LinkState;

/// Anything that can show a 0-100 intensity.
pub trait Indicator {
    fn set_level(&mut self, percent: u8);
}

/// No-op indicator for boards without a status light.
impl Indicator for () {
    fn set_level(&mut self, _percent: u8) {}
}

/// Brightness for a link state: dark without a host, dimmed while a
/// transfer is outstanding, full while connected and idle.
pub fn level_for(state: LinkState) -> u8 {
    match state {
        LinkState::Offline => LED_LEVEL_OFFLINE,
        LinkState::TransmitActive => LED_LEVEL_TRANSMIT,
        LinkState::Online | LinkState::TransmitIdle => LED_LEVEL_IDLE,
    }
}
