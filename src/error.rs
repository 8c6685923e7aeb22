//! Unified error type for uart2usb.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The host stopped issuing SOF frames while an acknowledgment was
    /// awaited.  The in-flight report is dropped, never retried.
    LinkLost,

    /// A configuration event fired but the device is not (or no
    /// longer) configured by the host.
    NotConfigured,
}
