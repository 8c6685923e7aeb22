//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Serial link

/// Capacity of the serial receive buffer (bytes).  Flow-control
/// thresholds are derived from this.
pub const RX_BUFFER_SIZE: usize = 64;

/// Software flow control bytes: XOFF = Ctrl+S, XON = Ctrl+Q.
pub const XOFF: u8 = 0x13;
pub const XON: u8 = 0x11;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "uart2usb";
pub const USB_PRODUCT: &str = "UART-to-USB Keyboard Bridge";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

// Host-presence detection

/// Length of one frame-count sampling window (ms).  At full speed the
/// host issues one SOF per millisecond, so the expected frame count
/// per window equals the window length.
pub const FRAME_SAMPLE_WINDOW_MS: u64 = 100;

/// Nominal SOF frames expected per sampling window.
pub const FRAMES_PER_WINDOW: u32 = 100;

/// Observed frame count below which the host is considered gone
/// (roughly one third of nominal).
pub const FRAMES_OFFLINE_THRESHOLD: u32 = FRAMES_PER_WINDOW / 3;

// Status LED

/// Indicator brightness (percent) while no host link is up.
pub const LED_LEVEL_OFFLINE: u8 = 0;

/// Indicator brightness while a report transfer is outstanding.
pub const LED_LEVEL_TRANSMIT: u8 = 25;

/// Indicator brightness while online and idle.
pub const LED_LEVEL_IDLE: u8 = 100;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types
// are selected in `main.rs`.  Adjust for your custom PCB.
//
//   UART RXD (115200 8N1) → P0.08
//   UART TXD              → P0.06
//   Status LED (PWM)      → P0.13
