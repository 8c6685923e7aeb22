//! uart2usb - UART controlled USB HID keyboard.
//!
//! Bytes received on a serial link are decoded into keystroke
//! commands, batched into USB boot-protocol keyboard reports and
//! pushed to the host over a single interrupt-IN endpoint.  Software
//! flow control (XON/XOFF) throttles the sender, and a SOF frame-count
//! watchdog detects a vanished host.
//!
//! The crate splits the usual way for embedded bridges:
//!
//! - this library holds the pure pipeline (scan-code mapping, command
//!   decoding, report assembly, flow control, link supervision, the
//!   bridge loop over collaborator traits) and is fully testable on
//!   the host: `cargo test`
//! - the embedded binary in `main.rs` (feature `embedded`, nRF52840)
//!   wires the pipeline to UARTE, USBD and a PWM status LED.

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod hid;
pub mod indicator;
pub mod link;
pub mod serial;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - host-run, no hardware required
// ═══════════════════════════════════════════════════════════════════════════
