//! USB device subsystem - presents a boot-protocol keyboard to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`.  A single HID interface carries the keyboard
//! reports; bus-level state (configured, configuration changes) is
//! published through atomics for the bridge loop to poll.

pub mod hid_device;
