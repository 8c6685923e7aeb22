//! End-to-end tests for the bridge poll loop: scripted serial input on
//! one side, a fake endpoint and status LED on the other.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;

use uart2usb::bridge::{Bridge, Endpoint};
use uart2usb::config::{LED_LEVEL_IDLE, LED_LEVEL_OFFLINE, LED_LEVEL_TRANSMIT, XOFF, XON};
use uart2usb::hid::keyboard::KeyboardReport;
use uart2usb::indicator::Indicator;
use uart2usb::link::{LinkSignal, LinkState};
use uart2usb::serial::SerialPort;

// ═══════════════════════════════════════════════════════════════════════════
// Test doubles (shared handles so the rig can inspect mid-run)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct SerialState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

#[derive(Clone, Default)]
struct SharedSerial(Rc<RefCell<SerialState>>);

impl SharedSerial {
    fn feed(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes);
    }

    fn fill(&self) -> usize {
        self.0.borrow().rx.len()
    }

    fn tx(&self) -> Vec<u8> {
        self.0.borrow().tx.clone()
    }
}

impl SerialPort for SharedSerial {
    fn poll_byte(&mut self) -> Option<u8> {
        self.0.borrow_mut().rx.pop_front()
    }

    fn wait_byte(&mut self) -> u8 {
        self.0
            .borrow_mut()
            .rx
            .pop_front()
            .expect("decoder blocked on an exhausted byte script")
    }

    fn write_byte(&mut self, byte: u8) {
        self.0.borrow_mut().tx.push(byte);
    }

    fn rx_fill(&self) -> usize {
        self.0.borrow().rx.len()
    }

    fn rx_capacity(&self) -> usize {
        64
    }
}

#[derive(Default)]
struct EndpointState {
    loaded: Vec<KeyboardReport>,
    acks: bool,
    configured: bool,
    config_event: bool,
    /// When set, the acknowledgment poll raises link loss instead of
    /// ever answering (a host that vanished mid-transfer).
    lose_on_ack: Option<&'static LinkSignal>,
}

#[derive(Clone, Default)]
struct SharedEndpoint(Rc<RefCell<EndpointState>>);

impl SharedEndpoint {
    fn loaded(&self) -> Vec<KeyboardReport> {
        self.0.borrow().loaded.clone()
    }
}

impl Endpoint for SharedEndpoint {
    fn load_report(&mut self, report: &KeyboardReport) {
        self.0.borrow_mut().loaded.push(*report);
    }

    fn ack_received(&mut self) -> bool {
        let state = self.0.borrow();
        if let Some(signal) = state.lose_on_ack {
            signal.sample_frame_window(0);
            return false;
        }
        state.acks
    }

    fn configuration_changed(&mut self) -> bool {
        mem::take(&mut self.0.borrow_mut().config_event)
    }

    fn is_configured(&mut self) -> bool {
        self.0.borrow().configured
    }
}

#[derive(Clone, Default)]
struct SharedLed(Rc<RefCell<Vec<u8>>>);

impl SharedLed {
    fn levels(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Indicator for SharedLed {
    fn set_level(&mut self, percent: u8) {
        self.0.borrow_mut().push(percent);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Rig
// ═══════════════════════════════════════════════════════════════════════════

struct Rig {
    serial: SharedSerial,
    endpoint: SharedEndpoint,
    led: SharedLed,
    signal: &'static LinkSignal,
    bridge: Bridge<'static, SharedSerial, SharedEndpoint, SharedLed>,
}

fn rig() -> Rig {
    let signal: &'static LinkSignal = Box::leak(Box::new(LinkSignal::new()));
    let serial = SharedSerial::default();
    let endpoint = SharedEndpoint::default();
    let led = SharedLed::default();
    let bridge = Bridge::new(serial.clone(), endpoint.clone(), led.clone(), signal);
    Rig {
        serial,
        endpoint,
        led,
        signal,
        bridge,
    }
}

/// A rig brought through enumeration: configured, endpoint armed with
/// the all-keys-released report.
fn online_rig() -> Rig {
    let mut rig = rig();
    {
        let mut endpoint = rig.endpoint.0.borrow_mut();
        endpoint.configured = true;
        endpoint.config_event = true;
        endpoint.acks = true;
    }
    rig.bridge.poll();
    assert_eq!(rig.bridge.link_state(), LinkState::TransmitIdle);
    rig
}

fn polls(rig: &mut Rig, count: usize) {
    for _ in 0..count {
        rig.bridge.poll();
    }
}

fn press_of(modifier: u8, codes: &[u8]) -> KeyboardReport {
    let mut report = KeyboardReport::empty();
    report.modifier = modifier;
    report.keycodes[..codes.len()].copy_from_slice(codes);
    report
}

const RELEASE: KeyboardReport = KeyboardReport::empty();

// ═══════════════════════════════════════════════════════════════════════════
// Bring-up
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn bring_up_arms_endpoint_with_release_report() {
    let rig = online_rig();
    assert_eq!(rig.endpoint.loaded(), vec![RELEASE]);
    assert_eq!(rig.led.levels().last(), Some(&LED_LEVEL_IDLE));
}

#[test]
fn configuration_event_without_configured_device_stays_offline() {
    let mut rig = rig();
    rig.endpoint.0.borrow_mut().config_event = true;
    rig.bridge.poll();

    assert_eq!(rig.bridge.link_state(), LinkState::Offline);
    assert!(rig.endpoint.loaded().is_empty());
}

#[test]
fn offline_bridge_leaves_serial_input_queued() {
    let mut rig = rig();
    rig.serial.feed(b"abc");
    polls(&mut rig, 5);

    assert_eq!(rig.serial.fill(), 3);
    assert!(rig.endpoint.loaded().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Keystroke scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn single_key_then_idle_flush() {
    let mut rig = online_rig();
    rig.serial.feed(b"A");

    rig.bridge.poll();
    // Accumulated but not yet sent; the line might still be bursting.
    assert_eq!(rig.endpoint.loaded().len(), 1);

    rig.bridge.poll();
    assert_eq!(
        rig.endpoint.loaded(),
        vec![RELEASE, press_of(0x02, &[0x04]), RELEASE]
    );
    assert!(rig.led.levels().contains(&LED_LEVEL_TRANSMIT));
}

#[test]
fn burst_batches_into_one_report() {
    let mut rig = online_rig();
    rig.serial.feed(b"hi\r");
    polls(&mut rig, 4);

    assert_eq!(
        rig.endpoint.loaded(),
        vec![RELEASE, press_of(0, &[0x0B, 0x0C, 0x28]), RELEASE]
    );
}

#[test]
fn seven_keys_roll_over_into_two_reports() {
    let mut rig = online_rig();
    rig.serial.feed(b"abcdefg");
    polls(&mut rig, 8);

    assert_eq!(
        rig.endpoint.loaded(),
        vec![
            RELEASE,
            press_of(0, &[0x04, 0x05, 0x06, 0x07, 0x08, 0x09]),
            RELEASE,
            press_of(0, &[0x0A]),
            RELEASE,
        ]
    );
}

#[test]
fn repeated_key_flushes_between_presses() {
    let mut rig = online_rig();
    rig.serial.feed(b"aa");
    polls(&mut rig, 3);

    assert_eq!(
        rig.endpoint.loaded(),
        vec![
            RELEASE,
            press_of(0, &[0x04]),
            RELEASE,
            press_of(0, &[0x04]),
            RELEASE,
        ]
    );
}

#[test]
fn modifier_change_splits_the_batch() {
    let mut rig = online_rig();
    rig.serial.feed(b"aB");
    polls(&mut rig, 3);

    assert_eq!(
        rig.endpoint.loaded(),
        vec![
            RELEASE,
            press_of(0, &[0x04]),
            RELEASE,
            press_of(0x02, &[0x05]),
            RELEASE,
        ]
    );
}

#[test]
fn unmapped_bytes_produce_no_reports() {
    let mut rig = online_rig();
    rig.serial.feed(&[0x07, 0x0A, 0x1B]);
    polls(&mut rig, 5);

    assert_eq!(rig.endpoint.loaded(), vec![RELEASE]);
}

// ═══════════════════════════════════════════════════════════════════════════
// One-shot raw reports
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn raw_key_command_sends_press_without_release() {
    let mut rig = online_rig();
    rig.serial.feed(&[0x00, 0x02, 0x05]);
    polls(&mut rig, 3);

    // Exactly one report; the sender owns the key-up.
    assert_eq!(rig.endpoint.loaded(), vec![RELEASE, press_of(0x02, &[0x05])]);
}

#[test]
fn raw_full_report_command_sends_press_without_release() {
    let mut rig = online_rig();
    rig.serial.feed(&[0xFF, 0x01, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    polls(&mut rig, 3);

    assert_eq!(
        rig.endpoint.loaded(),
        vec![RELEASE, press_of(0x01, &[0x04, 0x05, 0x06, 0x07, 0x08, 0x09])]
    );
}

#[test]
fn raw_report_does_not_disturb_pending_batch() {
    let mut rig = online_rig();
    // 'a' accumulates, then a raw one-shot goes out directly, then the
    // idle flush emits the batch.
    rig.serial.feed(b"a");
    rig.bridge.poll();
    rig.serial.feed(&[0x00, 0x00, 0x2C]);
    polls(&mut rig, 2);

    assert_eq!(
        rig.endpoint.loaded(),
        vec![
            RELEASE,
            press_of(0, &[0x2C]),
            press_of(0, &[0x04]),
            RELEASE,
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Flow control
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn flow_control_asserts_and_releases_once() {
    let mut rig = online_rig();
    // Unmapped filler so no reports complicate the run.
    rig.serial.feed(&[0x07; 60]);
    polls(&mut rig, 70);

    assert_eq!(rig.serial.fill(), 0);
    assert_eq!(rig.serial.tx(), vec![XOFF, XON]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Link loss and recovery
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn frame_loss_goes_offline_before_touching_the_endpoint() {
    let mut rig = online_rig();
    rig.signal.sample_frame_window(10);
    rig.serial.feed(b"a");
    rig.bridge.poll();

    assert_eq!(rig.bridge.link_state(), LinkState::Offline);
    // The queued byte was not consumed and nothing new was loaded.
    assert_eq!(rig.serial.fill(), 1);
    assert_eq!(rig.endpoint.loaded(), vec![RELEASE]);
    assert_eq!(rig.led.levels().last(), Some(&LED_LEVEL_OFFLINE));
}

#[test]
fn loss_during_ack_wait_drops_the_report() {
    let mut rig = online_rig();
    {
        let mut endpoint = rig.endpoint.0.borrow_mut();
        endpoint.acks = false;
        endpoint.lose_on_ack = Some(rig.signal);
    }
    rig.serial.feed(b"a");
    polls(&mut rig, 2);

    assert_eq!(rig.bridge.link_state(), LinkState::Offline);
    // The press went out but was never acknowledged; no release follows.
    assert_eq!(rig.endpoint.loaded(), vec![RELEASE, press_of(0, &[0x04])]);
}

#[test]
fn reconfiguration_recovers_a_lost_link() {
    let mut rig = online_rig();
    rig.signal.sample_frame_window(0);
    rig.bridge.poll();
    assert_eq!(rig.bridge.link_state(), LinkState::Offline);

    rig.endpoint.0.borrow_mut().config_event = true;
    rig.bridge.poll();
    assert_eq!(rig.bridge.link_state(), LinkState::TransmitIdle);

    // Freshly armed and typing again.
    rig.serial.feed(b"a");
    polls(&mut rig, 2);
    assert_eq!(
        rig.endpoint.loaded(),
        vec![RELEASE, RELEASE, press_of(0, &[0x04]), RELEASE]
    );
}
