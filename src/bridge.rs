//! The orchestration loop tying serial input to the USB endpoint.
//!
//! One iteration: bring the link up if a configuration event arrived,
//! otherwise take at most one byte from the serial side, decode it,
//! feed the assembler (or send a one-shot report directly), flush on
//! an idle line, and run the flow controller.  Every failure path
//! drops the in-flight report and returns control here.

use crate::error::Error;
use crate::hid::assembler::{ReportAssembler, ReportSink};
use crate::hid::keyboard::KeyboardReport;
use crate::indicator::{self, Indicator};
use crate::link::{LinkMonitor, LinkSignal, LinkState};
use crate::serial::decoder::{self, Command};
use crate::serial::flow::FlowController;
use crate::serial::SerialPort;

/// Bridge-side view of the interrupt-IN endpoint and the device
/// configuration signals from the controller driver.
pub trait Endpoint {
    /// Load a report into the IN endpoint buffer for the next host poll.
    fn load_report(&mut self, report: &KeyboardReport);

    /// Non-blocking: has the host acknowledged the loaded report?
    fn ack_received(&mut self) -> bool;

    /// Edge signal: did a configuration-changed event fire since the
    /// last call?
    fn configuration_changed(&mut self) -> bool;

    /// Is the device currently configured by the host?
    fn is_configured(&mut self) -> bool;
}

/// One report transmission: endpoint load plus acknowledgment wait,
/// with the indicator dimmed while the transfer is outstanding.
struct UsbSink<'a, 'sig, E: Endpoint, I: Indicator> {
    endpoint: &'a mut E,
    link: &'a mut LinkMonitor<'sig>,
    indicator: &'a mut I,
}

impl<E: Endpoint, I: Indicator> ReportSink for UsbSink<'_, '_, E, I> {
    fn send(&mut self, report: &KeyboardReport) -> Result<(), Error> {
        self.link.begin_transfer();
        self.indicator.set_level(indicator::level_for(self.link.state()));

        self.endpoint.load_report(report);
        let result = self.link.wait_for_ack(|| self.endpoint.ack_received());

        if result.is_ok() {
            self.link.end_transfer();
        }
        self.indicator.set_level(indicator::level_for(self.link.state()));
        result
    }
}

/// The bridge superloop.  Owns every mutable piece of the pipeline;
/// the only state shared with another context lives in [`LinkSignal`].
pub struct Bridge<'sig, S: SerialPort, E: Endpoint, I: Indicator> {
    serial: S,
    endpoint: E,
    indicator: I,
    assembler: ReportAssembler,
    flow: FlowController,
    link: LinkMonitor<'sig>,
}

impl<'sig, S: SerialPort, E: Endpoint, I: Indicator> Bridge<'sig, S, E, I> {
    pub fn new(serial: S, endpoint: E, indicator: I, signal: &'sig LinkSignal) -> Self {
        let flow = FlowController::new(serial.rx_capacity());
        Self {
            serial,
            endpoint,
            indicator,
            assembler: ReportAssembler::new(),
            flow,
            link: LinkMonitor::new(signal),
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Run forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// One loop iteration.  Public so a test harness can drive the
    /// bridge without hard-looping on real time.
    pub fn poll(&mut self) {
        if !self.link.is_online() {
            self.poll_offline();
            return;
        }
        if self.link.poll_lost() {
            self.indicator
                .set_level(indicator::level_for(self.link.state()));
            return;
        }
        self.poll_online();
    }

    fn poll_offline(&mut self) {
        if self.endpoint.configuration_changed() {
            // Failures leave the link down; the next configuration
            // event retries.
            let _ = self.bring_online();
        }
    }

    /// Offline→Online entry actions: verify the configured check,
    /// start from an empty pending report and re-arm the endpoint
    /// with an all-keys-released report.
    fn bring_online(&mut self) -> Result<(), Error> {
        if !self.endpoint.is_configured() {
            return Err(Error::NotConfigured);
        }
        self.link.bring_online();
        self.assembler.reset();

        let mut sink = UsbSink {
            endpoint: &mut self.endpoint,
            link: &mut self.link,
            indicator: &mut self.indicator,
        };
        sink.send(&KeyboardReport::empty())
    }

    fn poll_online(&mut self) {
        let Self {
            serial,
            endpoint,
            indicator,
            assembler,
            flow,
            link,
        } = self;
        let mut sink = UsbSink {
            endpoint,
            link,
            indicator,
        };

        match serial.poll_byte() {
            Some(byte) => {
                let outcome = match decoder::decode(byte, serial) {
                    Some(Command::Key { modifier, code }) => {
                        assembler.push_key(modifier, code, &mut sink)
                    }
                    Some(Command::OneShot(report)) => sink.send(&report),
                    None => Ok(()),
                };
                if outcome.is_err() {
                    // Link dropped mid-transfer; the report is gone.
                    return;
                }
            }
            None => {
                // Nothing more to read: the burst is over.
                if assembler.flush(&mut sink).is_err() {
                    return;
                }
            }
        }

        if let Some(ctrl) = flow.update(serial.rx_fill()) {
            serial.write_byte(ctrl);
        }
    }
}
