//! Embedded entry point - nRF52840 UART→USB keyboard bridge.
//!
//! Task layout: the hardware pumps (USB device, UART RX/TX, report
//! writer, SOF frame sampler) run on an interrupt executor so they
//! keep servicing the peripherals while the bridge superloop
//! busy-waits in thread mode.  The bridge itself is the portable
//! [`uart2usb::bridge::Bridge`], wired to the hardware through the
//! small adapters below.

#![no_std]
#![no_main]

mod usb;

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::block_on;
use embassy_nrf::bind_interrupts;
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_nrf::peripherals::{PWM0, UARTE0, USBD};
use embassy_nrf::pwm::SimplePwm;
use embassy_nrf::uarte::{self, UarteRx, UarteTx};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::hid::HidWriter;
use embassy_usb::UsbDevice;
use panic_probe as _;

use uart2usb::bridge::{Bridge, Endpoint};
use uart2usb::config;
use uart2usb::hid::keyboard::KeyboardReport;
use uart2usb::indicator::Indicator;
use uart2usb::link::LinkSignal;
use uart2usb::serial::SerialPort;

bind_interrupts!(struct UartIrqs {
    UARTE0_UART0 => uarte::InterruptHandler<UARTE0>;
});

/// Serial receive buffer.  Its fill level drives the flow controller.
static RX_BYTES: Channel<CriticalSectionRawMutex, u8, { config::RX_BUFFER_SIZE }> = Channel::new();

/// Outbound serial bytes (flow-control responses to the sender).
static TX_BYTES: Channel<CriticalSectionRawMutex, u8, 8> = Channel::new();

/// Reports handed to the endpoint writer task, one in flight at a time.
static REPORTS: Channel<CriticalSectionRawMutex, KeyboardReport, 1> = Channel::new();

/// Set by the writer task once the host has taken the loaded report.
static REPORT_ACKED: AtomicBool = AtomicBool::new(false);

/// The one cross-context link-supervision signal.
static LINK_SIGNAL: LinkSignal = LinkSignal::new();

static EXECUTOR_IO: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI0_EGU0() {
    EXECUTOR_IO.on_interrupt()
}

// ─── Hardware adapters for the bridge traits ───────────────────────────────

/// Serial-port view over the RX/TX channels the UARTE tasks pump.
struct ChannelSerial;

impl SerialPort for ChannelSerial {
    fn poll_byte(&mut self) -> Option<u8> {
        RX_BYTES.try_receive().ok()
    }

    fn wait_byte(&mut self) -> u8 {
        // Parks this context; the RX pump runs at interrupt priority.
        block_on(RX_BYTES.receive())
    }

    fn write_byte(&mut self, byte: u8) {
        if TX_BYTES.try_send(byte).is_err() {
            warn!("serial TX queue full, control byte dropped");
        }
    }

    fn rx_fill(&self) -> usize {
        RX_BYTES.len()
    }

    fn rx_capacity(&self) -> usize {
        config::RX_BUFFER_SIZE
    }
}

/// Endpoint view over the writer task and the USB bus handler signals.
struct UsbEndpoint;

impl Endpoint for UsbEndpoint {
    fn load_report(&mut self, report: &KeyboardReport) {
        REPORT_ACKED.store(false, Ordering::Relaxed);
        // One report is in flight at a time; the previous acknowledgment
        // wait completed before this load.
        if REPORTS.try_send(*report).is_err() {
            warn!("report writer busy, report dropped");
        }
    }

    fn ack_received(&mut self) -> bool {
        REPORT_ACKED.load(Ordering::Relaxed)
    }

    fn configuration_changed(&mut self) -> bool {
        usb::hid_device::take_configuration_event()
    }

    fn is_configured(&mut self) -> bool {
        usb::hid_device::is_configured()
    }
}

/// PWM-dimmed status LED.
struct PwmLed {
    pwm: SimplePwm<'static, PWM0>,
}

impl Indicator for PwmLed {
    fn set_level(&mut self, percent: u8) {
        let max = self.pwm.max_duty() as u32;
        self.pwm.set_duty(0, (max * percent as u32 / 100) as u16);
    }
}

// ─── Hardware pump tasks ───────────────────────────────────────────────────

#[embassy_executor::task]
async fn usb_device_task(
    mut device: UsbDevice<'static, Driver<'static, USBD, HardwareVbusDetect>>,
) -> ! {
    device.run().await
}

#[embassy_executor::task]
async fn report_writer_task(
    mut writer: HidWriter<'static, Driver<'static, USBD, HardwareVbusDetect>, 8>,
) -> ! {
    let mut buf = [0u8; 8];
    loop {
        let report = REPORTS.receive().await;
        let n = report.serialize(&mut buf);
        match writer.write(&buf[..n]).await {
            // Write completion is the host's acknowledgment.
            Ok(()) => REPORT_ACKED.store(true, Ordering::Relaxed),
            Err(_) => warn!("USB keyboard write failed"),
        }
    }
}

#[embassy_executor::task]
async fn uart_rx_task(mut rx: UarteRx<'static, UARTE0>) -> ! {
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => {
                if RX_BYTES.try_send(byte[0]).is_err() {
                    warn!("serial RX buffer full, byte dropped");
                }
            }
            Err(_) => warn!("serial read error"),
        }
    }
}

#[embassy_executor::task]
async fn uart_tx_task(mut tx: UarteTx<'static, UARTE0>) -> ! {
    loop {
        let byte = TX_BYTES.receive().await;
        if tx.write(&[byte]).await.is_err() {
            warn!("serial write error");
        }
    }
}

/// Host-presence heartbeat: once per window, feed the number of SOF
/// frames observed to the link signal.
#[embassy_executor::task]
async fn frame_sampler_task() -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(config::FRAME_SAMPLE_WINDOW_MS));
    let mut last = usb::hid_device::frame_counter();
    loop {
        ticker.next().await;
        let now = usb::hid_device::frame_counter();
        // FRAMECNTR is an 11-bit counter; mask the wrapped delta.
        let seen = now.wrapping_sub(last) & 0x7FF;
        last = now;
        LINK_SIGNAL.sample_frame_window(seen);
    }
}

// ─── Entry point ───────────────────────────────────────────────────────────

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_nrf::init(Default::default());

    info!("uart2usb - UART controlled USB keyboard");

    let mut uart_config = uarte::Config::default();
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    uart_config.parity = uarte::Parity::EXCLUDED;
    let uart = uarte::Uarte::new(p.UARTE0, UartIrqs, p.P0_08, p.P0_06, uart_config);
    let (uart_tx, uart_rx) = uart.split();

    let keyboard = usb::hid_device::init(p.USBD);

    let pwm = SimplePwm::new_1ch(p.PWM0, p.P0_13);

    // The pumps go on the interrupt executor so they preempt the
    // busy-waiting bridge loop below.
    interrupt::SWI0_EGU0.set_priority(Priority::P3);
    let io = EXECUTOR_IO.start(interrupt::SWI0_EGU0);
    io.spawn(usb_device_task(keyboard.device)).unwrap();
    io.spawn(report_writer_task(keyboard.writer)).unwrap();
    io.spawn(uart_rx_task(uart_rx)).unwrap();
    io.spawn(uart_tx_task(uart_tx)).unwrap();
    io.spawn(frame_sampler_task()).unwrap();

    info!("waiting for enumeration ...");

    let mut bridge = Bridge::new(ChannelSerial, UsbEndpoint, PwmLed { pwm }, &LINK_SIGNAL);
    bridge.run()
}
