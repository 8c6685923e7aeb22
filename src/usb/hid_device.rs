//! USB HID keyboard device bring-up.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes one HID IN endpoint plus the configuration
//! signals the bridge polls.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;
use uart2usb::config;
use uart2usb::hid::keyboard::KEYBOARD_REPORT_DESCRIPTOR;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

static KB_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_BUS_HANDLER: StaticCell<BusHandler> = StaticCell::new();

static CONFIGURED: AtomicBool = AtomicBool::new(false);
static CONFIG_CHANGED: AtomicBool = AtomicBool::new(false);

struct BusHandler;

impl embassy_usb::Handler for BusHandler {
    fn configured(&mut self, configured: bool) {
        CONFIGURED.store(configured, Ordering::Relaxed);
        CONFIG_CHANGED.store(true, Ordering::Relaxed);
    }

    fn reset(&mut self) {
        CONFIGURED.store(false, Ordering::Relaxed);
    }
}

/// Is the device currently configured by the host?
pub fn is_configured() -> bool {
    CONFIGURED.load(Ordering::Relaxed)
}

/// Take the configuration-changed edge, if one fired since last call.
pub fn take_configuration_event() -> bool {
    CONFIG_CHANGED.swap(false, Ordering::Relaxed)
}

/// Current SOF frame number from the USBD peripheral (11-bit counter).
pub fn frame_counter() -> u32 {
    embassy_nrf::pac::USBD.framecntr().read().framecntr() as u32
}

/// Build result containing the USB device runner and the keyboard
/// report writer.
pub struct UsbKeyboard {
    pub device: UsbDevice<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>>,
    pub writer: HidWriter<'static, Driver<'static, peripherals::USBD, HardwareVbusDetect>, 8>,
}

/// Initialise the USB stack and create the keyboard device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbKeyboard {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    // Build the USB device.
    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    builder.handler(USB_BUS_HANDLER.init(BusHandler));

    let kb_state = KB_STATE.init(State::new());
    let kb_config = HidConfig {
        report_descriptor: KEYBOARD_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let writer = HidWriter::new(&mut builder, kb_state, kb_config);

    let device = builder.build();

    info!("USB HID keyboard device initialised");

    UsbKeyboard { device, writer }
}
