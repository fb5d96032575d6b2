#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use core::fmt::Write as _;

use embassy_executor::Spawner;
use embassy_usb::class::cdc_acm::{self, CdcAcmClass};
use embassy_usb::descriptor::capability_type;
use embassy_usb::UsbDevice;
use esp_backtrace as _;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::otg_fs::asynch::{Config as OtgConfig, Driver};
use esp_hal::otg_fs::Usb;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{self, Uart, UartRx, UartTx};
use esp_hal::Async;
use esp_storage::FlashStorage;
use log::info;
use static_cell::StaticCell;

use webusb_serial_bridge::bridge::{IoUart, PacketPort, SerialBridge, UartRxSink};
use webusb_serial_bridge::buffer::RingBuffer;
use webusb_serial_bridge::config::{self, bridge::BUFFER_SIZE};
use webusb_serial_bridge::mode::DeviceModeState;
use webusb_serial_bridge::tasks::{self, LedReceiver, LedSender, LED_CHANNEL};
use webusb_serial_bridge::usb::{BridgePipe, CdcPipe, ControlHandler, InterfaceLayout, UsbProfile, VendorPipe};

type UsbDriver = Driver<'static>;
type ModeHandler = ControlHandler<FlashStorage<'static>>;

/// Vendor-specific interface class
const CLASS_VENDOR: u8 = 0xFF;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// USB stack buffers (needed for 'static lifetime)
static EP_OUT_BUFFER: StaticCell<[u8; 1024]> = StaticCell::new();
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 0]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static CDC_STATE: StaticCell<cdc_acm::State> = StaticCell::new();
static HANDLER: StaticCell<ModeHandler> = StaticCell::new();

/// Device→host buffer, shared by the UART receiver and the bridge
static TO_HOST: StaticCell<RingBuffer<BUFFER_SIZE>> = StaticCell::new();

/// USB serial number, derived from the MAC address
static SERIAL_NUMBER: StaticCell<heapless::String<12>> = StaticCell::new();

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Activity LEDs on GPIO47 (TX) and GPIO48 (RX), start off (active low)
    let tx_led = Output::new(peripherals.GPIO47, Level::High, OutputConfig::default());
    let rx_led = Output::new(peripherals.GPIO48, Level::High, OutputConfig::default());

    // Target reset on GPIO21, held released until the host asserts DTR
    let target_reset = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // UART1 towards the target: TX GPIO17, RX GPIO18
    let uart = Uart::new(
        peripherals.UART1,
        uart::Config::default().with_baudrate(config::uart::DEFAULT_BAUD_RATE),
    )
    .unwrap()
    .with_tx(peripherals.GPIO17)
    .with_rx(peripherals.GPIO18)
    .into_async();
    let (uart_rx, uart_tx) = uart.split();
    info!("UART1 at {} baud", config::uart::DEFAULT_BAUD_RATE);

    // Persisted mode decides which personality enumerates
    let flash = FlashStorage::new(peripherals.FLASH);
    let mode_state = DeviceModeState::load(flash, config::storage::WEBUSB_FLAG_ADDRESS);
    let profile = UsbProfile::for_mode(mode_state.mode());

    let mac = esp_hal::efuse::Efuse::read_base_mac_address();
    let serial_number = SERIAL_NUMBER.init(heapless::String::new());
    for byte in mac {
        let _ = write!(serial_number, "{:02X}", byte);
    }

    // USB OTG full-speed driver
    let usb = Usb::new(peripherals.USB0, peripherals.GPIO20, peripherals.GPIO19);
    let driver = Driver::new(usb, EP_OUT_BUFFER.init([0; 1024]), OtgConfig::default());

    let mut usb_config = embassy_usb::Config::new(profile.vid, profile.pid);
    usb_config.manufacturer = Some(profile.manufacturer);
    usb_config.product = Some(profile.product);
    usb_config.serial_number = Some(serial_number.as_str());
    usb_config.device_release = config::usb::DEVICE_RELEASE;
    usb_config.max_power = config::usb::MAX_POWER_MA;
    usb_config.max_packet_size_0 = config::usb::MAX_PACKET_SIZE_0;
    usb_config.device_class = profile.device_class.class;
    usb_config.device_sub_class = profile.device_class.subclass;
    usb_config.device_protocol = profile.device_class.protocol;
    usb_config.composite_with_iads = profile.layout == InterfaceLayout::CdcWithWebUsbInterface;

    let mut builder = embassy_usb::Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 0]),
        CONTROL_BUF.init([0; 256]),
    );

    let pipe = match profile.layout {
        InterfaceLayout::CdcWithWebUsbInterface => {
            let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(cdc_acm::State::new()), config::usb::DATA_EP_SIZE);
            let (sender, receiver) = class.split();

            // Endpoint-less interface that carries the WebUSB/WinUSB metadata
            let mut function = builder.function(CLASS_VENDOR, 0x00, 0x00);
            let mut interface = function.interface();
            let mut alt = interface.alt_setting(CLASS_VENDOR, 0x00, 0x00, None);
            alt.bos_capability(capability_type::PLATFORM, profile.webusb_capability);
            alt.bos_capability(capability_type::PLATFORM, profile.msos_capability);

            BridgePipe::Cdc(CdcPipe::new(sender, receiver))
        }
        InterfaceLayout::VendorBridge => {
            let mut function = builder.function(CLASS_VENDOR, 0x00, 0x00);
            let mut interface = function.interface();
            let mut alt = interface.alt_setting(CLASS_VENDOR, 0x00, 0x00, None);
            let ep_in = alt.endpoint_bulk_in(None, config::usb::DATA_EP_SIZE);
            let ep_out = alt.endpoint_bulk_out(None, config::usb::DATA_EP_SIZE);
            alt.bos_capability(capability_type::PLATFORM, profile.webusb_capability);
            alt.bos_capability(capability_type::PLATFORM, profile.msos_capability);

            BridgePipe::Vendor(VendorPipe::new(ep_in, ep_out))
        }
    };

    builder.handler(HANDLER.init(ControlHandler::new(mode_state)));
    let usb_device = builder.build();

    // Bridge buffers: the UART receiver fills TO_HOST, the bridge drains it
    let (producer, consumer) = TO_HOST.init(RingBuffer::new()).split();
    let bridge = SerialBridge::new(consumer, usize::from(config::usb::DATA_EP_SIZE));
    let sink = UartRxSink::new(producer);

    info!("Bridge: {} ({:04x}:{:04x})", profile.product, profile.vid, profile.pid);

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(
            spawner,
            usb_device,
            bridge,
            PacketPort::new(pipe),
            IoUart::new(uart_tx),
            uart_rx,
            sink,
            target_reset,
            tx_led,
            rx_led,
        ));
    })
}

#[embassy_executor::task]
#[allow(clippy::too_many_arguments)]
async fn async_main(
    spawner: Spawner,
    usb_device: UsbDevice<'static, UsbDriver>,
    bridge: SerialBridge<'static, BUFFER_SIZE>,
    port: PacketPort<BridgePipe<'static, UsbDriver>>,
    uart_tx: IoUart<UartTx<'static, Async>>,
    uart_rx: UartRx<'static, Async>,
    sink: UartRxSink<'static, BUFFER_SIZE>,
    target_reset: Output<'static>,
    tx_led: Output<'static>,
    rx_led: Output<'static>,
) {
    // Get channel handles
    let led_sender = LED_CHANNEL.sender();
    let led_receiver = LED_CHANNEL.receiver();

    // Spawn tasks
    spawner.spawn(usb_device_task(usb_device)).unwrap();
    spawner.spawn(bridge_task(bridge, port, uart_tx, target_reset, led_sender)).unwrap();
    spawner.spawn(uart_rx_task(uart_rx, sink)).unwrap();
    spawner.spawn(led_task(tx_led, rx_led, led_receiver)).unwrap();
}

/// Task that runs the USB device and performs mode-switch restarts
#[embassy_executor::task]
async fn usb_device_task(usb_device: UsbDevice<'static, UsbDriver>) {
    tasks::usb_task(usb_device).await
}

/// Task that relays bytes between USB and the UART
#[embassy_executor::task]
async fn bridge_task(
    bridge: SerialBridge<'static, BUFFER_SIZE>,
    port: PacketPort<BridgePipe<'static, UsbDriver>>,
    uart_tx: IoUart<UartTx<'static, Async>>,
    target_reset: Output<'static>,
    led_sender: LedSender,
) {
    tasks::bridge_task(bridge, port, uart_tx, target_reset, led_sender).await
}

/// Task that moves UART input into the device→host buffer
#[embassy_executor::task]
async fn uart_rx_task(uart_rx: UartRx<'static, Async>, sink: UartRxSink<'static, BUFFER_SIZE>) {
    tasks::uart_rx_task(uart_rx, sink).await
}

/// Task that pulses the activity LEDs
#[embassy_executor::task]
async fn led_task(tx_led: Output<'static>, rx_led: Output<'static>, receiver: LedReceiver) {
    tasks::led_task(tx_led, rx_led, receiver).await
}
