//! End-to-end tests through the public library API: bytes relayed in both
//! directions, then a WebUSB mode switch driven by raw SETUP packets.

use std::collections::VecDeque;

use embedded_storage::{ReadStorage, Storage};
use futures::executor::block_on;
use webusb_serial_bridge::bridge::{PortError, SerialBridge, UartPort, UartRxSink, UsbDataPort};
use webusb_serial_bridge::buffer::RingBuffer;
use webusb_serial_bridge::config::{bridge::BUFFER_SIZE, storage::WEBUSB_FLAG_ADDRESS, usb::DATA_EP_SIZE};
use webusb_serial_bridge::control::{ControlDispatcher, ControlRequest, ControlResponse};
use webusb_serial_bridge::mode::{DeviceMode, DeviceModeState};
use webusb_serial_bridge::usb::{InterfaceLayout, UsbProfile};

/// Host side of the USB data endpoints, packet oriented like the real stack
#[derive(Default)]
struct HostUsb {
    out: VecDeque<u8>,
    staged: Vec<u8>,
    packets: Vec<Vec<u8>>,
}

impl UsbDataPort for HostUsb {
    fn read_byte(&mut self) -> Option<u8> {
        self.out.pop_front()
    }

    fn in_ready(&mut self) -> bool {
        self.staged.is_empty()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), PortError> {
        if self.staged.len() >= DATA_EP_SIZE as usize {
            return Err(PortError::Busy);
        }
        self.staged.push(byte);
        Ok(())
    }

    async fn service(&mut self) {
        if !self.staged.is_empty() {
            self.packets.push(std::mem::take(&mut self.staged));
        }
    }
}

/// Target side of the UART
#[derive(Default)]
struct TargetUart {
    received: Vec<u8>,
}

impl UartPort for TargetUart {
    fn send_ready(&mut self) -> bool {
        true
    }

    fn send_byte(&mut self, byte: u8) {
        self.received.push(byte);
    }
}

/// Erased flash sector
struct RamFlash {
    data: Vec<u8>,
}

impl RamFlash {
    fn new() -> Self {
        Self {
            data: vec![0xFF; 0x10000],
        }
    }
}

impl ReadStorage for RamFlash {
    type Error = ();

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        bytes.copy_from_slice(self.data.get(start..start + bytes.len()).ok_or(())?);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl Storage for RamFlash {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        self.data
            .get_mut(start..start + bytes.len())
            .ok_or(())?
            .copy_from_slice(bytes);
        Ok(())
    }
}

#[test]
fn relays_both_directions() {
    let mut to_host: RingBuffer<BUFFER_SIZE> = RingBuffer::new();
    let (producer, consumer) = to_host.split();
    let mut sink = UartRxSink::new(producer);
    let mut bridge = SerialBridge::new(consumer, DATA_EP_SIZE as usize);
    let mut usb = HostUsb::default();
    let mut uart = TargetUart::default();

    let command = b"AT+VERSION?\r\n";
    usb.out.extend(command.iter().copied());

    let reply: Vec<u8> = (0..100u8).collect();
    for &byte in &reply {
        assert!(sink.accept(byte, true));
    }

    block_on(async {
        for _ in 0..32 {
            bridge.poll(&mut usb, &mut uart).await;
        }
    });

    assert_eq!(uart.received, command);
    assert_eq!(usb.packets.concat(), reply);
    // Never a full-size packet, so the host never waits for a ZLP
    assert!(usb.packets.iter().all(|p| p.len() < DATA_EP_SIZE as usize));
    assert_eq!(bridge.pending_to_host(), 0);
    assert_eq!(sink.dropped(), 0);
}

#[test]
fn uart_overrun_while_host_idle() {
    let mut to_host: RingBuffer<BUFFER_SIZE> = RingBuffer::new();
    let (producer, consumer) = to_host.split();
    let mut sink = UartRxSink::new(producer);
    let bridge = SerialBridge::new(consumer, DATA_EP_SIZE as usize);

    for byte in 0..(BUFFER_SIZE + 10) {
        sink.accept(byte as u8, true);
    }

    assert_eq!(bridge.pending_to_host(), BUFFER_SIZE);
    assert_eq!(sink.dropped(), 10);
}

#[test]
fn mode_switch_round_trip() {
    let dispatcher = ControlDispatcher::new();
    let mut state = DeviceModeState::load(RamFlash::new(), WEBUSB_FLAG_ADDRESS);
    assert_eq!(state.mode(), DeviceMode::Plain);
    assert_eq!(
        UsbProfile::for_mode(state.mode()).layout,
        InterfaceLayout::CdcWithWebUsbInterface
    );

    // Browser-side discovery in plain mode
    let get_url = ControlRequest::from_setup([0xC0, 0x42, 0x00, 0x00, 0x02, 0x00, 0xFF, 0x00]);
    assert!(matches!(
        dispatcher.dispatch(&get_url, &mut state),
        ControlResponse::Data(url) if url.ends_with(b"www.entropicengineering.com")
    ));

    // Enable WebUSB
    let enable = ControlRequest::from_setup([0x40, 0x42, 0x01, 0x00, 0x03, 0x00, 0x00, 0x00]);
    assert_eq!(
        dispatcher.dispatch(&enable, &mut state),
        ControlResponse::Restart { delay_ms: 2000 }
    );

    // Asking again before the restart changes nothing
    assert_eq!(dispatcher.dispatch(&enable, &mut state), ControlResponse::Accept);

    // Reboot: reload from whatever reached flash
    let flash = RamFlash {
        data: state.storage().data.clone(),
    };
    let mut state = DeviceModeState::load(flash, WEBUSB_FLAG_ADDRESS);
    assert_eq!(state.mode(), DeviceMode::WebUsb);
    let profile = UsbProfile::for_mode(state.mode());
    assert_eq!(profile.layout, InterfaceLayout::VendorBridge);
    assert_eq!((profile.vid, profile.pid), (0x04B9, 0x0AF1));

    // Windows now gets the reduced descriptor set
    let get_set = ControlRequest::from_setup([0xC0, 0x45, 0x00, 0x00, 0x07, 0x00, 0xFF, 0xFF]);
    assert!(matches!(
        dispatcher.dispatch(&get_set, &mut state),
        ControlResponse::Data(set) if set.len() == 30
    ));

    // Disable again
    let disable = ControlRequest::from_setup([0x40, 0x42, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00]);
    assert_eq!(
        dispatcher.dispatch(&disable, &mut state),
        ControlResponse::Restart { delay_ms: 2000 }
    );
    assert_eq!(state.mode(), DeviceMode::Plain);
}

#[test]
fn cdc_class_requests_pass_through() {
    let dispatcher = ControlDispatcher::new();
    let mut state = DeviceModeState::load(RamFlash::new(), WEBUSB_FLAG_ADDRESS);

    // SET_CONTROL_LINE_STATE (DTR)
    let req = ControlRequest::from_setup([0x21, 0x22, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(dispatcher.dispatch(&req, &mut state), ControlResponse::Defer);
}
