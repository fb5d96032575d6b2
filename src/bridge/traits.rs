//! Transport traits for the serial bridge
//!
//! These traits describe the two sides of the bridge as the engine sees
//! them: non-blocking byte-at-a-time primitives. The embedded build wires
//! them to the USB OTG endpoints and the UART; tests use the mocks below.

use core::future::Future;

/// Errors reported by a transport when it refuses a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// The endpoint bank is full; retry on the next poll
    Busy,
    /// The host has not configured the device
    Disconnected,
}

/// USB bulk data endpoints as seen by the bridge.
pub trait UsbDataPort {
    /// Take one byte received on the OUT endpoint, if any is pending.
    fn read_byte(&mut self) -> Option<u8>;

    /// Whether the IN endpoint can accept data right now.
    ///
    /// False while a previously queued packet is still waiting for the host.
    fn in_ready(&mut self) -> bool;

    /// Queue one byte for the IN endpoint.
    fn send_byte(&mut self, byte: u8) -> Result<(), PortError>;

    /// Transport housekeeping: flush queued IN data and refill OUT data.
    fn service(&mut self) -> impl Future<Output = ()>;
}

/// UART transmit side as seen by the bridge.
pub trait UartPort {
    /// Whether the transmitter can take another byte without blocking.
    fn send_ready(&mut self) -> bool;

    /// Hand one byte to the transmitter. Only called after `send_ready`.
    fn send_byte(&mut self, byte: u8);
}
