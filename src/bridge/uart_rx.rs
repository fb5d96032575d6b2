//! UART receive side of the bridge
//!
//! The UART receive context is the only producer of the device→host buffer.
//! Bytes arriving while nobody can read them (USB not configured) or while
//! the buffer is full are dropped and counted.

use crate::buffer::Producer;

/// Sink for bytes received on the UART
pub struct UartRxSink<'a, const N: usize> {
    to_host: Producer<'a, N>,
    dropped: u32,
}

impl<'a, const N: usize> UartRxSink<'a, N> {
    pub fn new(to_host: Producer<'a, N>) -> Self {
        Self { to_host, dropped: 0 }
    }

    /// Offer one received byte.
    ///
    /// Returns `true` when the byte was queued for the host.
    pub fn accept(&mut self, byte: u8, usb_configured: bool) -> bool {
        if usb_configured && self.to_host.try_insert(byte) {
            return true;
        }
        self.dropped = self.dropped.wrapping_add(1);
        false
    }

    /// Total bytes dropped since start-up
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Bytes currently queued for the host
    pub fn pending(&self) -> usize {
        self.to_host.count()
    }
}
