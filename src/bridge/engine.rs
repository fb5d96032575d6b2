//! Serial bridge engine
//!
//! Moves bytes between the USB data endpoints and the UART through two ring
//! buffers. Every transport call is non-blocking: an unready side is simply
//! skipped and retried on the next `poll`, and a byte only leaves a buffer
//! after the receiving side accepted it.

use crate::buffer::{Consumer, RingBuffer};
use crate::bridge::traits::{UartPort, UsbDataPort};

/// What a single `poll` iteration moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollActivity {
    /// A byte was read from the USB OUT endpoint
    pub from_host: bool,
    /// Bytes handed to the USB IN endpoint
    pub to_host: usize,
    /// A byte was handed to the UART transmitter
    pub to_uart: bool,
}

impl PollActivity {
    /// Whether anything moved in either direction
    pub fn is_idle(&self) -> bool {
        !self.from_host && !self.to_uart && self.to_host == 0
    }
}

/// Bidirectional byte relay between USB and UART
///
/// Owns the host→device buffer outright. The device→host buffer is filled by
/// the UART receive context through its `Producer`; the engine holds the
/// matching `Consumer`.
pub struct SerialBridge<'a, const N: usize> {
    to_uart: RingBuffer<N>,
    to_host: Consumer<'a, N>,
    max_packet_size: usize,
}

impl<'a, const N: usize> SerialBridge<'a, N> {
    /// Create a bridge draining `to_host` towards USB.
    ///
    /// `max_packet_size` is the IN endpoint size; at most `max_packet_size - 1`
    /// bytes are sent per poll so a burst never forms a full-size packet.
    pub fn new(to_host: Consumer<'a, N>, max_packet_size: usize) -> Self {
        Self {
            to_uart: RingBuffer::new(),
            to_host,
            max_packet_size,
        }
    }

    /// Bytes waiting for the UART transmitter
    pub fn pending_to_uart(&self) -> usize {
        self.to_uart.count()
    }

    /// Bytes waiting for the USB IN endpoint
    pub fn pending_to_host(&self) -> usize {
        self.to_host.count()
    }

    /// Run one relay iteration.
    pub async fn poll<U: UsbDataPort, T: UartPort>(&mut self, usb: &mut U, uart: &mut T) -> PollActivity {
        let mut activity = PollActivity::default();

        // USB OUT -> host->device buffer
        if !self.to_uart.is_full() {
            if let Some(byte) = usb.read_byte() {
                activity.from_host = self.to_uart.try_insert(byte);
            }
        }

        // device->host buffer -> USB IN
        if !self.to_host.is_empty() && usb.in_ready() {
            let burst = self
                .to_host
                .count()
                .min(self.max_packet_size.saturating_sub(1));

            for _ in 0..burst {
                let Some(byte) = self.to_host.peek() else {
                    break;
                };
                if usb.send_byte(byte).is_err() {
                    break;
                }
                self.to_host.try_remove();
                activity.to_host += 1;
            }
        }

        // host->device buffer -> UART
        if uart.send_ready() {
            if let Some(byte) = self.to_uart.try_remove() {
                uart.send_byte(byte);
                activity.to_uart = true;
            }
        }

        usb.service().await;
        activity
    }
}
