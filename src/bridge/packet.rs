//! Packet-to-byte adapter between USB bulk endpoints and the bridge engine.
//!
//! The engine works byte by byte; endpoints move whole packets. `PacketPort`
//! stages one OUT packet and one IN packet and exchanges them with a
//! `PacketPipe` in `service()`.

use core::future::Future;

use heapless::Vec;
use log::debug;

use crate::bridge::line::LineState;
use crate::bridge::traits::{PortError, UsbDataPort};
use crate::config::usb::DATA_EP_SIZE;

const PACKET_SIZE: usize = DATA_EP_SIZE as usize;

/// A pair of bulk endpoints moving whole packets.
pub trait PacketPipe {
    /// Read one OUT packet.
    ///
    /// `Ok(0)` when nothing arrived within the pipe's poll window,
    /// `Err(Disconnected)` while the host has the endpoints disabled.
    fn read_packet(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, PortError>>;

    /// Send one IN packet.
    ///
    /// `Err(Busy)` when the host did not take it in time; nothing was
    /// transmitted and the same packet may be offered again.
    fn write_packet(&mut self, buf: &[u8]) -> impl Future<Output = Result<(), PortError>>;

    /// Wait until the host has configured the endpoints.
    fn wait_connected(&mut self) -> impl Future<Output = ()>;

    /// Line coding and DTR, for pipes that have them
    fn line_state(&self) -> Option<LineState>;
}

/// Outcome of one endpoint exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    /// Nothing to do, the endpoint was not touched
    Idle,
    Done,
    Disconnected,
}

/// Byte-level view of a `PacketPipe`
pub struct PacketPort<P> {
    pipe: P,
    rx: Vec<u8, PACKET_SIZE>,
    rx_pos: usize,
    tx: Vec<u8, PACKET_SIZE>,
}

impl<P: PacketPipe> PacketPort<P> {
    pub fn new(pipe: P) -> Self {
        Self {
            pipe,
            rx: Vec::new(),
            rx_pos: 0,
            tx: Vec::new(),
        }
    }

    pub fn line_state(&self) -> Option<LineState> {
        self.pipe.line_state()
    }

    async fn flush_tx(&mut self) -> Exchange {
        if self.tx.is_empty() {
            return Exchange::Idle;
        }

        match self.pipe.write_packet(&self.tx).await {
            Ok(()) => self.tx.clear(),
            Err(PortError::Busy) => {}
            Err(PortError::Disconnected) => {
                debug!("USB: IN endpoint disabled, dropping {} bytes", self.tx.len());
                self.tx.clear();
                return Exchange::Disconnected;
            }
        }
        Exchange::Done
    }

    async fn fill_rx(&mut self) -> Exchange {
        if self.rx_pos < self.rx.len() {
            return Exchange::Idle;
        }

        let mut buf = [0u8; PACKET_SIZE];
        self.rx.clear();
        self.rx_pos = 0;
        match self.pipe.read_packet(&mut buf).await {
            Ok(n) => {
                // `n` never exceeds the buffer handed to the pipe
                let _ = self.rx.extend_from_slice(&buf[..n.min(PACKET_SIZE)]);
                Exchange::Done
            }
            Err(PortError::Busy) => Exchange::Done,
            Err(PortError::Disconnected) => Exchange::Disconnected,
        }
    }
}

impl<P: PacketPipe> UsbDataPort for PacketPort<P> {
    fn read_byte(&mut self) -> Option<u8> {
        let byte = *self.rx.get(self.rx_pos)?;
        self.rx_pos += 1;
        Some(byte)
    }

    fn in_ready(&mut self) -> bool {
        self.tx.is_empty()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), PortError> {
        self.tx.push(byte).map_err(|_| PortError::Busy)
    }

    async fn service(&mut self) {
        let wrote = self.flush_tx().await;
        let read = self.fill_rx().await;

        if wrote == Exchange::Disconnected || read == Exchange::Disconnected {
            // Disabled endpoints fail without awaiting; park until the host is back
            debug!("USB: waiting for host");
            self.pipe.wait_connected().await;
        } else if wrote == Exchange::Idle && read == Exchange::Idle {
            // Keep other tasks running while OUT data waits for the UART
            embassy_futures::yield_now().await;
        }
    }
}
