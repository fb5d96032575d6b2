//! embassy-usb endpoints behind `PacketPipe`.
//!
//! Plain mode bridges over the CDC-ACM data interface, WebUSB mode over the
//! vendor interface's bulk endpoints. Both bound every transfer with a
//! timeout so the bridge loop keeps moving UART data while the host is idle.

use core::marker::PhantomData;

use embassy_time::{with_timeout, Duration};
use embassy_usb::class::cdc_acm::{self, Receiver, Sender};
use embassy_usb::driver::{Driver, Endpoint, EndpointError, EndpointIn, EndpointOut};
use log::debug;

use crate::bridge::line::{LineCoding, LineState, Parity, StopBits};
use crate::bridge::packet::PacketPipe;
use crate::bridge::traits::PortError;

/// How long a read waits for an OUT packet before handing back control
const READ_POLL: Duration = Duration::from_millis(1);

/// How long a queued IN packet may wait for the host before it is retried
const WRITE_TIMEOUT: Duration = Duration::from_millis(50);

async fn read_with_timeout<F>(read: F) -> Result<usize, PortError>
where
    F: core::future::Future<Output = Result<usize, EndpointError>>,
{
    match with_timeout(READ_POLL, read).await {
        Ok(Ok(n)) => Ok(n),
        Ok(Err(EndpointError::Disabled)) => Err(PortError::Disconnected),
        Ok(Err(EndpointError::BufferOverflow)) => {
            debug!("USB: OUT packet larger than buffer, dropped");
            Ok(0)
        }
        Err(_) => Ok(0),
    }
}

async fn write_with_timeout<F>(write: F) -> Result<(), PortError>
where
    F: core::future::Future<Output = Result<(), EndpointError>>,
{
    // Nothing reaches the FIFO until the endpoint has room, so a timed out
    // packet can be offered again whole
    match with_timeout(WRITE_TIMEOUT, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(EndpointError::Disabled)) => Err(PortError::Disconnected),
        Ok(Err(EndpointError::BufferOverflow)) => {
            debug!("USB: IN packet larger than endpoint, dropped");
            Ok(())
        }
        Err(_) => Err(PortError::Busy),
    }
}

/// CDC-ACM data interface (plain mode)
pub struct CdcPipe<'d, D: Driver<'d>> {
    sender: Sender<'d, D>,
    receiver: Receiver<'d, D>,
}

impl<'d, D: Driver<'d>> CdcPipe<'d, D> {
    pub fn new(sender: Sender<'d, D>, receiver: Receiver<'d, D>) -> Self {
        Self { sender, receiver }
    }
}

impl<'d, D: Driver<'d>> PacketPipe for CdcPipe<'d, D> {
    async fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, PortError> {
        read_with_timeout(self.receiver.read_packet(buf)).await
    }

    async fn write_packet(&mut self, buf: &[u8]) -> Result<(), PortError> {
        write_with_timeout(self.sender.write_packet(buf)).await
    }

    async fn wait_connected(&mut self) {
        self.receiver.wait_connection().await;
    }

    fn line_state(&self) -> Option<LineState> {
        let coding = self.receiver.line_coding();
        Some(LineState {
            coding: LineCoding {
                baud_rate: coding.data_rate(),
                stop_bits: match coding.stop_bits() {
                    cdc_acm::StopBits::One => StopBits::One,
                    cdc_acm::StopBits::OnePointFive => StopBits::OnePointFive,
                    cdc_acm::StopBits::Two => StopBits::Two,
                },
                parity: match coding.parity_type() {
                    cdc_acm::ParityType::None => Parity::None,
                    cdc_acm::ParityType::Odd => Parity::Odd,
                    cdc_acm::ParityType::Even => Parity::Even,
                    cdc_acm::ParityType::Mark => Parity::Mark,
                    cdc_acm::ParityType::Space => Parity::Space,
                },
                data_bits: coding.data_bits(),
            },
            dtr: self.receiver.dtr(),
        })
    }
}

/// Vendor interface bulk endpoints (WebUSB mode)
pub struct VendorPipe<'d, D: Driver<'d>> {
    ep_in: D::EndpointIn,
    ep_out: D::EndpointOut,
    _lifetime: PhantomData<&'d ()>,
}

impl<'d, D: Driver<'d>> VendorPipe<'d, D> {
    pub fn new(ep_in: D::EndpointIn, ep_out: D::EndpointOut) -> Self {
        Self {
            ep_in,
            ep_out,
            _lifetime: PhantomData,
        }
    }
}

impl<'d, D: Driver<'d>> PacketPipe for VendorPipe<'d, D> {
    async fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, PortError> {
        read_with_timeout(self.ep_out.read(buf)).await
    }

    async fn write_packet(&mut self, buf: &[u8]) -> Result<(), PortError> {
        write_with_timeout(self.ep_in.write(buf)).await
    }

    async fn wait_connected(&mut self) {
        self.ep_out.wait_enabled().await;
    }

    fn line_state(&self) -> Option<LineState> {
        None
    }
}

/// Endpoints of whichever personality the device booted with
pub enum BridgePipe<'d, D: Driver<'d>> {
    Cdc(CdcPipe<'d, D>),
    Vendor(VendorPipe<'d, D>),
}

impl<'d, D: Driver<'d>> PacketPipe for BridgePipe<'d, D> {
    async fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, PortError> {
        match self {
            BridgePipe::Cdc(pipe) => pipe.read_packet(buf).await,
            BridgePipe::Vendor(pipe) => pipe.read_packet(buf).await,
        }
    }

    async fn write_packet(&mut self, buf: &[u8]) -> Result<(), PortError> {
        match self {
            BridgePipe::Cdc(pipe) => pipe.write_packet(buf).await,
            BridgePipe::Vendor(pipe) => pipe.write_packet(buf).await,
        }
    }

    async fn wait_connected(&mut self) {
        match self {
            BridgePipe::Cdc(pipe) => pipe.wait_connected().await,
            BridgePipe::Vendor(pipe) => pipe.wait_connected().await,
        }
    }

    fn line_state(&self) -> Option<LineState> {
        match self {
            BridgePipe::Cdc(pipe) => pipe.line_state(),
            BridgePipe::Vendor(pipe) => pipe.line_state(),
        }
    }
}
