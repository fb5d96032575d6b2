//! embassy-usb control handler for the vendor requests.
//!
//! Translates embassy's `Request` into a `ControlRequest`, runs the
//! dispatcher and maps the outcome back. Deferred requests return `None` so
//! the CDC-ACM class handler still sees its line coding requests.

use core::fmt::Debug;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::control::{self, InResponse, OutResponse, Request};
use embassy_usb::driver::Direction as UsbDirection;
use embassy_usb::Handler;
use embedded_storage::Storage;
use log::info;

use crate::control::{ControlDispatcher, ControlRequest, ControlResponse, Direction, Recipient, RequestType};
use crate::mode::DeviceModeState;

/// Set while the host has the device configured
pub static USB_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Raised with the restart delay once a mode change has been committed
pub static RESTART_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

fn to_control_request(req: &Request) -> ControlRequest {
    ControlRequest {
        direction: match req.direction {
            UsbDirection::In => Direction::In,
            UsbDirection::Out => Direction::Out,
        },
        request_type: match req.request_type {
            control::RequestType::Standard => RequestType::Standard,
            control::RequestType::Class => RequestType::Class,
            control::RequestType::Vendor => RequestType::Vendor,
            control::RequestType::Reserved => RequestType::Reserved,
        },
        recipient: match req.recipient {
            control::Recipient::Device => Recipient::Device,
            control::Recipient::Interface => Recipient::Interface,
            control::Recipient::Endpoint => Recipient::Endpoint,
            control::Recipient::Other => Recipient::Other,
            control::Recipient::Reserved => Recipient::Reserved,
        },
        request: req.request,
        value: req.value,
        index: req.index,
        length: req.length,
    }
}

/// Vendor request handler owning the device mode
pub struct ControlHandler<S> {
    dispatcher: ControlDispatcher,
    state: DeviceModeState<S>,
}

impl<S> ControlHandler<S>
where
    S: Storage,
    S::Error: Debug,
{
    pub fn new(state: DeviceModeState<S>) -> Self {
        Self {
            dispatcher: ControlDispatcher::new(),
            state,
        }
    }

    fn dispatch(&mut self, req: &Request) -> ControlResponse {
        self.dispatcher.dispatch(&to_control_request(req), &mut self.state)
    }
}

impl<S> Handler for ControlHandler<S>
where
    S: Storage,
    S::Error: Debug,
{
    fn reset(&mut self) {
        USB_CONFIGURED.store(false, Ordering::Release);
    }

    fn configured(&mut self, configured: bool) {
        USB_CONFIGURED.store(configured, Ordering::Release);
        info!("USB: {}", if configured { "configured" } else { "unconfigured" });
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        match self.dispatch(&req) {
            ControlResponse::Defer => None,
            ControlResponse::Stall => Some(OutResponse::Rejected),
            ControlResponse::Accept | ControlResponse::Data(_) => Some(OutResponse::Accepted),
            ControlResponse::Restart { delay_ms } => {
                RESTART_SIGNAL.signal(delay_ms);
                Some(OutResponse::Accepted)
            }
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, _buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        match self.dispatch(&req) {
            ControlResponse::Defer => None,
            ControlResponse::Stall => Some(InResponse::Rejected),
            ControlResponse::Data(payload) => Some(InResponse::Accepted(payload)),
            ControlResponse::Accept => Some(InResponse::Accepted(&[])),
            ControlResponse::Restart { delay_ms } => {
                RESTART_SIGNAL.signal(delay_ms);
                Some(InResponse::Accepted(&[]))
            }
        }
    }
}
