//! Vendor control request dispatcher
//!
//! Answers WebUSB and MS OS 2.0 requests and handles the WebUSB enable
//! toggle. Everything that is not a vendor request is left to the CDC class
//! handler; vendor requests that do not match a known selector are stalled.

use crate::config::msos;
use crate::control::request::{ControlRequest, VendorRequest};
use crate::mode::{DeviceModeState, ModeCommit};
use crate::usb::descriptors::{self, DescriptorKind};
use core::fmt::Debug;
use embedded_storage::Storage;
use log::{debug, info, warn};

/// Outcome of a control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlResponse {
    /// Send this payload in the data stage, then complete
    Data(&'static [u8]),
    /// Complete the status stage without data
    Accept,
    /// Complete, then shut USB down and reset after `delay_ms`
    Restart { delay_ms: u32 },
    /// Reject the request with a protocol stall
    Stall,
    /// Not a vendor request; another handler owns it
    Defer,
}

/// Control request dispatcher
pub struct ControlDispatcher;

impl ControlDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Produce exactly one response for `req`.
    pub fn dispatch<S>(&self, req: &ControlRequest, state: &mut DeviceModeState<S>) -> ControlResponse
    where
        S: Storage,
        S::Error: Debug,
    {
        let Some(vendor) = VendorRequest::classify(req) else {
            return ControlResponse::Defer;
        };

        match vendor {
            VendorRequest::GetUrl { url_index } => {
                match descriptors::lookup(DescriptorKind::Url { index: url_index }, state.mode()) {
                    Some(url) => Self::data(url, req.length),
                    None => {
                        debug!("Control: no URL descriptor at index {}", url_index);
                        ControlResponse::Stall
                    }
                }
            }
            VendorRequest::GetMsOs20DescriptorSet => {
                match descriptors::lookup(DescriptorKind::MsOs20Set, state.mode()) {
                    Some(set) => Self::data(set, req.length),
                    None => ControlResponse::Stall,
                }
            }
            VendorRequest::SetAltEnumeration { value } if value == u16::from(msos::ALT_ENUMERATION_CODE) << 8 => {
                ControlResponse::Accept
            }
            VendorRequest::SetAltEnumeration { value } => {
                debug!("Control: unknown alternate enumeration {:#06x}", value);
                ControlResponse::Stall
            }
            VendorRequest::SetWebUsbEnabled { enabled } => match state.set_and_commit(enabled) {
                ModeCommit::Unchanged => ControlResponse::Accept,
                ModeCommit::Restart { delay_ms } => {
                    info!("Control: WebUSB {} requested", if enabled { "enable" } else { "disable" });
                    ControlResponse::Restart { delay_ms }
                }
            },
            VendorRequest::Unknown => {
                warn!(
                    "Control: stalling vendor request {:#04x} index {:#06x} ({:?} {:?})",
                    req.request, req.index, req.direction, req.recipient
                );
                ControlResponse::Stall
            }
        }
    }

    /// Payload truncated to the host's wLength
    fn data(payload: &'static [u8], length: u16) -> ControlResponse {
        let len = payload.len().min(usize::from(length));
        ControlResponse::Data(&payload[..len])
    }
}

impl Default for ControlDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::request::{Direction, Recipient, RequestType};
    use crate::mode::state::mock::MockFlash;
    use crate::mode::DeviceMode;

    const BASE: u32 = 0x9000;
    const FLAG: u32 = 0x9045;

    fn plain_state() -> DeviceModeState<MockFlash> {
        DeviceModeState::load(MockFlash::new(BASE), FLAG)
    }

    fn webusb_state() -> DeviceModeState<MockFlash> {
        DeviceModeState::load(MockFlash::with_byte(BASE, FLAG, 0x01), FLAG)
    }

    fn vendor_in(request: u8, value: u16, index: u16, length: u16) -> ControlRequest {
        ControlRequest {
            direction: Direction::In,
            request_type: RequestType::Vendor,
            recipient: Recipient::Device,
            request,
            value,
            index,
            length,
        }
    }

    fn enable(value: u16) -> ControlRequest {
        ControlRequest {
            direction: Direction::Out,
            request_type: RequestType::Vendor,
            recipient: Recipient::Device,
            request: 0x42,
            value,
            index: 3,
            length: 0,
        }
    }

    #[test]
    fn test_get_url_landing_page() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        let response = dispatcher.dispatch(&vendor_in(0x42, 0, 2, 255), &mut state);
        let ControlResponse::Data(url) = response else {
            panic!("expected URL descriptor, got {:?}", response);
        };
        assert_eq!(url[1], 0x03);
        assert_eq!(&url[3..], b"www.entropicengineering.com");
    }

    #[test]
    fn test_get_url_unknown_index_stalls() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        assert_eq!(
            dispatcher.dispatch(&vendor_in(0x42, 5, 2, 255), &mut state),
            ControlResponse::Stall
        );
    }

    #[test]
    fn test_data_truncated_to_length() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        // Windows asks for the set header first
        assert_eq!(
            dispatcher.dispatch(&vendor_in(0x45, 0, 7, 10), &mut state),
            ControlResponse::Data(&descriptors::lookup(DescriptorKind::MsOs20Set, DeviceMode::Plain).unwrap()[..10])
        );
    }

    #[test]
    fn test_ms_os_set_follows_mode() {
        let dispatcher = ControlDispatcher::new();

        let mut plain = plain_state();
        let ControlResponse::Data(full) = dispatcher.dispatch(&vendor_in(0x45, 0, 7, 0xFFFF), &mut plain) else {
            panic!("expected descriptor set");
        };
        assert_eq!(full.len(), descriptors::MS_OS_20_SET_LEN);

        let mut webusb = webusb_state();
        let ControlResponse::Data(reduced) = dispatcher.dispatch(&vendor_in(0x45, 0, 7, 0xFFFF), &mut webusb)
        else {
            panic!("expected descriptor set");
        };
        assert_eq!(reduced.len(), descriptors::MS_OS_20_SET_LEN_WEBUSB);
    }

    #[test]
    fn test_set_alt_enumeration() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        assert_eq!(
            dispatcher.dispatch(&vendor_in(0x45, 0x0000, 8, 0), &mut state),
            ControlResponse::Accept
        );
        assert_eq!(
            dispatcher.dispatch(&vendor_in(0x45, 0x0100, 8, 0), &mut state),
            ControlResponse::Stall
        );
    }

    #[test]
    fn test_enable_same_state_acknowledges() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        assert_eq!(dispatcher.dispatch(&enable(0), &mut state), ControlResponse::Accept);
        assert_eq!(state.storage().writes(), 0);

        let mut state = webusb_state();
        assert_eq!(dispatcher.dispatch(&enable(1), &mut state), ControlResponse::Accept);
        assert_eq!(state.storage().writes(), 0);
    }

    #[test]
    fn test_enable_change_persists_and_restarts() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        assert_eq!(
            dispatcher.dispatch(&enable(1), &mut state),
            ControlResponse::Restart { delay_ms: 2000 }
        );
        assert_eq!(state.mode(), DeviceMode::WebUsb);
        assert_eq!(state.storage().byte_at(FLAG), 0x01);
    }

    #[test]
    fn test_enable_uses_only_bit_zero() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        assert_eq!(dispatcher.dispatch(&enable(0xFFFE), &mut state), ControlResponse::Accept);
        assert_eq!(state.mode(), DeviceMode::Plain);
    }

    #[test]
    fn test_unknown_vendor_requests_stall_everywhere() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        let directions = [Direction::In, Direction::Out];
        let recipients = [
            Recipient::Device,
            Recipient::Interface,
            Recipient::Endpoint,
            Recipient::Other,
            Recipient::Reserved,
        ];

        for direction in directions {
            for recipient in recipients {
                for (request, index) in [(0x99, 0), (0x42, 9), (0x45, 1)] {
                    let req = ControlRequest {
                        direction,
                        request_type: RequestType::Vendor,
                        recipient,
                        request,
                        value: 0,
                        index,
                        length: 8,
                    };
                    assert_eq!(
                        dispatcher.dispatch(&req, &mut state),
                        ControlResponse::Stall,
                        "{:?} {:?} {:#x}/{}",
                        direction,
                        recipient,
                        request,
                        index
                    );
                }
            }
        }
        assert_eq!(state.storage().writes(), 0);
    }

    #[test]
    fn test_known_requests_to_other_recipients_stall() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        let mut req = enable(1);
        req.recipient = Recipient::Interface;
        assert_eq!(dispatcher.dispatch(&req, &mut state), ControlResponse::Stall);
        assert_eq!(state.mode(), DeviceMode::Plain);

        let mut req = vendor_in(0x42, 0, 2, 255);
        req.recipient = Recipient::Endpoint;
        assert_eq!(dispatcher.dispatch(&req, &mut state), ControlResponse::Stall);
    }

    #[test]
    fn test_class_requests_are_deferred() {
        let dispatcher = ControlDispatcher::new();
        let mut state = plain_state();

        // SET_LINE_CODING
        let req = ControlRequest::from_setup([0x21, 0x20, 0x00, 0x00, 0x00, 0x00, 0x07, 0x00]);
        assert_eq!(dispatcher.dispatch(&req, &mut state), ControlResponse::Defer);

        // GET_DESCRIPTOR (standard)
        let req = ControlRequest::from_setup([0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x12, 0x00]);
        assert_eq!(dispatcher.dispatch(&req, &mut state), ControlResponse::Defer);
    }
}
