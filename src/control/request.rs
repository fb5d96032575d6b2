//! Control request decoding and vendor request classification

use crate::config::{msos, webusb};

/// Data stage direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to device
    Out,
    /// Device to host
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Standard,
    Class,
    Vendor,
    Reserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

/// A decoded SETUP packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub direction: Direction,
    pub request_type: RequestType,
    pub recipient: Recipient,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
    /// wLength
    pub length: u16,
}

impl ControlRequest {
    /// Decode the 8-byte SETUP packet.
    pub fn from_setup(setup: [u8; 8]) -> Self {
        let bm_request_type = setup[0];

        let direction = if bm_request_type & 0x80 != 0 {
            Direction::In
        } else {
            Direction::Out
        };

        let request_type = match (bm_request_type >> 5) & 0x03 {
            0 => RequestType::Standard,
            1 => RequestType::Class,
            2 => RequestType::Vendor,
            _ => RequestType::Reserved,
        };

        let recipient = match bm_request_type & 0x1F {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        };

        Self {
            direction,
            request_type,
            recipient,
            request: setup[1],
            value: u16::from_le_bytes([setup[2], setup[3]]),
            index: u16::from_le_bytes([setup[4], setup[5]]),
            length: u16::from_le_bytes([setup[6], setup[7]]),
        }
    }

    /// Device-recipient vendor request in the given direction
    fn is_device_vendor(&self, direction: Direction) -> bool {
        self.direction == direction
            && self.request_type == RequestType::Vendor
            && self.recipient == Recipient::Device
    }
}

/// Vendor requests the firmware understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorRequest {
    /// WebUSB GET_URL for a URL descriptor index
    GetUrl { url_index: u16 },
    /// MS OS 2.0 descriptor set
    GetMsOs20DescriptorSet,
    /// MS OS 2.0 SET_ALT_ENUMERATION with the code in the high byte of wValue
    SetAltEnumeration { value: u16 },
    /// Enable or disable WebUSB mode (wValue bit 0)
    SetWebUsbEnabled { enabled: bool },
    /// Vendor type but no known (direction, recipient, code, index)
    Unknown,
}

impl VendorRequest {
    /// Classify a vendor request. Non-vendor requests return `None`.
    pub fn classify(req: &ControlRequest) -> Option<Self> {
        if req.request_type != RequestType::Vendor {
            return None;
        }

        let request = if req.is_device_vendor(Direction::In) {
            match (req.request, req.index) {
                (webusb::VENDOR_CODE, webusb::REQUEST_GET_URL) => VendorRequest::GetUrl {
                    url_index: req.value,
                },
                (msos::VENDOR_CODE, msos::DESCRIPTOR_INDEX) => VendorRequest::GetMsOs20DescriptorSet,
                (msos::VENDOR_CODE, msos::SET_ALT_ENUMERATION) => {
                    VendorRequest::SetAltEnumeration { value: req.value }
                }
                _ => VendorRequest::Unknown,
            }
        } else if req.is_device_vendor(Direction::Out) {
            match (req.request, req.index) {
                (webusb::VENDOR_CODE, webusb::REQUEST_ENABLE) => VendorRequest::SetWebUsbEnabled {
                    enabled: req.value & 0x01 != 0,
                },
                _ => VendorRequest::Unknown,
            }
        } else {
            VendorRequest::Unknown
        };

        Some(request)
    }
}
