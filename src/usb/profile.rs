//! USB identity presented in each device mode

use crate::config::usb;
use crate::mode::DeviceMode;
use crate::usb::descriptors::{self, DescriptorKind};

/// How the bridge endpoints are exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceLayout {
    /// CDC-ACM function (IAD + comm + data) followed by a vendor interface
    /// without endpoints that only exists to carry WebUSB/WinUSB metadata
    CdcWithWebUsbInterface,
    /// A single vendor-specific interface with the bulk bridge endpoints
    VendorBridge,
}

/// Device class, subclass and protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTriple {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

/// Miscellaneous class with Interface Association Descriptors
const CLASS_IAD: ClassTriple = ClassTriple {
    class: 0xEF,
    subclass: 0x02,
    protocol: 0x01,
};

/// Class defined per interface
const CLASS_PER_INTERFACE: ClassTriple = ClassTriple {
    class: 0x00,
    subclass: 0x00,
    protocol: 0x00,
};

/// Everything the USB stack needs to enumerate in a given mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbProfile {
    pub vid: u16,
    pub pid: u16,
    pub manufacturer: &'static str,
    pub product: &'static str,
    pub device_class: ClassTriple,
    pub layout: InterfaceLayout,
    /// BOS platform capability payloads, WebUSB first
    pub webusb_capability: &'static [u8],
    pub msos_capability: &'static [u8],
}

impl UsbProfile {
    pub fn for_mode(mode: DeviceMode) -> Self {
        // Capability tables exist for every mode; an empty slice would only
        // show up if a table were removed.
        let webusb_capability = descriptors::lookup(DescriptorKind::WebUsbCapability, mode).unwrap_or(&[]);
        let msos_capability = descriptors::lookup(DescriptorKind::MsOs20Capability, mode).unwrap_or(&[]);

        match mode {
            DeviceMode::Plain => Self {
                vid: usb::VID_PLAIN,
                pid: usb::PID_PLAIN,
                manufacturer: usb::MANUFACTURER_PLAIN,
                product: usb::PRODUCT_PLAIN,
                device_class: CLASS_IAD,
                layout: InterfaceLayout::CdcWithWebUsbInterface,
                webusb_capability,
                msos_capability,
            },
            DeviceMode::WebUsb => Self {
                vid: usb::VID_WEBUSB,
                pid: usb::PID_WEBUSB,
                manufacturer: usb::MANUFACTURER_WEBUSB,
                product: usb::PRODUCT_WEBUSB,
                device_class: CLASS_PER_INTERFACE,
                layout: InterfaceLayout::VendorBridge,
                webusb_capability,
                msos_capability,
            },
        }
    }
}
