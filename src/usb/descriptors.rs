//! Static WebUSB and Microsoft OS 2.0 descriptor tables
//!
//! All tables are assembled at compile time. Multi-byte fields are little
//! endian. The BOS platform capability payloads start at `bReserved`; the
//! USB stack writes `bLength`, `bDescriptorType` and `bDevCapabilityType`.

use crate::config::{msos, usb, webusb};
use crate::mode::DeviceMode;

/// WebUSB URL descriptor type
const WEBUSB_URL: u8 = 0x03;

/// MS OS 2.0 descriptor types
const MS_OS_20_SET_HEADER: u16 = 0x00;
const MS_OS_20_SUBSET_CONFIGURATION: u16 = 0x01;
const MS_OS_20_SUBSET_FUNCTION: u16 = 0x02;
const MS_OS_20_FEATURE_COMPATIBLE_ID: u16 = 0x03;
const MS_OS_20_FEATURE_REG_PROPERTY: u16 = 0x04;

/// Registry value type for a list of strings
const REG_MULTI_SZ: u16 = 0x07;

/// {3408b638-09a9-47a0-8bfd-a0768815b665}
const WEBUSB_PLATFORM_UUID: [u8; 16] = [
    0x38, 0xB6, 0x08, 0x34, 0xA9, 0x09, 0xA0, 0x47, 0x8B, 0xFD, 0xA0, 0x76, 0x88, 0x15, 0xB6, 0x65,
];

/// {D8DD60DF-4589-4CC7-9CD2-659D9E648A9F}
const MS_OS_20_PLATFORM_UUID: [u8; 16] = [
    0xDF, 0x60, 0xDD, 0xD8, 0x89, 0x45, 0xC7, 0x4C, 0x9C, 0xD2, 0x65, 0x9D, 0x9E, 0x64, 0x8A, 0x9F,
];

const HEADER_LEN: usize = 10;
const SUBSET_LEN: usize = 8;
const COMPATIBLE_ID_LEN: usize = 20;
const REGISTRY_NAME_LEN: usize = utf16z_len(msos::REGISTRY_KEY);
// REG_MULTI_SZ: the GUID string plus the terminator of the list
const REGISTRY_DATA_LEN: usize = utf16z_len(msos::DEVICE_INTERFACE_GUID) + 2;
const REGISTRY_LEN: usize = 10 + REGISTRY_NAME_LEN + REGISTRY_DATA_LEN;

const WEBUSB_FUNCTION_LEN: usize = SUBSET_LEN + COMPATIBLE_ID_LEN + REGISTRY_LEN;
const CDC_FUNCTION_LEN: usize = SUBSET_LEN + COMPATIBLE_ID_LEN;
const CONFIGURATION_LEN: usize = SUBSET_LEN + CDC_FUNCTION_LEN + WEBUSB_FUNCTION_LEN;

/// Size of the descriptor set served in plain mode
pub const MS_OS_20_SET_LEN: usize = HEADER_LEN + CONFIGURATION_LEN;

/// Size of the descriptor set served in WebUSB mode
pub const MS_OS_20_SET_LEN_WEBUSB: usize = HEADER_LEN + COMPATIBLE_ID_LEN;

const URL_LEN: usize = 3 + webusb::LANDING_PAGE_URL.len();
const WEBUSB_CAPABILITY_LEN: usize = 1 + 16 + 2 + 1 + 1;
const MS_OS_20_CAPABILITY_LEN: usize = 1 + 16 + 4 + 2 + 1 + 1;

/// Byte length of a string encoded as null-terminated UTF-16LE
const fn utf16z_len(s: &str) -> usize {
    (s.len() + 1) * 2
}

/// Compile-time little-endian table builder
struct Table<const N: usize> {
    buf: [u8; N],
    pos: usize,
}

impl<const N: usize> Table<N> {
    const fn new() -> Self {
        Self { buf: [0; N], pos: 0 }
    }

    const fn u8(mut self, value: u8) -> Self {
        self.buf[self.pos] = value;
        self.pos += 1;
        self
    }

    const fn u16(self, value: u16) -> Self {
        let [lo, hi] = value.to_le_bytes();
        self.u8(lo).u8(hi)
    }

    const fn u32(self, value: u32) -> Self {
        let [b0, b1, b2, b3] = value.to_le_bytes();
        self.u8(b0).u8(b1).u8(b2).u8(b3)
    }

    const fn len16(self, len: usize) -> Self {
        self.u16(len as u16)
    }

    const fn bytes(mut self, data: &[u8]) -> Self {
        let mut i = 0;
        while i < data.len() {
            self = self.u8(data[i]);
            i += 1;
        }
        self
    }

    /// Fixed-width field, zero padded
    const fn padded(mut self, data: &[u8], width: usize) -> Self {
        let mut i = 0;
        while i < width {
            self = self.u8(if i < data.len() { data[i] } else { 0 });
            i += 1;
        }
        self
    }

    /// ASCII string as null-terminated UTF-16LE
    const fn utf16z(mut self, s: &str) -> Self {
        let chars = s.as_bytes();
        let mut i = 0;
        while i < chars.len() {
            self = self.u16(chars[i] as u16);
            i += 1;
        }
        self.u16(0)
    }

    const fn finish(self) -> [u8; N] {
        assert!(self.pos == N, "descriptor table length mismatch");
        self.buf
    }
}

const fn url_descriptor() -> [u8; URL_LEN] {
    Table::new()
        .u8(URL_LEN as u8)
        .u8(WEBUSB_URL)
        .u8(webusb::URL_SCHEME_HTTPS)
        .bytes(webusb::LANDING_PAGE_URL.as_bytes())
        .finish()
}

const fn compatible_id<const N: usize>(table: Table<N>, id: &[u8]) -> Table<N> {
    table
        .len16(COMPATIBLE_ID_LEN)
        .u16(MS_OS_20_FEATURE_COMPATIBLE_ID)
        .padded(id, 8)
        .padded(&[], 8)
}

const fn set_header<const N: usize>(table: Table<N>, total: usize) -> Table<N> {
    table
        .len16(HEADER_LEN)
        .u16(MS_OS_20_SET_HEADER)
        .u32(msos::WINDOWS_VERSION)
        .len16(total)
}

const fn function_subset<const N: usize>(table: Table<N>, interface: u8, len: usize) -> Table<N> {
    table
        .len16(SUBSET_LEN)
        .u16(MS_OS_20_SUBSET_FUNCTION)
        .u8(interface)
        .u8(0)
        .len16(len)
}

/// Plain mode: CDC bound to usbser, the zero-endpoint WebUSB interface to
/// WinUSB with a device interface GUID for user-mode access.
const fn ms_os_20_set() -> [u8; MS_OS_20_SET_LEN] {
    let table = set_header(Table::new(), MS_OS_20_SET_LEN)
        .len16(SUBSET_LEN)
        .u16(MS_OS_20_SUBSET_CONFIGURATION)
        .u8(0)
        .u8(0)
        .len16(CONFIGURATION_LEN);

    let table = function_subset(table, usb::INTERFACE_CDC_COMM, CDC_FUNCTION_LEN);
    let table = compatible_id(table, b"USBSER");

    let table = function_subset(table, usb::INTERFACE_WEBUSB, WEBUSB_FUNCTION_LEN);
    let table = compatible_id(table, b"WINUSB");

    table
        .len16(REGISTRY_LEN)
        .u16(MS_OS_20_FEATURE_REG_PROPERTY)
        .u16(REG_MULTI_SZ)
        .len16(REGISTRY_NAME_LEN)
        .utf16z(msos::REGISTRY_KEY)
        .len16(REGISTRY_DATA_LEN)
        .utf16z(msos::DEVICE_INTERFACE_GUID)
        .u16(0)
        .finish()
}

/// WebUSB mode: the whole device binds to WinUSB.
const fn ms_os_20_set_webusb() -> [u8; MS_OS_20_SET_LEN_WEBUSB] {
    let table = set_header(Table::new(), MS_OS_20_SET_LEN_WEBUSB);
    compatible_id(table, b"WINUSB").finish()
}

const fn webusb_capability() -> [u8; WEBUSB_CAPABILITY_LEN] {
    Table::new()
        .u8(0)
        .bytes(&WEBUSB_PLATFORM_UUID)
        .u16(0x0100)
        .u8(webusb::VENDOR_CODE)
        .u8(webusb::LANDING_PAGE_INDEX as u8)
        .finish()
}

const fn ms_os_20_capability(set_len: usize) -> [u8; MS_OS_20_CAPABILITY_LEN] {
    Table::new()
        .u8(0)
        .bytes(&MS_OS_20_PLATFORM_UUID)
        .u32(msos::WINDOWS_VERSION)
        .len16(set_len)
        .u8(msos::VENDOR_CODE)
        .u8(msos::ALT_ENUMERATION_CODE)
        .finish()
}

static URL_DESCRIPTOR: [u8; URL_LEN] = url_descriptor();
static MS_OS_20_SET: [u8; MS_OS_20_SET_LEN] = ms_os_20_set();
static MS_OS_20_SET_WEBUSB: [u8; MS_OS_20_SET_LEN_WEBUSB] = ms_os_20_set_webusb();
static WEBUSB_CAPABILITY: [u8; WEBUSB_CAPABILITY_LEN] = webusb_capability();
static MS_OS_20_CAPABILITY: [u8; MS_OS_20_CAPABILITY_LEN] = ms_os_20_capability(MS_OS_20_SET_LEN);
static MS_OS_20_CAPABILITY_WEBUSB: [u8; MS_OS_20_CAPABILITY_LEN] =
    ms_os_20_capability(MS_OS_20_SET_LEN_WEBUSB);

/// Descriptor tables served by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// WebUSB URL descriptor by URL index
    Url { index: u16 },
    /// MS OS 2.0 descriptor set
    MsOs20Set,
    /// WebUSB BOS platform capability payload
    WebUsbCapability,
    /// MS OS 2.0 BOS platform capability payload
    MsOs20Capability,
}

/// Table for `kind` in `mode`, or `None` when no such descriptor exists.
pub fn lookup(kind: DescriptorKind, mode: DeviceMode) -> Option<&'static [u8]> {
    match (kind, mode) {
        (DescriptorKind::Url { index }, _) if index == webusb::LANDING_PAGE_INDEX => {
            Some(&URL_DESCRIPTOR)
        }
        (DescriptorKind::Url { .. }, _) => None,
        (DescriptorKind::MsOs20Set, DeviceMode::Plain) => Some(&MS_OS_20_SET),
        (DescriptorKind::MsOs20Set, DeviceMode::WebUsb) => Some(&MS_OS_20_SET_WEBUSB),
        (DescriptorKind::WebUsbCapability, _) => Some(&WEBUSB_CAPABILITY),
        (DescriptorKind::MsOs20Capability, DeviceMode::Plain) => Some(&MS_OS_20_CAPABILITY),
        (DescriptorKind::MsOs20Capability, DeviceMode::WebUsb) => Some(&MS_OS_20_CAPABILITY_WEBUSB),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    /// Walk a descriptor set and collect (length, type) of each entry.
    /// Subset headers carry their own size in wLength, so a flat walk works.
    fn entries(set: &[u8]) -> heapless::Vec<(u16, u16), 16> {
        let mut out = heapless::Vec::new();
        let mut pos = 0;
        while pos < set.len() {
            let len = le16(set, pos);
            out.push((len, le16(set, pos + 2))).unwrap();
            pos += len as usize;
        }
        out
    }

    #[test]
    fn test_url_descriptor() {
        let url = lookup(DescriptorKind::Url { index: 0 }, DeviceMode::Plain).unwrap();
        assert_eq!(url[0] as usize, url.len());
        assert_eq!(url[1], 0x03);
        assert_eq!(url[2], 1);
        assert_eq!(&url[3..], b"www.entropicengineering.com");
    }

    #[test]
    fn test_unknown_url_index() {
        assert_eq!(lookup(DescriptorKind::Url { index: 5 }, DeviceMode::Plain), None);
        assert_eq!(lookup(DescriptorKind::Url { index: 1 }, DeviceMode::WebUsb), None);
    }

    #[test]
    fn test_full_set_layout() {
        let set = lookup(DescriptorKind::MsOs20Set, DeviceMode::Plain).unwrap();
        assert_eq!(set.len(), 206);
        assert_eq!(le16(set, 8) as usize, set.len());
        assert_eq!(
            u32::from_le_bytes([set[4], set[5], set[6], set[7]]),
            msos::WINDOWS_VERSION
        );

        let types: heapless::Vec<u16, 16> = entries(set).iter().map(|&(_, t)| t).collect();
        assert_eq!(types.as_slice(), &[0x00, 0x01, 0x02, 0x03, 0x02, 0x03, 0x04]);

        // Configuration subset covers everything after the set header
        assert_eq!(le16(set, 10 + 6) as usize, set.len() - HEADER_LEN);
    }

    #[test]
    fn test_full_set_compatible_ids() {
        let set = lookup(DescriptorKind::MsOs20Set, DeviceMode::Plain).unwrap();
        let cdc_id = 10 + 8 + 8 + 4;
        assert_eq!(&set[cdc_id..cdc_id + 8], b"USBSER\0\0");
        let webusb_function = 10 + 8 + 8 + 20;
        assert_eq!(set[webusb_function + 4], usb::INTERFACE_WEBUSB);
        let winusb_id = webusb_function + 8 + 4;
        assert_eq!(&set[winusb_id..winusb_id + 8], b"WINUSB\0\0");
    }

    #[test]
    fn test_registry_property() {
        let set = lookup(DescriptorKind::MsOs20Set, DeviceMode::Plain).unwrap();
        let registry = 10 + 8 + 8 + 20 + 8 + 20;
        assert_eq!(le16(set, registry), 132);
        assert_eq!(le16(set, registry + 4), REG_MULTI_SZ);
        assert_eq!(le16(set, registry + 6), 42);
        assert_eq!(le16(set, registry + 8), u16::from(b'D'));
        assert_eq!(le16(set, registry + 8 + 42), 80);
        // List ends with two null characters
        assert_eq!(&set[set.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_reduced_set_in_webusb_mode() {
        let set = lookup(DescriptorKind::MsOs20Set, DeviceMode::WebUsb).unwrap();
        assert_eq!(set.len(), 30);
        assert_eq!(le16(set, 8), 30);
        assert_eq!(le16(set, 12), MS_OS_20_FEATURE_COMPATIBLE_ID);
        assert_eq!(&set[14..22], b"WINUSB\0\0");
    }

    #[test]
    fn test_webusb_capability() {
        let cap = lookup(DescriptorKind::WebUsbCapability, DeviceMode::Plain).unwrap();
        assert_eq!(cap.len(), 21);
        assert_eq!(cap[0], 0);
        assert_eq!(&cap[1..17], &WEBUSB_PLATFORM_UUID);
        assert_eq!(le16(cap, 17), 0x0100);
        assert_eq!(cap[19], webusb::VENDOR_CODE);
        assert_eq!(cap[20], webusb::LANDING_PAGE_INDEX as u8);
    }

    #[test]
    fn test_ms_os_capability_tracks_set_length() {
        let plain = lookup(DescriptorKind::MsOs20Capability, DeviceMode::Plain).unwrap();
        let webusb = lookup(DescriptorKind::MsOs20Capability, DeviceMode::WebUsb).unwrap();

        assert_eq!(plain.len(), 25);
        assert_eq!(&plain[1..17], &MS_OS_20_PLATFORM_UUID);
        assert_eq!(le16(plain, 21) as usize, MS_OS_20_SET_LEN);
        assert_eq!(le16(webusb, 21) as usize, MS_OS_20_SET_LEN_WEBUSB);
        assert_eq!(plain[23], msos::VENDOR_CODE);
        assert_eq!(plain[24], msos::ALT_ENUMERATION_CODE);
    }
}
