//! Hardware and protocol configuration constants for the ESP32-S3 bridge

/// USB identity and endpoint sizing
pub mod usb {
    /// Identity presented while the device is a plain CDC serial port
    pub const VID_PLAIN: u16 = 0x2341;
    pub const PID_PLAIN: u16 = 0x0043;

    /// Identity presented while WebUSB is enabled
    pub const VID_WEBUSB: u16 = 0x04B9;
    pub const PID_WEBUSB: u16 = 0x0AF1;

    pub const MANUFACTURER_PLAIN: &str = "Arduino (www.arduino.cc)";
    pub const MANUFACTURER_WEBUSB: &str = "Arduino (Modkit Remix)";
    pub const PRODUCT_PLAIN: &str = "Arduino UNO R3";
    pub const PRODUCT_WEBUSB: &str = "Arduino UNO R3 (Modkit Remix)";

    /// Device release number (BCD)
    pub const DEVICE_RELEASE: u16 = 0x0002;

    pub const MAX_POWER_MA: u16 = 100;
    pub const MAX_PACKET_SIZE_0: u8 = 64;

    /// Bulk data endpoint size for both directions
    pub const DATA_EP_SIZE: u16 = 64;

    /// Interface number of the CDC communications interface
    pub const INTERFACE_CDC_COMM: u8 = 0;

    /// Interface number of the zero-endpoint WebUSB interface in plain mode
    pub const INTERFACE_WEBUSB: u8 = 2;
}

/// WebUSB vendor requests
pub mod webusb {
    /// bRequest used for every WebUSB vendor request
    pub const VENDOR_CODE: u8 = 0x42;

    /// wIndex selector: GET_URL
    pub const REQUEST_GET_URL: u16 = 0x02;

    /// wIndex selector: enable/disable WebUSB (wValue bit 0)
    pub const REQUEST_ENABLE: u16 = 0x03;

    /// URL descriptor index of the landing page
    pub const LANDING_PAGE_INDEX: u16 = 0;

    /// Landing page URL without its scheme prefix
    pub const LANDING_PAGE_URL: &str = "www.entropicengineering.com";

    /// URL scheme byte: 0 = http://, 1 = https://
    pub const URL_SCHEME_HTTPS: u8 = 1;
}

/// Microsoft OS 2.0 descriptor requests
pub mod msos {
    /// bRequest for MS OS 2.0 requests (must differ from the WebUSB code)
    pub const VENDOR_CODE: u8 = 0x45;

    /// wIndex selector: MS_OS_20_DESCRIPTOR_INDEX
    pub const DESCRIPTOR_INDEX: u16 = 0x07;

    /// wIndex selector: MS_OS_20_SET_ALT_ENUMERATION
    pub const SET_ALT_ENUMERATION: u16 = 0x08;

    /// Alternate enumeration code advertised in the BOS capability.
    /// Zero means no alternate descriptor set.
    pub const ALT_ENUMERATION_CODE: u8 = 0;

    /// Windows 8.1
    pub const WINDOWS_VERSION: u32 = 0x0603_0000;

    pub const REGISTRY_KEY: &str = "DeviceInterfaceGUIDs";
    pub const DEVICE_INTERFACE_GUID: &str = "{94e78d93-4cbb-481f-b542-a74740d3a713}";
}

/// Serial bridge buffers
pub mod bridge {
    /// Capacity of each direction's ring buffer (power of two)
    pub const BUFFER_SIZE: usize = 128;
}

/// Non-volatile storage of the WebUSB flag
pub mod storage {
    /// Flash offset of the NVS sector reserved for settings
    pub const SETTINGS_SECTOR: u32 = 0x9000;

    /// Flash offset of the WebUSB enable byte
    pub const WEBUSB_FLAG_ADDRESS: u32 = SETTINGS_SECTOR + 0x45;
}

/// Mode-switch restart sequence
pub mod restart {
    /// Delay between USB shutdown and reset so the host tears down the session
    pub const DELAY_MS: u32 = 2000;
}

/// UART towards the target MCU
pub mod uart {
    /// Baud rate used until the host sets a line coding
    pub const DEFAULT_BAUD_RATE: u32 = 115200;
}

/// Activity LEDs
pub mod led {
    /// Minimum on-time of a TX/RX activity pulse
    pub const PULSE_MS: u64 = 3;
}
