//! USB identities the bridge enumerates with.

/// Plain CDC serial mode
pub const PLAIN_VID: u16 = 0x2341;
pub const PLAIN_PID: u16 = 0x0043;

/// WebUSB mode
pub const WEBUSB_VID: u16 = 0x04B9;
pub const WEBUSB_PID: u16 = 0x0AF1;
