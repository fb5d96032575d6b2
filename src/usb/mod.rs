//! USB personality and transport.
//!
//! - `descriptors`, `profile`: what the device presents in each mode
//! - `port`: embassy-usb endpoints behind `PacketPipe` (embedded)
//! - `handler`: vendor control requests on the default pipe (embedded)

pub mod descriptors;
pub mod profile;

#[cfg(feature = "embedded")]
pub mod handler;
#[cfg(feature = "embedded")]
pub mod port;

pub use descriptors::{lookup, DescriptorKind};
pub use profile::{InterfaceLayout, UsbProfile};

#[cfg(feature = "embedded")]
pub use handler::{ControlHandler, RESTART_SIGNAL, USB_CONFIGURED};
#[cfg(feature = "embedded")]
pub use port::{BridgePipe, CdcPipe, VendorPipe};
