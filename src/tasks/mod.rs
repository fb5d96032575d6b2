//! Embassy tasks module
//!
//! Contains all async tasks for the firmware, organised by functionality.

pub mod bridge;
pub mod led;
pub mod restart;

pub use bridge::{bridge_task, uart_rx_task};
pub use led::{led_task, LedPulse, LedReceiver, LedSender, LED_CHANNEL};
pub use restart::{restart, usb_task};
