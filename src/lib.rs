#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod buffer;
pub mod config;
pub mod control;
pub mod mode;
pub mod usb;

// Tasks depend on esp-hal and embassy, only available with the embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
