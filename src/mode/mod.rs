//! Device mode (plain CDC or WebUSB) and its persistence

pub mod state;

pub use state::{DeviceMode, DeviceModeState, ModeCommit};
