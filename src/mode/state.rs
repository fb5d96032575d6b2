//! Persisted WebUSB enable flag
//!
//! The device presents one of two USB personalities. Which one is decided
//! once at boot from a byte in non-volatile storage; changing it writes the
//! byte and asks for a restart so the host sees a fresh enumeration.

use crate::config::restart;
use core::fmt::Debug;
use embedded_storage::Storage;
use log::{error, info, warn};

/// Stored value of a freshly erased flash byte
const ERASED: u8 = 0xFF;

/// USB personality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// CDC-ACM serial port plus a zero-endpoint WebUSB interface
    Plain,
    /// Vendor interface carrying the bridge, reachable from a browser
    WebUsb,
}

impl DeviceMode {
    /// Decode the persisted byte. Only bit 0 is significant.
    pub fn from_stored(byte: u8) -> Self {
        if byte == ERASED || byte & 0x01 == 0 {
            DeviceMode::Plain
        } else {
            DeviceMode::WebUsb
        }
    }

    pub fn stored(self) -> u8 {
        match self {
            DeviceMode::Plain => 0,
            DeviceMode::WebUsb => 1,
        }
    }

    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            DeviceMode::WebUsb
        } else {
            DeviceMode::Plain
        }
    }
}

/// Result of an enable/disable request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommit {
    /// Requested mode is already active; nothing was written
    Unchanged,
    /// New mode persisted; the device must restart after `delay_ms`
    Restart { delay_ms: u32 },
}

/// Live device mode backed by non-volatile storage
pub struct DeviceModeState<S> {
    storage: S,
    address: u32,
    mode: DeviceMode,
}

impl<S> DeviceModeState<S>
where
    S: Storage,
    S::Error: Debug,
{
    /// Read the persisted mode at `address`.
    ///
    /// Unreadable storage is treated like erased flash: plain mode.
    pub fn load(mut storage: S, address: u32) -> Self {
        let mut byte = [ERASED];
        if let Err(e) = storage.read(address, &mut byte) {
            warn!("Mode: failed to read flag at {:#x}: {:?}", address, e);
            byte[0] = ERASED;
        }

        let mode = DeviceMode::from_stored(byte[0]);
        info!("Mode: booting in {:?} mode (stored {:#04x})", mode, byte[0]);

        Self {
            storage,
            address,
            mode,
        }
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn webusb_enabled(&self) -> bool {
        self.mode == DeviceMode::WebUsb
    }

    /// Apply a host request to enable or disable WebUSB.
    ///
    /// A change is persisted before returning `Restart`. A failed write is
    /// logged and the restart is still requested.
    pub fn set_and_commit(&mut self, enabled: bool) -> ModeCommit {
        let requested = DeviceMode::from_enabled(enabled);
        if requested == self.mode {
            info!("Mode: {:?} already active", requested);
            return ModeCommit::Unchanged;
        }

        self.mode = requested;
        if let Err(e) = self.storage.write(self.address, &[requested.stored()]) {
            error!("Mode: failed to persist {:?}: {:?}", requested, e);
        } else {
            info!("Mode: switching to {:?}, restarting", requested);
        }

        ModeCommit::Restart {
            delay_ms: restart::DELAY_MS,
        }
    }

    /// Backing storage, for inspection
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
