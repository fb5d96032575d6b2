//! USB device task and the mode-switch restart sequence
//!
//! Runs the embassy-usb device until a committed mode change raises
//! `RESTART_SIGNAL`, then takes the device off the bus and resets the chip
//! so the host enumerates the new personality from scratch.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use embassy_usb::driver::Driver;
use embassy_usb::UsbDevice;
use log::info;

use crate::usb::RESTART_SIGNAL;

/// Time to keep the device running after the signal so the status stage of
/// the enable request reaches the host
const STATUS_STAGE_GRACE_MS: u64 = 50;

/// Reset the chip.
fn reboot() -> ! {
    esp_hal::system::software_reset()
}

/// Disconnect, wait `delay_ms` for the host to drop the session, then reset.
pub async fn restart<'d, D: Driver<'d>>(usb: &mut UsbDevice<'d, D>, delay_ms: u32) -> ! {
    info!("Restart: USB off, resetting in {} ms", delay_ms);
    usb.disable().await;
    Timer::after(Duration::from_millis(u64::from(delay_ms))).await;
    reboot()
}

/// Run the USB device until a restart is requested.
pub async fn usb_task<'d, D: Driver<'d>>(mut usb: UsbDevice<'d, D>) -> ! {
    let delay_ms = match select(usb.run(), RESTART_SIGNAL.wait()).await {
        Either::First(never) => never,
        Either::Second(delay_ms) => delay_ms,
    };

    let _ = select(
        usb.run(),
        Timer::after(Duration::from_millis(STATUS_STAGE_GRACE_MS)),
    )
    .await;

    restart(&mut usb, delay_ms).await
}
