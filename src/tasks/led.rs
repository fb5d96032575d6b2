//! Activity LED task
//!
//! Pulses the TX/RX LEDs without slowing down the bridge. Requests are
//! dropped when the channel is full; a pulse already in progress covers them.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Timer};
use esp_hal::gpio::Output;

use crate::config::led::PULSE_MS;

/// Which activity LED to pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedPulse {
    /// Data sent to the host
    Tx,
    /// Data sent to the target
    Rx,
}

/// Type alias for the LED pulse channel sender
pub type LedSender = Sender<'static, CriticalSectionRawMutex, LedPulse, 4>;

/// Type alias for the LED pulse channel receiver
pub type LedReceiver = Receiver<'static, CriticalSectionRawMutex, LedPulse, 4>;

/// Channel for LED pulse requests
pub static LED_CHANNEL: Channel<CriticalSectionRawMutex, LedPulse, 4> = Channel::new();

/// Task that pulses the activity LEDs (active low)
pub async fn led_task(mut tx_led: Output<'static>, mut rx_led: Output<'static>, receiver: LedReceiver) {
    loop {
        let led = match receiver.receive().await {
            LedPulse::Tx => &mut tx_led,
            LedPulse::Rx => &mut rx_led,
        };

        led.set_low();
        Timer::after(Duration::from_millis(PULSE_MS)).await;
        led.set_high();
    }
}
