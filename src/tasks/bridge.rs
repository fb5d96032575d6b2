//! Bridge tasks.
//!
//! `bridge_task` drives the engine and follows the host's line settings;
//! `uart_rx_task` is the only producer of the device→host buffer.

use core::sync::atomic::Ordering;

use embassy_usb::driver::Driver;
use embedded_io_async::Read;
use esp_hal::gpio::Output;
use esp_hal::uart::{self, UartRx, UartTx};
use esp_hal::Async;
use log::{info, warn};

use crate::bridge::line::{reset_line_high, uart_settings, LineState, LineTracker, UartParity, UartSettings, UartStopBits};
use crate::bridge::{IoUart, PacketPort, SerialBridge, UartRxSink};
use crate::config::bridge::BUFFER_SIZE;
use crate::tasks::led::{LedPulse, LedSender};
use crate::usb::{BridgePipe, USB_CONFIGURED};

fn uart_config(settings: &UartSettings) -> uart::Config {
    let data_bits = match settings.data_bits {
        5 => uart::DataBits::_5,
        6 => uart::DataBits::_6,
        7 => uart::DataBits::_7,
        _ => uart::DataBits::_8,
    };
    let parity = match settings.parity {
        UartParity::None => uart::Parity::None,
        UartParity::Odd => uart::Parity::Odd,
        UartParity::Even => uart::Parity::Even,
    };
    let stop_bits = match settings.stop_bits {
        UartStopBits::One => uart::StopBits::_1,
        UartStopBits::Two => uart::StopBits::_2,
    };

    uart::Config::default()
        .with_baudrate(settings.baud_rate)
        .with_data_bits(data_bits)
        .with_parity(parity)
        .with_stop_bits(stop_bits)
}

/// Apply a changed line state to the UART and the target reset line.
fn apply_line_state(uart: &mut UartTx<'static, Async>, reset: &mut Output<'static>, state: &LineState) {
    let settings = uart_settings(&state.coding);
    if let Err(e) = uart.apply_config(&uart_config(&settings)) {
        warn!("Bridge: rejected UART settings {:?}: {:?}", settings, e);
    } else {
        info!("Bridge: UART {:?}", settings);
    }

    if reset_line_high(state.dtr) {
        reset.set_high();
    } else {
        reset.set_low();
    }
}

/// Relay bytes between USB and the UART forever.
pub async fn bridge_task<'d, D: Driver<'d>>(
    mut bridge: SerialBridge<'static, BUFFER_SIZE>,
    mut port: PacketPort<BridgePipe<'d, D>>,
    mut uart: IoUart<UartTx<'static, Async>>,
    mut reset: Output<'static>,
    led_sender: LedSender,
) -> ! {
    // The UART keeps its boot settings until the host sets a coding
    let mut line = LineTracker::new(port.line_state());

    loop {
        let activity = bridge.poll(&mut port, &mut uart).await;

        if activity.to_host > 0 {
            let _ = led_sender.try_send(LedPulse::Tx);
        }
        if activity.to_uart {
            let _ = led_sender.try_send(LedPulse::Rx);
        }

        if let Some(state) = line.update(port.line_state()) {
            apply_line_state(uart.inner_mut(), &mut reset, &state);
        }
    }
}

/// Feed bytes received on the UART into the device→host buffer.
pub async fn uart_rx_task(mut rx: UartRx<'static, Async>, mut sink: UartRxSink<'static, BUFFER_SIZE>) -> ! {
    let mut buf = [0u8; 32];
    let mut reported_drops = 0;

    loop {
        let n = match Read::read(&mut rx, &mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Bridge: UART receive error: {:?}", e);
                continue;
            }
        };

        let configured = USB_CONFIGURED.load(Ordering::Acquire);
        for &byte in &buf[..n] {
            sink.accept(byte, configured);
        }

        let dropped = sink.dropped();
        if dropped != reported_drops {
            // Bytes are discarded on purpose while no host is attached
            if configured {
                warn!("Bridge: UART overrun, {} bytes dropped so far", dropped);
            }
            reported_drops = dropped;
        }
    }
}
