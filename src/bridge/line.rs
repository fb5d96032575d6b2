//! CDC line coding and control line handling
//!
//! The host picks a line coding through SET_LINE_CODING; the UART follows it
//! as far as the hardware supports. DTR doubles as the target reset line so
//! opening the port resets the attached MCU.

use crate::config::uart::DEFAULT_BAUD_RATE;

/// Stop bits as requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    OnePointFive,
    Two,
}

/// Parity as requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

/// CDC line coding (SET_LINE_CODING payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCoding {
    pub baud_rate: u32,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub data_bits: u8,
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            stop_bits: StopBits::One,
            parity: Parity::None,
            data_bits: 8,
        }
    }
}

/// Line coding and DTR as last set by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineState {
    pub coding: LineCoding,
    pub dtr: bool,
}

/// UART parity the transmitter can actually produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartParity {
    None,
    Odd,
    Even,
}

/// UART stop bits the transmitter can actually produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartStopBits {
    One,
    Two,
}

/// Settings to apply to the UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: UartParity,
    pub stop_bits: UartStopBits,
}

/// Map a host line coding onto supported UART settings.
///
/// Unsupported parities fall back to none, 1.5 stop bits to one, and data
/// widths outside 5..=8 to eight bits.
pub fn uart_settings(coding: &LineCoding) -> UartSettings {
    let parity = match coding.parity {
        Parity::Odd => UartParity::Odd,
        Parity::Even => UartParity::Even,
        Parity::None | Parity::Mark | Parity::Space => UartParity::None,
    };

    let stop_bits = match coding.stop_bits {
        StopBits::Two => UartStopBits::Two,
        StopBits::One | StopBits::OnePointFive => UartStopBits::One,
    };

    let data_bits = match coding.data_bits {
        5..=8 => coding.data_bits,
        _ => 8,
    };

    let baud_rate = if coding.baud_rate == 0 {
        DEFAULT_BAUD_RATE
    } else {
        coding.baud_rate
    };

    UartSettings {
        baud_rate,
        data_bits,
        parity,
        stop_bits,
    }
}

/// Level of the target reset line for a DTR state.
///
/// Reset is active low: asserting DTR holds the target in reset.
pub fn reset_line_high(dtr: bool) -> bool {
    !dtr
}

/// Tracks the host's line state and reports the changes to apply.
///
/// Seeded with what the transport reports before any host request. That
/// value is the USB stack's placeholder coding, not something the host
/// asked for, so it is never applied.
pub struct LineTracker {
    applied: Option<LineState>,
}

impl LineTracker {
    pub fn new(initial: Option<LineState>) -> Self {
        Self { applied: initial }
    }

    /// The new state if it differs from the last one seen.
    pub fn update(&mut self, current: Option<LineState>) -> Option<LineState> {
        if current == self.applied {
            return None;
        }
        self.applied = current;
        current
    }
}
