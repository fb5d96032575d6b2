//! USB ⇄ UART serial bridge
//!
//! - `engine`: the poll loop relaying bytes in both directions
//! - `uart_rx`: producer side of the device→host buffer
//! - `line`: CDC line coding and DTR handling
//! - `packet`: USB packets adapted to the engine's byte interface
//! - `uart_tx`: UART transmitter adapted to the engine
//! - `traits`: transport seams implemented by the embedded build and mocks

pub mod engine;
pub mod line;
pub mod packet;
pub mod traits;
pub mod uart_rx;
pub mod uart_tx;

pub use engine::{PollActivity, SerialBridge};
pub use line::{reset_line_high, uart_settings, LineCoding, LineState, LineTracker, UartSettings};
pub use packet::{PacketPipe, PacketPort};
pub use traits::{PortError, UartPort, UsbDataPort};
pub use uart_rx::UartRxSink;
pub use uart_tx::IoUart;
