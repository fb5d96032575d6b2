//! Byte buffers shared between the USB and UART sides of the bridge

pub mod ring;

pub use ring::{Consumer, Producer, RingBuffer};
