//! UART transmitter adapter for the bridge engine.

use embedded_io::{Error as _, Write, WriteReady};
use log::debug;

use crate::bridge::traits::UartPort;

/// Byte-at-a-time transmitter over an `embedded_io` writer.
///
/// Bytes are only written after `write_ready` reported FIFO space, so a
/// write never waits. A write the UART still refuses loses that byte; the
/// loss is logged and counted.
pub struct IoUart<W> {
    inner: W,
    write_failures: u32,
}

impl<W> IoUart<W>
where
    W: Write + WriteReady,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            write_failures: 0,
        }
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Bytes lost to refused writes (wrapping)
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }
}

impl<W> UartPort for IoUart<W>
where
    W: Write + WriteReady,
{
    fn send_ready(&mut self) -> bool {
        self.inner.write_ready().unwrap_or(false)
    }

    fn send_byte(&mut self, byte: u8) {
        match self.inner.write(&[byte]) {
            Ok(1) => return,
            Ok(_) => debug!("UART: byte {:#04x} not accepted", byte),
            Err(e) => debug!("UART: write of {:#04x} failed: {:?}", byte, e.kind()),
        }
        self.write_failures = self.write_failures.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{ErrorKind, ErrorType};

    /// How the fake transmitter answers writes
    #[derive(Clone, Copy, PartialEq)]
    enum Behaviour {
        Accept,
        AcceptNothing,
        Fail,
    }

    struct FakeTx {
        behaviour: Behaviour,
        ready: bool,
        written: heapless::Vec<u8, 16>,
    }

    impl FakeTx {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                ready: true,
                written: heapless::Vec::new(),
            }
        }
    }

    impl ErrorType for FakeTx {
        type Error = ErrorKind;
    }

    impl Write for FakeTx {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            match self.behaviour {
                Behaviour::Accept => {
                    let _ = self.written.extend_from_slice(buf);
                    Ok(buf.len())
                }
                Behaviour::AcceptNothing => Ok(0),
                Behaviour::Fail => Err(ErrorKind::Other),
            }
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl WriteReady for FakeTx {
        fn write_ready(&mut self) -> Result<bool, Self::Error> {
            if self.behaviour == Behaviour::Fail {
                return Err(ErrorKind::Other);
            }
            Ok(self.ready)
        }
    }

    #[test]
    fn test_bytes_written_in_order() {
        let mut uart = IoUart::new(FakeTx::new(Behaviour::Accept));
        for &byte in b"AT\r" {
            assert!(uart.send_ready());
            uart.send_byte(byte);
        }
        assert_eq!(uart.inner_mut().written.as_slice(), b"AT\r");
        assert_eq!(uart.write_failures(), 0);
    }

    #[test]
    fn test_zero_length_write_counted() {
        let mut uart = IoUart::new(FakeTx::new(Behaviour::AcceptNothing));
        uart.send_byte(0x01);
        uart.send_byte(0x02);
        assert_eq!(uart.write_failures(), 2);
    }

    #[test]
    fn test_write_error_counted() {
        let mut uart = IoUart::new(FakeTx::new(Behaviour::Fail));
        uart.send_byte(0x55);
        assert_eq!(uart.write_failures(), 1);
    }

    #[test]
    fn test_readiness_follows_writer() {
        let mut uart = IoUart::new(FakeTx::new(Behaviour::Accept));
        uart.inner_mut().ready = false;
        assert!(!uart.send_ready());

        let mut failing = IoUart::new(FakeTx::new(Behaviour::Fail));
        assert!(!failing.send_ready());
    }
}
