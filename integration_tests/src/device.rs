//! Serial client for the bridge's CDC-ACM port.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::{SerialPort, SerialPortType};

use crate::ids::{PLAIN_PID, PLAIN_VID};

/// Find the bridge's serial port by USB VID/PID.
pub fn find_bridge_port() -> Result<String> {
    let ports = serialport::available_ports()?;

    for port_info in ports {
        if let SerialPortType::UsbPort(usb) = &port_info.port_type {
            if usb.vid == PLAIN_VID && usb.pid == PLAIN_PID {
                return Ok(port_info.port_name);
            }
        }
    }

    anyhow::bail!(
        "No bridge found ({:04x}:{:04x}) - ensure it is connected and in plain mode",
        PLAIN_VID,
        PLAIN_PID
    )
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_bridge_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Client talking through the bridge to whatever sits on the UART.
pub struct BridgeClient {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl BridgeClient {
    /// Open the port. DTR is released so the target is not held in reset.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let mut port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        port.write_data_terminal_ready(false)?;

        Ok(Self {
            port,
            timeout: Duration::from_secs(2),
        })
    }

    /// Change the line coding; the bridge applies it to its UART.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.port.set_baud_rate(baud_rate)?;
        Ok(())
    }

    pub fn set_dtr(&mut self, level: bool) -> Result<()> {
        self.port.write_data_terminal_ready(level)?;
        Ok(())
    }

    /// Drain all pending data from the serial port.
    pub fn drain_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;

        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Write `data` and read back the same number of bytes.
    ///
    /// Writes in chunks no larger than the bridge buffer so a looped-back
    /// UART never overruns it while the host is busy writing.
    pub fn echo(&mut self, data: &[u8], chunk: usize) -> Result<Vec<u8>> {
        let mut received = Vec::with_capacity(data.len());

        for piece in data.chunks(chunk) {
            self.port.write_all(piece)?;
            self.port.flush()?;
            let target = received.len() + piece.len();
            self.read_until(&mut received, target)?;
        }

        Ok(received)
    }

    /// Read until `buf` holds `len` bytes or the timeout expires.
    fn read_until(&mut self, buf: &mut Vec<u8>, len: usize) -> Result<()> {
        let mut chunk = [0u8; 64];
        let start = Instant::now();

        while buf.len() < len && start.elapsed() < self.timeout {
            match self.port.read(&mut chunk) {
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if buf.len() < len {
            anyhow::bail!("Timeout: expected {} bytes, got {}", len, buf.len());
        }
        Ok(())
    }
}
