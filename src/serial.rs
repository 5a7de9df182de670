use std::io::{self, BufRead, BufReader};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serialport::SerialPort;

/// Line-oriented reader over the device's serial port.
///
/// The port is opened with a read timeout so `read_line` returns regularly and
/// the transport thread can notice a stop request.
pub struct SerialSession {
    port_name: String,
    reader: BufReader<Box<dyn SerialPort>>,
    pending: Vec<u8>,
}

impl SerialSession {
    pub fn connect(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .with_context(|| format!("failed to open serial port {port_name}"))?;
        Ok(Self {
            port_name: port_name.to_string(),
            reader: BufReader::new(port),
            pending: Vec::new(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Next complete line without its terminator, or `None` if the read timed out
    /// first. Partial lines are kept until the rest arrives.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => bail!("serial port {} closed", self.port_name),
            Ok(_) if self.pending.last() == Some(&b'\n') => Ok(Some(self.take_line())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read from {} failed", self.port_name)),
        }
    }

    fn take_line(&mut self) -> String {
        let line = decode_line(&self.pending);
        self.pending.clear();
        line
    }
}

/// Lossy UTF-8 decode with surrounding whitespace (and `\r\n`) removed.
pub fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Names of the serial ports the OS currently reports.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(err) => {
            log::warn!("failed to list serial ports: {err}");
            Vec::new()
        }
    }
}
