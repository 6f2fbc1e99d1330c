//! This module provides the serial (virtual COM port) transport using the `serialport` crate.

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{ControllerError, StreamTransport};

/// Baud rate the GPIB-USB controller is usually run at. The virtual COM port ignores it.
const DEFAULT_BAUD_RATE: u32 = 115_200;

/// A blocking serial transport for the GPIB-USB controller.
#[derive(Debug)]
pub struct SerialTransport {}

impl SerialTransport {
    /// Try to open a serial transport with a simple configuration.
    ///
    /// The port is opened with 115200 baud, 8N1, and a timeout of three seconds.
    ///
    /// # Arguments
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    pub fn simple(port: &str) -> Result<StreamTransport<Box<dyn SerialPort>>, ControllerError> {
        let spb = serialport::new(port, DEFAULT_BAUD_RATE).timeout(Duration::from_secs(3));
        Self::full(spb)
    }

    /// Try to open a serial transport from a fully configured [`SerialPortBuilder`].
    ///
    /// See [`serialport::SerialPortBuilder`] and the [`serialport::new`] function for more details.
    pub fn full(
        spb: SerialPortBuilder,
    ) -> Result<StreamTransport<Box<dyn SerialPort>>, ControllerError> {
        let port = spb.open()?;
        let timeout = port.timeout();
        Ok(StreamTransport::new(port, timeout))
    }
}
