//! A [`Transport`] on top of any byte stream.
//!
//! It can be used with any type that implements [`std::io::Read`] and [`std::io::Write`], such as
//! [`std::net::TcpStream`] or a `serialport::SerialPort`.

use std::{
    io::{ErrorKind, Read, Write},
    time::Duration,
};

use crate::{ControllerError, Transport};

/// A transport that can be built from anything that implements [`std::io::Read`] and
/// [`std::io::Write`].
///
/// Handy shortcuts for the usual links are provided by [`crate::TcpIpTransport`] and
/// `SerialTransport`. However, this general implementation can also be used with any other type.
///
/// The timeout given here is only reported in errors. The stream itself has to be configured to
/// time out, otherwise a read blocks until data arrives.
///
/// # Example
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use prologix::StreamTransport;
///
/// let stream = TcpStream::connect("192.168.1.20:1234").unwrap();
/// let transport = StreamTransport::new(stream, Duration::from_secs(3));
/// ```
#[derive(Debug)]
pub struct StreamTransport<P: Read + Write> {
    port: P,
    timeout: Duration,
}

impl<P: Read + Write> StreamTransport<P> {
    /// Create a new transport from a stream and the read timeout of that stream.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &P {
        &self.port
    }

    /// Consume the transport and return the underlying stream.
    pub fn into_inner(self) -> P {
        self.port
    }
}

impl<P: Read + Write> Transport for StreamTransport<P> {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ControllerError> {
        let mut buf = [0u8];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(ControllerError::Timeout(self.timeout));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }
}
