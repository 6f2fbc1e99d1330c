//! This module provides the TCP/IP transport for the GPIB-ETHERNET controller.

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{ControllerError, StreamTransport};

/// TCP port the GPIB-ETHERNET controller listens on.
const DEFAULT_PORT: u16 = 1234;

/// A blocking TCP/IP transport using [`std::net::TcpStream`].
#[derive(Debug)]
pub struct TcpIpTransport {}

impl TcpIpTransport {
    /// Try to connect to a GPIB-ETHERNET controller on its default port.
    ///
    /// Read and write timeouts are set to three seconds, so that a missing reply does not block
    /// forever.
    ///
    /// # Arguments
    /// * `host` - Host name or IP address of the controller.
    pub fn simple(host: &str) -> Result<StreamTransport<TcpStream>, ControllerError> {
        Self::full((host, DEFAULT_PORT), Duration::from_secs(3))
    }

    /// Try to connect to a given socket address with the given read and write timeout.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Read and write timeout of the socket.
    pub fn full<A: ToSocketAddrs>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<StreamTransport<TcpStream>, ControllerError> {
        let stream = TcpStream::connect(sock_addr)?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(StreamTransport::new(stream, timeout))
    }
}
