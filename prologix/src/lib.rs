//! Prologix: Drive GPIB instruments through a Prologix controller from Rust
//!
//! The Prologix GPIB-USB and GPIB-ETHERNET controllers bridge a byte stream (a virtual COM port
//! or a TCP socket) to a GPIB bus. Every line the host sends is either a command for the
//! controller itself, marked with a leading `++`, or data that the controller forwards to the
//! instrument currently addressed on the bus. This crate implements the host side of that
//! protocol:
//!
//! - [`Encoder`] formats controller commands and instrument commands.
//! - [`Controller`] runs the write/read round trips, including the explicit `++read eoi` trigger
//!   that is required when read-after-write is disabled, and keeps a local mirror of the
//!   controller configuration ([`Settings`]) in sync with the device.
//! - [`Transport`] is the byte-level seam to the physical link. [`StreamTransport`] works with any
//!   [`std::io::Read`] + [`std::io::Write`] type, [`TcpIpTransport`] and `SerialTransport` (feature
//!   `serial`) open the usual links, and [`LoopbackTransport`] lets you test code built on top of
//!   the controller without hardware.
//!
//! # Example
//!
//! ```no_run
//! use prologix::{Controller, ControllerConfig, TcpIpTransport};
//!
//! let transport = TcpIpTransport::simple("192.168.1.20").unwrap();
//! let mut ctrl = Controller::try_new(transport, ControllerConfig::new(5)).unwrap();
//!
//! println!("{}", ctrl.get_version().unwrap());
//! println!("{}", ctrl.query("*IDN?").unwrap());
//! ```
//!
//! # What this crate does not do
//!
//! The GPIB electrical layer and bus arbitration are handled by the controller hardware. This
//! crate does not know anything about instrument command sets (SCPI or otherwise), it only
//! carries them.
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.

#![warn(missing_docs)]

mod command;
mod controller;
mod engine;
mod gpib_term;
mod loopback;
#[cfg(feature = "serial")]
mod serial;
mod settings;
mod stream;
mod tcp_ip;

pub use command::{Encoder, escape_binary, mnemonic};
pub use controller::Controller;
pub use engine::{MAX_REPLY_LEN, Reply};
pub use gpib_term::GpibTerm;
pub use loopback::LoopbackTransport;
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
pub use settings::{
    ControllerConfig, GpibAddress, PRIMARY_ADDRESS_RANGE, READ_TIMEOUT_RANGE_MS,
    SECONDARY_ADDRESS_RANGE, Setting, Settings, Synced,
};
pub use stream::StreamTransport;
pub use tcp_ip::TcpIpTransport;

use std::time::Duration;

use thiserror::Error;

/// The error enum for everything the controller can run into.
///
/// Validation errors are raised before anything is written to the transport. Transport errors
/// are returned as they happen, nothing is retried. If you would like to retry a command, do so in
/// your own code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    /// A GPIB address is outside of the range the bus allows. The error contains the address and
    /// the inclusive range that would have been accepted.
    #[error("GPIB address {address} is out of range. Allowed range is [{min}, {max}]")]
    AddressOutOfRange {
        /// The address that is out of range.
        address: u8,
        /// The smallest allowed address.
        min: u8,
        /// The largest allowed address.
        max: u8,
    },
    /// The cached configuration disagreed with what the controller reported. The cache has
    /// already been updated to the reported value when you see this error.
    #[error("Internal state mismatch for {setting}: cached {cached}, controller reports {actual}")]
    InternalStateMismatch {
        /// The setting that was out of sync.
        setting: Setting,
        /// The value that was cached before the query.
        cached: String,
        /// The value the controller reported.
        actual: String,
    },
    /// Error when reading from/writing to the transport. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A reply grew beyond [`MAX_REPLY_LEN`] bytes without a delimiter. The bytes read so far are
    /// discarded.
    #[error("Reply to {query} exceeded {limit} bytes without a delimiter")]
    ReplyTooLong {
        /// The query the reply belongs to.
        query: String,
        /// The limit that was hit.
        limit: usize,
    },
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial transport. See the
    /// [`serialport::Error`] documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    /// The transport timed out while reading a single byte.
    #[error("Timeout occured while waiting for data from the controller. Timeout was set to {0:?}.")]
    Timeout(Duration),
    /// No reply at all arrived for a query before the transport timed out.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
    /// A read timeout outside of what the controller supports was requested or reported.
    #[error("Read timeout {value} ms is out of range. Allowed range is [{min}, {max}] ms")]
    TimeoutOutOfRange {
        /// The timeout in milliseconds.
        value: u32,
        /// The smallest allowed timeout in milliseconds.
        min: u32,
        /// The largest allowed timeout in milliseconds.
        max: u32,
    },
    /// The controller answered with something that could not be interpreted. The raw response is
    /// kept for diagnostics.
    #[error("Response to {query} could not be parsed. Response was: {response:?}")]
    UnparsableResponse {
        /// The query that was sent.
        query: String,
        /// The raw response that was received.
        response: String,
    },
}

/// The `Transport` trait is the byte-level link between the host and the controller.
///
/// Opening, closing, and configuring the physical link (baud rate, sockets, USB) is entirely up
/// to the implementation. The controller only ever writes complete lines and reads single bytes
/// back until it finds its delimiter.
pub trait Transport {
    /// Write all bytes to the link and flush it.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), ControllerError>;

    /// Read one byte from the link.
    ///
    /// Returns `Ok(None)` when the stream has ended. A link that timed out must return
    /// [`ControllerError::Timeout`].
    fn read_byte(&mut self) -> Result<Option<u8>, ControllerError>;

    /// Get the read timeout of the link. Defaults to three seconds.
    ///
    /// This is the timeout reported in [`ControllerError::TimeoutQuery`].
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        (**self).write_raw(data)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ControllerError> {
        (**self).read_byte()
    }

    fn get_timeout(&self) -> Duration {
        (**self).get_timeout()
    }
}
