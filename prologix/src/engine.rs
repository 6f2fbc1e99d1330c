//! The write/read round trips on top of a [`Transport`].

use log::{debug, trace, warn};

use crate::{ControllerError, Encoder, Settings, Transport, command::mnemonic};

/// Longest reply that is read before giving up on finding the delimiter.
pub const MAX_REPLY_LEN: usize = 1 << 20;

/// A reply read from the controller.
///
/// A reply is complete when the delimiter was found. The stream may also end without one, e.g.,
/// when EOT characters are disabled or the link timed out after some data arrived. In that case
/// the bytes received so far are kept and the reply is marked as incomplete. This is not an
/// error: GPIB transfers may legitimately end without the delimiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    data: Vec<u8>,
    complete: bool,
}

impl Reply {
    /// The received bytes, without the delimiter.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the reply ended with the delimiter.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The reply as text with surrounding whitespace trimmed. Invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).trim().to_string()
    }

    /// Consume the reply and return the received bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Everything that has to be guarded by one lock: the link and the cache.
pub(crate) struct Session<T: Transport> {
    transport: T,
    encoder: Encoder,
    pub(crate) settings: Settings,
}

impl<T: Transport> Session<T> {
    pub(crate) fn new(transport: T, settings: Settings) -> Self {
        Session {
            transport,
            encoder: Encoder::new(settings.transport_terminator),
            settings,
        }
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), ControllerError> {
        debug!("Sending {:?}", String::from_utf8_lossy(line));
        self.transport.write_raw(line)
    }

    /// Send a command to the controller itself.
    pub(crate) fn sendcmd_controller(
        &mut self,
        name: &str,
        args: &str,
    ) -> Result<(), ControllerError> {
        let line = self.encoder.controller(name, args);
        self.write_line(&line)
    }

    /// Query the controller itself.
    pub(crate) fn query_controller(
        &mut self,
        name: &str,
        args: &str,
    ) -> Result<Reply, ControllerError> {
        self.sendcmd_controller(name, args)?;
        self.read_reply(name)
    }

    /// Send a command to the addressed instrument.
    pub(crate) fn sendcmd(&mut self, cmd: &str) -> Result<(), ControllerError> {
        let line = self.encoder.instrument(cmd);
        self.write_line(&line)
    }

    /// Send binary data to the addressed instrument.
    pub(crate) fn write_binary(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        let line = self.encoder.instrument_binary(data);
        self.write_line(&line)
    }

    /// Query the addressed instrument.
    ///
    /// Without read-after-write the controller has to be told explicitly to address the
    /// instrument to talk, otherwise the read would block until the transport times out.
    pub(crate) fn query(&mut self, cmd: &str) -> Result<Reply, ControllerError> {
        self.sendcmd(cmd)?;
        if !self.settings.auto_read {
            self.trigger_read()?;
        }
        self.read_reply(cmd)
    }

    /// Read from the addressed instrument without sending anything first.
    pub(crate) fn read(&mut self) -> Result<Reply, ControllerError> {
        if !self.settings.auto_read {
            self.trigger_read()?;
        }
        self.read_reply(mnemonic::READ)
    }

    fn trigger_read(&mut self) -> Result<(), ControllerError> {
        trace!("Read-after-write is off, requesting read until EOI");
        self.sendcmd_controller(mnemonic::READ, "eoi")
    }

    /// Read bytes until the EOT character, the end of the stream, or a timeout.
    ///
    /// A stream that keeps sending without a delimiter is cut off after [`MAX_REPLY_LEN`] bytes.
    ///
    /// # Arguments
    /// * `query` - The query the reply belongs to, only used for errors and logging.
    fn read_reply(&mut self, query: &str) -> Result<Reply, ControllerError> {
        let delimiter = self.settings.eot_char;
        let mut data = Vec::new();

        loop {
            match self.transport.read_byte() {
                Ok(Some(byte)) if byte == delimiter => {
                    debug!("Received {:?}", String::from_utf8_lossy(&data));
                    return Ok(Reply {
                        data,
                        complete: true,
                    });
                }
                Ok(Some(_)) if data.len() == MAX_REPLY_LEN => {
                    return Err(ControllerError::ReplyTooLong {
                        query: query.to_string(),
                        limit: MAX_REPLY_LEN,
                    });
                }
                Ok(Some(byte)) => data.push(byte),
                Ok(None) => {
                    warn!(
                        "Stream ended before the delimiter in reply to {query}, returning {} bytes",
                        data.len()
                    );
                    return Ok(Reply {
                        data,
                        complete: false,
                    });
                }
                Err(ControllerError::Timeout(_)) if data.is_empty() => {
                    return Err(ControllerError::TimeoutQuery {
                        query: query.to_string(),
                        timeout: self.transport.get_timeout(),
                    });
                }
                Err(ControllerError::Timeout(timeout)) => {
                    warn!(
                        "Timeout of {timeout:?} before the delimiter in reply to {query}, returning {} bytes",
                        data.len()
                    );
                    return Ok(Reply {
                        data,
                        complete: false,
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
