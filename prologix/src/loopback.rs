//! The loopback module provides a controller simulator for testing purposes.
//!
//! The [`LoopbackTransport`] checks every line the host writes against a script and answers with
//! scripted replies. Use it to test code that is built on top of a [`crate::Controller`] without
//! any hardware attached.

use std::collections::VecDeque;

use crate::{ControllerError, Transport};

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }
}

/// A scripted transport that allows you to simply write tests against a controller.
///
/// # Example
///
/// Every controller session starts with its initialization sequence, so the script contains those
/// lines first. Here, the instrument is then queried for its name.
///
/// ```
/// use prologix::{Controller, ControllerConfig, LoopbackTransport};
///
/// let host2ctrl = vec![
///     "++savecfg 0", "++addr 9", "++mode 1", "++auto 0", "++eoi 1", "++eos 0",
///     "++read_tmo_ms 500", "++eot_char 10", "++eot_enable 1", "++savecfg 1",
///     "*IDN?", "++read eoi",
/// ];
/// let ctrl2host = vec!["MyInstrument,1.0,1234"];
/// let transport = LoopbackTransport::new(host2ctrl, ctrl2host);
///
/// let mut ctrl = Controller::try_new(transport, ControllerConfig::new(9)).unwrap();
/// assert_eq!("MyInstrument,1.0,1234", ctrl.query("*IDN?").unwrap());
///
/// // Dropping the controller drops the transport, which panics if any scripted line is left.
/// ```
#[derive(Debug)]
pub struct LoopbackTransport {
    from_host: Vec<String>,
    from_inst: Vec<String>,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    terminator: u8,
    delimiter: u8,
}

impl LoopbackTransport {
    /// Create a new loopback transport with the given lines to and from the controller.
    ///
    /// Lines are expected and served in order. Whenever the host writes something that is not the
    /// next expected line followed by the terminator, the [`LoopbackTransport`] panics. Replies are
    /// served followed by the delimiter. When the transport is dropped, [`LoopbackTransport::finalize`]
    /// is called and panics if not all lines have been used. This way, your tests ensure that
    /// exactly the scripted conversation took place.
    ///
    /// Both terminator and delimiter default to `b'\n'`, see [`LoopbackTransport::with_terminators`].
    ///
    /// # Arguments:
    /// * `from_host` - Lines from host to controller, without terminator.
    /// * `from_inst` - Replies from controller to host, without delimiter.
    pub fn new<H: Into<String>, I: Into<String>>(from_host: Vec<H>, from_inst: Vec<I>) -> Self {
        LoopbackTransport {
            from_host: from_host.into_iter().map(Into::into).collect(),
            from_inst: from_inst.into_iter().map(Into::into).collect(),
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            terminator: b'\n',
            delimiter: b'\n',
        }
    }

    /// Set the terminator expected after host lines and the delimiter appended to replies.
    pub fn with_terminators(mut self, terminator: u8, delimiter: u8) -> Self {
        self.terminator = terminator;
        self.delimiter = delimiter;
        self
    }

    /// This command panics if not all lines in the [`LoopbackTransport`] have been used.
    ///
    /// It is automatically called when the [`LoopbackTransport`] is dropped, but you can also call
    /// it manually to ensure that all lines have been used.
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.next());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.next());
        if let Some(fil) = from_host_leftover {
            panic!("Leftover expected lines found from host to controller: {fil}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover expected replies found from controller to host: {fil}");
        }
    }

    /// Get the next line from host to controller including the terminator, or panic.
    fn get_next_from_host(&mut self) -> Vec<u8> {
        let line = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more lines were expected from host to controller.");
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(self.terminator);
        bytes
    }

    /// Get the next reply from controller to host including the delimiter, or panic.
    fn get_next_from_inst(&mut self) -> VecDeque<u8> {
        let reply = self
            .from_inst
            .get(self.from_inst_index.next())
            .expect("No more replies were expected from controller to host.");
        let mut bytes: VecDeque<u8> = reply.bytes().collect();
        bytes.push_back(self.delimiter);
        bytes
    }
}

impl Transport for LoopbackTransport {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        let exp = self.get_next_from_host();
        assert_eq!(
            exp,
            data,
            "Expected line {:?}, got {:?}",
            String::from_utf8_lossy(&exp),
            String::from_utf8_lossy(data)
        );
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ControllerError> {
        if self.curr_bytes.is_empty() {
            self.curr_bytes = self.get_next_from_inst();
        }
        Ok(self.curr_bytes.pop_front())
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}

// Tests of internal functionality
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incrementing_index() {
        let mut idx = IncrIndex::default();
        assert_eq!(0, idx.next());
        assert_eq!(1, idx.next());
        assert_eq!(2, idx.next());
    }
}
