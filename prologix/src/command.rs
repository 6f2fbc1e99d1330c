//! Formatting of the lines that are sent to the controller.
//!
//! There are two kinds of lines: controller commands, which start with `++` and are interpreted by
//! the controller itself, and instrument commands, which the controller forwards to the
//! instrument at the current GPIB address. Both are terminated with the transport terminator.

/// Marker that tells the controller a line is meant for itself.
pub const CONTROLLER_MARKER: &str = "++";

/// Escape character of the controller, used to pass reserved bytes through to the instrument.
pub const ESC: u8 = 27;

/// Mnemonics of the controller commands used by this crate.
pub mod mnemonic {
    /// Primary (and secondary) GPIB address.
    pub const ADDR: &str = "addr";
    /// Read-after-write.
    pub const AUTO: &str = "auto";
    /// Selected Device Clear.
    pub const CLR: &str = "clr";
    /// EOI assertion with the last byte.
    pub const EOI: &str = "eoi";
    /// GPIB termination.
    pub const EOS: &str = "eos";
    /// Character appended to data sent to the host when EOI is detected.
    pub const EOT_CHAR: &str = "eot_char";
    /// Enable appending of the EOT character.
    pub const EOT_ENABLE: &str = "eot_enable";
    /// Interface Clear.
    pub const IFC: &str = "ifc";
    /// Local lockout of the instrument front panel.
    pub const LLO: &str = "llo";
    /// Return the instrument to local (front panel) operation.
    pub const LOC: &str = "loc";
    /// Controller or device mode.
    pub const MODE: &str = "mode";
    /// Read from the instrument.
    pub const READ: &str = "read";
    /// Read timeout in milliseconds.
    pub const READ_TMO_MS: &str = "read_tmo_ms";
    /// Power-on reset of the controller.
    pub const RST: &str = "rst";
    /// Save configuration parameters to EEPROM.
    pub const SAVECFG: &str = "savecfg";
    /// Serial poll of the addressed instrument.
    pub const SPOLL: &str = "spoll";
    /// State of the SRQ line.
    pub const SRQ: &str = "srq";
    /// Group Execute Trigger.
    pub const TRG: &str = "trg";
    /// Controller firmware version.
    pub const VER: &str = "ver";
}

/// Encoder for controller and instrument lines.
///
/// The encoder only knows the transport terminator, i.e., the byte that ends a line between the
/// host and the controller. Formatting is pure, nothing is validated here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoder {
    terminator: u8,
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder { terminator: b'\n' }
    }
}

impl Encoder {
    /// Create a new encoder with the given transport terminator.
    pub fn new(terminator: u8) -> Self {
        Encoder { terminator }
    }

    /// Get the transport terminator.
    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    /// Encode a command for the controller itself.
    ///
    /// The mnemonic is lower-cased, as controller commands are case insensitive, and prefixed with
    /// `++`. Arguments are separated by a single space if there are any.
    ///
    /// # Arguments
    /// * `name` - The mnemonic of the command, e.g., `"EOI"`.
    /// * `args` - The arguments, e.g., `"1"`, or an empty string.
    pub fn controller(&self, name: &str, args: &str) -> Vec<u8> {
        let name = name.trim().to_lowercase();
        let args = args.trim();

        let mut line = Vec::with_capacity(CONTROLLER_MARKER.len() + name.len() + args.len() + 2);
        line.extend_from_slice(CONTROLLER_MARKER.as_bytes());
        line.extend_from_slice(name.as_bytes());
        if !args.is_empty() {
            line.push(b' ');
            line.extend_from_slice(args.as_bytes());
        }
        line.push(self.terminator);
        line
    }

    /// Encode a command for the addressed instrument.
    ///
    /// Surrounding whitespace is trimmed, everything else is passed through verbatim.
    pub fn instrument(&self, text: &str) -> Vec<u8> {
        let mut line = text.trim().as_bytes().to_vec();
        line.push(self.terminator);
        line
    }

    /// Encode binary data for the addressed instrument.
    ///
    /// Reserved bytes are escaped with [`escape_binary`] so that the controller forwards them
    /// instead of interpreting them.
    pub fn instrument_binary(&self, data: &[u8]) -> Vec<u8> {
        let mut line = escape_binary(data);
        line.push(self.terminator);
        line
    }
}

/// Escape CR, LF, ESC, and `+` with a preceding ESC byte.
///
/// Unescaped, the controller would treat these bytes as line ends or as the start of a controller
/// command.
pub fn escape_binary(data: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(data.len());
    for &byte in data {
        if matches!(byte, b'\r' | b'\n' | ESC | b'+') {
            escaped.push(ESC);
        }
        escaped.push(byte);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_args_have_no_trailing_space() {
        let enc = Encoder::default();
        assert_eq!(enc.controller("ver", ""), b"++ver\n");
        assert_eq!(enc.controller("ver", "   "), b"++ver\n");
    }

    #[test]
    fn test_escape_leaves_plain_bytes() {
        assert_eq!(escape_binary(b"#14abcd"), b"#14abcd");
    }
}
