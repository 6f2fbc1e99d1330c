//! Configuration of the controller and the local mirror of its state.

use std::{fmt::Display, ops::RangeInclusive};

use log::warn;

use crate::{ControllerError, GpibTerm};

/// Valid primary GPIB addresses.
pub const PRIMARY_ADDRESS_RANGE: RangeInclusive<u8> = 0..=30;

/// Valid secondary GPIB addresses.
pub const SECONDARY_ADDRESS_RANGE: RangeInclusive<u8> = 96..=126;

/// Valid read timeouts of the controller in milliseconds.
pub const READ_TIMEOUT_RANGE_MS: RangeInclusive<u32> = 1..=3000;

pub(crate) fn check_primary_address(address: u8) -> Result<u8, ControllerError> {
    check_address(address, &PRIMARY_ADDRESS_RANGE)
}

pub(crate) fn check_secondary_address(address: u8) -> Result<u8, ControllerError> {
    check_address(address, &SECONDARY_ADDRESS_RANGE)
}

fn check_address(address: u8, range: &RangeInclusive<u8>) -> Result<u8, ControllerError> {
    if range.contains(&address) {
        Ok(address)
    } else {
        Err(ControllerError::AddressOutOfRange {
            address,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

pub(crate) fn check_read_timeout(value: u32) -> Result<u32, ControllerError> {
    if READ_TIMEOUT_RANGE_MS.contains(&value) {
        Ok(value)
    } else {
        Err(ControllerError::TimeoutOutOfRange {
            value,
            min: *READ_TIMEOUT_RANGE_MS.start(),
            max: *READ_TIMEOUT_RANGE_MS.end(),
        })
    }
}

/// A validated GPIB address, consisting of a primary and an optional secondary address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpibAddress {
    primary: u8,
    secondary: Option<u8>,
}

impl GpibAddress {
    /// Create a new address, checking both parts against their allowed ranges.
    ///
    /// # Arguments
    /// * `primary` - Primary address, see [`PRIMARY_ADDRESS_RANGE`].
    /// * `secondary` - Optional secondary address, see [`SECONDARY_ADDRESS_RANGE`].
    pub fn try_new(primary: u8, secondary: Option<u8>) -> Result<Self, ControllerError> {
        let primary = check_primary_address(primary)?;
        let secondary = secondary.map(check_secondary_address).transpose()?;
        Ok(GpibAddress { primary, secondary })
    }

    /// Get the primary address.
    pub fn primary(&self) -> u8 {
        self.primary
    }

    /// Get the secondary address, if any.
    pub fn secondary(&self) -> Option<u8> {
        self.secondary
    }
}

impl Display for GpibAddress {
    /// Formats the address the way the `++addr` command takes it, e.g. `5` or `5 96`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.secondary {
            Some(secondary) => write!(f, "{} {}", self.primary, secondary),
            None => write!(f, "{}", self.primary),
        }
    }
}

/// Configuration that is written to the controller when a [`crate::Controller`] is created.
///
/// All fields are plain data. Use [`ControllerConfig::new`] to start from the defaults with a given
/// primary address and change whatever you need.
///
/// ```
/// use prologix::{ControllerConfig, GpibTerm};
///
/// let cfg = ControllerConfig {
///     secondary_address: Some(96),
///     gpib_termination: GpibTerm::AppendLf,
///     clear_on_init: true,
///     ..ControllerConfig::new(22)
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Primary GPIB address of the instrument.
    pub primary_address: u8,
    /// Secondary GPIB address, only for instruments that need one.
    pub secondary_address: Option<u8>,
    /// Send a Selected Device Clear to the instrument during initialization.
    pub clear_on_init: bool,
    /// Read timeout of the controller in milliseconds.
    pub read_timeout_ms: u32,
    /// Let the controller read back from the instrument after every write.
    pub auto_read: bool,
    /// Assert EOI with the last byte of every instrument command.
    pub assert_eoi: bool,
    /// Termination the controller appends on the GPIB side.
    pub gpib_termination: GpibTerm,
    /// Byte the controller appends to instrument data when it detects EOI. This is the delimiter
    /// replies are read up to.
    ///
    /// With the default `b'\n'`, an instrument that itself ends its replies with `\n` and EOI
    /// produces two newlines per reply. The read stops at the first one and the second is left on
    /// the link, where the next query takes it for an empty reply. For such instruments, pick a
    /// byte that never occurs in the data, e.g., `4` (EOT), and the trailing newline is trimmed from
    /// the reply text.
    pub eot_char: u8,
    /// Byte that ends a line between host and controller.
    pub transport_terminator: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            primary_address: 0,
            secondary_address: None,
            clear_on_init: false,
            read_timeout_ms: 500,
            auto_read: false,
            assert_eoi: true,
            gpib_termination: GpibTerm::AppendCrLf,
            eot_char: b'\n',
            transport_terminator: b'\n',
        }
    }
}

impl ControllerConfig {
    /// Default configuration for an instrument at the given primary address.
    pub fn new(primary_address: u8) -> Self {
        ControllerConfig {
            primary_address,
            ..Default::default()
        }
    }

    /// Check all values against the ranges the controller accepts and return the address.
    pub fn validate(&self) -> Result<GpibAddress, ControllerError> {
        let address = GpibAddress::try_new(self.primary_address, self.secondary_address)?;
        check_read_timeout(self.read_timeout_ms)?;
        Ok(address)
    }
}

/// The local mirror of the controller configuration.
///
/// Values are only changed after the controller accepted the corresponding command, or when a
/// query showed that the controller is configured differently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub(crate) address: GpibAddress,
    pub(crate) auto_read: bool,
    pub(crate) assert_eoi: bool,
    pub(crate) gpib_termination: GpibTerm,
    pub(crate) read_timeout_ms: u32,
    pub(crate) eot_char: u8,
    pub(crate) eot_enable: bool,
    pub(crate) transport_terminator: u8,
}

impl Settings {
    pub(crate) fn new(cfg: &ControllerConfig, address: GpibAddress) -> Self {
        Settings {
            address,
            auto_read: cfg.auto_read,
            assert_eoi: cfg.assert_eoi,
            gpib_termination: cfg.gpib_termination,
            read_timeout_ms: cfg.read_timeout_ms,
            eot_char: cfg.eot_char,
            eot_enable: true,
            transport_terminator: cfg.transport_terminator,
        }
    }

    /// GPIB address of the instrument under control.
    pub fn address(&self) -> GpibAddress {
        self.address
    }

    /// Read-after-write mode.
    pub fn auto_read(&self) -> bool {
        self.auto_read
    }

    /// EOI assertion with the last byte of instrument commands.
    pub fn assert_eoi(&self) -> bool {
        self.assert_eoi
    }

    /// Termination appended on the GPIB side.
    pub fn gpib_termination(&self) -> GpibTerm {
        self.gpib_termination
    }

    /// Read timeout of the controller in milliseconds.
    pub fn read_timeout_ms(&self) -> u32 {
        self.read_timeout_ms
    }

    /// Delimiter of replies from the controller.
    pub fn eot_char(&self) -> u8 {
        self.eot_char
    }

    /// Whether the controller appends the EOT character when it detects EOI.
    pub fn eot_enable(&self) -> bool {
        self.eot_enable
    }

    /// Terminator of lines sent from host to controller.
    pub fn transport_terminator(&self) -> u8 {
        self.transport_terminator
    }
}

/// The cached settings that are checked against the controller when queried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Setting {
    /// GPIB address.
    Address,
    /// Read-after-write mode.
    AutoRead,
    /// EOI assertion.
    AssertEoi,
    /// GPIB termination.
    GpibTermination,
    /// Read timeout.
    ReadTimeout,
}

impl Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Address => write!(f, "GPIB address"),
            Setting::AutoRead => write!(f, "read-after-write"),
            Setting::AssertEoi => write!(f, "EOI assertion"),
            Setting::GpibTermination => write!(f, "GPIB termination"),
            Setting::ReadTimeout => write!(f, "read timeout"),
        }
    }
}

/// The result of reading back a cached setting from the controller.
///
/// Either the controller confirmed the cached value, or it reported something else. In the latter
/// case the cache has already been corrected and you decide whether the drift matters, e.g., by
/// calling [`Synced::into_result`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Synced<T> {
    /// The controller reported the cached value.
    Confirmed(T),
    /// The controller reported a different value, which is now cached.
    Corrected {
        /// The setting that drifted.
        setting: Setting,
        /// The value that was cached before.
        cached: T,
        /// The value reported by the controller.
        actual: T,
    },
}

impl<T> Synced<T> {
    /// The value reported by the controller.
    pub fn value(&self) -> &T {
        match self {
            Synced::Confirmed(value) => value,
            Synced::Corrected { actual, .. } => actual,
        }
    }

    /// Consume and return the value reported by the controller.
    pub fn into_value(self) -> T {
        match self {
            Synced::Confirmed(value) => value,
            Synced::Corrected { actual, .. } => actual,
        }
    }

    /// Whether the cache had to be corrected.
    pub fn is_corrected(&self) -> bool {
        matches!(self, Synced::Corrected { .. })
    }
}

impl<T: Display> Synced<T> {
    /// Treat a correction as an error.
    pub fn into_result(self) -> Result<T, ControllerError> {
        match self {
            Synced::Confirmed(value) => Ok(value),
            Synced::Corrected {
                setting,
                cached,
                actual,
            } => Err(ControllerError::InternalStateMismatch {
                setting,
                cached: cached.to_string(),
                actual: actual.to_string(),
            }),
        }
    }
}

/// Compare a freshly queried value with the cache and correct the cache if needed.
pub(crate) fn reconcile<T>(setting: Setting, cached: &mut T, actual: T) -> Synced<T>
where
    T: Copy + PartialEq + Display,
{
    if *cached == actual {
        return Synced::Confirmed(actual);
    }
    warn!("Internal state mismatch for {setting}: cached {cached}, controller reports {actual}");
    let cached_before = std::mem::replace(cached, actual);
    Synced::Corrected {
        setting,
        cached: cached_before,
        actual,
    }
}
