//! GPIB termination characters the controller appends to data sent to the instrument.

use std::fmt::Display;

/// The termination the controller appends to everything it forwards to the instrument.
///
/// This is the GPIB side of the link and independent of the terminator used between the host and
/// the controller. The discriminant is the value of the `++eos` command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GpibTerm {
    /// Append CR+LF.
    #[default]
    AppendCrLf = 0,
    /// Append CR only.
    AppendCr = 1,
    /// Append LF only.
    AppendLf = 2,
    /// Append nothing.
    AppendNothing = 3,
}

impl GpibTerm {
    /// All terminations, ordered by their `++eos` value.
    pub const ALL: [GpibTerm; 4] = [
        GpibTerm::AppendCrLf,
        GpibTerm::AppendCr,
        GpibTerm::AppendLf,
        GpibTerm::AppendNothing,
    ];

    /// The value used on the wire by the `++eos` command.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// A human readable description of the termination.
    pub fn description(self) -> &'static str {
        match self {
            GpibTerm::AppendCrLf => "Append CR+LF to instrument commands",
            GpibTerm::AppendCr => "Append CR to instrument commands",
            GpibTerm::AppendLf => "Append LF to instrument commands",
            GpibTerm::AppendNothing => "Do not append anything to instrument commands",
        }
    }
}

impl Display for GpibTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl TryFrom<u8> for GpibTerm {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GpibTerm::ALL.get(value as usize).copied().ok_or(value)
    }
}
