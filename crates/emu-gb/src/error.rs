//! Machine-level errors.

use std::fmt;

use sharp_sm83::ExecError;

/// Largest cartridge image that fits without bank switching.
pub const MAX_ROM_SIZE: usize = 0x8000;

/// Error raised while building or running the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GbError {
    /// The CPU hit an undefined opcode.
    Cpu(ExecError),
    /// The cartridge image is larger than the 32 KiB ROM window.
    RomTooLarge(usize),
    /// The cartridge image is empty.
    EmptyRom,
}

impl fmt::Display for GbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu(e) => write!(f, "CPU fault: {e}"),
            Self::RomTooLarge(len) => write!(
                f,
                "ROM too large: {len} bytes (at most {MAX_ROM_SIZE} without bank switching)"
            ),
            Self::EmptyRom => f.write_str("ROM is empty"),
        }
    }
}

impl std::error::Error for GbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExecError> for GbError {
    fn from(e: ExecError) -> Self {
        Self::Cpu(e)
    }
}
