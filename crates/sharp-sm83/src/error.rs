//! Execution errors.

use std::fmt;

/// Error raised while executing instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    /// The fetched byte names one of the undefined base opcodes.
    IllegalOpcode { opcode: u8, address: u16 },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalOpcode { opcode, address } => {
                write!(f, "illegal opcode ${opcode:02X} at ${address:04X}")
            }
        }
    }
}

impl std::error::Error for ExecError {}
