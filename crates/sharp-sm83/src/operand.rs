//! Operand selectors decoded from opcode bit fields.

use std::fmt;

/// 8-bit operand selector (3-bit field `rrr` in the opcode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    /// Memory at the address in HL.
    HlInd,
    A,
}

impl Reg8 {
    pub const ALL: [Reg8; 8] = [
        Reg8::B,
        Reg8::C,
        Reg8::D,
        Reg8::E,
        Reg8::H,
        Reg8::L,
        Reg8::HlInd,
        Reg8::A,
    ];

    /// Decode the low three bits of `bits`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 7) as usize]
    }

    /// True for the `(HL)` memory operand.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Reg8::HlInd)
    }
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
            Reg8::HlInd => "(HL)",
            Reg8::A => "A",
        })
    }
}

/// 16-bit pair selector for loads and arithmetic (2-bit field `pp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pair {
    Bc,
    De,
    Hl,
    Sp,
}

impl Pair {
    pub const ALL: [Pair; 4] = [Pair::Bc, Pair::De, Pair::Hl, Pair::Sp];
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pair::Bc => "BC",
            Pair::De => "DE",
            Pair::Hl => "HL",
            Pair::Sp => "SP",
        })
    }
}

/// 16-bit pair selector for PUSH/POP, where AF takes SP's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPair {
    Bc,
    De,
    Hl,
    Af,
}

impl StackPair {
    pub const ALL: [StackPair; 4] = [StackPair::Bc, StackPair::De, StackPair::Hl, StackPair::Af];
}

impl fmt::Display for StackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StackPair::Bc => "BC",
            StackPair::De => "DE",
            StackPair::Hl => "HL",
            StackPair::Af => "AF",
        })
    }
}

/// Branch condition (2-bit field `cc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
}

impl Cond {
    pub const ALL: [Cond; 4] = [Cond::Nz, Cond::Z, Cond::Nc, Cond::C];
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cond::Nz => "NZ",
            Cond::Z => "Z",
            Cond::Nc => "NC",
            Cond::C => "C",
        })
    }
}

/// Registers that `advance`/`retreat` can step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Pc,
    Sp,
    Hl,
}
