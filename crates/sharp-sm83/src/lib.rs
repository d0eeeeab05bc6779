//! Cycle-accurate Sharp SM83 CPU emulator.
//!
//! The SM83 is the Game Boy's CPU: an 8080/Z80 relative with its own
//! flag layout, no index registers and no I/O port space. Each call to
//! `tick()` advances exactly one T-cycle (4,194,304 Hz on a DMG).
//!
//! Instructions are decoded through two 256-entry tables (`base` and the
//! `0xCB`-prefixed `extended` table) built once per process.

mod alu;
mod cpu;
mod error;
mod flags;
mod operand;
mod registers;
mod table;

pub use alu::AluResult;
pub use cpu::{Sm83, Trace};
pub use error::ExecError;
pub use flags::{CF, HF, NF, ZF};
pub use operand::{Cond, Pair, Pointer, Reg8, StackPair};
pub use registers::Registers;
pub use table::{AluOp, Instruction, Loc8, Op, OpcodeTables, ShiftOp, tables};

/// ALU helpers, exposed for reference-vector tests and tools.
pub mod ops {
    pub use crate::alu::{
        adc8, add8, add16, add_sp, and8, bit, cp8, daa, dec8, inc8, or8, rl, rlc, rr, rrc, sbc8,
        sla, sra, srl, sub8, swap, xor8,
    };
}

/// Interrupt vector addresses, indexed by IF/IE bit.
pub const INTERRUPT_VECTORS: [u16; 5] = [0x0040, 0x0048, 0x0050, 0x0058, 0x0060];

/// Address of the interrupt flag register (IF).
pub const IF_ADDR: u16 = 0xFF0F;

/// Address of the interrupt enable register (IE).
pub const IE_ADDR: u16 = 0xFFFF;
