//! SM83 opcode tables.
//!
//! Two flat 256-entry tables: `base` for single-byte opcodes and `extended`
//! for the `0xCB`-prefixed page. Each populated slot carries a tagged
//! micro-op ([`Op`]) that the execution engine interprets. The tables are
//! built once per process by decoding the opcode bit fields.
//!
//! Cycle costs are T-cycles and exclude taken-branch penalties. Branches
//! that jump add their penalty through the engine's deferred-jump stage:
//! JR and JP +4, CALL, RET, RETI and RST +12.

#![allow(clippy::cast_possible_truncation)] // Table indices are always < 256.

use std::fmt;
use std::sync::LazyLock;

use crate::operand::{Cond, Pair, Reg8, StackPair};

/// 8-bit ALU operation selected by bits 5-3 of `10ooo rrr` / `11ooo110`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub const ALL: [AluOp; 8] = [
        AluOp::Add,
        AluOp::Adc,
        AluOp::Sub,
        AluOp::Sbc,
        AluOp::And,
        AluOp::Xor,
        AluOp::Or,
        AluOp::Cp,
    ];

    /// Mnemonic prefix, including the implicit `A,` where it is written.
    const fn prefix(self) -> &'static str {
        match self {
            AluOp::Add => "ADD A,",
            AluOp::Adc => "ADC A,",
            AluOp::Sub => "SUB ",
            AluOp::Sbc => "SBC A,",
            AluOp::And => "AND ",
            AluOp::Xor => "XOR ",
            AluOp::Or => "OR ",
            AluOp::Cp => "CP ",
        }
    }
}

/// Rotate/shift group of the `0xCB` page (bits 5-3 of `00ooo rrr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl ShiftOp {
    pub const ALL: [ShiftOp; 8] = [
        ShiftOp::Rlc,
        ShiftOp::Rrc,
        ShiftOp::Rl,
        ShiftOp::Rr,
        ShiftOp::Sla,
        ShiftOp::Sra,
        ShiftOp::Swap,
        ShiftOp::Srl,
    ];
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShiftOp::Rlc => "RLC",
            ShiftOp::Rrc => "RRC",
            ShiftOp::Rl => "RL",
            ShiftOp::Rr => "RR",
            ShiftOp::Sla => "SLA",
            ShiftOp::Sra => "SRA",
            ShiftOp::Swap => "SWAP",
            ShiftOp::Srl => "SRL",
        })
    }
}

/// Source or destination of an 8-bit load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loc8 {
    Reg(Reg8),
    /// Immediate byte following the opcode.
    Imm,
    IndBc,
    IndDe,
    /// `(HL+)`: HL is incremented after the access.
    IndHlInc,
    /// `(HL-)`: HL is decremented after the access.
    IndHlDec,
    /// `(nn)`: absolute address from the two operand bytes.
    IndImm16,
    /// `(FF00+n)`.
    HighImm,
    /// `(FF00+C)`.
    HighC,
}

impl fmt::Display for Loc8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loc8::Reg(r) => write!(f, "{r}"),
            Loc8::Imm => f.write_str("n"),
            Loc8::IndBc => f.write_str("(BC)"),
            Loc8::IndDe => f.write_str("(DE)"),
            Loc8::IndHlInc => f.write_str("(HL+)"),
            Loc8::IndHlDec => f.write_str("(HL-)"),
            Loc8::IndImm16 => f.write_str("(nn)"),
            Loc8::HighImm => f.write_str("(FF00+n)"),
            Loc8::HighC => f.write_str("(FF00+C)"),
        }
    }
}

/// Effect of an instruction, interpreted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Halt,
    Stop,
    Di,
    Ei,
    Ld8 { dst: Loc8, src: Loc8 },
    Ld16Imm(Pair),
    /// `LD (nn),SP`.
    LdImm16Sp,
    LdSpHl,
    /// `LD HL,SP+e`.
    LdHlSpOffset,
    Push(StackPair),
    Pop(StackPair),
    Alu(AluOp, Loc8),
    Inc8(Reg8),
    Dec8(Reg8),
    Inc16(Pair),
    Dec16(Pair),
    AddHl(Pair),
    AddSp,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jp(Option<Cond>),
    JpHl,
    Jr(Option<Cond>),
    Call(Option<Cond>),
    Ret(Option<Cond>),
    Reti,
    /// Restart to the fixed vector.
    Rst(u8),
    Shift(ShiftOp, Reg8),
    Bit(u8, Reg8),
    Res(u8, Reg8),
    Set(u8, Reg8),
}

/// Immutable descriptor for one opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode byte (the byte after `0xCB` for the extended page).
    pub opcode: u8,
    pub prefixed: bool,
    pub mnemonic: String,
    /// Base cost in T-cycles, including the fetch.
    pub cycles: u8,
    /// Encoded length in bytes, including any prefix.
    pub length: u8,
    pub op: Op,
}

/// The base and `0xCB`-prefixed dispatch tables.
pub struct OpcodeTables {
    base: [Option<Instruction>; 256],
    extended: [Instruction; 256],
}

impl OpcodeTables {
    fn build() -> Self {
        Self {
            base: std::array::from_fn(|i| decode_base(i as u8)),
            extended: std::array::from_fn(|i| decode_extended(i as u8)),
        }
    }

    /// Look up a single-byte opcode. `None` for the undefined slots and for
    /// the `0xCB` prefix itself.
    #[must_use]
    pub fn base(&self, opcode: u8) -> Option<&Instruction> {
        self.base[usize::from(opcode)].as_ref()
    }

    /// Look up the byte following a `0xCB` prefix.
    #[must_use]
    pub fn extended(&self, opcode: u8) -> &Instruction {
        &self.extended[usize::from(opcode)]
    }
}

static TABLES: LazyLock<OpcodeTables> = LazyLock::new(OpcodeTables::build);

/// Process-wide opcode tables, built on first use.
#[must_use]
pub fn tables() -> &'static OpcodeTables {
    &TABLES
}

fn instruction(opcode: u8, mnemonic: impl Into<String>, cycles: u8, length: u8, op: Op) -> Instruction {
    Instruction {
        opcode,
        prefixed: false,
        mnemonic: mnemonic.into(),
        cycles,
        length,
        op,
    }
}

#[allow(clippy::too_many_lines)]
fn decode_base(opcode: u8) -> Option<Instruction> {
    let y = Reg8::from_bits(opcode >> 3);
    let z = Reg8::from_bits(opcode);
    let pair = Pair::ALL[usize::from((opcode >> 4) & 3)];
    let stack = StackPair::ALL[usize::from((opcode >> 4) & 3)];
    let cond = Cond::ALL[usize::from((opcode >> 3) & 3)];
    let alu = AluOp::ALL[usize::from((opcode >> 3) & 7)];
    let a = Loc8::Reg(Reg8::A);
    let ins = |mnemonic: String, cycles, length, op| instruction(opcode, mnemonic, cycles, length, op);

    let decoded = match opcode {
        0x00 => ins("NOP".into(), 4, 1, Op::Nop),
        0x10 => ins("STOP".into(), 4, 2, Op::Stop),
        0x76 => ins("HALT".into(), 4, 1, Op::Halt),
        0xF3 => ins("DI".into(), 4, 1, Op::Di),
        0xFB => ins("EI".into(), 4, 1, Op::Ei),

        // 16-bit loads
        0x01 | 0x11 | 0x21 | 0x31 => ins(format!("LD {pair},nn"), 12, 3, Op::Ld16Imm(pair)),
        0x08 => ins("LD (nn),SP".into(), 20, 3, Op::LdImm16Sp),
        0xF8 => ins("LD HL,SP+e".into(), 12, 2, Op::LdHlSpOffset),
        0xF9 => ins("LD SP,HL".into(), 8, 1, Op::LdSpHl),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => ins(format!("POP {stack}"), 12, 1, Op::Pop(stack)),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => ins(format!("PUSH {stack}"), 16, 1, Op::Push(stack)),

        // Indirect accumulator loads
        0x02 | 0x12 | 0x22 | 0x32 | 0x0A | 0x1A | 0x2A | 0x3A => {
            let mem = match (opcode >> 4) & 3 {
                0 => Loc8::IndBc,
                1 => Loc8::IndDe,
                2 => Loc8::IndHlInc,
                _ => Loc8::IndHlDec,
            };
            if opcode & 0x08 == 0 {
                ins(format!("LD {mem},A"), 8, 1, Op::Ld8 { dst: mem, src: a })
            } else {
                ins(format!("LD A,{mem}"), 8, 1, Op::Ld8 { dst: a, src: mem })
            }
        }
        0xE0 => ins("LDH (n),A".into(), 12, 2, Op::Ld8 { dst: Loc8::HighImm, src: a }),
        0xF0 => ins("LDH A,(n)".into(), 12, 2, Op::Ld8 { dst: a, src: Loc8::HighImm }),
        0xE2 => ins("LD (C),A".into(), 8, 1, Op::Ld8 { dst: Loc8::HighC, src: a }),
        0xF2 => ins("LD A,(C)".into(), 8, 1, Op::Ld8 { dst: a, src: Loc8::HighC }),
        0xEA => ins("LD (nn),A".into(), 16, 3, Op::Ld8 { dst: Loc8::IndImm16, src: a }),
        0xFA => ins("LD A,(nn)".into(), 16, 3, Op::Ld8 { dst: a, src: Loc8::IndImm16 }),

        // 16-bit arithmetic
        0x03 | 0x13 | 0x23 | 0x33 => ins(format!("INC {pair}"), 8, 1, Op::Inc16(pair)),
        0x0B | 0x1B | 0x2B | 0x3B => ins(format!("DEC {pair}"), 8, 1, Op::Dec16(pair)),
        0x09 | 0x19 | 0x29 | 0x39 => ins(format!("ADD HL,{pair}"), 8, 1, Op::AddHl(pair)),
        0xE8 => ins("ADD SP,e".into(), 16, 2, Op::AddSp),

        // Accumulator rotates and misc
        0x07 => ins("RLCA".into(), 4, 1, Op::Rlca),
        0x0F => ins("RRCA".into(), 4, 1, Op::Rrca),
        0x17 => ins("RLA".into(), 4, 1, Op::Rla),
        0x1F => ins("RRA".into(), 4, 1, Op::Rra),
        0x27 => ins("DAA".into(), 4, 1, Op::Daa),
        0x2F => ins("CPL".into(), 4, 1, Op::Cpl),
        0x37 => ins("SCF".into(), 4, 1, Op::Scf),
        0x3F => ins("CCF".into(), 4, 1, Op::Ccf),

        // Control flow
        0x18 => ins("JR e".into(), 8, 2, Op::Jr(None)),
        0x20 | 0x28 | 0x30 | 0x38 => ins(format!("JR {cond},e"), 8, 2, Op::Jr(Some(cond))),
        0xC3 => ins("JP nn".into(), 12, 3, Op::Jp(None)),
        0xC2 | 0xCA | 0xD2 | 0xDA => ins(format!("JP {cond},nn"), 12, 3, Op::Jp(Some(cond))),
        0xE9 => ins("JP HL".into(), 4, 1, Op::JpHl),
        0xCD => ins("CALL nn".into(), 12, 3, Op::Call(None)),
        0xC4 | 0xCC | 0xD4 | 0xDC => ins(format!("CALL {cond},nn"), 12, 3, Op::Call(Some(cond))),
        0xC9 => ins("RET".into(), 4, 1, Op::Ret(None)),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => ins(format!("RET {cond}"), 8, 1, Op::Ret(Some(cond))),
        0xD9 => ins("RETI".into(), 4, 1, Op::Reti),
        op if op & 0xC7 == 0xC7 => {
            let vector = op & 0x38;
            ins(format!("RST {vector:02X}h"), 4, 1, Op::Rst(vector))
        }

        // 8-bit INC/DEC/LD r,n: 00rrr100 / 00rrr101 / 00rrr110
        op if op & 0xC7 == 0x04 => {
            ins(format!("INC {y}"), if y.is_memory() { 12 } else { 4 }, 1, Op::Inc8(y))
        }
        op if op & 0xC7 == 0x05 => {
            ins(format!("DEC {y}"), if y.is_memory() { 12 } else { 4 }, 1, Op::Dec8(y))
        }
        op if op & 0xC7 == 0x06 => ins(
            format!("LD {y},n"),
            if y.is_memory() { 12 } else { 8 },
            2,
            Op::Ld8 { dst: Loc8::Reg(y), src: Loc8::Imm },
        ),

        // LD r,r': 01ddd sss (0x76 is HALT, matched above)
        0x40..=0x7F => ins(
            format!("LD {y},{z}"),
            if y.is_memory() || z.is_memory() { 8 } else { 4 },
            1,
            Op::Ld8 { dst: Loc8::Reg(y), src: Loc8::Reg(z) },
        ),

        // ALU A,r: 10ooo rrr
        0x80..=0xBF => ins(
            format!("{}{z}", alu.prefix()),
            if z.is_memory() { 8 } else { 4 },
            1,
            Op::Alu(alu, Loc8::Reg(z)),
        ),
        // ALU A,n: 11ooo110
        op if op & 0xC7 == 0xC6 => ins(format!("{}n", alu.prefix()), 8, 2, Op::Alu(alu, Loc8::Imm)),

        // 0xCB prefix and the undefined slots
        _ => return None,
    };
    Some(decoded)
}

fn decode_extended(opcode: u8) -> Instruction {
    let index = (opcode >> 3) & 7;
    let r = Reg8::from_bits(opcode);
    let (mnemonic, op) = match opcode >> 6 {
        0 => {
            let shift = ShiftOp::ALL[usize::from(index)];
            (format!("{shift} {r}"), Op::Shift(shift, r))
        }
        1 => (format!("BIT {index},{r}"), Op::Bit(index, r)),
        2 => (format!("RES {index},{r}"), Op::Res(index, r)),
        _ => (format!("SET {index},{r}"), Op::Set(index, r)),
    };
    let cycles = match (r.is_memory(), op) {
        (false, _) => 8,
        (true, Op::Bit(..)) => 12,
        (true, _) => 16,
    };
    Instruction {
        opcode,
        prefixed: true,
        mnemonic,
        cycles,
        length: 2,
        op,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ILLEGAL: [u8; 11] = [
        0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
    ];

    #[test]
    fn base_table_leaves_illegal_slots_and_prefix_empty() {
        let t = tables();
        for opcode in ILLEGAL {
            assert!(t.base(opcode).is_none(), "{opcode:02X} should be empty");
        }
        assert!(t.base(0xCB).is_none());

        let populated = (0..=255u8).filter(|&op| t.base(op).is_some()).count();
        assert_eq!(populated, 256 - ILLEGAL.len() - 1);
    }

    #[test]
    fn every_slot_carries_its_own_opcode() {
        let t = tables();
        for opcode in 0..=255u8 {
            if let Some(ins) = t.base(opcode) {
                assert_eq!(ins.opcode, opcode);
                assert!(!ins.prefixed);
            }
            let ext = t.extended(opcode);
            assert_eq!(ext.opcode, opcode);
            assert!(ext.prefixed);
            assert_eq!(ext.length, 2);
        }
    }

    #[test]
    fn register_loads_skip_halt() {
        let t = tables();
        let halt = t.base(0x76).map(|i| i.op);
        assert_eq!(halt, Some(Op::Halt));

        let ld = t.base(0x41).map(|i| (i.mnemonic.clone(), i.cycles));
        assert_eq!(ld, Some(("LD B,C".to_string(), 4)));

        let ld = t.base(0x7E).map(|i| (i.mnemonic.clone(), i.cycles));
        assert_eq!(ld, Some(("LD A,(HL)".to_string(), 8)));
    }

    #[test]
    fn base_cycle_costs() {
        let t = tables();
        let cost = |op: u8| t.base(op).map(|i| i.cycles);
        assert_eq!(cost(0x00), Some(4));
        assert_eq!(cost(0x08), Some(20));
        assert_eq!(cost(0x34), Some(12));
        assert_eq!(cost(0x36), Some(12));
        assert_eq!(cost(0x18), Some(8));
        assert_eq!(cost(0xC3), Some(12));
        assert_eq!(cost(0xCD), Some(12));
        assert_eq!(cost(0xC9), Some(4));
        assert_eq!(cost(0xC0), Some(8));
        assert_eq!(cost(0xC5), Some(16));
        assert_eq!(cost(0xE8), Some(16));
        assert_eq!(cost(0xFA), Some(16));
        assert_eq!(cost(0xFF), Some(4));
    }

    #[test]
    fn extended_costs_depend_on_hl_operand() {
        let t = tables();
        assert_eq!(t.extended(0x00).cycles, 8);
        assert_eq!(t.extended(0x06).cycles, 16);
        assert_eq!(t.extended(0x46).cycles, 12);
        assert_eq!(t.extended(0x86).cycles, 16);
        assert_eq!(t.extended(0xFE).cycles, 16);
    }

    #[test]
    fn decoded_operands() {
        let t = tables();
        assert_eq!(t.base(0xF5).map(|i| i.op), Some(Op::Push(StackPair::Af)));
        assert_eq!(t.base(0x31).map(|i| i.op), Some(Op::Ld16Imm(Pair::Sp)));
        assert_eq!(t.base(0x38).map(|i| i.op), Some(Op::Jr(Some(Cond::C))));
        assert_eq!(t.base(0xEF).map(|i| i.op), Some(Op::Rst(0x28)));
        assert_eq!(
            t.base(0xBE).map(|i| i.op),
            Some(Op::Alu(AluOp::Cp, Loc8::Reg(Reg8::HlInd)))
        );
        assert_eq!(t.base(0xEE).map(|i| i.op), Some(Op::Alu(AluOp::Xor, Loc8::Imm)));
        assert_eq!(t.extended(0x37).op, Op::Shift(ShiftOp::Swap, Reg8::A));
        assert_eq!(t.extended(0x7C).op, Op::Bit(7, Reg8::H));
        assert_eq!(t.extended(0x7C).mnemonic, "BIT 7,H");
    }
}
