//! ALU operations for the SM83.
//!
//! Every helper is a pure function of its operands and returns the full
//! flag byte it produces. Operations that leave a flag untouched (INC/DEC
//! keep C, ADD HL keeps Z, BIT keeps C) return only the flags they define;
//! the caller merges the preserved bits back in.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use crate::flags::{CF, HF, NF, ZF, z};

/// Result of an 8-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

impl AluResult {
    const fn new(value: u8, flags: u8) -> Self {
        Self { value, flags }
    }
}

/// ADD: `a + b`.
#[must_use]
pub fn add8(a: u8, b: u8) -> AluResult {
    adc8(a, b, false)
}

/// ADC: `a + b + carry`.
#[must_use]
pub fn adc8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let value = wide as u8;

    let mut flags = z(value);
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }
    if wide > 0xFF {
        flags |= CF;
    }
    AluResult::new(value, flags)
}

/// SUB: `a - b`.
#[must_use]
pub fn sub8(a: u8, b: u8) -> AluResult {
    sbc8(a, b, false)
}

/// SBC: `a - b - carry`.
#[must_use]
pub fn sbc8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = z(value) | NF;
    if (a & 0x0F) < (b & 0x0F) + c {
        flags |= HF;
    }
    if u16::from(a) < u16::from(b) + u16::from(c) {
        flags |= CF;
    }
    AluResult::new(value, flags)
}

/// CP: flags of `a - b`; the value is `a`, unchanged.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    AluResult::new(a, sub8(a, b).flags)
}

/// AND. H is always set, C always clear.
#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult::new(value, z(value) | HF)
}

/// XOR. H and C always clear.
#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult::new(value, z(value))
}

/// OR. H and C always clear.
#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult::new(value, z(value))
}

/// INC r. Returns Z/N/H only; C is preserved by the caller.
#[must_use]
pub fn inc8(v: u8) -> AluResult {
    let value = v.wrapping_add(1);
    let h = if v & 0x0F == 0x0F { HF } else { 0 };
    AluResult::new(value, z(value) | h)
}

/// DEC r. Returns Z/N/H only; C is preserved by the caller.
#[must_use]
pub fn dec8(v: u8) -> AluResult {
    let value = v.wrapping_sub(1);
    let h = if v & 0x0F == 0 { HF } else { 0 };
    AluResult::new(value, z(value) | NF | h)
}

/// ADD HL, rr. Returns the sum and H/C (carry out of bits 11 and 15);
/// Z is preserved by the caller, N is clear.
#[must_use]
pub fn add16(hl: u16, rr: u16) -> (u16, u8) {
    let (value, carry) = hl.overflowing_add(rr);
    let mut flags = 0;
    if (hl & 0x0FFF) + (rr & 0x0FFF) > 0x0FFF {
        flags |= HF;
    }
    if carry {
        flags |= CF;
    }
    (value, flags)
}

/// SP + signed offset, shared by ADD SP,e and LD HL,SP+e.
///
/// Z and N are clear; H and C come from the unsigned add of the low byte.
#[must_use]
pub fn add_sp(sp: u16, offset: u8) -> (u16, u8) {
    let value = sp.wrapping_add_signed(i16::from(offset as i8));
    let low = sp as u8;
    let mut flags = 0;
    if (low & 0x0F) + (offset & 0x0F) > 0x0F {
        flags |= HF;
    }
    if u16::from(low) + u16::from(offset) > 0xFF {
        flags |= CF;
    }
    (value, flags)
}

/// DAA: decimal-adjust A after a BCD add or subtract.
///
/// Takes the current flag byte because the adjustment depends on N, H
/// and C. N is kept, H is cleared.
#[must_use]
pub fn daa(a: u8, flags: u8) -> AluResult {
    let mut adjust = 0;
    let mut carry = flags & CF != 0;
    let value = if flags & NF == 0 {
        if flags & HF != 0 || a & 0x0F > 0x09 {
            adjust |= 0x06;
        }
        if carry || a > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        a.wrapping_add(adjust)
    } else {
        if flags & HF != 0 {
            adjust |= 0x06;
        }
        if carry {
            adjust |= 0x60;
        }
        a.wrapping_sub(adjust)
    };

    let mut out = z(value) | (flags & NF);
    if carry {
        out |= CF;
    }
    AluResult::new(value, out)
}

fn shifted(value: u8, carry_out: bool) -> AluResult {
    AluResult::new(value, z(value) | if carry_out { CF } else { 0 })
}

/// RLC: rotate left, bit 7 into C and bit 0.
#[must_use]
pub fn rlc(v: u8) -> AluResult {
    shifted(v.rotate_left(1), v & 0x80 != 0)
}

/// RRC: rotate right, bit 0 into C and bit 7.
#[must_use]
pub fn rrc(v: u8) -> AluResult {
    shifted(v.rotate_right(1), v & 0x01 != 0)
}

/// RL: rotate left through carry.
#[must_use]
pub fn rl(v: u8, carry: bool) -> AluResult {
    shifted((v << 1) | u8::from(carry), v & 0x80 != 0)
}

/// RR: rotate right through carry.
#[must_use]
pub fn rr(v: u8, carry: bool) -> AluResult {
    shifted((v >> 1) | (u8::from(carry) << 7), v & 0x01 != 0)
}

/// SLA: arithmetic shift left.
#[must_use]
pub fn sla(v: u8) -> AluResult {
    shifted(v << 1, v & 0x80 != 0)
}

/// SRA: arithmetic shift right, bit 7 kept.
#[must_use]
pub fn sra(v: u8) -> AluResult {
    shifted((v >> 1) | (v & 0x80), v & 0x01 != 0)
}

/// SWAP: exchange nibbles. C is cleared.
#[must_use]
pub fn swap(v: u8) -> AluResult {
    shifted(v.rotate_left(4), false)
}

/// SRL: logical shift right.
#[must_use]
pub fn srl(v: u8) -> AluResult {
    shifted(v >> 1, v & 0x01 != 0)
}

/// BIT b, r. Returns Z/N/H; C is preserved by the caller.
#[must_use]
pub fn bit(index: u8, v: u8) -> u8 {
    let mut flags = HF;
    if v & (1 << (index & 7)) == 0 {
        flags |= ZF;
    }
    flags
}
