//! SM83 register file.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use crate::flags::{CF, FLAG_MASK, HF, NF, ZF};
use crate::operand::{Pair, Pointer, Reg8, StackPair};

/// SM83 register file.
///
/// Eight 8-bit registers, two 16-bit pointers and the interrupt master
/// enable. The pairs AF/BC/DE/HL are views over the byte registers, never
/// separate storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    /// Flags. Use `set_f`/`set_flag` to write; the low nibble must stay 0.
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub sp: u16,
    pub pc: u16,

    /// Interrupt master enable.
    pub ime: bool,
}

impl Registers {
    /// Register values the DMG boot ROM leaves behind when it jumps to
    /// the cartridge entry point at $0100.
    #[must_use]
    pub const fn post_boot() -> Self {
        Self {
            a: 0x01,
            f: ZF | HF | CF,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            ime: false,
        }
    }

    /// Get AF register pair.
    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    /// Get BC register pair.
    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    /// Get DE register pair.
    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    /// Get HL register pair.
    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    /// Set AF register pair. The unused low nibble of F is dropped.
    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.set_f(value as u8);
    }

    /// Set BC register pair.
    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    /// Set DE register pair.
    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    /// Set HL register pair.
    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    /// Replace the whole flag byte, keeping bits 3-0 clear.
    pub fn set_f(&mut self, value: u8) {
        self.f = value & FLAG_MASK;
    }

    /// Read one flag (`ZF`, `NF`, `HF` or `CF`).
    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    /// Set or clear one flag without touching the others.
    pub fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.f |= mask & FLAG_MASK;
        } else {
            self.f &= !mask;
        }
    }

    /// Carry flag.
    #[must_use]
    pub const fn carry(&self) -> bool {
        self.flag(CF)
    }

    /// Zero flag.
    #[must_use]
    pub const fn zero(&self) -> bool {
        self.flag(ZF)
    }

    /// Subtract flag.
    #[must_use]
    pub const fn subtract(&self) -> bool {
        self.flag(NF)
    }

    /// Half-carry flag.
    #[must_use]
    pub const fn half_carry(&self) -> bool {
        self.flag(HF)
    }

    /// Post-increment a pointer register: returns the old value.
    pub fn advance(&mut self, ptr: Pointer) -> u16 {
        let old = self.pointer(ptr);
        self.set_pointer(ptr, old.wrapping_add(1));
        old
    }

    /// Post-decrement a pointer register: returns the old value.
    pub fn retreat(&mut self, ptr: Pointer) -> u16 {
        let old = self.pointer(ptr);
        self.set_pointer(ptr, old.wrapping_sub(1));
        old
    }

    fn pointer(&self, ptr: Pointer) -> u16 {
        match ptr {
            Pointer::Pc => self.pc,
            Pointer::Sp => self.sp,
            Pointer::Hl => self.hl(),
        }
    }

    fn set_pointer(&mut self, ptr: Pointer, value: u16) {
        match ptr {
            Pointer::Pc => self.pc = value,
            Pointer::Sp => self.sp = value,
            Pointer::Hl => self.set_hl(value),
        }
    }

    /// Read an 8-bit register. `(HL)` is a memory operand and has no
    /// register to read; callers resolve it through the bus first.
    #[must_use]
    pub fn get8(&self, reg: Reg8) -> Option<u8> {
        match reg {
            Reg8::B => Some(self.b),
            Reg8::C => Some(self.c),
            Reg8::D => Some(self.d),
            Reg8::E => Some(self.e),
            Reg8::H => Some(self.h),
            Reg8::L => Some(self.l),
            Reg8::HlInd => None,
            Reg8::A => Some(self.a),
        }
    }

    /// Write an 8-bit register. Returns false for `(HL)`.
    pub fn set8(&mut self, reg: Reg8, value: u8) -> bool {
        match reg {
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
            Reg8::HlInd => return false,
            Reg8::A => self.a = value,
        }
        true
    }

    /// Read a 16-bit pair from the BC/DE/HL/SP group.
    #[must_use]
    pub const fn get16(&self, pair: Pair) -> u16 {
        match pair {
            Pair::Bc => self.bc(),
            Pair::De => self.de(),
            Pair::Hl => self.hl(),
            Pair::Sp => self.sp,
        }
    }

    /// Write a 16-bit pair from the BC/DE/HL/SP group.
    pub fn set16(&mut self, pair: Pair, value: u16) {
        match pair {
            Pair::Bc => self.set_bc(value),
            Pair::De => self.set_de(value),
            Pair::Hl => self.set_hl(value),
            Pair::Sp => self.sp = value,
        }
    }

    /// Read a pair from the PUSH/POP group (AF replaces SP).
    #[must_use]
    pub const fn get_stack(&self, pair: StackPair) -> u16 {
        match pair {
            StackPair::Bc => self.bc(),
            StackPair::De => self.de(),
            StackPair::Hl => self.hl(),
            StackPair::Af => self.af(),
        }
    }

    /// Write a pair from the PUSH/POP group.
    pub fn set_stack(&mut self, pair: StackPair, value: u16) {
        match pair {
            StackPair::Bc => self.set_bc(value),
            StackPair::De => self.set_de(value),
            StackPair::Hl => self.set_hl(value),
            StackPair::Af => self.set_af(value),
        }
    }
}
