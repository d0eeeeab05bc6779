//! SM83 flag register bits.
//!
//! Only the high nibble of F is backed by storage; bits 3-0 always read 0.

/// Zero flag (bit 7) - set if the result is zero.
pub const ZF: u8 = 0b1000_0000;

/// Subtract flag (bit 6) - set if the last operation was a subtraction.
pub const NF: u8 = 0b0100_0000;

/// Half-carry flag (bit 5) - carry/borrow out of bit 3.
pub const HF: u8 = 0b0010_0000;

/// Carry flag (bit 4) - carry/borrow out of bit 7.
pub const CF: u8 = 0b0001_0000;

/// Bits of F that exist in hardware.
pub const FLAG_MASK: u8 = ZF | NF | HF | CF;

/// Zero flag for a result.
#[must_use]
pub const fn z(value: u8) -> u8 {
    if value == 0 { ZF } else { 0 }
}
