//! Read-only inspection of component state.

use std::fmt;

/// A value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U64(u64),
    /// Symbolic state such as a mode name.
    Name(&'static str),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::Name(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

/// A component whose state can be queried by path.
///
/// Queries never change emulation state.
pub trait Observable {
    /// Query one property, e.g. `pc`, `flags.z` or `ppu.ly`.
    ///
    /// Returns `None` for unknown paths.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path `query` understands.
    fn query_paths(&self) -> &'static [&'static str];
}

/// Parse an address written as `0x1234`, `$1234` or decimal.
#[must_use]
pub fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_hex_widths() {
        assert_eq!(Value::U8(0x0A).to_string(), "0x0A");
        assert_eq!(Value::U16(0x1234).to_string(), "0x1234");
        assert_eq!(Value::Name("hblank").to_string(), "hblank");
    }

    #[test]
    fn address_forms() {
        assert_eq!(parse_address("0xFF40"), Some(0xFF40));
        assert_eq!(parse_address("$ff44"), Some(0xFF44));
        assert_eq!(parse_address("49152"), Some(0xC000));
        assert_eq!(parse_address("0x10000"), None);
    }
}
