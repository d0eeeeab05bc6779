//! Memory bus interface.

/// Memory bus interface.
///
/// Components reach memory and memory-mapped peripherals only through this
/// trait. The bus does the address decoding; any side effect of touching a
/// register (latches, derived status bits) happens behind `read`/`write`.
///
/// Both operations are total over the 16-bit address space.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Flat 64 KiB RAM with no memory-mapped devices.
///
/// Used by CPU tests and tools that need a bus without a machine behind it.
pub struct SimpleBus {
    ram: Box<[u8; 0x10000]>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x10000]),
        }
    }

    /// Copy `bytes` into RAM starting at `address`, wrapping at the top.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        let mut addr = address;
        for &byte in bytes {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read a byte without going through the `Bus` trait.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}
