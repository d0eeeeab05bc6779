//! Game Boy address space.
//!
//! A flat 64 KiB array with the display and interrupt registers overlaid
//! at fixed addresses. Register addresses never touch the backing array.
//! There is no banking: the cartridge image is copied in at $0000.

use emu_core::Bus;

use crate::io::{self, Interrupt, LCDC_ENABLE, STAT_COINCIDENCE, STAT_MODE, STAT_WRITABLE};

/// Display, palette and interrupt registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IoRegisters {
    lcdc: u8,
    /// Bit 7 is unused and always reads 1.
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    interrupt_flag: u8,
    interrupt_enable: u8,
}

impl IoRegisters {
    fn power_on() -> Self {
        let mut regs = Self {
            lcdc: 0x91,
            stat: 0x80 | 0x02,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0xFC,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            interrupt_flag: 0,
            interrupt_enable: 0,
        };
        regs.update_coincidence();
        regs
    }

    fn update_coincidence(&mut self) {
        if self.ly == self.lyc {
            self.stat |= STAT_COINCIDENCE;
        } else {
            self.stat &= !STAT_COINCIDENCE;
        }
    }
}

/// The Game Boy bus, implementing `emu_core::Bus`.
pub struct GbBus {
    ram: Box<[u8; 0x10000]>,
    io: IoRegisters,
    serial_sink: Option<Box<dyn FnMut(u8)>>,
}

impl GbBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x10000]),
            io: IoRegisters::power_on(),
            serial_sink: None,
        }
    }

    /// Copy a cartridge image into the address space starting at $0000.
    ///
    /// Bytes past $FFFF are ignored; callers reject oversized images.
    pub fn load_rom(&mut self, rom: &[u8]) {
        let len = rom.len().min(self.ram.len());
        self.ram[..len].copy_from_slice(&rom[..len]);
    }

    /// Forward every byte written to $FF01 to `sink`.
    pub fn set_serial_sink(&mut self, sink: impl FnMut(u8) + 'static) {
        self.serial_sink = Some(Box::new(sink));
    }

    /// Read a byte without side effects (for rendering and observation).
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            io::LCDC => self.io.lcdc,
            io::STAT => self.io.stat | 0x80,
            io::SCY => self.io.scy,
            io::SCX => self.io.scx,
            io::LY => self.io.ly,
            io::LYC => self.io.lyc,
            io::BGP => self.io.bgp,
            io::OBP0 => self.io.obp0,
            io::OBP1 => self.io.obp1,
            io::WY => self.io.wy,
            io::WX => self.io.wx,
            io::IF => self.io.interrupt_flag,
            io::IE => self.io.interrupt_enable,
            _ => self.ram[usize::from(addr)],
        }
    }

    // === Pixel pipeline side ===

    #[must_use]
    pub fn lcdc(&self) -> u8 {
        self.io.lcdc
    }

    #[must_use]
    pub fn lcd_enabled(&self) -> bool {
        self.io.lcdc & LCDC_ENABLE != 0
    }

    #[must_use]
    pub fn stat(&self) -> u8 {
        self.io.stat | 0x80
    }

    #[must_use]
    pub fn scx(&self) -> u8 {
        self.io.scx
    }

    #[must_use]
    pub fn scy(&self) -> u8 {
        self.io.scy
    }

    #[must_use]
    pub fn bgp(&self) -> u8 {
        self.io.bgp
    }

    #[must_use]
    pub fn ly(&self) -> u8 {
        self.io.ly
    }

    /// True when LY equals LYC.
    #[must_use]
    pub fn coincidence(&self) -> bool {
        self.io.stat & STAT_COINCIDENCE != 0
    }

    /// Set the current scanline and recompute the coincidence bit.
    pub fn set_ly(&mut self, ly: u8) {
        self.io.ly = ly;
        self.io.update_coincidence();
    }

    /// Publish the pixel-pipeline mode in STAT bits 1-0.
    pub fn set_mode(&mut self, mode: u8) {
        self.io.stat = (self.io.stat & !STAT_MODE) | (mode & STAT_MODE);
    }

    /// Raise an interrupt request in IF.
    pub fn request_interrupt(&mut self, interrupt: Interrupt) {
        self.io.interrupt_flag |= interrupt.mask();
    }
}

impl Default for GbBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for GbBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.peek(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            io::SB => {
                if let Some(sink) = self.serial_sink.as_mut() {
                    sink(value);
                }
            }
            io::LCDC => self.io.lcdc = value,
            io::STAT => {
                self.io.stat = 0x80 | (self.io.stat & 0x07) | (value & STAT_WRITABLE);
            }
            io::SCY => self.io.scy = value,
            io::SCX => self.io.scx = value,
            io::LY => {
                self.io.ly = value;
                self.io.update_coincidence();
            }
            io::LYC => {
                self.io.lyc = value;
                self.io.update_coincidence();
            }
            io::BGP => self.io.bgp = value,
            io::OBP0 => self.io.obp0 = value,
            io::OBP1 => self.io.obp1 = value,
            io::WY => self.io.wy = value,
            io::WX => self.io.wx = value,
            io::IF => self.io.interrupt_flag = value,
            io::IE => self.io.interrupt_enable = value,
            _ => self.ram[usize::from(addr)] = value,
        }
    }
}
