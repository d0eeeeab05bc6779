//! I/O register addresses and bit assignments.

/// Serial transfer data. Writes go to the diagnostic sink.
pub const SB: u16 = 0xFF01;
/// Interrupt flag register.
pub const IF: u16 = sharp_sm83::IF_ADDR;
/// LCD control.
pub const LCDC: u16 = 0xFF40;
/// LCD status.
pub const STAT: u16 = 0xFF41;
/// Background scroll Y.
pub const SCY: u16 = 0xFF42;
/// Background scroll X.
pub const SCX: u16 = 0xFF43;
/// Current scanline.
pub const LY: u16 = 0xFF44;
/// Scanline compare.
pub const LYC: u16 = 0xFF45;
/// Background palette.
pub const BGP: u16 = 0xFF47;
/// Object palette 0.
pub const OBP0: u16 = 0xFF48;
/// Object palette 1.
pub const OBP1: u16 = 0xFF49;
/// Window Y position.
pub const WY: u16 = 0xFF4A;
/// Window X position.
pub const WX: u16 = 0xFF4B;
/// Interrupt enable register.
pub const IE: u16 = sharp_sm83::IE_ADDR;

// LCDC bits
pub const LCDC_ENABLE: u8 = 0x80;
pub const LCDC_BG_TILE_DATA: u8 = 0x10;
pub const LCDC_BG_MAP: u8 = 0x08;
pub const LCDC_BG_ENABLE: u8 = 0x01;

// STAT bits
pub const STAT_LYC_INT: u8 = 0x40;
pub const STAT_OAM_INT: u8 = 0x20;
pub const STAT_VBLANK_INT: u8 = 0x10;
pub const STAT_HBLANK_INT: u8 = 0x08;
pub const STAT_COINCIDENCE: u8 = 0x04;
pub const STAT_MODE: u8 = 0x03;
/// Bits a CPU write may change.
pub const STAT_WRITABLE: u8 = 0x78;

/// Interrupt sources in priority order; the discriminant is the IF/IE bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    /// IF/IE mask for this source.
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}
