//! Game Boy pixel pipeline.
//!
//! One `tick()` = one T-cycle. Each visible scanline runs OAM scan (80),
//! drawing (172) and HBlank (204); lines 144-153 are VBlank at 456 cycles
//! each, for 154 x 456 = 70,224 cycles per frame.
//!
//! Only the background layer is modeled. On entering DRAWING the full
//! 256x256 background is rendered from VRAM and the current scanline of
//! the 160x144 viewport is copied out of it, offset by SCX/SCY.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::bus::GbBus;
use crate::io::{
    Interrupt, LCDC_BG_ENABLE, LCDC_BG_MAP, LCDC_BG_TILE_DATA, STAT_HBLANK_INT, STAT_LYC_INT,
    STAT_OAM_INT, STAT_VBLANK_INT,
};

/// Framebuffer dimensions.
pub const FB_WIDTH: u32 = 160;
pub const FB_HEIGHT: u32 = 144;

/// Background map dimensions in pixels.
pub const BG_SIZE: usize = 256;

/// Cycles per scanline.
pub const CYCLES_PER_LINE: u16 = 456;

/// Cycles per frame.
pub const CYCLES_PER_FRAME: u64 = CYCLES_PER_LINE as u64 * LINES_PER_FRAME as u64;

const LINES_PER_FRAME: u8 = 154;
const VBLANK_START: u8 = 144;

/// Shade for each 2-bit palette entry: white, light, dark, black.
const SHADES: [u8; 4] = [255, 170, 85, 0];

/// Pipeline mode, numbered as in STAT bits 1-0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

impl Mode {
    /// Cycles spent in this mode per scanline.
    #[must_use]
    pub const fn cycles(self) -> u16 {
        match self {
            Mode::OamScan => 80,
            Mode::Drawing => 172,
            Mode::HBlank => 204,
            Mode::VBlank => CYCLES_PER_LINE,
        }
    }

    /// STAT bits 1-0 for this mode.
    #[must_use]
    pub const fn stat_bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Mode::HBlank => "hblank",
            Mode::VBlank => "vblank",
            Mode::OamScan => "oam_scan",
            Mode::Drawing => "drawing",
        }
    }
}

/// DMG pixel pipeline.
pub struct Ppu {
    mode: Mode,
    /// Cycles left in the current mode (or VBlank line).
    remaining: u16,
    /// Current scanline. Published to LY but never read back from it.
    ly: u8,
    /// Last full background render, RGBA.
    background: Vec<u8>,
    /// Visible frame, RGBA.
    framebuffer: Vec<u8>,
    frame_count: u64,
}

impl Ppu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::OamScan,
            remaining: Mode::OamScan.cycles(),
            ly: 0,
            background: vec![0xFF; BG_SIZE * BG_SIZE * 4],
            framebuffer: vec![0xFF; FB_WIDTH as usize * FB_HEIGHT as usize * 4],
            frame_count: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Cycles left before the next mode change.
    #[must_use]
    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    /// Scanline being processed, 0-153.
    #[must_use]
    pub fn ly(&self) -> u8 {
        self.ly
    }

    /// Frames completed since power-on.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The 160x144 RGBA frame buffer.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// The most recent 256x256 RGBA background render.
    #[must_use]
    pub fn background(&self) -> &[u8] {
        &self.background
    }

    /// Advance one T-cycle. Does nothing while the LCD is off.
    pub fn tick(&mut self, bus: &mut GbBus) {
        if !bus.lcd_enabled() {
            return;
        }

        self.remaining -= 1;
        if self.remaining > 0 {
            return;
        }

        match self.mode {
            Mode::OamScan => {
                self.enter(Mode::Drawing, bus);
                render_background(bus, &mut self.background);
                self.copy_scanline(bus);
            }
            Mode::Drawing => {
                if self.ly == VBLANK_START - 1 {
                    self.frame_count += 1;
                }
                self.enter(Mode::HBlank, bus);
            }
            Mode::HBlank => {
                self.set_ly(bus, self.ly + 1);
                if self.ly == VBLANK_START {
                    self.enter(Mode::VBlank, bus);
                } else {
                    self.enter(Mode::OamScan, bus);
                }
            }
            Mode::VBlank => {
                let ly = self.ly + 1;
                if ly == LINES_PER_FRAME {
                    self.set_ly(bus, 0);
                    self.enter(Mode::OamScan, bus);
                } else {
                    self.set_ly(bus, ly);
                    self.remaining = CYCLES_PER_LINE;
                }
            }
        }
    }

    /// Switch mode and raise the interrupts tied to entering it.
    ///
    /// VBlank always requests IF bit 0. STAT bit 4 only adds the LCD-STAT
    /// request; it does not gate the VBlank interrupt itself.
    fn enter(&mut self, mode: Mode, bus: &mut GbBus) {
        self.mode = mode;
        self.remaining = mode.cycles();
        bus.set_mode(mode.stat_bits());

        let stat = bus.stat();
        match mode {
            Mode::HBlank if stat & STAT_HBLANK_INT != 0 => {
                bus.request_interrupt(Interrupt::LcdStat);
            }
            Mode::VBlank => {
                bus.request_interrupt(Interrupt::VBlank);
                if stat & STAT_VBLANK_INT != 0 {
                    bus.request_interrupt(Interrupt::LcdStat);
                }
            }
            Mode::OamScan if stat & STAT_OAM_INT != 0 => {
                bus.request_interrupt(Interrupt::LcdStat);
            }
            _ => {}
        }
    }

    fn set_ly(&mut self, bus: &mut GbBus, ly: u8) {
        self.ly = ly;
        bus.set_ly(ly);
        if bus.coincidence() && bus.stat() & STAT_LYC_INT != 0 {
            bus.request_interrupt(Interrupt::LcdStat);
        }
    }

    /// Copy the current viewport row out of the background render.
    fn copy_scanline(&mut self, bus: &GbBus) {
        let y = usize::from(self.ly);
        if y >= FB_HEIGHT as usize {
            return;
        }
        let src_y = (y + usize::from(bus.scy())) % BG_SIZE;
        let scx = usize::from(bus.scx());
        let width = FB_WIDTH as usize;

        for x in 0..width {
            let src_x = (x + scx) % BG_SIZE;
            let src = (src_y * BG_SIZE + src_x) * 4;
            let dst = (y * width + x) * 4;
            self.framebuffer[dst..dst + 4].copy_from_slice(&self.background[src..src + 4]);
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the full 256x256 background into `out` as RGBA.
///
/// A pure function of the address space: the same VRAM and register
/// contents always produce the same bytes. `out` must hold
/// `BG_SIZE * BG_SIZE * 4` bytes.
pub fn render_background(bus: &GbBus, out: &mut [u8]) {
    let lcdc = bus.lcdc();
    if lcdc & LCDC_BG_ENABLE == 0 {
        out.fill(0xFF);
        return;
    }

    let map_base: u16 = if lcdc & LCDC_BG_MAP == 0 { 0x9800 } else { 0x9C00 };
    let unsigned_tiles = lcdc & LCDC_BG_TILE_DATA != 0;
    let bgp = bus.bgp();

    for tile_y in 0..32u16 {
        for tile_x in 0..32u16 {
            let index = bus.peek(map_base + tile_y * 32 + tile_x);
            let tile_addr = if unsigned_tiles {
                0x8000 + u16::from(index) * 16
            } else {
                0x9000u16.wrapping_add_signed(i16::from(index as i8) * 16)
            };

            for row in 0..8u16 {
                let lo = bus.peek(tile_addr + row * 2);
                let hi = bus.peek(tile_addr + row * 2 + 1);
                let y = usize::from(tile_y * 8 + row);

                for col in 0..8u16 {
                    let bit = 7 - col;
                    let color = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
                    let shade = SHADES[usize::from((bgp >> (color * 2)) & 3)];

                    let x = usize::from(tile_x * 8 + col);
                    let offset = (y * BG_SIZE + x) * 4;
                    out[offset..offset + 4].copy_from_slice(&[shade, shade, shade, 0xFF]);
                }
            }
        }
    }
}
