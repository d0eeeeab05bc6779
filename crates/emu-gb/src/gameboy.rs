//! Top-level Game Boy system.
//!
//! CPU and pixel pipeline share one 4,194,304 Hz clock: every `tick()`
//! advances the CPU by one T-cycle, then the PPU by the same cycle. They
//! communicate only through the address space (LY/STAT/IF).
//!
//! One frame = 154 lines x 456 cycles = 70,224 ticks.

use emu_core::{Cpu, Observable, Value, parse_address};
use sharp_sm83::{Registers, Sm83, Trace};

use crate::bus::GbBus;
use crate::config::{GbConfig, StartState};
use crate::error::{GbError, MAX_ROM_SIZE};
use crate::ppu::{self, Ppu};

/// Game Boy (DMG) system.
pub struct GameBoy {
    cpu: Sm83,
    ppu: Ppu,
    bus: GbBus,
    /// Master clock: counts T-cycles.
    master_clock: u64,
}

impl GameBoy {
    /// Create a Game Boy with the cartridge image loaded at $0000.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or larger than 32 KiB.
    pub fn new(config: &GbConfig) -> Result<Self, GbError> {
        if config.rom_data.is_empty() {
            return Err(GbError::EmptyRom);
        }
        if config.rom_data.len() > MAX_ROM_SIZE {
            return Err(GbError::RomTooLarge(config.rom_data.len()));
        }

        let mut bus = GbBus::new();
        bus.load_rom(&config.rom_data);

        let cpu = match config.start {
            StartState::Reset => Sm83::new(),
            StartState::PostBoot => Sm83::with_registers(Registers::post_boot()),
        };

        Ok(Self {
            cpu,
            ppu: Ppu::new(),
            bus,
            master_clock: 0,
        })
    }

    /// Advance the whole machine by one T-cycle.
    ///
    /// # Errors
    ///
    /// Returns [`GbError::Cpu`] if the CPU fetches an undefined opcode; the
    /// PPU does not advance on that cycle.
    pub fn tick(&mut self) -> Result<(), GbError> {
        self.cpu.tick(&mut self.bus)?;
        self.ppu.tick(&mut self.bus);
        self.master_clock += 1;
        Ok(())
    }

    /// Run one frame's worth of cycles.
    ///
    /// Returns the number of T-cycles executed.
    ///
    /// # Errors
    ///
    /// Stops at the first CPU fault.
    pub fn run_frame(&mut self) -> Result<u64, GbError> {
        let start_clock = self.master_clock;
        let target = start_clock + ppu::CYCLES_PER_FRAME;

        while self.master_clock < target {
            self.tick()?;
        }

        Ok(self.master_clock - start_clock)
    }

    /// Reference to the framebuffer (RGBA, 160x144).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.ppu.framebuffer()
    }

    /// Framebuffer width in pixels.
    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        ppu::FB_WIDTH
    }

    /// Framebuffer height in pixels.
    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        ppu::FB_HEIGHT
    }

    /// Forward bytes written to the serial data register to `sink`.
    pub fn set_serial_sink(&mut self, sink: impl FnMut(u8) + 'static) {
        self.bus.set_serial_sink(sink);
    }

    /// Call `tracer` on every instruction fetch.
    pub fn set_tracer(&mut self, tracer: impl FnMut(&Trace) + 'static) {
        self.cpu.set_tracer(tracer);
    }

    #[must_use]
    pub fn cpu(&self) -> &Sm83 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Sm83 {
        &mut self.cpu
    }

    #[must_use]
    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    #[must_use]
    pub fn bus(&self) -> &GbBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut GbBus {
        &mut self.bus
    }

    /// T-cycles since power-on.
    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Frames completed by the pixel pipeline.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.ppu.frame_count()
    }
}

impl Observable for GameBoy {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ppu.") {
            match rest {
                "mode" => Some(Value::Name(self.ppu.mode().name())),
                "ly" => Some(self.bus.ly().into()),
                "stat" => Some(self.bus.stat().into()),
                "lcdc" => Some(self.bus.lcdc().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|a| Value::U8(self.bus.peek(a)))
        } else {
            match path {
                "master_clock" => Some(self.master_clock.into()),
                "frame_count" => Some(self.frame_count().into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<sm83_paths>",
            "ppu.mode",
            "ppu.ly",
            "ppu.stat",
            "ppu.lcdc",
            "memory.<address>",
            "master_clock",
            "frame_count",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `JR -2` at $0100: spins forever.
    fn make_gb() -> GameBoy {
        let mut rom = vec![0u8; 0x8000];
        rom[0x100] = 0x18;
        rom[0x101] = 0xFE;
        GameBoy::new(&GbConfig {
            rom_data: rom,
            start: StartState::PostBoot,
        })
        .expect("valid ROM")
    }

    #[test]
    fn master_clock_advances() {
        let mut gb = make_gb();
        assert_eq!(gb.master_clock(), 0);
        gb.tick().expect("tick");
        assert_eq!(gb.master_clock(), 1);
    }

    #[test]
    fn run_frame_returns_tick_count() {
        let mut gb = make_gb();
        assert_eq!(gb.run_frame(), Ok(70_224));
        assert_eq!(gb.frame_count(), 1);
        assert_eq!(gb.query("ppu.ly"), Some(Value::U8(0)));
    }

    #[test]
    fn framebuffer_correct_size() {
        let gb = make_gb();
        assert_eq!(gb.framebuffer().len(), 160 * 144 * 4);
    }

    #[test]
    fn rejects_empty_and_oversized_roms() {
        let empty = GbConfig::default();
        assert_eq!(GameBoy::new(&empty).err(), Some(GbError::EmptyRom));

        let big = GbConfig {
            rom_data: vec![0; 0x8001],
            ..GbConfig::default()
        };
        assert_eq!(GameBoy::new(&big).err(), Some(GbError::RomTooLarge(0x8001)));
    }

    #[test]
    fn start_states() {
        let gb = make_gb();
        assert_eq!(gb.query("cpu.pc"), Some(Value::U16(0x0100)));
        assert_eq!(gb.query("cpu.af"), Some(Value::U16(0x01B0)));
        assert_eq!(gb.query("cpu.sp"), Some(Value::U16(0xFFFE)));

        let gb = GameBoy::new(&GbConfig {
            rom_data: vec![0x00],
            start: StartState::Reset,
        })
        .expect("valid ROM");
        assert_eq!(gb.query("cpu.pc"), Some(Value::U16(0x0000)));
        assert_eq!(gb.query("cpu.sp"), Some(Value::U16(0x0000)));
    }

    #[test]
    fn observable_paths() {
        let mut gb = make_gb();
        assert_eq!(gb.query("ppu.mode"), Some(Value::Name("oam_scan")));
        assert_eq!(gb.query("memory.0x0100"), Some(Value::U8(0x18)));
        assert_eq!(gb.query("memory.$FF40"), Some(Value::U8(0x91)));
        assert_eq!(gb.query("ppu.nope"), None);

        for _ in 0..80 {
            gb.tick().expect("tick");
        }
        assert_eq!(gb.query("ppu.mode"), Some(Value::Name("drawing")));
        assert_eq!(gb.query("master_clock"), Some(Value::U64(80)));
    }

    #[test]
    fn illegal_opcode_surfaces_as_cpu_error() {
        let mut rom = vec![0u8; 0x200];
        rom[0x100] = 0xFD;
        let mut gb = GameBoy::new(&GbConfig {
            rom_data: rom,
            start: StartState::PostBoot,
        })
        .expect("valid ROM");

        let err = gb.run_frame().err();
        assert_eq!(
            err,
            Some(GbError::Cpu(sharp_sm83::ExecError::IllegalOpcode {
                opcode: 0xFD,
                address: 0x0100
            }))
        );
        assert_eq!(gb.master_clock(), 0);
    }
}
