//! Cycle-accurate Game Boy (DMG) emulator.
//!
//! The master clock ticks at 4,194,304 Hz. The SM83 CPU and the pixel
//! pipeline both advance one T-cycle per tick and talk to each other only
//! through the memory-mapped registers.
//!
//! One frame = 154 scanlines x 456 cycles = 70,224 cycles.

mod bus;
#[cfg(feature = "capture")]
pub mod capture;
mod config;
mod error;
mod gameboy;
pub mod io;
pub mod ppu;

pub use bus::GbBus;
pub use config::{GbConfig, StartState};
pub use error::{GbError, MAX_ROM_SIZE};
pub use gameboy::GameBoy;
pub use ppu::{Mode, Ppu};
