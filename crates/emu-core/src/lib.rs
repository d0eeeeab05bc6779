//! Core traits and types for cycle-accurate emulation.
//!
//! One tick is one cycle of the master clock. Every component that shares
//! the bus advances by the same tick, so state observed through the bus is
//! always consistent between components.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
pub use ticks::Ticks;
