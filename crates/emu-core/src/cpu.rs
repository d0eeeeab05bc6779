//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// The CPU does not own the bus: it is lent on every tick so other
/// components (the video chip, for instance) can share it between CPU
/// cycles.
pub trait Cpu {
    /// Register snapshot type for inspection.
    type Registers;

    /// Fault raised when the CPU cannot continue (e.g. an undefined opcode).
    type Error;

    /// Advance the CPU by one clock cycle.
    ///
    /// # Errors
    ///
    /// Returns the CPU's fault type when execution cannot proceed. The CPU
    /// state is left as it was at the moment of the fault.
    fn tick<B: Bus>(&mut self, bus: &mut B) -> Result<(), Self::Error>;

    /// Current program counter.
    fn pc(&self) -> u16;

    /// Snapshot of all registers.
    fn registers(&self) -> Self::Registers;

    /// True while the CPU is halted waiting for an interrupt.
    fn is_halted(&self) -> bool;

    /// Return the CPU to its power-on state.
    fn reset(&mut self);
}
