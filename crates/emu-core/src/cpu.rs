//! CPU core trait.

use crate::Ticks;

/// A CPU core that executes whole instructions against a cycle budget.
///
/// `H` is the host: whatever the core calls back into for memory-mapped
/// I/O and interrupt acknowledge. It is borrowed for the duration of a run
/// so callbacks can never re-enter the CPU.
pub trait BudgetCpu<H> {
    /// Run until at least `budget` cycles have elapsed, the CPU stops, or it
    /// halts. A core may also end the run early on an event the caller must
    /// see, such as a bus fault. Returns the cycles consumed, which may
    /// overshoot the budget by up to one instruction.
    fn run(&mut self, host: &mut H, budget: u32) -> u32;

    /// Returns the current program counter.
    fn pc(&self) -> u32;

    /// Returns true if the CPU is halted and will not execute until released.
    fn is_halted(&self) -> bool;

    /// Total cycles executed since construction.
    fn total_cycles(&self) -> Ticks;

    /// Assert an interrupt priority level on the CPU's input pins.
    fn set_irq(&mut self, level: u8);

    /// Pulse the reset line.
    fn reset(&mut self, host: &mut H);
}
