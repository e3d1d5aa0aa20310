//! The host seam: everything the core calls out to while it runs.
//!
//! Memory regions backed by banks never reach the host. Regions mapped to
//! I/O land in the `read_*`/`write_*` methods here, and the pin-level events
//! (interrupt acknowledge, the RESET instruction, TAS write-back, function
//! code changes) are reported through the remaining methods. Implementing a
//! method is how a callback is installed; the defaults describe a bare board.

use serde::{Deserialize, Serialize};

/// Base of the autovector table (vector 25 is level 1).
pub const AUTOVECTOR_BASE: u8 = 24;
/// Vector used when the interrupting device answers with a bus error.
pub const SPURIOUS_VECTOR: u8 = 24;
/// Substituted when an interrupt vector table entry is still zero.
pub const UNINITIALIZED_VECTOR: u8 = 15;

/// Function code values from the 68000's FC0-FC2 pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionCode {
    UserData = 1,
    UserProgram = 2,
    SupervisorData = 5,
    SupervisorProgram = 6,
    /// Interrupt acknowledge cycle (CPU space).
    InterruptAck = 7,
}

impl FunctionCode {
    /// Build a function code from supervisor flag and program/data flag.
    #[must_use]
    pub fn from_flags(supervisor: bool, program: bool) -> Self {
        match (supervisor, program) {
            (false, false) => Self::UserData,
            (false, true) => Self::UserProgram,
            (true, false) => Self::SupervisorData,
            (true, true) => Self::SupervisorProgram,
        }
    }

    /// The 3-bit pin value.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Answer to an interrupt acknowledge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAck {
    /// The device placed this vector number on the bus.
    Vector(u8),
    /// VPA asserted: use vector 24 + level.
    Autovector,
    /// Bus error during acknowledge: use the spurious interrupt vector.
    Spurious,
}

impl InterruptAck {
    /// Vector number this answer selects for an interrupt at `level`.
    #[must_use]
    pub fn vector(self, level: u8) -> u8 {
        match self {
            Self::Vector(v) => v,
            Self::Autovector => AUTOVECTOR_BASE + (level & 7),
            Self::Spurious => SPURIOUS_VECTOR,
        }
    }
}

/// A change to the interrupt input pins requested by a device mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqChange {
    /// Same as [`Cpu68000::set_irq`](crate::Cpu68000::set_irq).
    Set(u8),
    /// Same as [`Cpu68000::set_irq_delayed`](crate::Cpu68000::set_irq_delayed).
    SetDelayed(u8),
}

/// Callbacks from the CPU into the surrounding machine.
pub trait M68kHost {
    /// Byte read from an I/O region. Unclaimed reads float high.
    fn read_byte(&mut self, addr: u32) -> u8 {
        log::trace!("unhandled byte read at {addr:06X}");
        0xFF
    }

    /// Word read from an I/O region.
    fn read_word(&mut self, addr: u32) -> u16 {
        log::trace!("unhandled word read at {addr:06X}");
        0xFFFF
    }

    /// Byte write to an I/O region.
    fn write_byte(&mut self, addr: u32, value: u8) {
        log::trace!("unhandled byte write {value:02X} at {addr:06X}");
    }

    /// Word write to an I/O region.
    fn write_word(&mut self, addr: u32, value: u16) {
        log::trace!("unhandled word write {value:04X} at {addr:06X}");
    }

    /// Interrupt acknowledge for `level` (1-7).
    fn interrupt_ack(&mut self, _level: u8) -> InterruptAck {
        InterruptAck::Autovector
    }

    /// The RESET instruction pulsed the reset line. The CPU itself is not
    /// reset.
    fn reset_instruction(&mut self) {}

    /// Whether TAS may complete its write-back to memory. Some machines
    /// (the Mega Drive, Amiga chip RAM) ignore the write cycle.
    fn tas_writeback(&mut self) -> bool {
        true
    }

    /// The function code pins changed. Only called when function code
    /// emulation is enabled in [`CpuConfig`](crate::CpuConfig).
    fn function_code_changed(&mut self, _fc: FunctionCode) {}

    /// Polled after every instruction so devices driven from memory-mapped
    /// writes can raise or drop an interrupt without re-entering the CPU.
    fn poll_irq(&mut self) -> Option<IrqChange> {
        None
    }
}

/// A host with nothing attached: I/O floats, interrupts autovector.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl M68kHost for NullHost {}
