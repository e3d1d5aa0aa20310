//! Motorola 68000 interpreter.
//!
//! Executes whole instructions against a [`MemoryMap`] of 256 regions of
//! 64 KiB, charging the documented cycle cost of each, until a cycle budget
//! is met. Everything outside the CPU (I/O regions, interrupt acknowledge,
//! the RESET and TAS bus quirks) is reached through the [`M68kHost`] trait.
//!
//! ```
//! use cpu_m68k_interp::{Cpu68000, NullHost};
//!
//! let mut cpu = Cpu68000::new();
//! let ram = cpu.memory_mut().add_bank(0x1_0000);
//! cpu.memory_mut().map_ram(0, 0x1_0000, ram);
//! cpu.memory_mut().load(ram, 0, &[0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x04, 0x00]);
//! cpu.memory_mut().load(ram, 0x400, &[0x60, 0xFE]); // BRA *
//!
//! let mut host = NullHost;
//! cpu.pulse_reset(&mut host);
//! assert_eq!(cpu.run(&mut host, 1000), 1000);
//! assert_eq!(cpu.regs.pc, 0x400);
//! ```

mod addressing;
mod alu;
mod arith;
mod branches;
mod bus;
mod config;
mod cpu;
mod decode;
mod ea;
mod exceptions;
pub mod flags;
mod idle;
mod immediates;
mod logic;
mod memory;
mod misc;
mod registers;
mod shifts;
mod state;
mod timing;

pub use addressing::AddrMode;
pub use alu::Size;
pub use bus::{
    AUTOVECTOR_BASE, FunctionCode, InterruptAck, IrqChange, M68kHost, NullHost, SPURIOUS_VECTOR,
    UNINITIALIZED_VECTOR,
};
pub use config::CpuConfig;
pub use cpu::{AddressFault, Cpu68000, StepOutcome};
pub use exceptions::{
    ADDRESS_ERROR, CHK, ILLEGAL_INSTRUCTION, LINE_A, LINE_F, PRIVILEGE_VIOLATION, TRACE, TRAP_BASE,
    TRAPV, ZERO_DIVIDE,
};
pub use flags::Status;
pub use memory::{ADDRESS_MASK, Backing, BankId, MemoryMap, REGION_COUNT, REGION_SIZE, Region};
pub use registers::{Register, Registers};
pub use state::{STATE_VERSION, StateError};
