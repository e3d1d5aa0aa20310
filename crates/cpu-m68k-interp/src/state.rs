//! Save states.
//!
//! A snapshot holds the CPU's own state only. The memory map and its banks
//! belong to the machine and are saved by it.

use std::fmt;

use emu_core::Ticks;
use serde::{Deserialize, Serialize};

use crate::bus::FunctionCode;
use crate::cpu::{AddressFault, Cpu68000, InstrMode, RunMode};
use crate::idle::IdleDetector;
use crate::registers::Registers;

/// Bumped whenever [`Snapshot`] changes shape.
pub const STATE_VERSION: u16 = 1;

#[derive(Debug)]
pub enum StateError {
    Encode(rmp_serde::encode::Error),
    Decode(rmp_serde::decode::Error),
    UnsupportedVersion(u16),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "failed to encode CPU state: {e}"),
            Self::Decode(e) => write!(f, "failed to decode CPU state: {e}"),
            Self::UnsupportedVersion(v) => write!(
                f,
                "unsupported CPU state version {v} (expected {STATE_VERSION})"
            ),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::UnsupportedVersion(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    version: u16,
    regs: Registers,
    ir: u16,
    instr_pc: u32,
    pref_addr: u32,
    pref_data: u16,
    fc: FunctionCode,
    int_level: u8,
    nmi_pending: bool,
    delayed_level: Option<u8>,
    stopped: bool,
    halted: bool,
    instr_mode: InstrMode,
    run_mode: RunMode,
    last_fault: Option<AddressFault>,
    last_cost: u32,
    total_cycles: Ticks,
    idle: IdleDetector,
}

impl Cpu68000 {
    /// Serialize the CPU state. Call between runs.
    pub fn save_state(&self) -> Result<Vec<u8>, StateError> {
        let snapshot = Snapshot {
            version: STATE_VERSION,
            regs: self.regs,
            ir: self.ir,
            instr_pc: self.instr_pc,
            pref_addr: self.pref_addr,
            pref_data: self.pref_data,
            fc: self.fc,
            int_level: self.int_level,
            nmi_pending: self.nmi_pending,
            delayed_level: self.delayed_level,
            stopped: self.stopped,
            halted: self.halted,
            instr_mode: self.instr_mode,
            run_mode: self.run_mode,
            last_fault: self.last_fault,
            last_cost: self.last_cost,
            total_cycles: self.total_cycles,
            idle: self.idle,
        };
        rmp_serde::to_vec(&snapshot).map_err(StateError::Encode)
    }

    /// Replace the CPU state with a snapshot from [`save_state`](Self::save_state).
    /// On error the CPU is left untouched.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), StateError> {
        let s: Snapshot = rmp_serde::from_slice(data).map_err(StateError::Decode)?;
        if s.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(s.version));
        }

        self.regs = s.regs;
        self.ir = s.ir;
        self.instr_pc = s.instr_pc;
        self.pref_addr = s.pref_addr;
        self.pref_data = s.pref_data;
        self.fc = s.fc;
        self.int_level = s.int_level;
        self.nmi_pending = s.nmi_pending;
        self.delayed_level = s.delayed_level;
        self.stopped = s.stopped;
        self.halted = s.halted;
        self.instr_mode = s.instr_mode;
        self.run_mode = s.run_mode;
        self.last_fault = s.last_fault;
        self.last_cost = s.last_cost;
        self.total_cycles = s.total_cycles;
        self.idle = s.idle;
        self.tracing = false;
        self.branch_to_self = false;
        self.instr_cycles = 0;
        self.cycles = 0;
        self.cycle_end = 0;
        log::debug!("state loaded: pc={:08X} sr={:04X}", self.regs.pc, self.regs.sr());
        Ok(())
    }
}
