//! The CPU context and its run loop.
//!
//! Execution is instruction-at-a-time: each step fetches an opcode,
//! resolves its operands, executes it and charges the documented cycle
//! cost. Interrupts are sampled between instructions. A misaligned access
//! abandons the instruction in flight: the handlers propagate an
//! [`Abort`] with `?`, the step restores the registers it saved before the
//! opcode fetch, and the address error is raised from the clean state.

use emu_core::{BudgetCpu, Observable, Ticks, Value};
use serde::{Deserialize, Serialize};

use crate::alu::Size;
use crate::bus::{FunctionCode, IrqChange, M68kHost};
use crate::config::CpuConfig;
use crate::flags::{C, N, V, X, Z};
use crate::idle::IdleDetector;
use crate::memory::MemoryMap;
use crate::registers::{Register, Registers};

/// Details of an address error, as captured for the exception frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFault {
    /// The odd address that was accessed.
    pub address: u32,
    /// True for a write cycle.
    pub write: bool,
    pub fc: FunctionCode,
    /// False when the fault happened during exception processing.
    pub instruction: bool,
    /// PC when the fault was detected; this is what the frame stacks.
    pub pc: u32,
}

impl AddressFault {
    /// The access-information word of the group 0 frame:
    /// R/W in bit 4, I/N in bit 3, function code in bits 2-0.
    #[must_use]
    pub fn access_word(&self) -> u16 {
        let rw = if self.write { 0 } else { 0x10 };
        let in_bit = if self.instruction { 0 } else { 0x08 };
        rw | in_bit | u16::from(self.fc.bits())
    }
}

/// Why an instruction stopped short of completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Abort {
    /// Misaligned access. The instruction's register effects are undone.
    Fault(AddressFault),
    /// The instruction raises an exception. Effects so far stand.
    Trap { vector: u8, pc: u32 },
}

/// Result type threaded through every bus access and instruction handler.
pub(crate) type Exec<T = ()> = Result<T, Abort>;

/// What one call to [`Cpu68000::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An instruction ran to completion.
    Completed,
    /// An instruction raised the given exception vector (TRAP, CHK,
    /// illegal, privilege...).
    Exception(u8),
    /// An instruction was abandoned on an address error.
    AddressFault(AddressFault),
    /// An interrupt was taken through the given vector.
    Interrupt(u8),
    /// The CPU is stopped waiting for an interrupt.
    Stopped,
    /// The CPU is halted.
    Halted,
}

/// Whether bus cycles belong to an instruction or to exception processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrMode {
    Instruction,
    Exception,
}

/// Set while building a reset or address-error frame; a further address
/// error in this mode is a double fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    Normal,
    Group0,
}

pub(crate) const QUERY_PATHS: &[&str] = &[
    "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7", "a0", "a1", "a2", "a3", "a4", "a5", "a6",
    "a7", "usp", "ssp", "pc", "sr", "ccr", "flags.x", "flags.n", "flags.z", "flags.v", "flags.c",
    "flags.s", "flags.t", "int_mask", "int_level", "halted", "stopped", "cycles", "opcode",
    "fc", "idle",
];

/// A Motorola 68000.
#[derive(Debug, Clone)]
pub struct Cpu68000 {
    pub regs: Registers,
    pub(crate) memory: MemoryMap,
    pub(crate) config: CpuConfig,

    /// Opcode of the instruction being executed.
    pub(crate) ir: u16,
    /// Address of the instruction being executed.
    pub(crate) instr_pc: u32,
    pub(crate) pref_addr: u32,
    pub(crate) pref_data: u16,
    pub(crate) fc: FunctionCode,

    /// Level on the IPL pins.
    pub(crate) int_level: u8,
    /// Latched on a rise to level 7.
    pub(crate) nmi_pending: bool,
    /// Level to apply once the next instruction completes.
    pub(crate) delayed_level: Option<u8>,

    pub(crate) stopped: bool,
    pub(crate) halted: bool,
    pub(crate) instr_mode: InstrMode,
    pub(crate) run_mode: RunMode,
    pub(crate) last_fault: Option<AddressFault>,
    /// T was set when the current instruction started.
    pub(crate) tracing: bool,

    /// Master clocks consumed in the current `run`.
    pub(crate) cycles: u32,
    /// Budget of the current `run`.
    pub(crate) cycle_end: u32,
    /// CPU clocks charged by the instruction in flight.
    pub(crate) instr_cycles: u32,
    /// CPU clocks of the last completed instruction.
    pub(crate) last_cost: u32,
    pub(crate) total_cycles: Ticks,

    pub(crate) idle: IdleDetector,
    /// The instruction just executed was a taken branch to itself.
    pub(crate) branch_to_self: bool,
}

impl Default for Cpu68000 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu68000 {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    #[must_use]
    pub fn with_config(config: CpuConfig) -> Self {
        Self::with_memory(config, MemoryMap::new())
    }

    /// A CPU wired to an already-built memory map.
    #[must_use]
    pub fn with_memory(config: CpuConfig, memory: MemoryMap) -> Self {
        Self {
            regs: Registers::new(),
            memory,
            config,
            ir: 0,
            instr_pc: 0,
            pref_addr: 0,
            pref_data: 0,
            fc: FunctionCode::SupervisorProgram,
            int_level: 0,
            nmi_pending: false,
            delayed_level: None,
            stopped: false,
            halted: false,
            instr_mode: InstrMode::Instruction,
            run_mode: RunMode::Normal,
            last_fault: None,
            tracing: false,
            cycles: 0,
            cycle_end: 0,
            instr_cycles: 0,
            last_cost: 0,
            total_cycles: Ticks::ZERO,
            idle: IdleDetector::default(),
            branch_to_self: false,
        }
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryMap {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryMap {
        &mut self.memory
    }

    #[must_use]
    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CpuConfig {
        &mut self.config
    }

    /// Master clocks consumed by the most recent `run` or `step`.
    #[must_use]
    pub fn cycles_run(&self) -> u32 {
        self.cycles
    }

    #[must_use]
    pub fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn irq_level(&self) -> u8 {
        self.int_level
    }

    /// Function code of the most recent bus cycle.
    #[must_use]
    pub fn function_code(&self) -> FunctionCode {
        self.fc
    }

    /// The most recent address error, if any has occurred since reset.
    #[must_use]
    pub fn last_address_fault(&self) -> Option<AddressFault> {
        self.last_fault
    }

    /// True once the idle-loop detector has confirmed a spin loop.
    #[must_use]
    pub fn idle_detected(&self) -> bool {
        self.idle.detected()
    }

    // ========================================================================
    // Register access
    // ========================================================================

    /// Read any architectural or pipeline register.
    #[must_use]
    pub fn get(&self, reg: Register) -> u32 {
        match reg {
            Register::Pc => self.regs.pc,
            Register::Sr => u32::from(self.regs.sr()),
            Register::Sp => self.regs.active_sp(),
            Register::Usp => self.regs.usp,
            Register::Isp => self.regs.ssp,
            Register::PrefAddr => self.pref_addr,
            Register::PrefData => u32::from(self.pref_data),
            Register::Ir => u32::from(self.ir),
            other => match other.index() {
                Some((false, n)) => self.regs.d[n],
                Some((true, n)) => self.regs.a(n),
                None => 0,
            },
        }
    }

    /// Write any register. Only meaningful between runs; an SR write takes
    /// effect (stack switch, interrupt mask) at the next instruction
    /// boundary.
    pub fn set(&mut self, reg: Register, value: u32) {
        match reg {
            Register::Pc => self.regs.pc = value,
            Register::Sr => self.regs.set_sr(value as u16),
            Register::Sp => self.regs.set_active_sp(value),
            Register::Usp => self.regs.usp = value,
            Register::Isp => self.regs.ssp = value,
            Register::PrefAddr => self.pref_addr = value,
            Register::PrefData => self.pref_data = value as u16,
            Register::Ir => self.ir = value as u16,
            other => match other.index() {
                Some((false, n)) => self.regs.d[n] = value,
                Some((true, n)) => self.regs.set_a(n, value),
                None => {}
            },
        }
    }

    // ========================================================================
    // Pins
    // ========================================================================

    /// Pulse RESET: supervisor mode, interrupts masked, SSP and PC loaded
    /// from the first two vectors. Clears STOP and HALT.
    pub fn pulse_reset<H: M68kHost>(&mut self, host: &mut H) {
        self.stopped = false;
        self.halted = false;
        self.tracing = false;
        self.int_level = 0;
        self.nmi_pending = false;
        self.delayed_level = None;
        self.last_fault = None;
        self.idle.clear();
        self.branch_to_self = false;
        self.instr_mode = InstrMode::Exception;
        self.run_mode = RunMode::Group0;

        self.regs.set_sr(0x2700);
        self.set_fc(host, FunctionCode::SupervisorProgram);
        self.regs.ssp = self.memory.read_long(host, 0);
        self.regs.pc = self.memory.read_long(host, 4);
        self.pref_addr = 4;
        self.pref_data = self.regs.pc as u16;

        self.instr_mode = InstrMode::Instruction;
        self.run_mode = RunMode::Normal;
        self.total_cycles += self.scale(40);
        log::debug!(
            "reset: ssp={:08X} pc={:08X}",
            self.regs.ssp,
            self.regs.pc
        );
    }

    /// Drive the interrupt priority level (0-7).
    ///
    /// A rise to 7 from any lower level is latched as an edge and taken even
    /// when the mask is 7. Holding 7 does not re-trigger.
    pub fn set_irq(&mut self, level: u8) {
        let level = level & 7;
        if self.int_level != 7 && level == 7 {
            self.nmi_pending = true;
        }
        if level != self.int_level {
            log::trace!("irq level {} -> {level}", self.int_level);
        }
        self.int_level = level;
    }

    /// Drive the interrupt level after one more instruction has executed,
    /// modelling the latency between a device asserting IPL and the CPU
    /// sampling it.
    pub fn set_irq_delayed(&mut self, level: u8) {
        if self.stopped || self.halted {
            self.set_irq(level);
        } else {
            self.delayed_level = Some(level & 7);
        }
    }

    /// OR `mask` into the asserted level.
    pub fn update_irq(&mut self, mask: u8) {
        self.set_irq(self.int_level | mask);
    }

    /// Assert HALT: the CPU executes nothing until released or reset.
    pub fn pulse_halt(&mut self) {
        self.halted = true;
        log::debug!("halt asserted at pc={:08X}", self.regs.pc);
    }

    pub fn clear_halt(&mut self) {
        self.halted = false;
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run for `budget` master clocks. Returns the clocks consumed, which
    /// overshoots the budget by at most one instruction. A stopped or halted
    /// CPU consumes the whole budget. An address error ends the run early,
    /// with the CPU already vectored to its handler.
    pub fn run<H: M68kHost>(&mut self, host: &mut H, budget: u32) -> u32 {
        self.cycles = 0;
        self.cycle_end = budget;

        while self.cycles < self.cycle_end {
            let outcome = self.step_inner(host);
            if matches!(outcome, StepOutcome::Stopped | StepOutcome::Halted) {
                self.cycles = self.cycle_end;
                break;
            }
            self.after_step(host);
            if matches!(outcome, StepOutcome::AddressFault(_)) {
                break;
            }
            if self.track_idle() {
                self.skip_idle_loop();
            }
        }

        self.total_cycles += Ticks::from(self.cycles);
        self.cycles
    }

    /// Execute one instruction, or take one pending interrupt.
    pub fn step<H: M68kHost>(&mut self, host: &mut H) -> StepOutcome {
        self.cycles = 0;
        self.cycle_end = 0;
        let outcome = self.step_inner(host);
        self.after_step(host);
        self.track_idle();
        self.total_cycles += Ticks::from(self.cycles);
        outcome
    }

    fn step_inner<H: M68kHost>(&mut self, host: &mut H) -> StepOutcome {
        self.branch_to_self = false;
        if self.halted {
            return StepOutcome::Halted;
        }
        if let Some(vector) = self.service_interrupts(host) {
            return StepOutcome::Interrupt(vector);
        }
        if self.halted {
            return StepOutcome::Halted;
        }
        if self.stopped {
            return StepOutcome::Stopped;
        }
        self.execute_instruction(host)
    }

    fn execute_instruction<H: M68kHost>(&mut self, host: &mut H) -> StepOutcome {
        let saved = self.regs;
        self.instr_pc = self.regs.pc;
        self.instr_cycles = 0;
        self.instr_mode = InstrMode::Instruction;
        self.tracing = self.regs.is_trace();

        match self.decode_and_execute(host) {
            Ok(()) => {
                self.commit_cycles();
                if self.tracing {
                    self.trace_exception(host);
                }
                StepOutcome::Completed
            }
            Err(Abort::Trap { vector, pc }) => {
                self.exception(host, vector, pc);
                StepOutcome::Exception(vector)
            }
            Err(Abort::Fault(fault)) => {
                self.regs = saved;
                self.instr_cycles = 0;
                self.branch_to_self = false;
                self.address_error(host, fault);
                StepOutcome::AddressFault(fault)
            }
        }
    }

    /// Bookkeeping at every instruction boundary: the delayed interrupt
    /// level lands, then devices get a chance to change the pins.
    fn after_step<H: M68kHost>(&mut self, host: &mut H) {
        if let Some(level) = self.delayed_level.take() {
            self.set_irq(level);
        }
        match host.poll_irq() {
            Some(IrqChange::Set(level)) => self.set_irq(level),
            Some(IrqChange::SetDelayed(level)) => self.set_irq_delayed(level),
            None => {}
        }
    }

    /// Feed the idle-loop detector. True once a spin loop is confirmed.
    fn track_idle(&mut self) -> bool {
        if !self.branch_to_self {
            self.idle.clear();
            return false;
        }
        let now = self.total_cycles.get() + u64::from(self.cycles);
        self.idle.observe(self.instr_pc, now)
    }

    /// Jump to the end of the budget in whole iterations of the spin loop,
    /// leaving the same state literal execution would.
    fn skip_idle_loop(&mut self) {
        let cost = self.scale(self.last_cost);
        if !self.config.idle_loop_skip || self.tracing || cost == 0 {
            return;
        }
        // An interrupt due at the next boundary ends the loop.
        if self.interrupt_due() || self.delayed_level.is_some() {
            return;
        }
        let pc = self.instr_pc;
        let remaining = self.cycle_end.saturating_sub(self.cycles);
        if remaining > 0 {
            let iterations = remaining.div_ceil(cost);
            self.cycles = self.cycles.saturating_add(iterations.saturating_mul(cost));
            log::trace!(
                "idle loop at {pc:06X} (seen at cycle {}): skipped {iterations} iterations",
                self.idle.last_seen()
            );
        }
    }

    // ========================================================================
    // Cycle accounting
    // ========================================================================

    /// Charge CPU clocks to the instruction in flight.
    #[inline]
    pub(crate) fn use_cycles(&mut self, n: u32) {
        self.instr_cycles += n;
    }

    pub(crate) fn commit_cycles(&mut self) {
        self.cycles = self.cycles.saturating_add(self.scale(self.instr_cycles));
        self.last_cost = self.instr_cycles;
        self.instr_cycles = 0;
    }

    pub(crate) fn scale(&self, cpu_cycles: u32) -> u32 {
        cpu_cycles.saturating_mul(self.config.clock_divider.max(1))
    }

    // ========================================================================
    // Bus access
    // ========================================================================

    pub(crate) fn set_fc<H: M68kHost>(&mut self, host: &mut H, fc: FunctionCode) {
        if self.fc != fc {
            self.fc = fc;
            if self.config.emulate_function_codes {
                host.function_code_changed(fc);
            }
        }
    }

    fn data_fc(&self) -> FunctionCode {
        FunctionCode::from_flags(self.regs.is_supervisor(), false)
    }

    fn program_fc(&self) -> FunctionCode {
        FunctionCode::from_flags(self.regs.is_supervisor(), true)
    }

    fn check_alignment(&self, addr: u32, size: Size, write: bool, fc: FunctionCode) -> Exec {
        if size != Size::Byte && addr & 1 != 0 && self.config.address_errors {
            return Err(Abort::Fault(AddressFault {
                address: addr,
                write,
                fc,
                instruction: self.instr_mode == InstrMode::Instruction,
                pc: self.regs.pc,
            }));
        }
        Ok(())
    }

    /// Data-space read. Word and long accesses must be even.
    pub(crate) fn read_bus<H: M68kHost>(&mut self, host: &mut H, addr: u32, size: Size) -> Exec<u32> {
        let fc = self.data_fc();
        self.check_alignment(addr, size, false, fc)?;
        self.set_fc(host, fc);
        Ok(match size {
            Size::Byte => u32::from(self.memory.read_byte(host, addr)),
            Size::Word => u32::from(self.memory.read_word(host, addr)),
            Size::Long => self.memory.read_long(host, addr),
        })
    }

    /// Data-space write. Word and long accesses must be even.
    pub(crate) fn write_bus<H: M68kHost>(
        &mut self,
        host: &mut H,
        addr: u32,
        size: Size,
        value: u32,
    ) -> Exec {
        let fc = self.data_fc();
        self.check_alignment(addr, size, true, fc)?;
        self.set_fc(host, fc);
        match size {
            Size::Byte => self.memory.write_byte(host, addr, value as u8),
            Size::Word => self.memory.write_word(host, addr, value as u16),
            Size::Long => self.memory.write_long(host, addr, value),
        }
        Ok(())
    }

    /// Program-space operand read (PC-relative modes). Never faults.
    pub(crate) fn read_program<H: M68kHost>(&mut self, host: &mut H, addr: u32, size: Size) -> u32 {
        let fc = self.program_fc();
        self.set_fc(host, fc);
        match size {
            Size::Byte => u32::from(self.memory.read_byte(host, addr)),
            Size::Word => u32::from(self.memory.fetch_word(host, addr)),
            Size::Long => {
                let hi = self.memory.fetch_word(host, addr);
                let lo = self.memory.fetch_word(host, addr.wrapping_add(2));
                (u32::from(hi) << 16) | u32::from(lo)
            }
        }
    }

    /// Fetch the word at PC and advance past it.
    pub(crate) fn fetch_word<H: M68kHost>(&mut self, host: &mut H) -> Exec<u16> {
        let pc = self.regs.pc;
        let fc = self.program_fc();
        self.check_alignment(pc, Size::Word, false, fc)?;
        self.set_fc(host, fc);
        let word = self.memory.fetch_word(host, pc);
        self.pref_addr = pc;
        self.pref_data = word;
        self.regs.pc = pc.wrapping_add(2);
        Ok(word)
    }

    pub(crate) fn fetch_long<H: M68kHost>(&mut self, host: &mut H) -> Exec<u32> {
        let hi = self.fetch_word(host)?;
        let lo = self.fetch_word(host)?;
        Ok((u32::from(hi) << 16) | u32::from(lo))
    }

    pub(crate) fn push<H: M68kHost>(&mut self, host: &mut H, size: Size, value: u32) -> Exec {
        let sp = self.regs.a(7).wrapping_sub(size.bytes());
        self.write_bus(host, sp, size, value)?;
        self.regs.set_a(7, sp);
        Ok(())
    }

    pub(crate) fn pop<H: M68kHost>(&mut self, host: &mut H, size: Size) -> Exec<u32> {
        let sp = self.regs.a(7);
        let value = self.read_bus(host, sp, size)?;
        self.regs.set_a(7, sp.wrapping_add(size.bytes()));
        Ok(value)
    }

    /// Raise a privilege violation unless in supervisor mode.
    pub(crate) fn require_supervisor(&self) -> Exec {
        if self.regs.is_supervisor() {
            Ok(())
        } else {
            Err(Abort::Trap {
                vector: crate::exceptions::PRIVILEGE_VIOLATION,
                pc: self.instr_pc,
            })
        }
    }

    /// The current instruction does not exist on the 68000.
    pub(crate) fn illegal<T>(&self) -> Exec<T> {
        Err(Abort::Trap {
            vector: crate::exceptions::ILLEGAL_INSTRUCTION,
            pc: self.instr_pc,
        })
    }

    /// Current SR condition codes, for handlers that rebuild flags.
    #[inline]
    pub(crate) fn sr(&self) -> u16 {
        self.regs.sr()
    }

    #[inline]
    pub(crate) fn set_sr_flags(&mut self, sr: u16) {
        let keep = self.regs.sr() & !(X | N | Z | V | C);
        self.regs.set_sr(keep | (sr & (X | N | Z | V | C)));
    }
}

impl<H: M68kHost> BudgetCpu<H> for Cpu68000 {
    fn run(&mut self, host: &mut H, budget: u32) -> u32 {
        Cpu68000::run(self, host, budget)
    }

    fn pc(&self) -> u32 {
        self.regs.pc
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    fn set_irq(&mut self, level: u8) {
        Cpu68000::set_irq(self, level);
    }

    fn reset(&mut self, host: &mut H) {
        self.pulse_reset(host);
    }
}

impl Observable for Cpu68000 {
    fn query(&self, path: &str) -> Option<Value> {
        let sr = self.regs.sr();
        if let Some(n) = path.strip_prefix('d').and_then(|n| n.parse::<usize>().ok()) {
            return (n < 8).then(|| self.regs.d[n].into());
        }
        if let Some(n) = path.strip_prefix('a').and_then(|n| n.parse::<usize>().ok()) {
            return (n < 8).then(|| self.regs.a(n).into());
        }
        match path {
            "usp" => Some(self.regs.usp.into()),
            "ssp" => Some(self.regs.ssp.into()),
            "pc" => Some(self.regs.pc.into()),
            "sr" => Some(sr.into()),
            "ccr" => Some(self.regs.ccr().into()),
            "flags.x" => Some((sr & X != 0).into()),
            "flags.n" => Some((sr & N != 0).into()),
            "flags.z" => Some((sr & Z != 0).into()),
            "flags.v" => Some((sr & V != 0).into()),
            "flags.c" => Some((sr & C != 0).into()),
            "flags.s" => Some(self.regs.is_supervisor().into()),
            "flags.t" => Some(self.regs.is_trace().into()),
            "int_mask" => Some(self.regs.interrupt_mask().into()),
            "int_level" => Some(self.int_level.into()),
            "halted" => Some(self.halted.into()),
            "stopped" => Some(self.stopped.into()),
            "cycles" => Some(self.total_cycles.get().into()),
            "opcode" => Some(self.ir.into()),
            "fc" => Some(self.fc.bits().into()),
            "idle" => Some(self.idle.detected().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
