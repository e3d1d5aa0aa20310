//! Exception processing.
//!
//! Group 0 (reset, address error) builds the long 14-byte frame; everything
//! else pushes PC then SR. All frames go on the supervisor stack: S is set
//! before the first push so A7 already names SSP.

use crate::alu::Size;
use crate::bus::{FunctionCode, M68kHost, UNINITIALIZED_VECTOR};
use crate::cpu::{Abort, AddressFault, Cpu68000, Exec, InstrMode, RunMode};
use crate::flags::{S, T};

pub const ADDRESS_ERROR: u8 = 3;
pub const ILLEGAL_INSTRUCTION: u8 = 4;
pub const ZERO_DIVIDE: u8 = 5;
pub const CHK: u8 = 6;
pub const TRAPV: u8 = 7;
pub const PRIVILEGE_VIOLATION: u8 = 8;
pub const TRACE: u8 = 9;
pub const LINE_A: u8 = 10;
pub const LINE_F: u8 = 11;
pub const TRAP_BASE: u8 = 32;

/// Cycles to take an exception through `vector`, frame and vector fetch
/// included.
#[must_use]
pub fn exception_cycles(vector: u8) -> u32 {
    match vector {
        ADDRESS_ERROR => 50,
        ZERO_DIVIDE => 38,
        CHK => 40,
        // Illegal, TRAPV, privilege, trace, line A/F, TRAP #n
        _ => 34,
    }
}

impl Cpu68000 {
    /// Enter supervisor mode for exception processing and return the SR to
    /// stack.
    fn begin_exception(&mut self) -> u16 {
        let sr = self.regs.sr();
        self.regs.set_sr((sr | S) & !T);
        self.tracing = false;
        self.instr_mode = InstrMode::Exception;
        sr
    }

    fn read_vector<H: M68kHost>(&mut self, host: &mut H, vector: u8) -> Exec<u32> {
        self.read_bus(host, u32::from(vector) << 2, Size::Long)
    }

    /// Group 1/2 exception: push PC and SR, jump through `vector`.
    pub(crate) fn exception<H: M68kHost>(&mut self, host: &mut H, vector: u8, pc: u32) {
        log::trace!("exception {vector} at {:06X}", self.instr_pc);
        let sr = self.begin_exception();
        let result = self.push_short_frame(host, pc, sr).and_then(|()| {
            let target = self.read_vector(host, vector)?;
            self.regs.pc = target;
            Ok(())
        });
        self.instr_mode = InstrMode::Instruction;
        self.use_cycles(exception_cycles(vector));
        self.commit_cycles();
        if let Err(abort) = result {
            self.nested_fault(host, abort);
        }
    }

    fn push_short_frame<H: M68kHost>(&mut self, host: &mut H, pc: u32, sr: u16) -> Exec {
        self.push(host, Size::Long, pc)?;
        self.push(host, Size::Word, u32::from(sr))
    }

    /// A fault while stacking a frame becomes an address error of its own.
    fn nested_fault<H: M68kHost>(&mut self, host: &mut H, abort: Abort) {
        if let Abort::Fault(fault) = abort {
            self.address_error(host, fault);
        }
    }

    /// Group 0 frame for an address error, then vector 3. A fault while
    /// building it halts the CPU.
    pub(crate) fn address_error<H: M68kHost>(&mut self, host: &mut H, fault: AddressFault) {
        if self.run_mode == RunMode::Group0 {
            log::debug!(
                "double fault at {:06X} (address {:06X}): halting",
                fault.pc,
                fault.address
            );
            self.halted = true;
            return;
        }
        log::debug!(
            "address error: {} {:06X} fc={} pc={:06X}",
            if fault.write { "write" } else { "read" },
            fault.address,
            fault.fc.bits(),
            fault.pc
        );
        self.last_fault = Some(fault);
        self.run_mode = RunMode::Group0;

        let sr = self.begin_exception();
        let result = self.push_group0_frame(host, fault, sr).and_then(|()| {
            let target = self.read_vector(host, ADDRESS_ERROR)?;
            self.regs.pc = target;
            Ok(())
        });

        self.instr_mode = InstrMode::Instruction;
        self.use_cycles(exception_cycles(ADDRESS_ERROR));
        self.commit_cycles();
        match result {
            Ok(()) => self.run_mode = RunMode::Normal,
            Err(_) => {
                log::debug!("double fault building address error frame: halting");
                self.halted = true;
                self.run_mode = RunMode::Normal;
            }
        }
    }

    fn push_group0_frame<H: M68kHost>(&mut self, host: &mut H, fault: AddressFault, sr: u16) -> Exec {
        self.push(host, Size::Long, fault.pc)?;
        self.push(host, Size::Word, u32::from(sr))?;
        self.push(host, Size::Word, u32::from(self.ir))?;
        self.push(host, Size::Long, fault.address)?;
        self.push(host, Size::Word, u32::from(fault.access_word()))
    }

    /// True when the next instruction boundary will take an interrupt.
    pub(crate) fn interrupt_due(&self) -> bool {
        self.nmi_pending || self.int_level > self.regs.interrupt_mask()
    }

    /// Take a pending interrupt if one is due. Returns the vector used.
    pub(crate) fn service_interrupts<H: M68kHost>(&mut self, host: &mut H) -> Option<u8> {
        if !self.interrupt_due() {
            return None;
        }
        let level = if self.nmi_pending { 7 } else { self.int_level };
        self.nmi_pending = false;
        self.stopped = false;
        self.instr_cycles = 0;

        self.set_fc(host, FunctionCode::InterruptAck);
        let vector = host.interrupt_ack(level).vector(level);
        log::trace!("interrupt level {level} -> vector {vector}");

        let pc = self.regs.pc;
        let sr = self.begin_exception();
        self.regs.set_interrupt_mask(level);
        let result = self.push_short_frame(host, pc, sr).and_then(|()| {
            let mut target = self.read_vector(host, vector)?;
            if target == 0 {
                target = self.read_vector(host, UNINITIALIZED_VECTOR)?;
            }
            self.regs.pc = target;
            Ok(())
        });
        self.instr_mode = InstrMode::Instruction;
        self.use_cycles(44);
        self.commit_cycles();
        if let Err(abort) = result {
            self.nested_fault(host, abort);
        }
        Some(vector)
    }

    /// Trace exception after an instruction that started with T set.
    pub(crate) fn trace_exception<H: M68kHost>(&mut self, host: &mut H) {
        let pc = self.regs.pc;
        self.exception(host, TRACE, pc);
    }
}
