//! Program flow: Bcc/BRA/BSR, DBcc, JMP/JSR, RTS/RTE/RTR.
//!
//! Jumps never check the target here. An odd target faults on the opcode
//! fetch that follows, as on the real bus.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kHost;
use crate::cpu::{Cpu68000, Exec};
use crate::flags::{CCR_MASK, Status};
use crate::timing;

impl Cpu68000 {
    /// EA field restricted to control modes, with its timing-table column.
    pub(crate) fn control_mode(&self, op: u16) -> Exec<(AddrMode, usize)> {
        let mode = self.ea_field(op)?;
        match mode.control_index() {
            Some(index) => Ok((mode, index)),
            None => self.illegal(),
        }
    }

    // ========================================================================
    // Bcc / BRA / BSR: 0110 CCCC DDDDDDDD (D=0: 16-bit displacement follows)
    // ========================================================================

    pub(crate) fn exec_branch<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let cond = ((op >> 8) & 0x0F) as u8;
        let base = self.regs.pc;
        let disp8 = op as u8;
        let (disp, word) = if disp8 == 0 {
            (i32::from(self.fetch_word(host)? as i16), true)
        } else {
            (i32::from(disp8 as i8), false)
        };
        let target = base.wrapping_add(disp as u32);

        match cond {
            // BSR
            1 => {
                let ret = self.regs.pc;
                self.push(host, Size::Long, ret)?;
                self.regs.pc = target;
                self.use_cycles(18);
            }
            _ if Status::condition(self.sr(), cond) => {
                self.regs.pc = target;
                self.branch_to_self = target == self.instr_pc;
                self.use_cycles(10);
            }
            _ => self.use_cycles(if word { 12 } else { 8 }),
        }
        Ok(())
    }

    /// DBcc Dn,label: 0101 CCCC 11001 RRR + d16
    pub(crate) fn exec_dbcc<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let cond = ((op >> 8) & 0x0F) as u8;
        let reg = usize::from(op & 7);
        let base = self.regs.pc;
        let disp = self.fetch_word(host)? as i16;

        if Status::condition(self.sr(), cond) {
            self.use_cycles(12);
            return Ok(());
        }

        let count = (self.regs.d[reg] as u16).wrapping_sub(1);
        self.regs.d[reg] = Size::Word.merge(self.regs.d[reg], u32::from(count));
        if count == 0xFFFF {
            self.use_cycles(14);
        } else {
            self.regs.pc = base.wrapping_add(i32::from(disp) as u32);
            self.use_cycles(10);
        }
        Ok(())
    }

    // ========================================================================
    // JMP / JSR
    // ========================================================================

    pub(crate) fn exec_jmp<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let (mode, index) = self.control_mode(op)?;
        let target = self.control_address(host, mode)?;
        self.regs.pc = target;
        self.branch_to_self = target == self.instr_pc;
        self.use_cycles(timing::JMP[index]);
        Ok(())
    }

    pub(crate) fn exec_jsr<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let (mode, index) = self.control_mode(op)?;
        let target = self.control_address(host, mode)?;
        let ret = self.regs.pc;
        self.push(host, Size::Long, ret)?;
        self.regs.pc = target;
        self.use_cycles(timing::JSR[index]);
        Ok(())
    }

    // ========================================================================
    // Returns
    // ========================================================================

    pub(crate) fn exec_rts<H: M68kHost>(&mut self, host: &mut H) -> Exec {
        self.regs.pc = self.pop(host, Size::Long)?;
        self.use_cycles(16);
        Ok(())
    }

    /// RTE: privileged. Reloads SR and PC from the supervisor stack; if the
    /// new SR clears S, A7 becomes USP from here on.
    pub(crate) fn exec_rte<H: M68kHost>(&mut self, host: &mut H) -> Exec {
        self.require_supervisor()?;
        let sr = self.pop(host, Size::Word)? as u16;
        let pc = self.pop(host, Size::Long)?;
        self.regs.set_sr(sr);
        self.regs.pc = pc;
        self.use_cycles(20);
        Ok(())
    }

    /// RTR: pop CCR (the system byte is left alone), then PC.
    pub(crate) fn exec_rtr<H: M68kHost>(&mut self, host: &mut H) -> Exec {
        let ccr = self.pop(host, Size::Word)? as u16;
        let pc = self.pop(host, Size::Long)?;
        self.regs.set_ccr((ccr & CCR_MASK) as u8);
        self.regs.pc = pc;
        self.use_cycles(20);
        Ok(())
    }
}
