//! Data movement and the remaining line 4 instructions.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kHost;
use crate::cpu::{Abort, Cpu68000, Exec};
use crate::ea::Operand;
use crate::exceptions::TRAPV;
use crate::flags::{Status, V};
use crate::timing::{self, ea_cycles};

impl Cpu68000 {
    // ========================================================================
    // MOVE / MOVEA: 00SS RRR MMM MMMRRR
    // ========================================================================

    pub(crate) fn exec_move<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let Some(size) = Size::from_move_bits(op >> 12) else {
            return self.illegal();
        };
        let src_mode = self.ea_field(op)?;
        let Some(dst_mode) = AddrMode::move_destination(op) else {
            return self.illegal();
        };
        if size == Size::Byte && matches!(src_mode, AddrMode::AddrReg(_)) {
            return self.illegal();
        }

        if let AddrMode::AddrReg(r) = dst_mode {
            if size == Size::Byte {
                return self.illegal();
            }
            let value = size.sign_extend(self.read_ea(host, src_mode, size)?);
            self.regs.set_a(usize::from(r), value);
            self.use_cycles(4 + ea_cycles(src_mode, size));
            return Ok(());
        }
        if !dst_mode.is_data_alterable() {
            return self.illegal();
        }

        let value = self.read_ea(host, src_mode, size)?;
        let dst = self.resolve(host, dst_mode, size)?;
        self.write_operand(host, dst, size, value)?;
        let sr = Status::logic(self.sr(), size, value);
        self.set_sr_flags(sr);

        // A predecrement destination costs the same as (An).
        let dst_cost = match dst_mode {
            AddrMode::AddrIndPreDec(r) => ea_cycles(AddrMode::AddrInd(r), size),
            _ => ea_cycles(dst_mode, size),
        };
        self.use_cycles(4 + ea_cycles(src_mode, size) + dst_cost);
        Ok(())
    }

    /// MOVEQ #d8,Dn: 0111 RRR 0 DDDDDDDD
    pub(crate) fn exec_moveq(&mut self, op: u16) {
        let reg = usize::from((op >> 9) & 7);
        let value = op as u8 as i8 as i32 as u32;
        self.regs.d[reg] = value;
        let sr = Status::logic(self.sr(), Size::Long, value);
        self.set_sr_flags(sr);
        self.use_cycles(4);
    }

    // ========================================================================
    // MOVEM: 0100 1D00 1S MMMRRR + register mask
    // ========================================================================
    //
    // Mask bit 0 is D0 and bit 15 is A7, except for -(An) where the order
    // is reversed. Registers are stored lowest-numbered at the lowest
    // address either way.

    pub(crate) fn exec_movem_to_mem<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let size = if op & 0x0040 == 0 { Size::Word } else { Size::Long };
        let mask = self.fetch_word(host)?;
        let mode = self.ea_field(op)?;
        let per_reg = if size == Size::Long { 8 } else { 4 };

        if let AddrMode::AddrIndPreDec(r) = mode {
            let r = usize::from(r);
            let mut addr = self.regs.a(r);
            for bit in 0..16 {
                if mask & (1 << bit) != 0 {
                    addr = addr.wrapping_sub(size.bytes());
                    let value = self.register_by_index(15 - bit);
                    self.write_bus(host, addr, size, value)?;
                }
            }
            self.regs.set_a(r, addr);
            self.use_cycles(8 + per_reg * mask.count_ones());
            return Ok(());
        }

        if !mode.is_control() || !mode.is_alterable() {
            return self.illegal();
        }
        let (_, index) = self.control_mode(op)?;
        let mut addr = self.control_address(host, mode)?;
        for bit in 0..16 {
            if mask & (1 << bit) != 0 {
                let value = self.register_by_index(bit);
                self.write_bus(host, addr, size, value)?;
                addr = addr.wrapping_add(size.bytes());
            }
        }
        self.use_cycles(timing::MOVEM_TO_MEM[index] + per_reg * mask.count_ones());
        Ok(())
    }

    pub(crate) fn exec_movem_to_regs<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let size = if op & 0x0040 == 0 { Size::Word } else { Size::Long };
        let mask = self.fetch_word(host)?;
        let mode = self.ea_field(op)?;
        let per_reg = if size == Size::Long { 8 } else { 4 };

        let (mut addr, base, post_inc) = match mode {
            AddrMode::AddrIndPostInc(r) => (self.regs.a(usize::from(r)), 12, Some(usize::from(r))),
            _ => {
                let (_, index) = self.control_mode(op)?;
                let addr = self.control_address(host, mode)?;
                (addr, timing::MOVEM_TO_REGS[index], None)
            }
        };
        let program = matches!(mode, AddrMode::PcDisp | AddrMode::PcIndex);

        for bit in 0..16 {
            if mask & (1 << bit) != 0 {
                let location = if program { Operand::Program(addr) } else { Operand::Memory(addr) };
                let value = size.sign_extend(self.read_operand(host, location, size)?);
                self.set_register_by_index(bit, value);
                addr = addr.wrapping_add(size.bytes());
            }
        }
        // The post-incremented address overrides a value loaded into An.
        if let Some(r) = post_inc {
            self.regs.set_a(r, addr);
        }
        self.use_cycles(base + per_reg * mask.count_ones());
        Ok(())
    }

    /// D0-D7 then A0-A7.
    fn register_by_index(&self, index: usize) -> u32 {
        if index < 8 { self.regs.d[index] } else { self.regs.a(index - 8) }
    }

    fn set_register_by_index(&mut self, index: usize, value: u32) {
        if index < 8 {
            self.regs.d[index] = value;
        } else {
            self.regs.set_a(index - 8, value);
        }
    }

    // ========================================================================
    // LEA / PEA / LINK / UNLK
    // ========================================================================

    pub(crate) fn exec_lea<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let (mode, index) = self.control_mode(op)?;
        let addr = self.control_address(host, mode)?;
        self.regs.set_a(reg, addr);
        self.use_cycles(timing::LEA[index]);
        Ok(())
    }

    pub(crate) fn exec_pea<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let (mode, index) = self.control_mode(op)?;
        let addr = self.control_address(host, mode)?;
        self.push(host, Size::Long, addr)?;
        self.use_cycles(timing::PEA[index]);
        Ok(())
    }

    /// LINK An,#d16. For A7 the value pushed is the already decremented SP.
    pub(crate) fn exec_link<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from(op & 7);
        let disp = self.fetch_word(host)? as i16;
        let sp = self.regs.a(7).wrapping_sub(4);
        let value = if reg == 7 { sp } else { self.regs.a(reg) };
        self.write_bus(host, sp, Size::Long, value)?;
        self.regs.set_a(7, sp);
        self.regs.set_a(reg, sp);
        self.regs.set_a(7, sp.wrapping_add(i32::from(disp) as u32));
        self.use_cycles(16);
        Ok(())
    }

    pub(crate) fn exec_unlk<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from(op & 7);
        let frame = self.regs.a(reg);
        let value = self.read_bus(host, frame, Size::Long)?;
        self.regs.set_a(7, frame.wrapping_add(4));
        self.regs.set_a(reg, value);
        self.use_cycles(12);
        Ok(())
    }

    // ========================================================================
    // SWAP / EXT / EXG
    // ========================================================================

    pub(crate) fn exec_swap(&mut self, op: u16) {
        let reg = usize::from(op & 7);
        let value = self.regs.d[reg].rotate_left(16);
        self.regs.d[reg] = value;
        let sr = Status::logic(self.sr(), Size::Long, value);
        self.set_sr_flags(sr);
        self.use_cycles(4);
    }

    /// EXT.W (byte to word) for opmode 010, EXT.L (word to long) for 011.
    pub(crate) fn exec_ext(&mut self, op: u16) {
        let reg = usize::from(op & 7);
        let (size, value) = if op & 0x0040 == 0 {
            (Size::Word, Size::Byte.sign_extend(self.regs.d[reg]) & 0xFFFF)
        } else {
            (Size::Long, Size::Word.sign_extend(self.regs.d[reg]))
        };
        self.regs.d[reg] = size.merge(self.regs.d[reg], value);
        let sr = Status::logic(self.sr(), size, value);
        self.set_sr_flags(sr);
        self.use_cycles(4);
    }

    /// EXG: 1100 XXX 1 OOOOO YYY (01000 Dx,Dy; 01001 Ax,Ay; 10001 Dx,Ay)
    pub(crate) fn exec_exg(&mut self, op: u16) {
        let rx = usize::from((op >> 9) & 7);
        let ry = usize::from(op & 7);
        match op & 0x00F8 {
            0x0040 => self.regs.d.swap(rx, ry),
            0x0048 => {
                let x = self.regs.a(rx);
                self.regs.set_a(rx, self.regs.a(ry));
                self.regs.set_a(ry, x);
            }
            _ => {
                let x = self.regs.d[rx];
                self.regs.d[rx] = self.regs.a(ry);
                self.regs.set_a(ry, x);
            }
        }
        self.use_cycles(6);
    }

    // ========================================================================
    // Status register and system control
    // ========================================================================

    /// MOVE USP: 0100 1110 0110 DAAA (D=1: USP to An). Privileged.
    pub(crate) fn exec_move_usp(&mut self, op: u16) -> Exec {
        self.require_supervisor()?;
        let reg = usize::from(op & 7);
        if op & 0x0008 == 0 {
            self.regs.usp = self.regs.a(reg);
        } else {
            self.regs.set_a(reg, self.regs.usp);
        }
        self.use_cycles(4);
        Ok(())
    }

    /// MOVE SR,<ea>. Unprivileged on the 68000.
    pub(crate) fn exec_move_from_sr<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let operand = self.resolve(host, mode, Size::Word)?;
        if !mode.is_register() {
            // Read cycle precedes the write on this CPU.
            self.read_operand(host, operand, Size::Word)?;
        }
        self.write_operand(host, operand, Size::Word, u32::from(self.sr()))?;
        self.use_cycles(if mode.is_register() { 6 } else { 8 + ea_cycles(mode, Size::Word) });
        Ok(())
    }

    pub(crate) fn exec_move_to_ccr<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let mode = self.data_mode(op)?;
        let value = self.read_ea(host, mode, Size::Word)?;
        self.regs.set_ccr(value as u8);
        self.use_cycles(12 + ea_cycles(mode, Size::Word));
        Ok(())
    }

    pub(crate) fn exec_move_to_sr<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        self.require_supervisor()?;
        let mode = self.data_mode(op)?;
        let value = self.read_ea(host, mode, Size::Word)?;
        self.regs.set_sr(value as u16);
        self.use_cycles(12 + ea_cycles(mode, Size::Word));
        Ok(())
    }

    /// STOP #imm: load SR and wait for an interrupt above the new mask.
    pub(crate) fn exec_stop<H: M68kHost>(&mut self, host: &mut H) -> Exec {
        self.require_supervisor()?;
        let sr = self.fetch_word(host)?;
        self.regs.set_sr(sr);
        self.stopped = true;
        log::trace!("stop #{sr:04X} at {:06X}", self.instr_pc);
        self.use_cycles(4);
        Ok(())
    }

    /// RESET: pulse the reset line for external devices. The CPU carries on.
    pub(crate) fn exec_reset<H: M68kHost>(&mut self, host: &mut H) -> Exec {
        self.require_supervisor()?;
        host.reset_instruction();
        self.use_cycles(132);
        Ok(())
    }

    pub(crate) fn exec_trapv(&mut self) -> Exec {
        if self.sr() & V != 0 {
            return Err(Abort::Trap {
                vector: TRAPV,
                pc: self.regs.pc,
            });
        }
        self.use_cycles(4);
        Ok(())
    }
}
