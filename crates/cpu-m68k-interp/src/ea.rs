//! Effective address resolution.
//!
//! Resolving an EA consumes its extension words and applies the (An)+ and
//! -(An) side effects, producing an [`Operand`] that can then be read and
//! written any number of times. Read-modify-write instructions resolve once.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kHost;
use crate::cpu::{Cpu68000, Exec};

/// A resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    DataReg(usize),
    AddrReg(usize),
    /// Data space address.
    Memory(u32),
    /// Program space address (PC-relative modes), read-only.
    Program(u32),
    Immediate(u32),
}

impl Operand {
    /// The address of a memory operand.
    pub(crate) fn address(self) -> Option<u32> {
        match self {
            Self::Memory(a) | Self::Program(a) => Some(a),
            _ => None,
        }
    }
}

impl Cpu68000 {
    pub(crate) fn resolve<H: M68kHost>(&mut self, host: &mut H, mode: AddrMode, size: Size) -> Exec<Operand> {
        Ok(match mode {
            AddrMode::DataReg(r) => Operand::DataReg(r as usize),
            AddrMode::AddrReg(r) => Operand::AddrReg(r as usize),
            AddrMode::AddrInd(r) => Operand::Memory(self.regs.a(r as usize)),
            AddrMode::AddrIndPostInc(r) => {
                let r = r as usize;
                let addr = self.regs.a(r);
                self.regs.set_a(r, addr.wrapping_add(step(r, size)));
                Operand::Memory(addr)
            }
            AddrMode::AddrIndPreDec(r) => {
                let r = r as usize;
                let addr = self.regs.a(r).wrapping_sub(step(r, size));
                self.regs.set_a(r, addr);
                Operand::Memory(addr)
            }
            AddrMode::AddrIndDisp(r) => {
                let disp = self.fetch_word(host)? as i16;
                Operand::Memory(self.regs.a(r as usize).wrapping_add(disp as i32 as u32))
            }
            AddrMode::AddrIndIndex(r) => {
                let base = self.regs.a(r as usize);
                let ext = self.fetch_word(host)?;
                Operand::Memory(self.index_address(base, ext))
            }
            AddrMode::AbsShort => Operand::Memory(self.fetch_word(host)? as i16 as i32 as u32),
            AddrMode::AbsLong => Operand::Memory(self.fetch_long(host)?),
            AddrMode::PcDisp => {
                let base = self.regs.pc;
                let disp = self.fetch_word(host)? as i16;
                Operand::Program(base.wrapping_add(disp as i32 as u32))
            }
            AddrMode::PcIndex => {
                let base = self.regs.pc;
                let ext = self.fetch_word(host)?;
                Operand::Program(self.index_address(base, ext))
            }
            AddrMode::Immediate => match size {
                Size::Byte => Operand::Immediate(u32::from(self.fetch_word(host)? & 0xFF)),
                Size::Word => Operand::Immediate(u32::from(self.fetch_word(host)?)),
                Size::Long => Operand::Immediate(self.fetch_long(host)?),
            },
        })
    }

    /// Brief extension word: base + d8 + Xn.W/Xn.L.
    fn index_address(&self, base: u32, ext: u16) -> u32 {
        let disp = ext as u8 as i8 as i32;
        let xn = usize::from((ext >> 12) & 7);
        let raw = if ext & 0x8000 != 0 { self.regs.a(xn) } else { self.regs.d[xn] };
        let index = if ext & 0x0800 != 0 {
            raw as i32
        } else {
            i32::from(raw as u16 as i16)
        };
        base.wrapping_add(disp as u32).wrapping_add(index as u32)
    }

    pub(crate) fn read_operand<H: M68kHost>(&mut self, host: &mut H, op: Operand, size: Size) -> Exec<u32> {
        Ok(match op {
            Operand::DataReg(r) => self.regs.d[r] & size.mask(),
            Operand::AddrReg(r) => self.regs.a(r) & size.mask(),
            Operand::Memory(addr) => self.read_bus(host, addr, size)?,
            Operand::Program(addr) => self.read_program(host, addr, size),
            Operand::Immediate(v) => v & size.mask(),
        })
    }

    /// Store a result. Data registers keep their untouched upper bits;
    /// address registers always take the whole long.
    pub(crate) fn write_operand<H: M68kHost>(
        &mut self,
        host: &mut H,
        op: Operand,
        size: Size,
        value: u32,
    ) -> Exec {
        match op {
            Operand::DataReg(r) => self.regs.d[r] = size.merge(self.regs.d[r], value),
            Operand::AddrReg(r) => self.regs.set_a(r, value),
            Operand::Memory(addr) => self.write_bus(host, addr, size, value)?,
            // Decode never lets these reach a write.
            Operand::Program(_) | Operand::Immediate(_) => {}
        }
        Ok(())
    }

    /// Resolve and read in one go.
    pub(crate) fn read_ea<H: M68kHost>(&mut self, host: &mut H, mode: AddrMode, size: Size) -> Exec<u32> {
        let op = self.resolve(host, mode, size)?;
        self.read_operand(host, op, size)
    }

    /// Resolve a control-mode EA to its address without touching memory
    /// (LEA, PEA, JMP, JSR).
    pub(crate) fn control_address<H: M68kHost>(&mut self, host: &mut H, mode: AddrMode) -> Exec<u32> {
        match self.resolve(host, mode, Size::Long)?.address() {
            Some(addr) => Ok(addr),
            None => self.illegal(),
        }
    }
}

/// Post-increment/pre-decrement step. A7 stays word aligned for bytes.
fn step(reg: usize, size: Size) -> u32 {
    if size == Size::Byte && reg == 7 { 2 } else { size.bytes() }
}
