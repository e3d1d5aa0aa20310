//! Line 0 immediate forms: ORI/ANDI/SUBI/ADDI/EORI/CMPI, their CCR and SR
//! variants, and MOVEP.

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::M68kHost;
use crate::cpu::{Cpu68000, Exec};
use crate::flags::Status;
use crate::timing::ea_cycles;

const ORI: u16 = 0;
const ANDI: u16 = 1;
const SUBI: u16 = 2;
const ADDI: u16 = 3;
const EORI: u16 = 5;
const CMPI: u16 = 6;

impl Cpu68000 {
    /// 0000 KKK 0SS MMMRRR + immediate
    pub(crate) fn exec_immediate<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let kind = (op >> 9) & 7;
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }

        // The immediate precedes the destination's extension words.
        let imm = self.read_ea(host, AddrMode::Immediate, size)?;
        let operand = self.resolve(host, mode, size)?;
        let dst = self.read_operand(host, operand, size)?;
        let sr = self.sr();
        let register = matches!(mode, AddrMode::DataReg(_));
        let ea = ea_cycles(mode, size);

        if kind == CMPI {
            self.set_sr_flags(alu::cmp(sr, size, imm, dst));
            self.use_cycles(match (register, size) {
                (true, Size::Long) => 14,
                (true, _) => 8,
                (false, Size::Long) => 12 + ea,
                (false, _) => 8 + ea,
            });
            return Ok(());
        }

        let (result, sr) = match kind {
            ORI => (dst | imm, Status::logic(sr, size, dst | imm)),
            ANDI => (dst & imm, Status::logic(sr, size, dst & imm)),
            EORI => (dst ^ imm, Status::logic(sr, size, dst ^ imm)),
            SUBI => alu::sub(sr, size, imm, dst, false),
            ADDI => alu::add(sr, size, imm, dst, false),
            _ => return self.illegal(),
        };
        self.write_operand(host, operand, size, result)?;
        self.set_sr_flags(sr);
        self.use_cycles(match (register, size) {
            (true, Size::Long) if kind == ANDI => 14,
            (true, Size::Long) => 16,
            (true, _) => 8,
            (false, Size::Long) => 20 + ea,
            (false, _) => 12 + ea,
        });
        Ok(())
    }

    /// ORI/ANDI/EORI #imm,CCR
    pub(crate) fn exec_ccr_op<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let imm = (self.fetch_word(host)? & 0xFF) as u8;
        let ccr = self.regs.ccr();
        let value = match (op >> 9) & 7 {
            ANDI => ccr & imm,
            EORI => ccr ^ imm,
            _ => ccr | imm,
        };
        self.regs.set_ccr(value);
        self.use_cycles(20);
        Ok(())
    }

    /// ORI/ANDI/EORI #imm,SR (privileged)
    pub(crate) fn exec_sr_op<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        self.require_supervisor()?;
        let imm = self.fetch_word(host)?;
        let sr = self.sr();
        let value = match (op >> 9) & 7 {
            ANDI => sr & imm,
            EORI => sr ^ imm,
            _ => sr | imm,
        };
        self.regs.set_sr(value);
        self.use_cycles(20);
        Ok(())
    }

    // ========================================================================
    // MOVEP: 0000 DDD 1OO 001 AAA + d16
    // ========================================================================
    //
    // Transfers a word or long to/from every other byte starting at
    // d16(An), high byte first. Byte accesses only, so never misaligned.

    pub(crate) fn exec_movep<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let dreg = usize::from((op >> 9) & 7);
        let areg = usize::from(op & 7);
        let disp = self.fetch_word(host)? as i16;
        let base = self.regs.a(areg).wrapping_add(disp as i32 as u32);
        let opmode = (op >> 6) & 7;
        let (size, to_memory) = match opmode {
            4 => (Size::Word, false),
            5 => (Size::Long, false),
            6 => (Size::Word, true),
            _ => (Size::Long, true),
        };
        let count = size.bytes();

        if to_memory {
            let value = self.regs.d[dreg];
            for i in 0..count {
                let shift = 8 * (count - 1 - i);
                self.write_bus(host, base.wrapping_add(2 * i), Size::Byte, value >> shift)?;
            }
        } else {
            let mut value = 0u32;
            for i in 0..count {
                let byte = self.read_bus(host, base.wrapping_add(2 * i), Size::Byte)?;
                value = (value << 8) | byte;
            }
            self.regs.d[dreg] = size.merge(self.regs.d[dreg], value);
        }
        self.use_cycles(if size == Size::Long { 24 } else { 16 });
        Ok(())
    }
}
