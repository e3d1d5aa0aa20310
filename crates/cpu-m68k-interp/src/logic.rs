//! Logical operations, tests and single-bit manipulation.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kHost;
use crate::cpu::{Cpu68000, Exec};
use crate::decode::LogicOp;
use crate::flags::{C, N, Status, V, Z};
use crate::timing::ea_cycles;

impl Cpu68000 {
    // ========================================================================
    // AND / OR: 1100/1000 RRR OOO MMMRRR
    // ========================================================================
    //
    // opmode 0-2: <ea>,Dn (any data mode), 4-6: Dn,<ea> (memory alterable)

    pub(crate) fn exec_logic<H: M68kHost>(&mut self, host: &mut H, op: u16, logic: LogicOp) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let size = self.size_field(op)?;
        let to_register = op & 0x0100 == 0;

        if to_register {
            let mode = self.data_mode(op)?;
            let src = self.read_ea(host, mode, size)?;
            let result = logic.apply(self.regs.d[reg], src) & size.mask();
            self.regs.d[reg] = size.merge(self.regs.d[reg], result);
            let sr = Status::logic(self.sr(), size, result);
            self.set_sr_flags(sr);
            let base = match (size, mode) {
                (Size::Long, AddrMode::DataReg(_) | AddrMode::Immediate) => 8,
                (Size::Long, _) => 6,
                _ => 4,
            };
            self.use_cycles(base + ea_cycles(mode, size));
        } else {
            let mode = self.ea_field(op)?;
            if !mode.is_memory_alterable() {
                return self.illegal();
            }
            self.logic_to_memory(host, mode, size, logic, self.regs.d[reg])?;
        }
        Ok(())
    }

    fn logic_to_memory<H: M68kHost>(
        &mut self,
        host: &mut H,
        mode: AddrMode,
        size: Size,
        logic: LogicOp,
        src: u32,
    ) -> Exec {
        let operand = self.resolve(host, mode, size)?;
        let dst = self.read_operand(host, operand, size)?;
        let result = logic.apply(dst, src) & size.mask();
        self.write_operand(host, operand, size, result)?;
        let sr = Status::logic(self.sr(), size, result);
        self.set_sr_flags(sr);
        let base = if size == Size::Long { 12 } else { 8 };
        self.use_cycles(base + ea_cycles(mode, size));
        Ok(())
    }

    /// EOR Dn,<ea>: 1011 RRR 1SS MMMRRR
    pub(crate) fn exec_eor<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        match mode {
            AddrMode::DataReg(r) => {
                let r = usize::from(r);
                let result = (self.regs.d[r] ^ self.regs.d[reg]) & size.mask();
                self.regs.d[r] = size.merge(self.regs.d[r], result);
                let sr = Status::logic(self.sr(), size, result);
                self.set_sr_flags(sr);
                self.use_cycles(if size == Size::Long { 8 } else { 4 });
                Ok(())
            }
            _ if mode.is_data_alterable() => {
                self.logic_to_memory(host, mode, size, LogicOp::Eor, self.regs.d[reg])
            }
            _ => self.illegal(),
        }
    }

    // ========================================================================
    // NOT / CLR / TST / TAS / Scc
    // ========================================================================

    pub(crate) fn exec_not<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let operand = self.resolve(host, mode, size)?;
        let result = !self.read_operand(host, operand, size)? & size.mask();
        self.write_operand(host, operand, size, result)?;
        let sr = Status::logic(self.sr(), size, result);
        self.set_sr_flags(sr);
        self.use_cycles(self.unary_cycles(mode, size));
        Ok(())
    }

    /// CLR reads its operand before writing zero, as the silicon does.
    pub(crate) fn exec_clr<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let operand = self.resolve(host, mode, size)?;
        self.read_operand(host, operand, size)?;
        self.write_operand(host, operand, size, 0)?;
        let sr = (self.sr() & !(N | V | C)) | Z;
        self.set_sr_flags(sr);
        self.use_cycles(self.unary_cycles(mode, size));
        Ok(())
    }

    pub(crate) fn exec_tst<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let value = self.read_ea(host, mode, size)?;
        let sr = Status::logic(self.sr(), size, value);
        self.set_sr_flags(sr);
        self.use_cycles(4 + ea_cycles(mode, size));
        Ok(())
    }

    /// TAS: test a byte and set its bit 7 in one indivisible cycle. Some
    /// buses drop the write half, so for memory operands the host decides.
    pub(crate) fn exec_tas<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let operand = self.resolve(host, mode, Size::Byte)?;
        let value = self.read_operand(host, operand, Size::Byte)?;
        let sr = Status::logic(self.sr(), Size::Byte, value);
        self.set_sr_flags(sr);

        if let AddrMode::DataReg(_) = mode {
            self.write_operand(host, operand, Size::Byte, value | 0x80)?;
            self.use_cycles(4);
        } else {
            if host.tas_writeback() {
                self.write_operand(host, operand, Size::Byte, value | 0x80)?;
            }
            self.use_cycles(10 + ea_cycles(mode, Size::Byte));
        }
        Ok(())
    }

    /// Scc <ea>: 0101 CCCC 11 MMMRRR
    pub(crate) fn exec_scc<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let cond = Status::condition(self.sr(), ((op >> 8) & 0x0F) as u8);
        let operand = self.resolve(host, mode, Size::Byte)?;
        if !matches!(mode, AddrMode::DataReg(_)) {
            // Read-modify-write on the bus even though the value is ignored.
            self.read_operand(host, operand, Size::Byte)?;
        }
        self.write_operand(host, operand, Size::Byte, if cond { 0xFF } else { 0 })?;
        self.use_cycles(match mode {
            AddrMode::DataReg(_) if cond => 6,
            AddrMode::DataReg(_) => 4,
            _ => 8 + ea_cycles(mode, Size::Byte),
        });
        Ok(())
    }

    // ========================================================================
    // BTST / BCHG / BCLR / BSET
    // ========================================================================
    //
    // Dynamic: 0000 RRR 1TT MMMRRR, bit number in Dn
    // Static:  0000 1000 TT MMMRRR + #bit
    //
    // Register operands are long (bit mod 32), memory operands byte (mod 8).

    pub(crate) fn exec_bit_op<H: M68kHost>(&mut self, host: &mut H, op: u16, is_static: bool) -> Exec {
        let kind = (op >> 6) & 3;
        let bit = if is_static {
            u32::from(self.fetch_word(host)? & 0xFF)
        } else {
            self.regs.d[usize::from((op >> 9) & 7)]
        };
        let mode = self.ea_field(op)?;
        let valid = match kind {
            0 if is_static => mode.is_data() && mode != AddrMode::Immediate,
            0 => mode.is_data(),
            _ => mode.is_data_alterable(),
        };
        if !valid {
            return self.illegal();
        }

        if let AddrMode::DataReg(r) = mode {
            let r = usize::from(r);
            let bit = bit & 31;
            let value = self.regs.d[r];
            self.test_bit(value, bit);
            self.regs.d[r] = modify_bit(kind, value, bit);
            let high = u32::from(bit >= 16) * 2;
            let base = match kind {
                0 => 6,
                2 => 8 + high,
                _ => 6 + high,
            };
            self.use_cycles(base + if is_static { 4 } else { 0 });
        } else {
            let bit = bit & 7;
            let operand = self.resolve(host, mode, Size::Byte)?;
            let value = self.read_operand(host, operand, Size::Byte)?;
            self.test_bit(value, bit);
            if kind != 0 {
                self.write_operand(host, operand, Size::Byte, modify_bit(kind, value, bit))?;
            }
            let base = if kind == 0 { 4 } else { 8 };
            self.use_cycles(base + if is_static { 4 } else { 0 } + ea_cycles(mode, Size::Byte));
        }
        Ok(())
    }

    fn test_bit(&mut self, value: u32, bit: u32) {
        let sr = Status::set_if(self.sr(), Z, value & (1 << bit) == 0);
        self.set_sr_flags(sr);
    }
}

fn modify_bit(kind: u16, value: u32, bit: u32) -> u32 {
    match kind {
        1 => value ^ (1 << bit),
        2 => value & !(1 << bit),
        3 => value | (1 << bit),
        _ => value,
    }
}
