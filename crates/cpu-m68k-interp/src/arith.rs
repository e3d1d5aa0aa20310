//! Integer and decimal arithmetic: ADD/SUB and their A/Q/X forms, CMP,
//! NEG/NEGX, MULU/MULS, DIVU/DIVS, ABCD/SBCD/NBCD, CHK.

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::M68kHost;
use crate::cpu::{Abort, Cpu68000, Exec};
use crate::exceptions::{CHK, ZERO_DIVIDE};
use crate::flags::{C, N, Status, V, X, Z};
use crate::timing::{divs_cycles, divu_cycles, ea_cycles, muls_cycles, mulu_cycles};

/// Long ops with a register or immediate source take two extra cycles.
fn long_source_penalty(mode: AddrMode) -> u32 {
    if matches!(mode, AddrMode::DataReg(_) | AddrMode::AddrReg(_) | AddrMode::Immediate) {
        8
    } else {
        6
    }
}

impl Cpu68000 {
    fn arith(&self, add: bool, size: Size, src: u32, dst: u32, with_x: bool) -> (u32, u16) {
        if add {
            alu::add(self.sr(), size, src, dst, with_x)
        } else {
            alu::sub(self.sr(), size, src, dst, with_x)
        }
    }

    // ========================================================================
    // ADD / SUB / ADDA / SUBA / ADDX / SUBX
    // ========================================================================
    //
    // 1101 RRR OOO MMMRRR (ADD), 1001 ... (SUB)
    //   opmode 0-2: <ea>,Dn   4-6: Dn,<ea>   3/7: <ea>,An.W/.L
    //   opmode 4-6 with mode 0/1: ADDX/SUBX Dy,Dx / -(Ay),-(Ax)

    pub(crate) fn exec_add_sub<H: M68kHost>(&mut self, host: &mut H, op: u16, add: bool) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let opmode = (op >> 6) & 7;

        if opmode == 3 || opmode == 7 {
            return self.exec_adda_suba(host, op, add);
        }
        if opmode >= 4 && op & 0x0030 == 0 {
            return self.exec_addx_subx(host, op, add);
        }

        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;

        if opmode < 4 {
            if size == Size::Byte && matches!(mode, AddrMode::AddrReg(_)) {
                return self.illegal();
            }
            let src = self.read_ea(host, mode, size)?;
            let (result, sr) = self.arith(add, size, src, self.regs.d[reg], false);
            self.regs.d[reg] = size.merge(self.regs.d[reg], result);
            self.set_sr_flags(sr);
            let base = if size == Size::Long { long_source_penalty(mode) } else { 4 };
            self.use_cycles(base + ea_cycles(mode, size));
        } else {
            if !mode.is_memory_alterable() {
                return self.illegal();
            }
            let dst_op = self.resolve(host, mode, size)?;
            let dst = self.read_operand(host, dst_op, size)?;
            let (result, sr) = self.arith(add, size, self.regs.d[reg], dst, false);
            self.write_operand(host, dst_op, size, result)?;
            self.set_sr_flags(sr);
            let base = if size == Size::Long { 12 } else { 8 };
            self.use_cycles(base + ea_cycles(mode, size));
        }
        Ok(())
    }

    fn exec_adda_suba<H: M68kHost>(&mut self, host: &mut H, op: u16, add: bool) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let size = if op & 0x0100 == 0 { Size::Word } else { Size::Long };
        let mode = self.ea_field(op)?;

        let src = size.sign_extend(self.read_ea(host, mode, size)?);
        let dst = self.regs.a(reg);
        let result = if add { dst.wrapping_add(src) } else { dst.wrapping_sub(src) };
        self.regs.set_a(reg, result);

        let base = if size == Size::Long { long_source_penalty(mode) } else { 8 };
        self.use_cycles(base + ea_cycles(mode, size));
        Ok(())
    }

    fn exec_addx_subx<H: M68kHost>(&mut self, host: &mut H, op: u16, add: bool) -> Exec {
        let rx = usize::from((op >> 9) & 7);
        let ry = usize::from(op & 7);
        let size = self.size_field(op)?;

        if op & 0x0008 == 0 {
            let (result, sr) = self.arith(add, size, self.regs.d[ry], self.regs.d[rx], true);
            self.regs.d[rx] = size.merge(self.regs.d[rx], result);
            self.set_sr_flags(sr);
            self.use_cycles(if size == Size::Long { 8 } else { 4 });
        } else {
            let src = self.read_ea(host, AddrMode::AddrIndPreDec(ry as u8), size)?;
            let dst_op = self.resolve(host, AddrMode::AddrIndPreDec(rx as u8), size)?;
            let dst = self.read_operand(host, dst_op, size)?;
            let (result, sr) = self.arith(add, size, src, dst, true);
            self.write_operand(host, dst_op, size, result)?;
            self.set_sr_flags(sr);
            self.use_cycles(if size == Size::Long { 30 } else { 18 });
        }
        Ok(())
    }

    // ========================================================================
    // ADDQ / SUBQ: 0101 DDD O SS MMMRRR (DDD = 0 means 8)
    // ========================================================================

    pub(crate) fn exec_addq_subq<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let data = match (op >> 9) & 7 {
            0 => 8,
            n => u32::from(n),
        };
        let add = op & 0x0100 == 0;
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if !mode.is_alterable() {
            return self.illegal();
        }

        match mode {
            AddrMode::AddrReg(r) => {
                // Whole register, flags untouched.
                if size == Size::Byte {
                    return self.illegal();
                }
                let r = usize::from(r);
                let a = self.regs.a(r);
                let result = if add { a.wrapping_add(data) } else { a.wrapping_sub(data) };
                self.regs.set_a(r, result);
                self.use_cycles(8);
            }
            AddrMode::DataReg(r) => {
                let r = usize::from(r);
                let (result, sr) = self.arith(add, size, data, self.regs.d[r], false);
                self.regs.d[r] = size.merge(self.regs.d[r], result);
                self.set_sr_flags(sr);
                self.use_cycles(if size == Size::Long { 8 } else { 4 });
            }
            _ => {
                let dst_op = self.resolve(host, mode, size)?;
                let dst = self.read_operand(host, dst_op, size)?;
                let (result, sr) = self.arith(add, size, data, dst, false);
                self.write_operand(host, dst_op, size, result)?;
                self.set_sr_flags(sr);
                let base = if size == Size::Long { 12 } else { 8 };
                self.use_cycles(base + ea_cycles(mode, size));
            }
        }
        Ok(())
    }

    // ========================================================================
    // CMP / CMPA / CMPM
    // ========================================================================

    pub(crate) fn exec_cmp<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if size == Size::Byte && matches!(mode, AddrMode::AddrReg(_)) {
            return self.illegal();
        }
        let src = self.read_ea(host, mode, size)?;
        let sr = alu::cmp(self.sr(), size, src, self.regs.d[reg]);
        self.set_sr_flags(sr);
        let base = if size == Size::Long { 6 } else { 4 };
        self.use_cycles(base + ea_cycles(mode, size));
        Ok(())
    }

    pub(crate) fn exec_cmpa<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let size = if op & 0x0100 == 0 { Size::Word } else { Size::Long };
        let mode = self.ea_field(op)?;
        let src = size.sign_extend(self.read_ea(host, mode, size)?);
        let sr = alu::cmp(self.sr(), Size::Long, src, self.regs.a(reg));
        self.set_sr_flags(sr);
        self.use_cycles(6 + ea_cycles(mode, size));
        Ok(())
    }

    /// CMPM (Ay)+,(Ax)+
    pub(crate) fn exec_cmpm<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let rx = ((op >> 9) & 7) as u8;
        let ry = (op & 7) as u8;
        let size = self.size_field(op)?;
        let src = self.read_ea(host, AddrMode::AddrIndPostInc(ry), size)?;
        let dst = self.read_ea(host, AddrMode::AddrIndPostInc(rx), size)?;
        let sr = alu::cmp(self.sr(), size, src, dst);
        self.set_sr_flags(sr);
        self.use_cycles(if size == Size::Long { 20 } else { 12 });
        Ok(())
    }

    // ========================================================================
    // NEG / NEGX
    // ========================================================================

    pub(crate) fn exec_neg<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        self.negate(host, op, false)
    }

    pub(crate) fn exec_negx<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        self.negate(host, op, true)
    }

    fn negate<H: M68kHost>(&mut self, host: &mut H, op: u16, with_x: bool) -> Exec {
        let size = self.size_field(op)?;
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let operand = self.resolve(host, mode, size)?;
        let value = self.read_operand(host, operand, size)?;
        let (result, sr) = alu::sub(self.sr(), size, value, 0, with_x);
        self.write_operand(host, operand, size, result)?;
        self.set_sr_flags(sr);
        self.use_cycles(self.unary_cycles(mode, size));
        Ok(())
    }

    /// CLR/NEG/NEGX/NOT timing.
    pub(crate) fn unary_cycles(&self, mode: AddrMode, size: Size) -> u32 {
        match (mode, size) {
            (AddrMode::DataReg(_), Size::Long) => 6,
            (AddrMode::DataReg(_), _) => 4,
            (_, Size::Long) => 12 + ea_cycles(mode, size),
            _ => 8 + ea_cycles(mode, size),
        }
    }

    // ========================================================================
    // MULU / MULS: 1100 DDD 011/111 EA (16 x 16 -> 32)
    // ========================================================================

    pub(crate) fn exec_mulu<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let mode = self.data_mode(op)?;
        let src = self.read_ea(host, mode, Size::Word)? as u16;
        let result = u32::from(self.regs.d[reg] as u16) * u32::from(src);
        self.regs.d[reg] = result;
        let sr = Status::logic(self.sr(), Size::Long, result);
        self.set_sr_flags(sr);
        self.use_cycles(mulu_cycles(src) + ea_cycles(mode, Size::Word));
        Ok(())
    }

    pub(crate) fn exec_muls<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let mode = self.data_mode(op)?;
        let src = self.read_ea(host, mode, Size::Word)? as u16;
        let result = i32::from(self.regs.d[reg] as i16) * i32::from(src as i16);
        self.regs.d[reg] = result as u32;
        let sr = Status::logic(self.sr(), Size::Long, result as u32);
        self.set_sr_flags(sr);
        self.use_cycles(muls_cycles(src) + ea_cycles(mode, Size::Word));
        Ok(())
    }

    /// EA field restricted to data modes (anything but An).
    pub(crate) fn data_mode(&self, op: u16) -> Exec<AddrMode> {
        let mode = self.ea_field(op)?;
        if mode.is_data() { Ok(mode) } else { self.illegal() }
    }

    // ========================================================================
    // DIVU / DIVS: 1000 DDD 011/111 EA (32 / 16 -> 16r:16q)
    // ========================================================================
    //
    // Overflow leaves Dn untouched and sets V. Divide by zero traps through
    // vector 5 with C cleared.

    fn divide_by_zero<T>(&mut self, mode: AddrMode) -> Exec<T> {
        let sr = self.sr() & !C;
        self.set_sr_flags(sr);
        self.use_cycles(ea_cycles(mode, Size::Word));
        Err(Abort::Trap {
            vector: ZERO_DIVIDE,
            pc: self.regs.pc,
        })
    }

    fn division_overflow(&mut self) {
        let sr = (self.sr() | V | N) & !(Z | C);
        self.set_sr_flags(sr);
    }

    pub(crate) fn exec_divu<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let mode = self.data_mode(op)?;
        let divisor = self.read_ea(host, mode, Size::Word)? as u16;
        if divisor == 0 {
            return self.divide_by_zero(mode);
        }

        let dividend = self.regs.d[reg];
        self.use_cycles(divu_cycles(dividend, divisor) + ea_cycles(mode, Size::Word));

        let quotient = dividend / u32::from(divisor);
        if quotient > 0xFFFF {
            self.division_overflow();
            return Ok(());
        }
        let remainder = dividend % u32::from(divisor);
        self.regs.d[reg] = (remainder << 16) | quotient;
        let sr = Status::logic(self.sr(), Size::Word, quotient);
        self.set_sr_flags(sr);
        Ok(())
    }

    pub(crate) fn exec_divs<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let mode = self.data_mode(op)?;
        let divisor = self.read_ea(host, mode, Size::Word)? as u16 as i16;
        if divisor == 0 {
            return self.divide_by_zero(mode);
        }

        let dividend = self.regs.d[reg] as i32;
        self.use_cycles(divs_cycles(dividend, divisor) + ea_cycles(mode, Size::Word));

        let quotient = i64::from(dividend) / i64::from(divisor);
        if quotient < i64::from(i16::MIN) || quotient > i64::from(i16::MAX) {
            self.division_overflow();
            return Ok(());
        }
        let remainder = i64::from(dividend) % i64::from(divisor);
        self.regs.d[reg] = (u32::from(remainder as u16) << 16) | u32::from(quotient as u16);
        let sr = Status::logic(self.sr(), Size::Word, quotient as u32);
        self.set_sr_flags(sr);
        Ok(())
    }

    // ========================================================================
    // ABCD / SBCD: 1100/1000 XXX 10000 R YYY; NBCD: 0100 1000 00 EA
    // ========================================================================

    pub(crate) fn exec_bcd<H: M68kHost>(&mut self, host: &mut H, op: u16, add: bool) -> Exec {
        let rx = ((op >> 9) & 7) as u8;
        let ry = (op & 7) as u8;
        let x = u8::from(self.sr() & X != 0);

        let (src_mode, dst_mode, cycles) = if op & 0x0008 == 0 {
            (AddrMode::DataReg(ry), AddrMode::DataReg(rx), 6)
        } else {
            (AddrMode::AddrIndPreDec(ry), AddrMode::AddrIndPreDec(rx), 18)
        };
        let src = self.read_ea(host, src_mode, Size::Byte)? as u8;
        let dst_op = self.resolve(host, dst_mode, Size::Byte)?;
        let dst = self.read_operand(host, dst_op, Size::Byte)? as u8;

        let (result, carry, overflow) = if add {
            alu::bcd_add(src, dst, x)
        } else {
            alu::bcd_sub(src, dst, x)
        };
        self.write_operand(host, dst_op, Size::Byte, u32::from(result))?;
        let sr = alu::bcd_flags(self.sr(), result, carry, overflow);
        self.set_sr_flags(sr);
        self.use_cycles(cycles);
        Ok(())
    }

    pub(crate) fn exec_nbcd<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let mode = self.ea_field(op)?;
        if !mode.is_data_alterable() {
            return self.illegal();
        }
        let x = u8::from(self.sr() & X != 0);
        let operand = self.resolve(host, mode, Size::Byte)?;
        let value = self.read_operand(host, operand, Size::Byte)? as u8;
        let (result, borrow, overflow) = alu::bcd_sub(value, 0, x);
        self.write_operand(host, operand, Size::Byte, u32::from(result))?;
        let sr = alu::bcd_flags(self.sr(), result, borrow, overflow);
        self.set_sr_flags(sr);
        self.use_cycles(if mode.is_register() { 6 } else { 8 + ea_cycles(mode, Size::Byte) });
        Ok(())
    }

    // ========================================================================
    // CHK <ea>,Dn: 0100 DDD 110 EA (word bound)
    // ========================================================================

    pub(crate) fn exec_chk<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let reg = usize::from((op >> 9) & 7);
        let mode = self.data_mode(op)?;
        let bound = self.read_ea(host, mode, Size::Word)? as u16 as i16;
        let value = self.regs.d[reg] as u16 as i16;
        let ea = ea_cycles(mode, Size::Word);

        let mut sr = Status::set_if(self.sr(), Z, value == 0) & !(V | C);
        let trap = if value < 0 {
            sr |= N;
            true
        } else if value > bound {
            sr &= !N;
            true
        } else {
            false
        };
        self.set_sr_flags(sr);

        if trap {
            self.use_cycles(ea);
            return Err(Abort::Trap {
                vector: CHK,
                pc: self.regs.pc,
            });
        }
        self.use_cycles(10 + ea);
        Ok(())
    }
}
