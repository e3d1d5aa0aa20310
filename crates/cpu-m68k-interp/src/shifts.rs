//! ASL/ASR, LSL/LSR, ROXL/ROXR, ROL/ROR.
//!
//! Register form: 1110 CCC D SS I TT RRR (I=0: count 1-8, I=1: Dn mod 64)
//! Memory form:   1110 0TT D 11 MMMRRR (word, one bit)

use crate::alu::Size;
use crate::bus::M68kHost;
use crate::cpu::{Cpu68000, Exec};
use crate::flags::{C, Status, V, X};
use crate::timing::ea_cycles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Arithmetic,
    Logical,
    RotateExtend,
    Rotate,
}

impl ShiftKind {
    fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Arithmetic,
            1 => Self::Logical,
            2 => Self::RotateExtend,
            _ => Self::Rotate,
        }
    }
}

/// Shift `value` by `count` one bit at a time. A zero count returns the
/// value and status register untouched.
fn shift(kind: ShiftKind, left: bool, size: Size, value: u32, count: u32, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb();
    let mut v = value & mask;
    if count == 0 {
        return (v, sr);
    }

    let mut x = sr & X != 0;
    let mut carry = false;
    let mut overflow = false;

    for _ in 0..count {
        let out = if left { v & msb != 0 } else { v & 1 != 0 };
        if left {
            v = (v << 1) & mask;
            let fill = match kind {
                ShiftKind::RotateExtend => x,
                ShiftKind::Rotate => out,
                _ => false,
            };
            if fill {
                v |= 1;
            }
            // ASL: V records any change of the sign bit along the way.
            if kind == ShiftKind::Arithmetic && (v & msb != 0) != out {
                overflow = true;
            }
        } else {
            let fill = match kind {
                ShiftKind::Arithmetic => v & msb != 0,
                ShiftKind::RotateExtend => x,
                ShiftKind::Rotate => out,
                ShiftKind::Logical => false,
            };
            v >>= 1;
            if fill {
                v |= msb;
            }
        }
        carry = out;
        if kind != ShiftKind::Rotate {
            x = out;
        }
    }

    let mut sr = Status::update_nz(sr, size, v);
    sr = Status::set_if(sr, V, overflow);
    sr = Status::set_if(sr, C, carry);
    sr = Status::set_if(sr, X, x);
    (v, sr)
}

impl Cpu68000 {
    pub(crate) fn exec_shift<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        let left = op & 0x0100 != 0;

        if (op >> 6) & 3 == 3 {
            if op & 0x0800 != 0 {
                return self.illegal();
            }
            let kind = ShiftKind::from_bits(op >> 9);
            let mode = self.ea_field(op)?;
            if !mode.is_memory_alterable() {
                return self.illegal();
            }
            let operand = self.resolve(host, mode, Size::Word)?;
            let value = self.read_operand(host, operand, Size::Word)?;
            let (result, sr) = shift(kind, left, Size::Word, value, 1, self.sr());
            self.write_operand(host, operand, Size::Word, result)?;
            self.set_sr_flags(sr);
            self.use_cycles(8 + ea_cycles(mode, Size::Word));
            return Ok(());
        }

        let size = self.size_field(op)?;
        let kind = ShiftKind::from_bits(op >> 3);
        let reg = usize::from(op & 7);
        let field = (op >> 9) & 7;
        let count = if op & 0x0020 != 0 {
            self.regs.d[usize::from(field)] & 63
        } else if field == 0 {
            8
        } else {
            u32::from(field)
        };

        let (result, sr) = shift(kind, left, size, self.regs.d[reg], count, self.sr());
        self.regs.d[reg] = size.merge(self.regs.d[reg], result);
        self.set_sr_flags(sr);
        let base = if size == Size::Long { 8 } else { 6 };
        self.use_cycles(base + 2 * count);
        Ok(())
    }
}
