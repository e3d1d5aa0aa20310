//! Instruction timing tables and operand-dependent cycle formulas.
//!
//! Values are CPU clocks from the MC68000 user manual (section 8). The
//! divide formulas follow Jorge Cwik's analysis of the microcode.

use crate::addressing::AddrMode;
use crate::alu::Size;

/// Effective address calculation time, added to an instruction's base cost.
#[must_use]
pub fn ea_cycles(mode: AddrMode, size: Size) -> u32 {
    let long = size == Size::Long;
    let (bw, l) = match mode {
        AddrMode::DataReg(_) | AddrMode::AddrReg(_) => (0, 0),
        AddrMode::AddrInd(_) | AddrMode::AddrIndPostInc(_) => (4, 8),
        AddrMode::AddrIndPreDec(_) => (6, 10),
        AddrMode::AddrIndDisp(_) | AddrMode::AbsShort | AddrMode::PcDisp => (8, 12),
        AddrMode::AddrIndIndex(_) | AddrMode::PcIndex => (10, 14),
        AddrMode::AbsLong => (12, 16),
        AddrMode::Immediate => (4, 8),
    };
    if long { l } else { bw }
}

// Control-mode tables, indexed by `AddrMode::control_index`:
// (An), d16(An), d8(An,Xn), abs.W, abs.L, d16(PC), d8(PC,Xn)

pub const JMP: [u32; 7] = [8, 10, 14, 10, 12, 10, 14];
pub const JSR: [u32; 7] = [16, 18, 22, 18, 20, 18, 22];
pub const LEA: [u32; 7] = [4, 8, 12, 8, 12, 8, 12];
pub const PEA: [u32; 7] = [12, 16, 20, 16, 20, 16, 20];
/// MOVEM memory to registers, before the per-register cost.
pub const MOVEM_TO_REGS: [u32; 7] = [12, 16, 18, 16, 20, 16, 18];
/// MOVEM registers to memory; PC-relative columns are unused.
pub const MOVEM_TO_MEM: [u32; 7] = [8, 12, 14, 12, 16, 0, 0];

/// MULU: 38 + 2n, n = number of set bits in the source.
#[must_use]
pub fn mulu_cycles(src: u16) -> u32 {
    38 + 2 * src.count_ones()
}

/// MULS: 38 + 2n, n = number of 01/10 transitions in `src << 1`.
#[must_use]
pub fn muls_cycles(src: u16) -> u32 {
    let mut bits = u32::from(src) << 1;
    let mut n = 0;
    while bits != 0 {
        if matches!(bits & 3, 1 | 2) {
            n += 1;
        }
        bits >>= 1;
    }
    38 + 2 * n
}

/// DIVU execution time, excluding EA calculation.
#[must_use]
pub fn divu_cycles(dividend: u32, divisor: u16) -> u32 {
    if (dividend >> 16) >= u32::from(divisor) {
        return 10;
    }

    let mut mcycles: u32 = 38;
    let hdivisor = u32::from(divisor) << 16;
    let mut dvd = dividend;

    for _ in 0..15 {
        let carry = dvd & 0x8000_0000 != 0;
        dvd <<= 1;
        if carry {
            dvd = dvd.wrapping_sub(hdivisor);
        } else {
            mcycles += 2;
            if dvd >= hdivisor {
                dvd = dvd.wrapping_sub(hdivisor);
                mcycles -= 1;
            }
        }
    }
    mcycles * 2
}

/// DIVS execution time, excluding EA calculation.
#[must_use]
pub fn divs_cycles(dividend: i32, divisor: i16) -> u32 {
    let mut mcycles: u32 = 6;
    if dividend < 0 {
        mcycles += 1;
    }

    let abs_dividend = dividend.unsigned_abs();
    let abs_divisor = divisor.unsigned_abs();
    if (abs_dividend >> 16) >= u32::from(abs_divisor) {
        return (mcycles + 2) * 2;
    }

    let mut aquot = abs_dividend / u32::from(abs_divisor);
    mcycles += 55;
    if divisor >= 0 {
        if dividend >= 0 {
            mcycles -= 1;
        } else {
            mcycles += 1;
        }
    }

    // Each zero among the 15 high bits of the quotient costs one more.
    for _ in 0..15 {
        if (aquot as i16) >= 0 {
            mcycles += 1;
        }
        aquot <<= 1;
    }
    mcycles * 2
}
