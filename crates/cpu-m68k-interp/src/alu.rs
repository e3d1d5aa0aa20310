//! Operand sizes and the integer/BCD arithmetic shared by every
//! instruction family.
//!
//! Each function takes the current SR and returns the new one, so callers
//! never need to know which flags an operation touches.

use crate::flags::{C, N, Status, V, X, Z};

/// Operation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Byte,
    Word,
    Long,
}

impl Size {
    /// Decode the standard two-bit size field (00 = byte, 01 = word, 10 = long).
    #[must_use]
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits & 3 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Decode the MOVE size field (01 = byte, 11 = word, 10 = long).
    #[must_use]
    pub fn from_move_bits(bits: u16) -> Option<Self> {
        match bits & 3 {
            1 => Some(Self::Byte),
            3 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Long => 0xFFFF_FFFF,
        }
    }

    /// The sign bit.
    #[must_use]
    pub const fn msb(self) -> u32 {
        match self {
            Self::Byte => 0x80,
            Self::Word => 0x8000,
            Self::Long => 0x8000_0000,
        }
    }

    #[must_use]
    pub const fn sign_extend(self, value: u32) -> u32 {
        match self {
            Self::Byte => value as u8 as i8 as i32 as u32,
            Self::Word => value as u16 as i16 as i32 as u32,
            Self::Long => value,
        }
    }

    /// Replace the low `self` bits of `reg` with `value`, keeping the rest.
    /// This is how byte and word results land in a data register.
    #[must_use]
    pub const fn merge(self, reg: u32, value: u32) -> u32 {
        (reg & !self.mask()) | (value & self.mask())
    }
}

fn extend_bit(sr: u16) -> u32 {
    u32::from(sr & X != 0)
}

/// `dst + src (+ X)`. With `with_x` this is ADDX: the X flag is an input and
/// Z is only ever cleared, so multi-precision chains test zero across all
/// of their parts.
#[must_use]
pub fn add(sr: u16, size: Size, src: u32, dst: u32, with_x: bool) -> (u32, u16) {
    let mask = size.mask();
    let (src, dst) = (src & mask, dst & mask);
    let x = if with_x { extend_bit(sr) } else { 0 };
    let wide = u64::from(src) + u64::from(dst) + u64::from(x);
    let result = wide as u32 & mask;
    let carry = wide > u64::from(mask);
    let overflow = (src ^ result) & (dst ^ result) & size.msb() != 0;
    (result, arith_flags(sr, size, result, carry, overflow, with_x))
}

/// `dst - src (- X)`. SUBX/NEGX semantics with `with_x`, as for [`add`].
#[must_use]
pub fn sub(sr: u16, size: Size, src: u32, dst: u32, with_x: bool) -> (u32, u16) {
    let mask = size.mask();
    let (src, dst) = (src & mask, dst & mask);
    let x = if with_x { extend_bit(sr) } else { 0 };
    let result = dst.wrapping_sub(src).wrapping_sub(x) & mask;
    let borrow = u64::from(src) + u64::from(x) > u64::from(dst);
    let overflow = (src ^ dst) & (result ^ dst) & size.msb() != 0;
    (result, arith_flags(sr, size, result, borrow, overflow, with_x))
}

/// Compare `dst - src`: N Z V C like [`sub`], X preserved.
#[must_use]
pub fn cmp(sr: u16, size: Size, src: u32, dst: u32) -> u16 {
    let (_, flags) = sub(sr, size, src, dst, false);
    (flags & !X) | (sr & X)
}

fn arith_flags(sr: u16, size: Size, result: u32, carry: bool, overflow: bool, sticky_z: bool) -> u16 {
    let mut sr = sr & !(X | N | V | C);
    if sticky_z {
        if result != 0 {
            sr &= !Z;
        }
    } else {
        sr = Status::set_if(sr, Z, result == 0);
    }
    sr = Status::set_if(sr, N, result & size.msb() != 0);
    sr = Status::set_if(sr, V, overflow);
    if carry {
        sr |= X | C;
    }
    sr
}

// ============================================================================
// Packed BCD
// ============================================================================
//
// V and N are undefined in the manual; these reproduce what the silicon
// actually produces. V is set when the decimal correction flips bit 7 in
// the direction opposite to the operation.

/// `dst + src + extend` in packed BCD. Returns (result, carry, overflow).
#[must_use]
pub fn bcd_add(src: u8, dst: u8, extend: u8) -> (u8, bool, bool) {
    let low_sum = (dst & 0x0F) + (src & 0x0F) + extend;
    let low_fix: u16 = if low_sum > 9 { 6 } else { 0 };
    let binary = u16::from(dst) + u16::from(src) + u16::from(extend);

    let low_carry = (low_sum + low_fix as u8) >> 4;
    let carry = (dst >> 4) + (src >> 4) + low_carry > 9;

    let result = binary + low_fix + if carry { 0x60 } else { 0 };
    let overflow = !binary & result & 0x80 != 0;
    (result as u8, carry, overflow)
}

/// `dst - src - extend` in packed BCD. Returns (result, borrow, overflow).
#[must_use]
pub fn bcd_sub(src: u8, dst: u8, extend: u8) -> (u8, bool, bool) {
    let binary = dst.wrapping_sub(src).wrapping_sub(extend);
    let mut result = binary;

    let low_borrow = (dst & 0x0F) < (src & 0x0F) + extend;
    if low_borrow {
        result = result.wrapping_sub(6);
    }
    let high_borrow = (dst >> 4) < (src >> 4) + u8::from(low_borrow);
    if high_borrow {
        result = result.wrapping_sub(0x60);
    }

    // The low correction alone can wrap the byte (e.g. 0x00 - 0x01).
    let borrow = high_borrow || (low_borrow && binary < 6);
    let overflow = binary & !result & 0x80 != 0;
    (result, borrow, overflow)
}

/// Flags after ABCD/SBCD/NBCD: X and C from the decimal carry, Z only
/// cleared, N and V from the result.
#[must_use]
pub fn bcd_flags(sr: u16, result: u8, carry: bool, overflow: bool) -> u16 {
    let mut sr = sr & !(X | N | V | C);
    if result != 0 {
        sr &= !Z;
    }
    if carry {
        sr |= X | C;
    }
    sr = Status::set_if(sr, N, result & 0x80 != 0);
    Status::set_if(sr, V, overflow)
}
