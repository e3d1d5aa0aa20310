//! Status register layout and condition-code helpers.
//!
//! ```text
//!  15  14  13  12  11  10   9   8   7   6   5   4   3   2   1   0
//!   T   -   S   -   -  I2  I1  I0   -   -   -   X   N   Z   V   C
//! ```
//!
//! Reserved bits always read as zero; every write to SR is masked with
//! [`SR_MASK`].

use crate::alu::Size;

/// Carry flag.
pub const C: u16 = 0x0001;
/// Overflow flag.
pub const V: u16 = 0x0002;
/// Zero flag.
pub const Z: u16 = 0x0004;
/// Negative flag.
pub const N: u16 = 0x0008;
/// Extend flag.
pub const X: u16 = 0x0010;

/// Interrupt priority mask (I2..I0).
pub const INT_MASK: u16 = 0x0700;
/// Supervisor state.
pub const S: u16 = 0x2000;
/// Trace mode.
pub const T: u16 = 0x8000;

/// Condition codes only.
pub const CCR_MASK: u16 = 0x001F;
/// Implemented SR bits.
pub const SR_MASK: u16 = 0xA71F;

/// Status register helper functions. All take and return the full SR.
pub struct Status;

impl Status {
    /// Set N and Z from a result of the given size, leaving other bits alone.
    #[must_use]
    pub fn update_nz(sr: u16, size: Size, value: u32) -> u16 {
        let value = value & size.mask();
        let mut sr = sr & !(N | Z);
        if value == 0 {
            sr |= Z;
        }
        if value & size.msb() != 0 {
            sr |= N;
        }
        sr
    }

    /// Flags for logical results: N and Z from the value, V and C cleared,
    /// X untouched.
    #[must_use]
    pub fn logic(sr: u16, size: Size, value: u32) -> u16 {
        Self::clear_vc(Self::update_nz(sr, size, value))
    }

    /// Clear V and C.
    #[must_use]
    pub fn clear_vc(sr: u16) -> u16 {
        sr & !(V | C)
    }

    /// Set a flag if condition is true, clear if false.
    #[must_use]
    pub fn set_if(sr: u16, flag: u16, condition: bool) -> u16 {
        if condition { sr | flag } else { sr & !flag }
    }

    /// Evaluate one of the sixteen condition tests (T, F, HI, LS ... LE).
    #[must_use]
    pub fn condition(sr: u16, cc: u8) -> bool {
        let c = sr & C != 0;
        let v = sr & V != 0;
        let z = sr & Z != 0;
        let n = sr & N != 0;
        match cc & 0x0F {
            0x0 => true,
            0x1 => false,
            0x2 => !c && !z,
            0x3 => c || z,
            0x4 => !c,
            0x5 => c,
            0x6 => !z,
            0x7 => z,
            0x8 => !v,
            0x9 => v,
            0xA => !n,
            0xB => n,
            0xC => n == v,
            0xD => n != v,
            0xE => !z && n == v,
            _ => z || n != v,
        }
    }
}
