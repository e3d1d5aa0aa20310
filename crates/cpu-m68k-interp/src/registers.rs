//! Programmer-visible register file.
//!
//! A7 is not stored: it is whichever of USP/SSP the S bit selects, so the
//! active stack pointer can never disagree with the privilege level.

use serde::{Deserialize, Serialize};

use crate::flags::{CCR_MASK, INT_MASK, S, SR_MASK, T};

/// 68000 register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Data registers D0-D7.
    pub d: [u32; 8],
    /// Address registers A0-A6.
    pub a: [u32; 7],
    /// User stack pointer.
    pub usp: u32,
    /// Supervisor (interrupt) stack pointer.
    pub ssp: u32,
    pub pc: u32,
    sr: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Power-on state: supervisor mode, interrupts masked.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            d: [0; 8],
            a: [0; 7],
            usp: 0,
            ssp: 0,
            pc: 0,
            sr: 0x2700,
        }
    }

    /// Address register `n` (0-7), with A7 resolved to the active stack.
    #[must_use]
    pub fn a(&self, n: usize) -> u32 {
        debug_assert!(n < 8);
        if n < 7 { self.a[n] } else { self.active_sp() }
    }

    pub fn set_a(&mut self, n: usize, value: u32) {
        debug_assert!(n < 8);
        if n < 7 {
            self.a[n] = value;
        } else {
            self.set_active_sp(value);
        }
    }

    #[must_use]
    pub const fn active_sp(&self) -> u32 {
        if self.is_supervisor() { self.ssp } else { self.usp }
    }

    pub fn set_active_sp(&mut self, value: u32) {
        if self.is_supervisor() {
            self.ssp = value;
        } else {
            self.usp = value;
        }
    }

    #[must_use]
    pub const fn sr(&self) -> u16 {
        self.sr
    }

    /// Write SR. Reserved bits are dropped. The S bit selects which of the
    /// two stored stack pointers A7 names.
    pub fn set_sr(&mut self, value: u16) {
        self.sr = value & SR_MASK;
    }

    #[must_use]
    pub const fn ccr(&self) -> u8 {
        (self.sr & CCR_MASK) as u8
    }

    pub fn set_ccr(&mut self, value: u8) {
        self.sr = (self.sr & !CCR_MASK) | (u16::from(value) & CCR_MASK);
    }

    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        self.sr & S != 0
    }

    #[must_use]
    pub const fn is_trace(&self) -> bool {
        self.sr & T != 0
    }

    #[must_use]
    pub const fn interrupt_mask(&self) -> u8 {
        ((self.sr & INT_MASK) >> 8) as u8
    }

    pub fn set_interrupt_mask(&mut self, level: u8) {
        self.sr = (self.sr & !INT_MASK) | ((u16::from(level) << 8) & INT_MASK);
    }
}

/// Register selector for [`Cpu68000::get`](crate::Cpu68000::get) and
/// [`Cpu68000::set`](crate::Cpu68000::set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    Pc,
    Sr,
    /// The active stack pointer (same as A7).
    Sp,
    Usp,
    /// Supervisor stack pointer.
    Isp,
    /// Address of the last program-space fetch.
    PrefAddr,
    /// Word returned by the last program-space fetch.
    PrefData,
    /// Opcode of the last instruction started.
    Ir,
}

impl Register {
    const DATA: [Self; 8] = [
        Self::D0,
        Self::D1,
        Self::D2,
        Self::D3,
        Self::D4,
        Self::D5,
        Self::D6,
        Self::D7,
    ];
    const ADDRESS: [Self; 8] = [
        Self::A0,
        Self::A1,
        Self::A2,
        Self::A3,
        Self::A4,
        Self::A5,
        Self::A6,
        Self::A7,
    ];

    /// Dn for `n` in 0..8.
    #[must_use]
    pub fn data(n: usize) -> Self {
        Self::DATA[n & 7]
    }

    /// An for `n` in 0..8.
    #[must_use]
    pub fn address(n: usize) -> Self {
        Self::ADDRESS[n & 7]
    }

    /// Data or address register index, if this is one.
    pub(crate) fn index(self) -> Option<(bool, usize)> {
        if let Some(n) = Self::DATA.iter().position(|&r| r == self) {
            return Some((false, n));
        }
        Self::ADDRESS.iter().position(|&r| r == self).map(|n| (true, n))
    }
}
