//! The twelve 68000 addressing modes and the categories instructions
//! restrict them to.

/// Addressing mode decoded from a 6-bit mode/register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Dn
    DataReg(u8),
    /// An
    AddrReg(u8),
    /// (An)
    AddrInd(u8),
    /// (An)+
    AddrIndPostInc(u8),
    /// -(An)
    AddrIndPreDec(u8),
    /// d16(An)
    AddrIndDisp(u8),
    /// d8(An,Xn)
    AddrIndIndex(u8),
    /// (xxx).W
    AbsShort,
    /// (xxx).L
    AbsLong,
    /// d16(PC)
    PcDisp,
    /// d8(PC,Xn)
    PcIndex,
    /// #imm
    Immediate,
}

impl AddrMode {
    /// Decode mode/register fields. `None` for the unused mode 7 encodings.
    #[must_use]
    pub fn decode(mode: u16, reg: u16) -> Option<Self> {
        let r = (reg & 7) as u8;
        match mode & 7 {
            0 => Some(Self::DataReg(r)),
            1 => Some(Self::AddrReg(r)),
            2 => Some(Self::AddrInd(r)),
            3 => Some(Self::AddrIndPostInc(r)),
            4 => Some(Self::AddrIndPreDec(r)),
            5 => Some(Self::AddrIndDisp(r)),
            6 => Some(Self::AddrIndIndex(r)),
            _ => match r {
                0 => Some(Self::AbsShort),
                1 => Some(Self::AbsLong),
                2 => Some(Self::PcDisp),
                3 => Some(Self::PcIndex),
                4 => Some(Self::Immediate),
                _ => None,
            },
        }
    }

    /// Decode the EA field in the low six bits of an opcode.
    #[must_use]
    pub fn from_opcode(op: u16) -> Option<Self> {
        Self::decode(op >> 3, op)
    }

    /// Decode the MOVE destination field (register in bits 11-9, mode in 8-6).
    #[must_use]
    pub fn move_destination(op: u16) -> Option<Self> {
        Self::decode(op >> 6, op >> 9)
    }

    #[must_use]
    pub fn is_register(self) -> bool {
        matches!(self, Self::DataReg(_) | Self::AddrReg(_))
    }

    /// Every mode except An.
    #[must_use]
    pub fn is_data(self) -> bool {
        !matches!(self, Self::AddrReg(_))
    }

    /// Every mode except Dn and An.
    #[must_use]
    pub fn is_memory(self) -> bool {
        !self.is_register()
    }

    /// Modes with no implicit side effect and a computable address.
    #[must_use]
    pub fn is_control(self) -> bool {
        matches!(
            self,
            Self::AddrInd(_)
                | Self::AddrIndDisp(_)
                | Self::AddrIndIndex(_)
                | Self::AbsShort
                | Self::AbsLong
                | Self::PcDisp
                | Self::PcIndex
        )
    }

    /// Writable destinations (including An).
    #[must_use]
    pub fn is_alterable(self) -> bool {
        !matches!(self, Self::PcDisp | Self::PcIndex | Self::Immediate)
    }

    #[must_use]
    pub fn is_data_alterable(self) -> bool {
        self.is_alterable() && self.is_data()
    }

    #[must_use]
    pub fn is_memory_alterable(self) -> bool {
        self.is_alterable() && self.is_memory()
    }

    /// Column in the control-mode timing tables (JMP, JSR, LEA, PEA, MOVEM).
    pub(crate) fn control_index(self) -> Option<usize> {
        match self {
            Self::AddrInd(_) => Some(0),
            Self::AddrIndDisp(_) => Some(1),
            Self::AddrIndIndex(_) => Some(2),
            Self::AbsShort => Some(3),
            Self::AbsLong => Some(4),
            Self::PcDisp => Some(5),
            Self::PcIndex => Some(6),
            _ => None,
        }
    }
}
