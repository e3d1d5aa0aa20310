//! Opcode dispatch.
//!
//! The top nibble selects a line; each line is split further on the size
//! and mode fields. Encodings that do not exist on the 68000, and valid
//! opcodes with an addressing mode the instruction does not accept, raise
//! the illegal instruction exception.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kHost;
use crate::cpu::{Abort, Cpu68000, Exec};
use crate::exceptions::{LINE_A, LINE_F};

impl Cpu68000 {
    /// Fetch the opcode at PC and execute it.
    pub(crate) fn decode_and_execute<H: M68kHost>(&mut self, host: &mut H) -> Exec {
        let op = self.fetch_word(host)?;
        self.ir = op;

        match op >> 12 {
            // ORI/ANDI/SUBI/ADDI/EORI/CMPI, bit ops, MOVEP
            0x0 => self.exec_group0(host, op),
            // MOVE.B / MOVE.L / MOVE.W, MOVEA
            0x1..=0x3 => self.exec_move(host, op),
            // Miscellaneous
            0x4 => self.exec_group4(host, op),
            // ADDQ/SUBQ/Scc/DBcc
            0x5 => self.exec_group5(host, op),
            // Bcc/BRA/BSR
            0x6 => self.exec_branch(host, op),
            // MOVEQ: 0111 RRR 0 DDDDDDDD
            0x7 if op & 0x0100 == 0 => {
                self.exec_moveq(op);
                Ok(())
            }
            0x7 => self.illegal(),
            // OR/DIVU/DIVS/SBCD
            0x8 => self.exec_group8(host, op),
            // SUB/SUBA/SUBX
            0x9 => self.exec_add_sub(host, op, false),
            0xA => Err(Abort::Trap {
                vector: LINE_A,
                pc: self.instr_pc,
            }),
            // CMP/CMPA/CMPM/EOR
            0xB => self.exec_group_b(host, op),
            // AND/MULU/MULS/ABCD/EXG
            0xC => self.exec_group_c(host, op),
            // ADD/ADDA/ADDX
            0xD => self.exec_add_sub(host, op, true),
            0xE => self.exec_shift(host, op),
            _ => Err(Abort::Trap {
                vector: LINE_F,
                pc: self.instr_pc,
            }),
        }
    }

    /// EA field of the current opcode, or illegal.
    pub(crate) fn ea_field(&self, op: u16) -> Exec<AddrMode> {
        match AddrMode::from_opcode(op) {
            Some(mode) => Ok(mode),
            None => self.illegal(),
        }
    }

    /// Standard size field in bits 7-6, or illegal.
    pub(crate) fn size_field(&self, op: u16) -> Exec<Size> {
        match Size::from_bits(op >> 6) {
            Some(size) => Ok(size),
            None => self.illegal(),
        }
    }

    // ========================================================================
    // Line 0
    // ========================================================================

    fn exec_group0<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        if op & 0x0100 != 0 {
            // Dynamic bit ops share the line with MOVEP (mode 001).
            return if (op >> 3) & 7 == 1 {
                self.exec_movep(host, op)
            } else {
                self.exec_bit_op(host, op, false)
            };
        }

        match op {
            0x003C => return self.exec_ccr_op(host, op),
            0x007C => return self.exec_sr_op(host, op),
            0x023C => return self.exec_ccr_op(host, op),
            0x027C => return self.exec_sr_op(host, op),
            0x0A3C => return self.exec_ccr_op(host, op),
            0x0A7C => return self.exec_sr_op(host, op),
            _ => {}
        }

        match (op >> 9) & 7 {
            4 => self.exec_bit_op(host, op, true),
            7 => self.illegal(),
            _ => self.exec_immediate(host, op),
        }
    }

    // ========================================================================
    // Line 4
    // ========================================================================

    fn exec_group4<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        match op {
            0x4AFC => return self.illegal(),
            0x4E70 => return self.exec_reset(host),
            0x4E71 => {
                self.use_cycles(4);
                return Ok(());
            }
            0x4E72 => return self.exec_stop(host),
            0x4E73 => return self.exec_rte(host),
            0x4E75 => return self.exec_rts(host),
            0x4E76 => return self.exec_trapv(),
            0x4E77 => return self.exec_rtr(host),
            _ => {}
        }

        match op & 0x01C0 {
            // LEA: 0100 AAA 111 EA
            0x01C0 => return self.exec_lea(host, op),
            // CHK.W: 0100 DDD 110 EA
            0x0180 => return self.exec_chk(host, op),
            0x0100 | 0x0140 => return self.illegal(),
            _ => {}
        }

        let sz = (op >> 6) & 3;
        let mode = (op >> 3) & 7;
        match (op >> 8) & 0x0F {
            0x0 if sz == 3 => self.exec_move_from_sr(host, op),
            0x0 => self.exec_negx(host, op),
            0x2 if sz == 3 => self.illegal(),
            0x2 => self.exec_clr(host, op),
            0x4 if sz == 3 => self.exec_move_to_ccr(host, op),
            0x4 => self.exec_neg(host, op),
            0x6 if sz == 3 => self.exec_move_to_sr(host, op),
            0x6 => self.exec_not(host, op),
            0x8 => match sz {
                0 => self.exec_nbcd(host, op),
                1 if mode == 0 => {
                    self.exec_swap(op);
                    Ok(())
                }
                1 => self.exec_pea(host, op),
                _ if mode == 0 => {
                    self.exec_ext(op);
                    Ok(())
                }
                _ => self.exec_movem_to_mem(host, op),
            },
            0xA if sz == 3 => self.exec_tas(host, op),
            0xA => self.exec_tst(host, op),
            0xC if sz >= 2 => self.exec_movem_to_regs(host, op),
            0xE => match sz {
                1 => match mode {
                    0 | 1 => Err(Abort::Trap {
                        vector: crate::exceptions::TRAP_BASE + (op & 0x0F) as u8,
                        pc: self.regs.pc,
                    }),
                    2 => self.exec_link(host, op),
                    3 => self.exec_unlk(host, op),
                    4 | 5 => self.exec_move_usp(op),
                    _ => self.illegal(),
                },
                2 => self.exec_jsr(host, op),
                3 => self.exec_jmp(host, op),
                _ => self.illegal(),
            },
            _ => self.illegal(),
        }
    }

    // ========================================================================
    // Line 5
    // ========================================================================

    fn exec_group5<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        if (op >> 6) & 3 == 3 {
            if (op >> 3) & 7 == 1 {
                self.exec_dbcc(host, op)
            } else {
                self.exec_scc(host, op)
            }
        } else {
            self.exec_addq_subq(host, op)
        }
    }

    // ========================================================================
    // Lines 8, B, C
    // ========================================================================

    fn exec_group8<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        match (op >> 6) & 7 {
            3 => self.exec_divu(host, op),
            7 => self.exec_divs(host, op),
            _ if op & 0x01F0 == 0x0100 => self.exec_bcd(host, op, false),
            _ => self.exec_logic(host, op, LogicOp::Or),
        }
    }

    fn exec_group_b<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        match (op >> 6) & 7 {
            3 | 7 => self.exec_cmpa(host, op),
            0..=2 => self.exec_cmp(host, op),
            _ if (op >> 3) & 7 == 1 => self.exec_cmpm(host, op),
            _ => self.exec_eor(host, op),
        }
    }

    fn exec_group_c<H: M68kHost>(&mut self, host: &mut H, op: u16) -> Exec {
        match (op >> 6) & 7 {
            3 => self.exec_mulu(host, op),
            7 => self.exec_muls(host, op),
            _ if op & 0x01F0 == 0x0100 => self.exec_bcd(host, op, true),
            _ if matches!(op & 0x01F8, 0x0140 | 0x0148 | 0x0188) => {
                self.exec_exg(op);
                Ok(())
            }
            _ => self.exec_logic(host, op, LogicOp::And),
        }
    }
}

/// The two-operand logical ops sharing the OR/AND encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicOp {
    And,
    Or,
    Eor,
}

impl LogicOp {
    pub(crate) fn apply(self, a: u32, b: u32) -> u32 {
        match self {
            Self::And => a & b,
            Self::Or => a | b,
            Self::Eor => a ^ b,
        }
    }
}
