//! Instruction semantics and timing, one program at a time.

mod common;

use common::{CODE, IO_BASE, Machine, STACK};
use cpu_m68k_interp::flags::{C, N, V, X, Z};
use cpu_m68k_interp::{Register, StepOutcome};

const CCR: u16 = X | N | Z | V | C;

fn ccr(m: &Machine) -> u16 {
    m.cpu.regs.sr() & CCR
}

fn set_ccr(m: &mut Machine, flags: u16) {
    m.cpu.set(Register::Sr, u32::from(0x2700 | flags));
}

#[test]
fn test_reset_loads_vectors() {
    let m = Machine::new(&[0x4E71]);
    assert_eq!(m.cpu.get(Register::Isp), STACK);
    assert_eq!(m.cpu.get(Register::Sp), STACK);
    assert_eq!(m.cpu.regs.pc, CODE);
    assert_eq!(m.cpu.regs.sr(), 0x2700);
    assert_eq!(m.cpu.total_cycles().get(), 40);
}

#[test]
fn test_nop() {
    let mut m = Machine::new(&[0x4E71]);
    m.cpu.regs.d[0] = 0x1234;
    assert_eq!(m.step(), StepOutcome::Completed);
    assert_eq!(m.cpu.regs.d[0], 0x1234);
    assert_eq!(m.cpu.regs.pc, CODE + 2);
    assert_eq!(m.cpu.cycles_run(), 4);
}

#[test]
fn test_moveq_negative() {
    // MOVEQ #-1,D0
    let mut m = Machine::new(&[0x70FF]);
    assert_eq!(m.step_cycles(), 4);
    assert_eq!(m.cpu.regs.d[0], 0xFFFF_FFFF);
    assert_eq!(ccr(&m), N);
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_add_long_overflow() {
    // ADD.L D1,D0
    let mut m = Machine::new(&[0xD081]);
    m.cpu.regs.d[0] = 0x7FFF_FFFF;
    m.cpu.regs.d[1] = 1;
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.d[0], 0x8000_0000);
    assert_eq!(ccr(&m), N | V);
}

#[test]
fn test_sub_borrow_sets_carry_and_extend() {
    // SUB.L D1,D0
    let mut m = Machine::new(&[0x9081]);
    m.cpu.regs.d[0] = 0;
    m.cpu.regs.d[1] = 1;
    m.step();
    assert_eq!(m.cpu.regs.d[0], 0xFFFF_FFFF);
    assert_eq!(ccr(&m), X | N | C);
}

#[test]
fn test_add_byte_keeps_upper_bits() {
    // ADD.B D1,D0
    let mut m = Machine::new(&[0xD001]);
    m.cpu.regs.d[0] = 0x1234_56FF;
    m.cpu.regs.d[1] = 0x0000_0001;
    assert_eq!(m.step_cycles(), 4);
    assert_eq!(m.cpu.regs.d[0], 0x1234_5600);
    assert_eq!(ccr(&m), X | Z | C);
}

#[test]
fn test_addx_zero_is_sticky() {
    // ADDX.L D1,D0 twice
    let mut m = Machine::new(&[0xD181, 0xD181]);
    set_ccr(&mut m, Z);
    m.step();
    assert_eq!(m.cpu.regs.d[0], 0);
    assert_eq!(ccr(&m) & Z, Z);

    m.cpu.regs.d[1] = 1;
    m.step();
    assert_eq!(m.cpu.regs.d[0], 1);
    assert_eq!(ccr(&m) & Z, 0);
}

#[test]
fn test_adda_word_sign_extends_without_flags() {
    // ADDA.W D0,A0
    let mut m = Machine::new(&[0xD0C0]);
    m.cpu.regs.a[0] = 0x0001_0000;
    m.cpu.regs.d[0] = 0xFFFF;
    set_ccr(&mut m, C);
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.a[0], 0x0000_FFFF);
    assert_eq!(ccr(&m), C);
}

#[test]
fn test_addq_to_address_register() {
    // ADDQ.W #8,A1
    let mut m = Machine::new(&[0x5049]);
    m.cpu.regs.a[1] = 0x0000_FFFC;
    m.step();
    assert_eq!(m.cpu.regs.a[1], 0x0001_0004);
}

#[test]
fn test_cmp_preserves_extend() {
    // CMP.W D1,D0
    let mut m = Machine::new(&[0xB041]);
    m.cpu.regs.d[0] = 1;
    m.cpu.regs.d[1] = 2;
    set_ccr(&mut m, X);
    assert_eq!(m.step_cycles(), 4);
    assert_eq!(ccr(&m), X | N | C);
    assert_eq!(m.cpu.regs.d[0], 1);
}

#[test]
fn test_cmpm_post_increments_both() {
    // CMPM.B (A0)+,(A1)+
    let mut m = Machine::new(&[0xB308]);
    m.cpu.regs.a[0] = 0x2000;
    m.cpu.regs.a[1] = 0x3000;
    m.poke_byte(0x2000, 0x42);
    m.poke_byte(0x3000, 0x42);
    assert_eq!(m.step_cycles(), 12);
    assert_eq!(ccr(&m) & Z, Z);
    assert_eq!(m.cpu.regs.a[0], 0x2001);
    assert_eq!(m.cpu.regs.a[1], 0x3001);
}

#[test]
fn test_neg_clr_not() {
    // NEG.B D0; CLR.W D1; NOT.L D2
    let mut m = Machine::new(&[0x4400, 0x4241, 0x4682]);
    m.cpu.regs.d[0] = 0x01;
    m.cpu.regs.d[1] = 0xAAAA_5555;
    m.cpu.regs.d[2] = 0x0F0F_0F0F;

    assert_eq!(m.step_cycles(), 4);
    assert_eq!(m.cpu.regs.d[0], 0xFF);
    assert_eq!(ccr(&m), X | N | C);

    assert_eq!(m.step_cycles(), 4);
    assert_eq!(m.cpu.regs.d[1], 0xAAAA_0000);
    assert_eq!(ccr(&m), X | Z);

    assert_eq!(m.step_cycles(), 6);
    assert_eq!(m.cpu.regs.d[2], 0xF0F0_F0F0);
    assert_eq!(ccr(&m), X | N);
}

#[test]
fn test_mulu_worst_case() {
    // MULU.W D1,D0
    let mut m = Machine::new(&[0xC0C1]);
    m.cpu.regs.d[0] = 0xFFFF;
    m.cpu.regs.d[1] = 0xFFFF;
    assert_eq!(m.step_cycles(), 70);
    assert_eq!(m.cpu.regs.d[0], 0xFFFE_0001);
    assert_eq!(ccr(&m), N);
}

#[test]
fn test_muls_signed() {
    // MULS.W D1,D0
    let mut m = Machine::new(&[0xC1C1]);
    m.cpu.regs.d[0] = 0xFFFF_FFFE; // -2
    m.cpu.regs.d[1] = 3;
    m.step();
    assert_eq!(m.cpu.regs.d[0], (-6i32) as u32);
    assert_eq!(ccr(&m), N);
}

#[test]
fn test_divu_quotient_and_remainder() {
    // DIVU.W D1,D0
    let mut m = Machine::new(&[0x80C1]);
    m.cpu.regs.d[0] = 100;
    m.cpu.regs.d[1] = 7;
    m.step();
    assert_eq!(m.cpu.regs.d[0], 0x0002_000E);
    assert_eq!(ccr(&m), 0);
}

#[test]
fn test_divu_overflow_leaves_register() {
    // DIVU.W D1,D0
    let mut m = Machine::new(&[0x80C1]);
    m.cpu.regs.d[0] = 0x0001_0000;
    m.cpu.regs.d[1] = 1;
    assert_eq!(m.step_cycles(), 10);
    assert_eq!(m.cpu.regs.d[0], 0x0001_0000);
    assert_eq!(ccr(&m), N | V);
}

#[test]
fn test_divs_negative_dividend() {
    // DIVS.W D1,D0: -7 / 2 = -3 remainder -1
    let mut m = Machine::new(&[0x81C1]);
    m.cpu.regs.d[0] = (-7i32) as u32;
    m.cpu.regs.d[1] = 2;
    m.step();
    assert_eq!(m.cpu.regs.d[0], 0xFFFF_FFFD);
    assert_eq!(ccr(&m), N);
}

#[test]
fn test_divs_min_by_minus_one_overflows() {
    let mut m = Machine::new(&[0x81C1]);
    m.cpu.regs.d[0] = 0x8000_0000;
    m.cpu.regs.d[1] = 0xFFFF;
    m.step();
    assert_eq!(m.cpu.regs.d[0], 0x8000_0000);
    assert_eq!(ccr(&m) & V, V);
}

#[test]
fn test_abcd_and_sbcd() {
    // ABCD D1,D0; SBCD D3,D2
    let mut m = Machine::new(&[0xC101, 0x8503]);
    m.cpu.regs.d[0] = 0x45;
    m.cpu.regs.d[1] = 0x38;
    m.cpu.regs.d[2] = 0x10;
    m.cpu.regs.d[3] = 0x01;

    assert_eq!(m.step_cycles(), 6);
    assert_eq!(m.cpu.regs.d[0], 0x83);
    assert_eq!(ccr(&m) & (X | C), 0);

    m.step();
    assert_eq!(m.cpu.regs.d[2], 0x09);
    assert_eq!(ccr(&m) & (X | C), 0);
}

#[test]
fn test_abcd_decimal_carry() {
    // ABCD D1,D0: 99 + 01 = 00 carry
    let mut m = Machine::new(&[0xC101]);
    m.cpu.regs.d[0] = 0x99;
    m.cpu.regs.d[1] = 0x01;
    set_ccr(&mut m, Z);
    m.step();
    assert_eq!(m.cpu.regs.d[0] & 0xFF, 0x00);
    assert_eq!(ccr(&m) & (X | C | Z), X | C | Z);
}

// ============================================================================
// Logic, bits and shifts
// ============================================================================

#[test]
fn test_logic_ops() {
    // AND.W D1,D0; OR.B D1,D2; EOR.L D1,D3
    let mut m = Machine::new(&[0xC041, 0x8401, 0xB383]);
    m.cpu.regs.d[0] = 0xFFFF_F0F0;
    m.cpu.regs.d[1] = 0x0000_8F0F;
    m.cpu.regs.d[2] = 0x0000_0000;
    m.cpu.regs.d[3] = 0x0000_8F0F;
    set_ccr(&mut m, V | C | X);

    m.step();
    assert_eq!(m.cpu.regs.d[0], 0xFFFF_8000);
    assert_eq!(ccr(&m), X | N);

    m.step();
    assert_eq!(m.cpu.regs.d[2], 0x0F);
    assert_eq!(ccr(&m), X);

    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.d[3], 0);
    assert_eq!(ccr(&m), X | Z);
}

#[test]
fn test_immediate_ops() {
    // ORI.B #$0F,D0; ANDI.L #$FF00FF00,D0; CMPI.W #5,D1
    let mut m = Machine::new(&[0x0000, 0x000F, 0x0280, 0xFF00, 0xFF00, 0x0C41, 0x0005]);
    m.cpu.regs.d[0] = 0x1234_5670;
    m.cpu.regs.d[1] = 5;

    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.d[0], 0x1234_567F);

    assert_eq!(m.step_cycles(), 14);
    assert_eq!(m.cpu.regs.d[0], 0x1200_5600);

    assert_eq!(m.step_cycles(), 8);
    assert_eq!(ccr(&m) & Z, Z);
    assert_eq!(m.cpu.regs.pc, CODE + 14);
}

#[test]
fn test_addi_to_memory() {
    // ADDI.W #1,(A0)
    let mut m = Machine::new(&[0x0650, 0x0001]);
    m.cpu.regs.a[0] = 0x2000;
    m.poke_word(0x2000, 0x7FFF);
    assert_eq!(m.step_cycles(), 16);
    assert_eq!(m.peek_word(0x2000), 0x8000);
    assert_eq!(ccr(&m), N | V);
}

#[test]
fn test_ccr_immediates() {
    // ORI #$1F,CCR; ANDI #$04,CCR; EORI #$05,CCR
    let mut m = Machine::new(&[0x003C, 0x001F, 0x023C, 0x0004, 0x0A3C, 0x0005]);
    assert_eq!(m.step_cycles(), 20);
    assert_eq!(ccr(&m), CCR);
    m.step();
    assert_eq!(ccr(&m), Z);
    m.step();
    assert_eq!(ccr(&m), C);
    assert_eq!(m.cpu.regs.sr() & 0xFF00, 0x2700);
}

#[test]
fn test_bit_ops_register_and_memory() {
    // BSET #3,D0; BTST D1,(A0); BCLR #31,D2
    let mut m = Machine::new(&[0x08C0, 0x0003, 0x0310, 0x0882, 0x001F]);
    m.cpu.regs.d[1] = 9; // bit 1 for a byte operand
    m.cpu.regs.d[2] = 0x8000_0000;
    m.cpu.regs.a[0] = 0x2000;
    m.poke_byte(0x2000, 0x02);

    m.step();
    assert_eq!(m.cpu.regs.d[0], 0x08);
    assert_eq!(ccr(&m) & Z, Z);

    assert_eq!(m.step_cycles(), 8);
    assert_eq!(ccr(&m) & Z, 0);

    m.step();
    assert_eq!(m.cpu.regs.d[2], 0);
    assert_eq!(ccr(&m) & Z, 0);
}

#[test]
fn test_lsl_register_count() {
    // LSL.L D1,D0
    let mut m = Machine::new(&[0xE3A8]);
    m.cpu.regs.d[0] = 0xF000_0001;
    m.cpu.regs.d[1] = 4;
    assert_eq!(m.step_cycles(), 16);
    assert_eq!(m.cpu.regs.d[0], 0x0000_0010);
    assert_eq!(ccr(&m), X | C);
}

#[test]
fn test_shift_count_zero_preserves_flags() {
    // LSL.L D1,D0 with D1 = 64 (mod 64 = 0)
    let mut m = Machine::new(&[0xE3A8]);
    m.cpu.regs.d[0] = 0x8000_0000;
    m.cpu.regs.d[1] = 64;
    set_ccr(&mut m, X | V | C);
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.d[0], 0x8000_0000);
    assert_eq!(ccr(&m), X | V | C);
}

#[test]
fn test_asl_immediate_overflow() {
    // ASL.W #1,D0
    let mut m = Machine::new(&[0xE340]);
    m.cpu.regs.d[0] = 0x4000;
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.d[0], 0x8000);
    assert_eq!(ccr(&m), N | V);
}

#[test]
fn test_immediate_count_zero_means_eight() {
    // ROR.B #8,D0
    let mut m = Machine::new(&[0xE018]);
    m.cpu.regs.d[0] = 0x81;
    assert_eq!(m.step_cycles(), 22);
    assert_eq!(m.cpu.regs.d[0], 0x81);
    assert_eq!(ccr(&m), N | C);
}

#[test]
fn test_memory_shift() {
    // LSR.W (A0)
    let mut m = Machine::new(&[0xE2D0]);
    m.cpu.regs.a[0] = 0x2000;
    m.poke_word(0x2000, 0x0003);
    assert_eq!(m.step_cycles(), 12);
    assert_eq!(m.peek_word(0x2000), 0x0001);
    assert_eq!(ccr(&m), X | C);
}

#[test]
fn test_tas_memory_and_writeback() {
    // TAS (A0) twice
    let mut m = Machine::new(&[0x4AD0, 0x4AD0]);
    m.cpu.regs.a[0] = 0x2000;
    assert_eq!(m.step_cycles(), 14);
    assert_eq!(m.peek_byte(0x2000), 0x80);
    assert_eq!(ccr(&m), Z);

    m.poke_byte(0x2000, 0x01);
    m.host.refuse_tas = true;
    m.step();
    assert_eq!(m.peek_byte(0x2000), 0x01);
}

#[test]
fn test_scc() {
    // SEQ D0; SNE D1
    let mut m = Machine::new(&[0x57C0, 0x56C1]);
    m.cpu.regs.d[1] = 0x1234_5678;
    set_ccr(&mut m, Z);
    assert_eq!(m.step_cycles(), 6);
    assert_eq!(m.cpu.regs.d[0], 0xFF);
    assert_eq!(m.step_cycles(), 4);
    assert_eq!(m.cpu.regs.d[1], 0x1234_5600);
}

// ============================================================================
// Data movement
// ============================================================================

#[test]
fn test_move_word_to_memory() {
    // MOVE.W D0,(A0)
    let mut m = Machine::new(&[0x3080]);
    m.cpu.regs.a[0] = 0x2000;
    m.cpu.regs.d[0] = 0x8001;
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.peek_word(0x2000), 0x8001);
    assert_eq!(ccr(&m), N);
}

#[test]
fn test_move_long_predecrement_costs_like_indirect() {
    // MOVE.L D0,-(A0)
    let mut m = Machine::new(&[0x2100]);
    m.cpu.regs.a[0] = 0x2000;
    m.cpu.regs.d[0] = 0xCAFE_BABE;
    assert_eq!(m.step_cycles(), 12);
    assert_eq!(m.cpu.regs.a[0], 0x1FFC);
    assert_eq!(m.peek_long(0x1FFC), 0xCAFE_BABE);
}

#[test]
fn test_move_memory_to_memory_timing() {
    // MOVE.L 4(A0),$3000.L
    let mut m = Machine::new(&[0x23E8, 0x0004, 0x0000, 0x3000]);
    m.cpu.regs.a[0] = 0x2000;
    m.poke_long(0x2004, 0x0102_0304);
    assert_eq!(m.step_cycles(), 32);
    assert_eq!(m.peek_long(0x3000), 0x0102_0304);
    assert_eq!(m.cpu.regs.pc, CODE + 8);
}

#[test]
fn test_movea_word_sign_extends() {
    // MOVEA.W D0,A1
    let mut m = Machine::new(&[0x3240]);
    m.cpu.regs.d[0] = 0x8000;
    set_ccr(&mut m, Z);
    assert_eq!(m.step_cycles(), 4);
    assert_eq!(m.cpu.regs.a[1], 0xFFFF_8000);
    assert_eq!(ccr(&m), Z);
}

#[test]
fn test_move_pc_relative_source() {
    // MOVE.W 6(PC),D0 then data word at CODE + 8
    let mut m = Machine::new(&[0x303A, 0x0006, 0x4E71, 0x4E71, 0xBEEF]);
    m.step();
    assert_eq!(m.cpu.regs.d[0], 0xBEEF);
}

#[test]
fn test_movem_round_trip_through_stack() {
    // MOVEM.L D0-D1/A0,-(A7); MOVEM.L (A7)+,D2-D3/A1
    let mut m = Machine::new(&[0x48E7, 0xC080, 0x4CDF, 0x020C]);
    m.cpu.regs.d[0] = 0x1111_1111;
    m.cpu.regs.d[1] = 0x2222_2222;
    m.cpu.regs.a[0] = 0x3333_3333;

    assert_eq!(m.step_cycles(), 32);
    assert_eq!(m.cpu.regs.ssp, STACK - 12);
    assert_eq!(m.peek_long(STACK - 12), 0x1111_1111);
    assert_eq!(m.peek_long(STACK - 8), 0x2222_2222);
    assert_eq!(m.peek_long(STACK - 4), 0x3333_3333);

    assert_eq!(m.step_cycles(), 36);
    assert_eq!(m.cpu.regs.ssp, STACK);
    assert_eq!(m.cpu.regs.d[2], 0x1111_1111);
    assert_eq!(m.cpu.regs.d[3], 0x2222_2222);
    assert_eq!(m.cpu.regs.a[1], 0x3333_3333);
}

#[test]
fn test_movem_word_loads_sign_extend() {
    // MOVEM.W (A0),D0/A1
    let mut m = Machine::new(&[0x4C90, 0x0201]);
    m.cpu.regs.a[0] = 0x2000;
    m.poke_word(0x2000, 0x8000);
    m.poke_word(0x2002, 0xFFFE);
    assert_eq!(m.step_cycles(), 20);
    assert_eq!(m.cpu.regs.d[0], 0xFFFF_8000);
    assert_eq!(m.cpu.regs.a[1], 0xFFFF_FFFE);
}

#[test]
fn test_movep_long_to_memory() {
    // MOVEP.L D0,0(A0)
    let mut m = Machine::new(&[0x01C8, 0x0000]);
    m.cpu.regs.a[0] = 0x2000;
    m.cpu.regs.d[0] = 0x1122_3344;
    assert_eq!(m.step_cycles(), 24);
    assert_eq!(m.peek_byte(0x2000), 0x11);
    assert_eq!(m.peek_byte(0x2002), 0x22);
    assert_eq!(m.peek_byte(0x2004), 0x33);
    assert_eq!(m.peek_byte(0x2006), 0x44);
    assert_eq!(m.peek_byte(0x2001), 0x00);
}

#[test]
fn test_swap_ext_exg() {
    // SWAP D0; EXT.W D1; EXT.L D2; EXG D0,A0
    let mut m = Machine::new(&[0x4840, 0x4881, 0x48C2, 0xC188]);
    m.cpu.regs.d[0] = 0x1234_5678;
    m.cpu.regs.d[1] = 0xAAAA_AA80;
    m.cpu.regs.d[2] = 0x0000_7FFF;
    m.cpu.regs.a[0] = 0xDEAD_BEEF;

    m.step();
    assert_eq!(m.cpu.regs.d[0], 0x5678_1234);
    m.step();
    assert_eq!(m.cpu.regs.d[1], 0xAAAA_FF80);
    assert_eq!(ccr(&m), N);
    m.step();
    assert_eq!(m.cpu.regs.d[2], 0x0000_7FFF);
    assert_eq!(m.step_cycles(), 6);
    assert_eq!(m.cpu.regs.d[0], 0xDEAD_BEEF);
    assert_eq!(m.cpu.regs.a[0], 0x5678_1234);
}

#[test]
fn test_lea_and_pea() {
    // LEA 8(A0),A1; PEA (A1)
    let mut m = Machine::new(&[0x43E8, 0x0008, 0x4851]);
    m.cpu.regs.a[0] = 0x2000;
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.a[1], 0x2008);
    assert_eq!(m.step_cycles(), 12);
    assert_eq!(m.cpu.regs.ssp, STACK - 4);
    assert_eq!(m.peek_long(STACK - 4), 0x2008);
}

#[test]
fn test_link_and_unlk() {
    // LINK A6,#-8; UNLK A6
    let mut m = Machine::new(&[0x4E56, 0xFFF8, 0x4E5E]);
    m.cpu.regs.a[6] = 0x1234_5678;
    assert_eq!(m.step_cycles(), 16);
    assert_eq!(m.cpu.regs.a[6], STACK - 4);
    assert_eq!(m.cpu.regs.ssp, STACK - 12);
    assert_eq!(m.peek_long(STACK - 4), 0x1234_5678);

    assert_eq!(m.step_cycles(), 12);
    assert_eq!(m.cpu.regs.a[6], 0x1234_5678);
    assert_eq!(m.cpu.regs.ssp, STACK);
}

#[test]
fn test_move_to_ccr_and_from_sr() {
    // MOVE #$1F,CCR; MOVE SR,D0
    let mut m = Machine::new(&[0x44FC, 0x001F, 0x40C0]);
    assert_eq!(m.step_cycles(), 16);
    assert_eq!(ccr(&m), CCR);
    assert_eq!(m.step_cycles(), 6);
    assert_eq!(m.cpu.regs.d[0] & 0xFFFF, 0x271F);
}

#[test]
fn test_move_usp() {
    // MOVE A0,USP; MOVE USP,A1
    let mut m = Machine::new(&[0x4E60, 0x4E69]);
    m.cpu.regs.a[0] = 0x8000;
    m.step();
    assert_eq!(m.cpu.get(Register::Usp), 0x8000);
    m.step();
    assert_eq!(m.cpu.regs.a[1], 0x8000);
}

#[test]
fn test_long_write_to_io_splits_high_word_first() {
    // MOVE.L D0,(A0)
    let mut m = Machine::new(&[0x2080]);
    m.cpu.regs.a[0] = IO_BASE + 0x10;
    m.cpu.regs.d[0] = 0x1122_3344;
    m.step();
    assert_eq!(
        m.host.io_writes,
        vec![(IO_BASE + 0x10, 0x1122, 2), (IO_BASE + 0x12, 0x3344, 2)]
    );
}

#[test]
fn test_reset_instruction_calls_host() {
    let mut m = Machine::new(&[0x4E70]);
    assert_eq!(m.step_cycles(), 132);
    assert_eq!(m.host.resets, 1);
    assert_eq!(m.cpu.regs.pc, CODE + 2);
}

// ============================================================================
// Program flow
// ============================================================================

#[test]
fn test_dbra_loop_runs_body_count_plus_one_times() {
    // MOVEQ #3,D0; loop: ADDQ.W #1,D1; DBRA D0,loop; NOP
    let mut m = Machine::new(&[0x7003, 0x5241, 0x51C8, 0xFFFC, 0x4E71]);
    m.step();

    let mut dbra_cycles = Vec::new();
    while m.cpu.regs.pc != CODE + 8 {
        m.step();
        dbra_cycles.push(m.step_cycles());
    }
    assert_eq!(m.cpu.regs.d[1], 4);
    assert_eq!(m.cpu.regs.d[0] & 0xFFFF, 0xFFFF);
    assert_eq!(dbra_cycles, vec![10, 10, 10, 14]);
}

#[test]
fn test_dbcc_condition_true_falls_through() {
    // DBEQ D0,* with Z set
    let mut m = Machine::new(&[0x57C8, 0xFFFE]);
    m.cpu.regs.d[0] = 5;
    set_ccr(&mut m, Z);
    assert_eq!(m.step_cycles(), 12);
    assert_eq!(m.cpu.regs.d[0], 5);
    assert_eq!(m.cpu.regs.pc, CODE + 4);
}

#[test]
fn test_branch_timing() {
    // BEQ.S +2 (not taken); BNE.S +2 (taken); BEQ.W +16 (not taken)
    let mut m = Machine::new(&[0x6702, 0x6602, 0x4E71, 0x6700, 0x0010]);
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.pc, CODE + 2);
    assert_eq!(m.step_cycles(), 10);
    assert_eq!(m.cpu.regs.pc, CODE + 6);
    assert_eq!(m.step_cycles(), 12);
    assert_eq!(m.cpu.regs.pc, CODE + 10);
}

#[test]
fn test_bsr_and_rts() {
    // BSR.S +4; NOP; NOP; RTS
    let mut m = Machine::new(&[0x6104, 0x4E71, 0x4E71, 0x4E75]);
    assert_eq!(m.step_cycles(), 18);
    assert_eq!(m.cpu.regs.pc, CODE + 6);
    assert_eq!(m.peek_long(STACK - 4), CODE + 2);
    assert_eq!(m.step_cycles(), 16);
    assert_eq!(m.cpu.regs.pc, CODE + 2);
    assert_eq!(m.cpu.regs.ssp, STACK);
}

#[test]
fn test_jsr_and_jmp() {
    // JSR (A0) at CODE; JMP (A1) at $2000
    let mut m = Machine::new(&[0x4E90]);
    m.load_words(0x2000, &[0x4ED1]);
    m.cpu.regs.a[0] = 0x2000;
    m.cpu.regs.a[1] = 0x3000;
    assert_eq!(m.step_cycles(), 16);
    assert_eq!(m.cpu.regs.pc, 0x2000);
    assert_eq!(m.peek_long(STACK - 4), CODE + 2);
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.regs.pc, 0x3000);
}

#[test]
fn test_rtr_restores_ccr_only() {
    let mut m = Machine::new(&[0x4E77]);
    m.cpu.regs.ssp = STACK - 6;
    m.poke_word(STACK - 6, 0xFF1F);
    m.poke_long(STACK - 4, 0x2000);
    assert_eq!(m.step_cycles(), 20);
    assert_eq!(m.cpu.regs.sr(), 0x271F);
    assert_eq!(m.cpu.regs.pc, 0x2000);
}

// ============================================================================
// Idle loops
// ============================================================================

#[test]
fn test_idle_loop_is_skipped_to_end_of_budget() {
    // BRA *
    let mut m = Machine::new(&[0x60FE]);
    assert_eq!(m.run(10_000), 10_000);
    assert!(m.cpu.idle_detected());
    assert_eq!(m.cpu.regs.pc, CODE);
}

#[test]
fn test_idle_skip_matches_literal_execution() {
    use cpu_m68k_interp::CpuConfig;

    let mut fast = Machine::new(&[0x60FE]);
    let mut slow =
        Machine::with_config(CpuConfig::default().with_idle_loop_skip(false), &[0x60FE]);
    assert_eq!(fast.run(1_005), slow.run(1_005));
    assert_eq!(fast.cpu.regs, slow.cpu.regs);
    assert_eq!(fast.cpu.total_cycles(), slow.cpu.total_cycles());
}

/// Run a fast and a literal machine side by side, apply the same
/// interrupt request to both after 100 clocks, and require identical
/// results over the next 1000.
fn compare_idle_with_irq(program: &[u16], sr: u32, request: impl Fn(&mut Machine)) -> Machine {
    use cpu_m68k_interp::CpuConfig;

    let mut fast = Machine::new(program);
    let mut slow = Machine::with_config(CpuConfig::default().with_idle_loop_skip(false), program);
    for m in [&mut fast, &mut slow] {
        m.cpu.set(Register::Sr, sr);
    }
    assert_eq!(fast.run(100), slow.run(100));
    request(&mut fast);
    request(&mut slow);
    assert_eq!(fast.run(1_000), slow.run(1_000));
    assert_eq!(fast.cpu.regs, slow.cpu.regs);
    assert_eq!(fast.cpu.total_cycles(), slow.cpu.total_cycles());
    fast
}

#[test]
fn test_idle_skip_takes_delayed_irq() {
    // BRA *
    let m = compare_idle_with_irq(&[0x60FE], 0x2000, |m| m.cpu.set_irq_delayed(4));
    assert_eq!(m.cpu.regs.ssp, STACK - 6);
    assert_eq!(m.peek_long(STACK - 4), CODE);
}

#[test]
fn test_idle_skip_takes_polled_irq() {
    use cpu_m68k_interp::IrqChange;

    let m = compare_idle_with_irq(&[0x60FE], 0x2000, |m| {
        m.host.pending_irq = Some(IrqChange::Set(4));
    });
    assert_eq!(m.cpu.regs.ssp, STACK - 6);
    assert_eq!(m.host.acks, [4]);
}

#[test]
fn test_idle_skip_takes_immediate_irq() {
    let m = compare_idle_with_irq(&[0x60FE], 0x2000, |m| m.cpu.set_irq(4));
    assert_eq!(m.cpu.regs.ssp, STACK - 6);
    assert_ne!(m.cpu.regs.pc, CODE);
}

#[test]
fn test_idle_skip_takes_level_7_edge() {
    let m = compare_idle_with_irq(&[0x60FE], 0x2700, |m| m.cpu.set_irq(7));
    assert_eq!(m.cpu.regs.ssp, STACK - 6);
    assert_eq!(m.host.acks, [7]);
}

#[test]
fn test_idle_skip_on_conditional_and_jmp_self_loops() {
    use cpu_m68k_interp::CpuConfig;

    // BEQ * with Z set, then JMP (A0) with A0 pointing at itself
    let cases: [(&[u16], u32); 2] = [(&[0x67FE], 0x2004), (&[0x4ED0], 0x2700)];
    for (program, sr) in cases {
        let mut fast = Machine::new(program);
        let mut slow =
            Machine::with_config(CpuConfig::default().with_idle_loop_skip(false), program);
        for m in [&mut fast, &mut slow] {
            m.cpu.set(Register::Sr, sr);
            m.cpu.set(Register::A0, CODE);
        }
        assert_eq!(fast.run(1_005), slow.run(1_005), "{program:04X?}");
        assert!(fast.cpu.idle_detected(), "{program:04X?}");
        assert_eq!(fast.cpu.regs, slow.cpu.regs, "{program:04X?}");
        assert_eq!(fast.cpu.total_cycles(), slow.cpu.total_cycles(), "{program:04X?}");
    }
}

#[test]
fn test_idle_skip_fills_largest_budget() {
    // BRA *
    let mut m = Machine::new(&[0x60FE]);
    assert_eq!(m.run(u32::MAX), u32::MAX);
    assert_eq!(m.cpu.regs.pc, CODE);
    assert_eq!(m.cpu.total_cycles().get(), u64::from(u32::MAX) + 40);
}

#[test]
fn test_clock_divider_scales_cycles() {
    use cpu_m68k_interp::CpuConfig;

    let config = CpuConfig::default().with_clock_divider(7);
    let mut m = Machine::with_config(config, &[0x4E71, 0x4E71]);
    assert_eq!(m.step_cycles(), 28);

    m.cpu.config_mut().clock_divider = 2;
    assert_eq!(m.step_cycles(), 8);
    assert_eq!(m.cpu.config().clock_divider, 2);
}
