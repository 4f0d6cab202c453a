//! M standard extension for integer multiplication and division
//!
//! Semantics for the instructions of chapter 7 of the unprivileged
//! specification, grouped into the four encoding families: the
//! multiply group (MUL/MULH/MULHSU/MULHU), the divide group
//! (DIV/DIVU), the remainder group (REM/REMU), and the RV64-only
//! word-width group (MULW/DIVW/DIVUW/REMW/REMUW).
//!
//! Each family function decides legality (opcode, funct7, funct3,
//! the M bit of misa, and RV64 for the word-width group) before
//! touching any state. An unrecognised or illegal instruction
//! returns `false` with the environment unchanged.

use crate::alu;
use crate::eei::{Eei, Xlen};
use crate::instr_type::{decode_rtype, funct3, funct7, opcode, Rtype};
use crate::opcodes::{
    FUNCT3_DIV, FUNCT3_DIVU, FUNCT3_MUL, FUNCT3_MULH, FUNCT3_MULHSU, FUNCT3_MULHU, FUNCT3_REM,
    FUNCT3_REMU, FUNCT7_MULDIV, OP, OP_32,
};

/// The multiply/divide operation selected by a funct3 value
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum MulDivOp {
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

impl MulDivOp {
    fn from_funct3(funct3: u32) -> Option<Self> {
        match funct3 {
            FUNCT3_MUL => Some(MulDivOp::Mul),
            FUNCT3_MULH => Some(MulDivOp::Mulh),
            FUNCT3_MULHSU => Some(MulDivOp::Mulhsu),
            FUNCT3_MULHU => Some(MulDivOp::Mulhu),
            FUNCT3_DIV => Some(MulDivOp::Div),
            FUNCT3_DIVU => Some(MulDivOp::Divu),
            FUNCT3_REM => Some(MulDivOp::Rem),
            FUNCT3_REMU => Some(MulDivOp::Remu),
            _ => None,
        }
    }
}

fn muldiv_decode<E: Eei>(eei: &E, instr: u32, op: u32) -> Option<(MulDivOp, Rtype)> {
    if opcode(instr) != op || funct7(instr) != FUNCT7_MULDIV || !eei.extension_supported('M') {
        return None;
    }
    Some((MulDivOp::from_funct3(funct3(instr))?, decode_rtype(instr)))
}

fn finish_muldiv<E: Eei>(eei: &mut E, fields: Rtype, value: u64, is_compressed: bool) {
    eei.finish_rd(fields.rd, value, is_compressed);
}

/// MUL, MULH, MULHSU and MULHU
///
/// Returns false, leaving the environment unchanged, unless the
/// instruction is a legal member of the multiply group.
pub fn execute_mul<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    let Some((op, fields)) = muldiv_decode(eei, instr, OP) else {
        return false;
    };
    let xlen = eei.xlen();
    let src1 = eei.x(fields.rs1);
    let src2 = eei.x(fields.rs2);
    let value = match op {
        MulDivOp::Mul => alu::mul(src1, src2, xlen),
        MulDivOp::Mulh => alu::mulh(src1, src2, xlen),
        MulDivOp::Mulhsu => alu::mulhsu(src1, src2, xlen),
        MulDivOp::Mulhu => alu::mulhu(src1, src2, xlen),
        _ => return false,
    };
    finish_muldiv(eei, fields, value, is_compressed);
    true
}

/// DIV and DIVU
///
/// A zero divisor is not a trap: the quotient is all ones. The
/// overflowing INT_MIN / -1 wraps back to INT_MIN.
pub fn execute_div<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    let Some((op, fields)) = muldiv_decode(eei, instr, OP) else {
        return false;
    };
    let xlen = eei.xlen();
    let src1 = eei.x(fields.rs1);
    let src2 = eei.x(fields.rs2);
    let value = match op {
        MulDivOp::Div => alu::div(src1, src2, xlen),
        MulDivOp::Divu => alu::divu(src1, src2, xlen),
        _ => return false,
    };
    finish_muldiv(eei, fields, value, is_compressed);
    true
}

/// REM and REMU
///
/// A zero divisor passes the dividend through; the overflow case
/// has remainder zero.
pub fn execute_rem<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    let Some((op, fields)) = muldiv_decode(eei, instr, OP) else {
        return false;
    };
    let xlen = eei.xlen();
    let src1 = eei.x(fields.rs1);
    let src2 = eei.x(fields.rs2);
    let value = match op {
        MulDivOp::Rem => alu::rem(src1, src2, xlen),
        MulDivOp::Remu => alu::remu(src1, src2, xlen),
        _ => return false,
    };
    finish_muldiv(eei, fields, value, is_compressed);
    true
}

/// MULW, DIVW, DIVUW, REMW and REMUW (RV64 only)
///
/// These operate on the low 32 bits of each operand and sign-extend
/// the 32-bit result to the full register.
pub fn execute_mul_div_32<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if eei.xlen() != Xlen::Xlen64 {
        return false;
    }
    let Some((op, fields)) = muldiv_decode(eei, instr, OP_32) else {
        return false;
    };
    let src1 = eei.x(fields.rs1);
    let src2 = eei.x(fields.rs2);
    let value = match op {
        MulDivOp::Mul => alu::mulw(src1, src2),
        MulDivOp::Div => alu::divw(src1, src2),
        MulDivOp::Divu => alu::divuw(src1, src2),
        MulDivOp::Rem => alu::remw(src1, src2),
        MulDivOp::Remu => alu::remuw(src1, src2),
        // MULH/MULHSU/MULHU have no word-width form
        _ => return false,
    };
    finish_muldiv(eei, fields, value, is_compressed);
    true
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::hart::Hart;
    use crate::utils::interpret_i64_as_unsigned;

    fn hart64() -> Hart {
        let mut hart = Hart::new(Xlen::Xlen64);
        hart.set_pc(0x1000);
        hart
    }

    // mul x10,x10,x11
    const MUL_X10_X10_X11: u32 = 0x02b50533;
    // div x10,x11,x12
    const DIV_X10_X11_X12: u32 = 0x02c5c533;
    // rem x10,x11,x12
    const REM_X10_X11_X12: u32 = 0x02c5e533;
    // mulw x10,x10,x11
    const MULW_X10_X10_X11: u32 = 0x02b5053b;
    // divw x10,x11,x12
    const DIVW_X10_X11_X12: u32 = 0x02c5c53b;

    #[test]
    fn check_mul() {
        let mut hart = hart64();
        hart.set_x(10, 3);
        hart.set_x(11, 5);
        assert!(execute_mul(&mut hart, MUL_X10_X10_X11, false));
        assert_eq!(hart.x(10), 15);
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_mul_compressed_pc_step() {
        let mut hart = hart64();
        hart.set_x(10, 3);
        hart.set_x(11, 5);
        assert!(execute_mul(&mut hart, MUL_X10_X10_X11, true));
        assert_eq!(hart.pc(), 0x1002);
    }

    #[test]
    fn check_mul_rejects_divide_funct3() {
        let mut hart = hart64();
        assert!(!execute_mul(&mut hart, DIV_X10_X11_X12, false));
        assert_eq!(hart.pc(), 0x1000);
    }

    #[test]
    fn check_div_by_zero() {
        let mut hart = hart64();
        hart.set_x(11, 7);
        // x12 is zero
        assert!(execute_div(&mut hart, DIV_X10_X11_X12, false));
        assert_eq!(hart.x(10), u64::MAX);
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_rem_by_zero() {
        let mut hart = hart64();
        hart.set_x(11, 7);
        assert!(execute_rem(&mut hart, REM_X10_X11_X12, false));
        assert_eq!(hart.x(10), 7);
    }

    #[test]
    fn check_div_signed() {
        let mut hart = hart64();
        hart.set_x(11, interpret_i64_as_unsigned(-27));
        hart.set_x(12, 4);
        assert!(execute_div(&mut hart, DIV_X10_X11_X12, false));
        assert_eq!(hart.x(10), interpret_i64_as_unsigned(-6));
    }

    #[test]
    fn check_mulw_low_words_sign_extended() {
        let mut hart = hart64();
        hart.set_x(10, 0x0000_0001_0000_0002);
        hart.set_x(11, 0x2);
        assert!(execute_mul_div_32(&mut hart, MULW_X10_X10_X11, false));
        assert_eq!(hart.x(10), 4);
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_word_ops_rejected_on_rv32() {
        let mut hart = Hart::new(Xlen::Xlen32);
        hart.set_pc(0x1000);
        hart.set_x(11, 100);
        hart.set_x(12, 10);
        assert!(!execute_mul_div_32(&mut hart, DIVW_X10_X11_X12, false));
        assert_eq!(hart.x(10), 0);
        assert_eq!(hart.pc(), 0x1000);
    }

    #[test]
    fn check_rejected_without_m_extension() {
        let mut hart = Hart::with_extensions(Xlen::Xlen64, "FD");
        hart.set_x(10, 3);
        hart.set_x(11, 5);
        assert!(!execute_mul(&mut hart, MUL_X10_X10_X11, false));
        assert_eq!(hart.x(10), 3);
    }

    #[test]
    fn check_wrong_funct7_rejected() {
        let mut hart = hart64();
        // add x10,x10,x11 has funct7 zero
        assert!(!execute_mul(&mut hart, 0x00b50533, false));
    }

    #[test]
    fn check_write_to_x0_discarded() {
        let mut hart = hart64();
        hart.set_x(10, 3);
        hart.set_x(11, 5);
        // mul x0,x10,x11
        assert!(execute_mul(&mut hart, 0x02b50033, false));
        assert_eq!(hart.x(0), 0);
        assert_eq!(hart.pc(), 0x1004);
    }
}
