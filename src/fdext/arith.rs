use super::{precision_supported, Precision};
use crate::eei::Eei;
use crate::instr_type::{decode_r4type, decode_rtype, funct7, opcode, rm, R4type, Rtype};
use crate::opcodes::{
    FUNCT2_D, FUNCT2_S, FUNCT7_FADD_D, FUNCT7_FADD_S, FUNCT7_FDIV_D, FUNCT7_FDIV_S, FUNCT7_FMUL_D,
    FUNCT7_FMUL_S, FUNCT7_FSQRT_D, FUNCT7_FSQRT_S, FUNCT7_FSUB_D, FUNCT7_FSUB_S, OP_FMADD,
    OP_FMSUB, OP_FNMADD, OP_FNMSUB, OP_FP,
};
use crate::softfloat::{dp, resolve_rounding_mode, sp, unbox_sp};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Sqrt,
}

fn arith_decode(funct7: u32) -> Option<(ArithOp, Precision)> {
    match funct7 {
        FUNCT7_FADD_S => Some((ArithOp::Add, Precision::Single)),
        FUNCT7_FADD_D => Some((ArithOp::Add, Precision::Double)),
        FUNCT7_FSUB_S => Some((ArithOp::Sub, Precision::Single)),
        FUNCT7_FSUB_D => Some((ArithOp::Sub, Precision::Double)),
        FUNCT7_FMUL_S => Some((ArithOp::Mul, Precision::Single)),
        FUNCT7_FMUL_D => Some((ArithOp::Mul, Precision::Double)),
        FUNCT7_FDIV_S => Some((ArithOp::Div, Precision::Single)),
        FUNCT7_FDIV_D => Some((ArithOp::Div, Precision::Double)),
        FUNCT7_FSQRT_S => Some((ArithOp::Sqrt, Precision::Single)),
        FUNCT7_FSQRT_D => Some((ArithOp::Sqrt, Precision::Double)),
        _ => None,
    }
}

/// FADD, FSUB, FMUL, FDIV and FSQRT in both precisions
///
/// The rounding mode comes from the rm field, or from the frm CSR
/// when rm is DYN; a reserved rounding mode makes the instruction
/// illegal. Results are correctly rounded and any NaN produced is
/// the canonical NaN of the format.
pub fn execute_fp_op<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP {
        return false;
    }
    let Some((op, precision)) = arith_decode(funct7(instr)) else {
        return false;
    };
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    // FSQRT repurposes the rs2 field; only zero is a valid encoding
    if op == ArithOp::Sqrt && rs2 != 0 {
        return false;
    }
    if !precision_supported(eei, precision) {
        return false;
    }
    let Some(round) = resolve_rounding_mode(rm(instr), eei.frm()) else {
        return false;
    };
    match precision {
        Precision::Single => {
            let a = unbox_sp(eei.f(rs1));
            let b = unbox_sp(eei.f(rs2));
            let (value, flags) = match op {
                ArithOp::Add => sp::add(a, b, round),
                ArithOp::Sub => sp::sub(a, b, round),
                ArithOp::Mul => sp::mul(a, b, round),
                ArithOp::Div => sp::div(a, b, round),
                ArithOp::Sqrt => sp::sqrt(a, round),
            };
            eei.finish_frd_fflags(rd, value.into(), flags, true, is_compressed);
        }
        Precision::Double => {
            let a = eei.f(rs1);
            let b = eei.f(rs2);
            let (value, flags) = match op {
                ArithOp::Add => dp::add(a, b, round),
                ArithOp::Sub => dp::sub(a, b, round),
                ArithOp::Mul => dp::mul(a, b, round),
                ArithOp::Div => dp::div(a, b, round),
                ArithOp::Sqrt => dp::sqrt(a, round),
            };
            eei.finish_frd_fflags(rd, value, flags, false, is_compressed);
        }
    }
    true
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FusedOp {
    /// a x b + c
    Madd,
    /// a x b - c
    Msub,
    /// -(a x b) + c
    Nmsub,
    /// -(a x b) - c
    Nmadd,
}

const SP_SIGN_BIT: u32 = 0x8000_0000;
const DP_SIGN_BIT: u64 = 0x8000_0000_0000_0000;

/// FMADD, FMSUB, FNMSUB and FNMADD in both precisions
///
/// The fused product-and-sum is rounded once; negations of the
/// product and addend are exact sign operations applied before the
/// fused step, so no double rounding can occur.
pub fn execute_fp_fused<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    let op = match opcode(instr) {
        OP_FMADD => FusedOp::Madd,
        OP_FMSUB => FusedOp::Msub,
        OP_FNMSUB => FusedOp::Nmsub,
        OP_FNMADD => FusedOp::Nmadd,
        _ => return false,
    };
    let R4type {
        rs1,
        rs2,
        rs3,
        funct2,
        rd,
    } = decode_r4type(instr);
    let precision = match funct2 {
        FUNCT2_S => Precision::Single,
        FUNCT2_D => Precision::Double,
        _ => return false,
    };
    if !precision_supported(eei, precision) {
        return false;
    }
    let Some(round) = resolve_rounding_mode(rm(instr), eei.frm()) else {
        return false;
    };
    match precision {
        Precision::Single => {
            let a = unbox_sp(eei.f(rs1));
            let b = unbox_sp(eei.f(rs2));
            let c = unbox_sp(eei.f(rs3));
            let (value, flags) = match op {
                FusedOp::Madd => sp::mul_add(a, b, c, round),
                FusedOp::Msub => sp::mul_add(a, b, c ^ SP_SIGN_BIT, round),
                FusedOp::Nmsub => sp::neg_mul_add(a, b, c, round),
                FusedOp::Nmadd => sp::neg_mul_add(a, b, c ^ SP_SIGN_BIT, round),
            };
            eei.finish_frd_fflags(rd, value.into(), flags, true, is_compressed);
        }
        Precision::Double => {
            let a = eei.f(rs1);
            let b = eei.f(rs2);
            let c = eei.f(rs3);
            let (value, flags) = match op {
                FusedOp::Madd => dp::mul_add(a, b, c, round),
                FusedOp::Msub => dp::mul_add(a, b, c ^ DP_SIGN_BIT, round),
                FusedOp::Nmsub => dp::neg_mul_add(a, b, c, round),
                FusedOp::Nmadd => dp::neg_mul_add(a, b, c ^ DP_SIGN_BIT, round),
            };
            eei.finish_frd_fflags(rd, value, flags, false, is_compressed);
        }
    }
    true
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::csr::{Fflags, CSR_FFLAGS, CSR_FRM};
    use crate::eei::Xlen;
    use crate::hart::Hart;
    use crate::softfloat::{box_sp, CANONICAL_NAN_DP, CANONICAL_NAN_SP};

    fn hart64() -> Hart {
        let mut hart = Hart::new(Xlen::Xlen64);
        hart.set_pc(0x1000);
        hart
    }

    // fadd.d f10,f10,f11 (rm=DYN)
    const FADD_D: u32 = 0x02b57553;
    // fdiv.s f10,f10,f11 (rm=DYN)
    const FDIV_S: u32 = 0x18b57553;
    // fsqrt.s f5,f6 (rm=RNE)
    const FSQRT_S: u32 = 0x580302d3;
    // fmadd.s f1,f2,f3,f4 (rm=RNE)
    const FMADD_S: u32 = 0x203100c3;
    // fnmadd.d f0,f1,f2,f3 (rm=RNE)
    const FNMADD_D: u32 = 0x1a20804f;

    #[test]
    fn check_fadd_d() {
        let mut hart = hart64();
        hart.set_f(10, 0x3ff8_0000_0000_0000); // 1.5
        hart.set_f(11, 0x4002_0000_0000_0000); // 2.25
        assert!(execute_fp_op(&mut hart, FADD_D, false));
        assert_eq!(hart.f(10), 0x400e_0000_0000_0000); // 3.75
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_fdiv_s_by_zero() {
        let mut hart = hart64();
        hart.set_f(10, box_sp(0x3f80_0000)); // 1.0
        hart.set_f(11, box_sp(0)); // +0.0
        assert!(execute_fp_op(&mut hart, FDIV_S, false));
        assert_eq!(hart.f(10), box_sp(0x7f80_0000)); // +inf, boxed
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::DZ.bits()));
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_unboxed_operand_reads_as_nan() {
        let mut hart = hart64();
        // f10 holds a double, not a boxed single
        hart.set_f(10, 0x3ff0_0000_0000_0000);
        hart.set_f(11, box_sp(0x3f80_0000));
        assert!(execute_fp_op(&mut hart, FDIV_S, false));
        assert_eq!(hart.f(10), box_sp(CANONICAL_NAN_SP));
    }

    #[test]
    fn check_fsqrt_s() {
        let mut hart = hart64();
        hart.set_f(6, box_sp(0x4080_0000)); // 4.0
        assert!(execute_fp_op(&mut hart, FSQRT_S, false));
        assert_eq!(hart.f(5), box_sp(0x4000_0000)); // 2.0
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fsqrt_nonzero_rs2_illegal() {
        let mut hart = hart64();
        // fsqrt.s with rs2 = 1
        assert!(!execute_fp_op(&mut hart, FSQRT_S | (1 << 20), false));
        assert_eq!(hart.pc(), 0x1000);
    }

    #[test]
    fn check_reserved_rounding_mode_illegal() {
        let mut hart = hart64();
        hart.set_f(10, 0x3ff8_0000_0000_0000);
        hart.set_f(11, 0x4002_0000_0000_0000);
        // rm = 0b101 is reserved
        let instr = (FADD_D & !0x7000) | (0b101 << 12);
        assert!(!execute_fp_op(&mut hart, instr, false));
        assert_eq!(hart.pc(), 0x1000);
        assert_eq!(hart.f(10), 0x3ff8_0000_0000_0000);
    }

    #[test]
    fn check_dyn_with_bad_frm_illegal() {
        let mut hart = hart64();
        hart.write_csr(CSR_FRM, 0b110);
        assert!(!execute_fp_op(&mut hart, FADD_D, false));
        assert_eq!(hart.pc(), 0x1000);
    }

    #[test]
    fn check_rejected_without_f_extension() {
        let mut hart = Hart::with_extensions(Xlen::Xlen64, "M");
        assert!(!execute_fp_op(&mut hart, FDIV_S, false));
    }

    #[test]
    fn check_double_rejected_without_d_extension() {
        let mut hart = Hart::with_extensions(Xlen::Xlen64, "MF");
        assert!(!execute_fp_op(&mut hart, FADD_D, false));
    }

    #[test]
    fn check_fmadd_s() {
        let mut hart = hart64();
        hart.set_f(2, box_sp(0x4000_0000)); // 2.0
        hart.set_f(3, box_sp(0x4040_0000)); // 3.0
        hart.set_f(4, box_sp(0x3f80_0000)); // 1.0
        assert!(execute_fp_fused(&mut hart, FMADD_S, false));
        assert_eq!(hart.f(1), box_sp(0x40e0_0000)); // 7.0
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_fmadd_single_rounding() {
        // (1 + 2^-23)^2 - (1 + 2^-22) is 2^-46 when fused, zero when
        // computed as multiply then add
        let mut hart = hart64();
        hart.set_f(2, box_sp(0x3f80_0001));
        hart.set_f(3, box_sp(0x3f80_0001));
        hart.set_f(4, box_sp(0xbf80_0002));
        assert!(execute_fp_fused(&mut hart, FMADD_S, false));
        assert_eq!(hart.f(1), box_sp(0x2880_0000));
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fnmadd_d() {
        let mut hart = hart64();
        hart.set_f(1, 0x4000_0000_0000_0000); // 2.0
        hart.set_f(2, 0x4008_0000_0000_0000); // 3.0
        hart.set_f(3, 0x3ff0_0000_0000_0000); // 1.0
        assert!(execute_fp_fused(&mut hart, FNMADD_D, false));
        // -(2 x 3) - 1 = -7
        assert_eq!(hart.f(0), 0xc01c_0000_0000_0000);
    }

    #[test]
    fn check_fused_zero_times_infinity() {
        let mut hart = hart64();
        hart.set_f(2, box_sp(0)); // 0.0
        hart.set_f(3, box_sp(0x7f80_0000)); // +inf
        hart.set_f(4, box_sp(CANONICAL_NAN_SP));
        assert!(execute_fp_fused(&mut hart, FMADD_S, false));
        assert_eq!(hart.f(1), box_sp(CANONICAL_NAN_SP));
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NV.bits()));
    }

    #[test]
    fn check_fused_reserved_format_illegal() {
        let mut hart = hart64();
        // funct2 = 0b10 is reserved
        assert!(!execute_fp_fused(&mut hart, FMADD_S | (0b10 << 25), false));
        assert_eq!(hart.pc(), 0x1000);
    }

    #[test]
    fn check_fnmadd_d_snan_gives_canonical_nan() {
        let mut hart = hart64();
        hart.set_f(1, 0x7ff0_0000_0000_0001); // signalling NaN
        hart.set_f(2, 0x4008_0000_0000_0000);
        hart.set_f(3, 0x3ff0_0000_0000_0000);
        assert!(execute_fp_fused(&mut hart, FNMADD_D, false));
        assert_eq!(hart.f(0), CANONICAL_NAN_DP);
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NV.bits()));
    }
}
