use super::{precision_supported, Precision};
use crate::csr::Fflags;
use crate::eei::Eei;
use crate::instr_type::{decode_rtype, funct3, funct7, opcode, Rtype};
use crate::opcodes::{
    FUNCT3_FEQ, FUNCT3_FLE, FUNCT3_FLT, FUNCT3_FMAX, FUNCT3_FMIN, FUNCT7_FCMP_D, FUNCT7_FCMP_S,
    FUNCT7_FMINMAX_D, FUNCT7_FMINMAX_S, OP_FP,
};
use crate::softfloat::{dp, sp, unbox_sp};

/// FMIN and FMAX in both precisions
///
/// The result is quiet: a single NaN operand selects the other
/// operand, two NaN operands give the canonical NaN, and any
/// signalling NaN raises NV. Opposite-signed zeros are ordered with
/// -0 below +0.
pub fn execute_fp_min_max<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP {
        return false;
    }
    let precision = match funct7(instr) {
        FUNCT7_FMINMAX_S => Precision::Single,
        FUNCT7_FMINMAX_D => Precision::Double,
        _ => return false,
    };
    let take_min = match funct3(instr) {
        FUNCT3_FMIN => true,
        FUNCT3_FMAX => false,
        _ => return false,
    };
    if !precision_supported(eei, precision) {
        return false;
    }
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    match precision {
        Precision::Single => {
            let a = unbox_sp(eei.f(rs1));
            let b = unbox_sp(eei.f(rs2));
            let (value, flags) = if take_min { sp::min(a, b) } else { sp::max(a, b) };
            eei.finish_frd_fflags(rd, value.into(), flags, true, is_compressed);
        }
        Precision::Double => {
            let a = eei.f(rs1);
            let b = eei.f(rs2);
            let (value, flags) = if take_min { dp::min(a, b) } else { dp::max(a, b) };
            eei.finish_frd_fflags(rd, value, flags, false, is_compressed);
        }
    }
    true
}

/// FEQ, FLT and FLE in both precisions
///
/// The boolean result is written to an integer register. FEQ is a
/// quiet comparison (NV only for a signalling NaN); FLT and FLE are
/// signalling (NV for any NaN operand). A NaN operand makes the
/// result zero.
pub fn execute_fp_cmp<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP {
        return false;
    }
    let precision = match funct7(instr) {
        FUNCT7_FCMP_S => Precision::Single,
        FUNCT7_FCMP_D => Precision::Double,
        _ => return false,
    };
    let cmp = funct3(instr);
    if !matches!(cmp, FUNCT3_FEQ | FUNCT3_FLT | FUNCT3_FLE) {
        return false;
    }
    if !precision_supported(eei, precision) {
        return false;
    }
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    let (result, flags): (bool, Fflags) = match precision {
        Precision::Single => {
            let a = unbox_sp(eei.f(rs1));
            let b = unbox_sp(eei.f(rs2));
            match cmp {
                FUNCT3_FEQ => sp::eq_quiet(a, b),
                FUNCT3_FLT => sp::lt_signaling(a, b),
                _ => sp::le_signaling(a, b),
            }
        }
        Precision::Double => {
            let a = eei.f(rs1);
            let b = eei.f(rs2);
            match cmp {
                FUNCT3_FEQ => dp::eq_quiet(a, b),
                FUNCT3_FLT => dp::lt_signaling(a, b),
                _ => dp::le_signaling(a, b),
            }
        }
    };
    eei.finish_rd_fflags(rd, u64::from(result), flags, is_compressed);
    true
}
