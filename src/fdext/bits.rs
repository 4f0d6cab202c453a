use super::{precision_supported, Precision};
use crate::eei::{Eei, Xlen};
use crate::instr_type::{decode_rtype, funct3, funct7, opcode, Rtype};
use crate::opcodes::{
    FUNCT3_FCLASS, FUNCT3_FMV, FUNCT3_FSGNJ, FUNCT3_FSGNJN, FUNCT3_FSGNJX, FUNCT7_FMV_D_X,
    FUNCT7_FMV_W_X, FUNCT7_FMV_X_D_FCLASS_D, FUNCT7_FMV_X_W_FCLASS_S, FUNCT7_FSGNJ_D,
    FUNCT7_FSGNJ_S, OP_FP,
};
use crate::softfloat::{box_sp, dp, sp, unbox_sp};
use crate::utils::sign_extend_word;

const SP_SIGN_BIT: u32 = 0x8000_0000;
const DP_SIGN_BIT: u64 = 0x8000_0000_0000_0000;

/// FSGNJ, FSGNJN and FSGNJX in both precisions
///
/// The result takes the exponent and mantissa of rs1 and a sign bit
/// derived from rs2: copied, inverted, or XORed with the sign of
/// rs1. No flags are raised and NaNs pass through unchanged apart
/// from the sign bit; a badly boxed single-precision operand still
/// reads as the canonical NaN first.
pub fn execute_fp_sign_inject<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP {
        return false;
    }
    let precision = match funct7(instr) {
        FUNCT7_FSGNJ_S => Precision::Single,
        FUNCT7_FSGNJ_D => Precision::Double,
        _ => return false,
    };
    let variant = funct3(instr);
    if !matches!(variant, FUNCT3_FSGNJ | FUNCT3_FSGNJN | FUNCT3_FSGNJX) {
        return false;
    }
    if !precision_supported(eei, precision) {
        return false;
    }
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    match precision {
        Precision::Single => {
            let a = unbox_sp(eei.f(rs1));
            let b = unbox_sp(eei.f(rs2));
            let value = match variant {
                FUNCT3_FSGNJ => (a & !SP_SIGN_BIT) | (b & SP_SIGN_BIT),
                FUNCT3_FSGNJN => (a & !SP_SIGN_BIT) | (!b & SP_SIGN_BIT),
                _ => a ^ (b & SP_SIGN_BIT),
            };
            eei.finish_frd(rd, value.into(), true, is_compressed);
        }
        Precision::Double => {
            let a = eei.f(rs1);
            let b = eei.f(rs2);
            let value = match variant {
                FUNCT3_FSGNJ => (a & !DP_SIGN_BIT) | (b & DP_SIGN_BIT),
                FUNCT3_FSGNJN => (a & !DP_SIGN_BIT) | (!b & DP_SIGN_BIT),
                _ => a ^ (b & DP_SIGN_BIT),
            };
            eei.finish_frd(rd, value, false, is_compressed);
        }
    }
    true
}

/// FMV.X.W, FMV.W.X and (RV64 only) FMV.X.D, FMV.D.X
///
/// Raw bit moves between the register files: no arithmetic, no
/// NaN-box check on the source, no flags. FMV.X.W sign-extends the
/// low 32 bits of the floating-point register into the integer
/// destination; FMV.W.X boxes the low 32 bits of the integer source.
pub fn execute_fp_mv<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP || funct3(instr) != FUNCT3_FMV {
        return false;
    }
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    // The rs2 field is part of the encoding and must be zero
    if rs2 != 0 {
        return false;
    }
    match funct7(instr) {
        FUNCT7_FMV_X_W_FCLASS_S => {
            if !precision_supported(eei, Precision::Single) {
                return false;
            }
            let value = sign_extend_word(eei.f(rs1) & 0xffff_ffff);
            eei.finish_rd(rd, value & eei.xlen().mask(), is_compressed);
        }
        FUNCT7_FMV_W_X => {
            if !precision_supported(eei, Precision::Single) {
                return false;
            }
            let value = box_sp(eei.x(rs1) as u32);
            eei.set_f(rd, value);
            eei.advance_pc(is_compressed);
        }
        FUNCT7_FMV_X_D_FCLASS_D => {
            if eei.xlen() != Xlen::Xlen64 || !precision_supported(eei, Precision::Double) {
                return false;
            }
            let value = eei.f(rs1);
            eei.finish_rd(rd, value, is_compressed);
        }
        FUNCT7_FMV_D_X => {
            if eei.xlen() != Xlen::Xlen64 || !precision_supported(eei, Precision::Double) {
                return false;
            }
            let value = eei.x(rs1);
            eei.set_f(rd, value);
            eei.advance_pc(is_compressed);
        }
        _ => return false,
    }
    true
}

/// FCLASS in both precisions
///
/// Writes a ten-bit one-hot mask into the integer destination
/// classifying the operand: negative infinity, negative normal,
/// negative subnormal, negative zero, positive zero, positive
/// subnormal, positive normal, positive infinity, signalling NaN,
/// quiet NaN. No flags are raised.
pub fn execute_fp_class<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP || funct3(instr) != FUNCT3_FCLASS {
        return false;
    }
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    if rs2 != 0 {
        return false;
    }
    let mask = match funct7(instr) {
        FUNCT7_FMV_X_W_FCLASS_S => {
            if !precision_supported(eei, Precision::Single) {
                return false;
            }
            sp::classify(unbox_sp(eei.f(rs1)))
        }
        FUNCT7_FMV_X_D_FCLASS_D => {
            if !precision_supported(eei, Precision::Double) {
                return false;
            }
            dp::classify(eei.f(rs1))
        }
        _ => return false,
    };
    eei.finish_rd(rd, mask.into(), is_compressed);
    true
}
