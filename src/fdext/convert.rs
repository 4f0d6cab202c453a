use super::{precision_supported, Precision};
use crate::eei::{Eei, Xlen};
use crate::instr_type::{decode_rtype, funct7, opcode, rm, Rtype};
use crate::opcodes::{
    FUNCT7_FCVT_D_INT, FUNCT7_FCVT_D_S, FUNCT7_FCVT_INT_D, FUNCT7_FCVT_INT_S, FUNCT7_FCVT_S_D,
    FUNCT7_FCVT_S_INT, OP_FP, RS2_CVT_L, RS2_CVT_LU, RS2_CVT_W, RS2_CVT_WU,
};
use crate::softfloat::{dp, dp_to_sp, resolve_rounding_mode, sp, sp_to_dp, unbox_sp};
use crate::utils::{interpret_u32_as_signed, interpret_u64_as_signed, sign_extend_word};

/// The integer side of a float/integer conversion, selected by the
/// rs2 field
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum IntKind {
    /// Signed 32-bit (W)
    Word,
    /// Unsigned 32-bit (WU)
    WordUnsigned,
    /// Signed 64-bit (L), RV64 only
    Long,
    /// Unsigned 64-bit (LU), RV64 only
    LongUnsigned,
}

impl IntKind {
    fn from_rs2(selector: u32) -> Option<Self> {
        match selector {
            RS2_CVT_W => Some(IntKind::Word),
            RS2_CVT_WU => Some(IntKind::WordUnsigned),
            RS2_CVT_L => Some(IntKind::Long),
            RS2_CVT_LU => Some(IntKind::LongUnsigned),
            _ => None,
        }
    }

    fn requires_rv64(self) -> bool {
        matches!(self, IntKind::Long | IntKind::LongUnsigned)
    }
}

/// The FCVT family: conversions between the two floating-point
/// formats and between floating-point and integer values
///
/// The rs2 field selects the integer kind (or the source format for
/// FCVT.S.D/FCVT.D.S); the 64-bit integer kinds are RV64-only.
/// Float-to-integer results go to an integer register, with 32-bit
/// results sign-extended to XLEN (including the unsigned ones);
/// NaN converts to the most-positive integer and out-of-range values
/// saturate, both raising NV. Integer-to-float results are rounded
/// under the resolved rounding mode.
pub fn execute_fp_cvt<E: Eei>(eei: &mut E, instr: u32, is_compressed: bool) -> bool {
    if opcode(instr) != OP_FP {
        return false;
    }
    let Rtype { rs1, rs2, rd } = decode_rtype(instr);
    let selector = u32::from(rs2);
    match funct7(instr) {
        // Float to integer
        FUNCT7_FCVT_INT_S | FUNCT7_FCVT_INT_D => {
            let precision = if funct7(instr) == FUNCT7_FCVT_INT_S {
                Precision::Single
            } else {
                Precision::Double
            };
            let Some(kind) = IntKind::from_rs2(selector) else {
                return false;
            };
            if kind.requires_rv64() && eei.xlen() != Xlen::Xlen64 {
                return false;
            }
            if !precision_supported(eei, precision) {
                return false;
            }
            let Some(round) = resolve_rounding_mode(rm(instr), eei.frm()) else {
                return false;
            };
            let (value, flags) = match precision {
                Precision::Single => {
                    let a = unbox_sp(eei.f(rs1));
                    match kind {
                        IntKind::Word => {
                            let (v, flags) = sp::to_i32(a, round);
                            (sign_extend_word(v.into()), flags)
                        }
                        IntKind::WordUnsigned => {
                            let (v, flags) = sp::to_u32(a, round);
                            (sign_extend_word(v.into()), flags)
                        }
                        IntKind::Long => sp::to_i64(a, round),
                        IntKind::LongUnsigned => sp::to_u64(a, round),
                    }
                }
                Precision::Double => {
                    let a = eei.f(rs1);
                    match kind {
                        IntKind::Word => {
                            let (v, flags) = dp::to_i32(a, round);
                            (sign_extend_word(v.into()), flags)
                        }
                        IntKind::WordUnsigned => {
                            let (v, flags) = dp::to_u32(a, round);
                            (sign_extend_word(v.into()), flags)
                        }
                        IntKind::Long => dp::to_i64(a, round),
                        IntKind::LongUnsigned => dp::to_u64(a, round),
                    }
                }
            };
            eei.finish_rd_fflags(rd, value, flags, is_compressed);
            true
        }
        // Integer to float
        FUNCT7_FCVT_S_INT | FUNCT7_FCVT_D_INT => {
            let precision = if funct7(instr) == FUNCT7_FCVT_S_INT {
                Precision::Single
            } else {
                Precision::Double
            };
            let Some(kind) = IntKind::from_rs2(selector) else {
                return false;
            };
            if kind.requires_rv64() && eei.xlen() != Xlen::Xlen64 {
                return false;
            }
            if !precision_supported(eei, precision) {
                return false;
            }
            let Some(round) = resolve_rounding_mode(rm(instr), eei.frm()) else {
                return false;
            };
            let src = eei.x(rs1);
            match precision {
                Precision::Single => {
                    let (value, flags) = match kind {
                        IntKind::Word => sp::from_i32(interpret_u32_as_signed(src as u32), round),
                        IntKind::WordUnsigned => sp::from_u32(src as u32, round),
                        IntKind::Long => sp::from_i64(interpret_u64_as_signed(src), round),
                        IntKind::LongUnsigned => sp::from_u64(src, round),
                    };
                    eei.finish_frd_fflags(rd, value.into(), flags, true, is_compressed);
                }
                Precision::Double => {
                    let (value, flags) = match kind {
                        IntKind::Word => dp::from_i32(interpret_u32_as_signed(src as u32), round),
                        IntKind::WordUnsigned => dp::from_u32(src as u32, round),
                        IntKind::Long => dp::from_i64(interpret_u64_as_signed(src), round),
                        IntKind::LongUnsigned => dp::from_u64(src, round),
                    };
                    eei.finish_frd_fflags(rd, value, flags, false, is_compressed);
                }
            }
            true
        }
        // FCVT.S.D: narrow a double to single; rs2 names the source
        // format and must be the double encoding
        FUNCT7_FCVT_S_D => {
            if selector != 0b00001 || !precision_supported(eei, Precision::Double) {
                return false;
            }
            let Some(round) = resolve_rounding_mode(rm(instr), eei.frm()) else {
                return false;
            };
            let (value, flags) = dp_to_sp(eei.f(rs1), round);
            eei.finish_frd_fflags(rd, value.into(), flags, true, is_compressed);
            true
        }
        // FCVT.D.S: widen a single to double (always exact)
        FUNCT7_FCVT_D_S => {
            if selector != 0b00000 || !precision_supported(eei, Precision::Double) {
                return false;
            }
            // The conversion is exact, but a reserved rounding mode
            // still makes the encoding illegal
            if resolve_rounding_mode(rm(instr), eei.frm()).is_none() {
                return false;
            }
            let (value, flags) = sp_to_dp(unbox_sp(eei.f(rs1)));
            eei.finish_frd_fflags(rd, value, flags, false, is_compressed);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::csr::{Fflags, CSR_FFLAGS};
    use crate::hart::Hart;
    use crate::softfloat::{box_sp, CANONICAL_NAN_DP, CANONICAL_NAN_SP};
    use crate::utils::interpret_i64_as_unsigned;

    fn hart64() -> Hart {
        let mut hart = Hart::new(Xlen::Xlen64);
        hart.set_pc(0x1000);
        hart
    }

    const DP_ONE_AND_HALF: u64 = 0x3ff8_0000_0000_0000;

    // fcvt.w.d x5,f10 (rm=RTZ)
    const FCVT_W_D: u32 = 0xc20512d3;
    // fcvt.wu.d x5,f10 (rm=RTZ)
    const FCVT_WU_D: u32 = 0xc21512d3;
    // fcvt.l.d x5,f10 (rm=RTZ)
    const FCVT_L_D: u32 = 0xc22512d3;
    // fcvt.w.s x5,f10 (rm=RTZ)
    const FCVT_W_S: u32 = 0xc00512d3;
    // fcvt.d.w f10,x5 (rm=RNE)
    const FCVT_D_W: u32 = 0xd2028553;
    // fcvt.s.w f10,x5 (rm=RNE)
    const FCVT_S_W: u32 = 0xd0028553;
    // fcvt.s.lu f10,x5 (rm=RNE)
    const FCVT_S_LU: u32 = 0xd0328553;
    // fcvt.s.d f10,f11 (rm=RNE)
    const FCVT_S_D: u32 = 0x40158553;
    // fcvt.d.s f10,f11 (rm=RNE)
    const FCVT_D_S: u32 = 0x42058553;

    #[test]
    fn check_fcvt_w_d_truncates() {
        let mut hart = hart64();
        hart.set_f(10, DP_ONE_AND_HALF);
        assert!(execute_fp_cvt(&mut hart, FCVT_W_D, false));
        assert_eq!(hart.x(5), 1);
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NX.bits()));
        assert_eq!(hart.pc(), 0x1004);
    }

    #[test]
    fn check_fcvt_w_d_negative_sign_extends() {
        let mut hart = hart64();
        hart.set_f(10, 0xc000_0000_0000_0000); // -2.0
        assert!(execute_fp_cvt(&mut hart, FCVT_W_D, false));
        assert_eq!(hart.x(5), interpret_i64_as_unsigned(-2));
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fcvt_wu_d_result_sign_extended() {
        let mut hart = hart64();
        // 2^31 fits u32 but its sign bit is set, so the register
        // image is sign-extended
        hart.set_f(10, 0x41e0_0000_0000_0000); // 2^31
        assert!(execute_fp_cvt(&mut hart, FCVT_WU_D, false));
        assert_eq!(hart.x(5), 0xffff_ffff_8000_0000);
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fcvt_w_d_nan_gives_most_positive() {
        let mut hart = hart64();
        hart.set_f(10, CANONICAL_NAN_DP);
        assert!(execute_fp_cvt(&mut hart, FCVT_W_D, false));
        assert_eq!(hart.x(5), i32::MAX as u64);
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NV.bits()));
    }

    #[test]
    fn check_fcvt_w_d_overflow_saturates() {
        let mut hart = hart64();
        hart.set_f(10, 0x41f0_0000_0000_0000); // 2^32
        assert!(execute_fp_cvt(&mut hart, FCVT_W_D, false));
        assert_eq!(hart.x(5), i32::MAX as u64);
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NV.bits()));
        // The same value fits a signed 64-bit conversion exactly
        let mut hart = hart64();
        hart.set_f(10, 0x41f0_0000_0000_0000);
        assert!(execute_fp_cvt(&mut hart, FCVT_L_D, false));
        assert_eq!(hart.x(5), 1 << 32);
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fcvt_w_s_unboxes() {
        let mut hart = hart64();
        hart.set_f(10, box_sp(0x40a0_0000)); // 5.0
        assert!(execute_fp_cvt(&mut hart, FCVT_W_S, false));
        assert_eq!(hart.x(5), 5);
        // A badly boxed operand reads as NaN
        let mut hart = hart64();
        hart.set_f(10, u64::from(0x40a0_0000u32));
        assert!(execute_fp_cvt(&mut hart, FCVT_W_S, false));
        assert_eq!(hart.x(5), i32::MAX as u64);
    }

    #[test]
    fn check_fcvt_d_w_exact() {
        let mut hart = hart64();
        hart.set_x(5, interpret_i64_as_unsigned(-7));
        assert!(execute_fp_cvt(&mut hart, FCVT_D_W, false));
        assert_eq!(hart.f(10), 0xc01c_0000_0000_0000); // -7.0
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fcvt_d_w_uses_low_word_only() {
        let mut hart = hart64();
        // Only the low 32 bits participate, interpreted signed
        hart.set_x(5, 0xdead_beef_ffff_fff9);
        assert!(execute_fp_cvt(&mut hart, FCVT_D_W, false));
        assert_eq!(hart.f(10), 0xc01c_0000_0000_0000); // -7.0
    }

    #[test]
    fn check_fcvt_s_w_rounds() {
        let mut hart = hart64();
        // 2^24 + 1 is not representable in single precision
        hart.set_x(5, 0x100_0001);
        assert!(execute_fp_cvt(&mut hart, FCVT_S_W, false));
        assert_eq!(hart.f(10), box_sp(0x4b80_0000)); // 2^24
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NX.bits()));
    }

    #[test]
    fn check_fcvt_s_lu_full_width_unsigned() {
        let mut hart = hart64();
        hart.set_x(5, u64::MAX);
        assert!(execute_fp_cvt(&mut hart, FCVT_S_LU, false));
        assert_eq!(hart.f(10), box_sp(0x5f80_0000)); // 2^64
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NX.bits()));
    }

    #[test]
    fn check_long_forms_rejected_on_rv32() {
        let mut hart = Hart::new(Xlen::Xlen32);
        hart.set_pc(0x1000);
        hart.set_f(10, DP_ONE_AND_HALF);
        assert!(!execute_fp_cvt(&mut hart, FCVT_L_D, false));
        assert_eq!(hart.pc(), 0x1000);
        // The 32-bit form still works
        assert!(execute_fp_cvt(&mut hart, FCVT_W_D, false));
        assert_eq!(hart.x(5), 1);
    }

    #[test]
    fn check_fcvt_s_d() {
        let mut hart = hart64();
        hart.set_f(11, DP_ONE_AND_HALF);
        assert!(execute_fp_cvt(&mut hart, FCVT_S_D, false));
        assert_eq!(hart.f(10), box_sp(0x3fc0_0000)); // 1.5
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fcvt_d_s() {
        let mut hart = hart64();
        hart.set_f(11, box_sp(0x3fc0_0000));
        assert!(execute_fp_cvt(&mut hart, FCVT_D_S, false));
        assert_eq!(hart.f(10), DP_ONE_AND_HALF);
        assert_eq!(hart.read_csr(CSR_FFLAGS), 0);
    }

    #[test]
    fn check_fcvt_s_d_narrows_inexactly() {
        let mut hart = hart64();
        // 1 + 2^-28 rounds to 1.0 in single precision
        hart.set_f(11, 0x3ff0_0000_0100_0000);
        assert!(execute_fp_cvt(&mut hart, FCVT_S_D, false));
        assert_eq!(hart.f(10), box_sp(0x3f80_0000));
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NX.bits()));
    }

    #[test]
    fn check_format_conversion_snan_quietens() {
        let mut hart = hart64();
        hart.set_f(11, box_sp(0x7f80_0001)); // signalling NaN
        assert!(execute_fp_cvt(&mut hart, FCVT_D_S, false));
        assert_eq!(hart.f(10), CANONICAL_NAN_DP);
        assert_eq!(hart.read_csr(CSR_FFLAGS), u64::from(Fflags::NV.bits()));
        let mut hart = hart64();
        hart.set_f(11, 0x7ff0_0000_0000_0001);
        assert!(execute_fp_cvt(&mut hart, FCVT_S_D, false));
        assert_eq!(hart.f(10), box_sp(CANONICAL_NAN_SP));
    }

    #[test]
    fn check_bad_selector_illegal() {
        let mut hart = hart64();
        // rs2 = 4 selects nothing
        assert!(!execute_fp_cvt(&mut hart, FCVT_W_D | (4 << 20), false));
        // FCVT.S.D requires rs2 = 1
        assert!(!execute_fp_cvt(&mut hart, FCVT_S_D & !(1 << 20), false));
        assert_eq!(hart.pc(), 0x1000);
    }

    #[test]
    fn check_cvt_rejected_without_extension() {
        let mut hart = Hart::with_extensions(Xlen::Xlen64, "M");
        assert!(!execute_fp_cvt(&mut hart, FCVT_W_S, false));
        let mut hart = Hart::with_extensions(Xlen::Xlen64, "MF");
        assert!(!execute_fp_cvt(&mut hart, FCVT_W_D, false));
        assert!(execute_fp_cvt(&mut hart, FCVT_W_S, false));
    }
}
