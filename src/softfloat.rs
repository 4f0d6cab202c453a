//! Correctly-rounded IEEE-754-2008 arithmetic for the F/D semantics
//!
//! This module adapts the `rustc_apfloat` software floating-point
//! library (a port of LLVM's APFloat) to the conventions the RISC-V
//! floating-point extensions require: results are returned as raw bit
//! patterns paired with the [`Fflags`] the operation raised, every
//! NaN produced by an arithmetic operation is replaced by the
//! canonical NaN of its format, and the float-to-integer conversions
//! saturate with the RISC-V out-of-range values (most-positive for
//! NaN). The fused multiply-add is the library's single-rounding
//! primitive, never a multiply followed by an add.
//!
//! The library does not provide a square root; [`sp::sqrt`] and
//! [`dp::sqrt`] compute one by exact integer square root of the
//! scaled significand with guard/round/sticky rounding, which is
//! correctly rounded in all five rounding modes (the result of a
//! square root is always in the normal range, so only NX and NV can
//! arise).
//!
//! Single-precision values live NaN-boxed in 64-bit registers: the
//! upper 32 bits must be all ones, and a value failing that check
//! reads as the canonical 32-bit NaN (section 12.2 of the
//! unprivileged specification).

use std::cmp::Ordering;

use rustc_apfloat::ieee::{Double, Single};
use rustc_apfloat::{Float, FloatConvert, Round, Status, StatusAnd};

use crate::csr::Fflags;
use crate::opcodes::{RM_DYN, RM_RDN, RM_RMM, RM_RNE, RM_RTZ, RM_RUP};

pub const CANONICAL_NAN_SP: u32 = 0x7fc0_0000;
pub const CANONICAL_NAN_DP: u64 = 0x7ff8_0000_0000_0000;

/// NaN-box a single-precision value into a 64-bit register image
pub fn box_sp(value: u32) -> u64 {
    u64::from(value) | 0xffff_ffff_0000_0000
}

/// Recover a single-precision value from a 64-bit register image.
/// An improperly boxed value reads as the canonical NaN.
pub fn unbox_sp(value: u64) -> u32 {
    if value >> 32 == 0xffff_ffff {
        value as u32
    } else {
        CANONICAL_NAN_SP
    }
}

/// Map a rounding-mode encoding (rm field or frm CSR) to a rounding
/// mode, if it encodes one. Values 5 and 6 are reserved.
pub fn rounding_mode_from_bits(rm: u32) -> Option<Round> {
    match rm {
        RM_RNE => Some(Round::NearestTiesToEven),
        RM_RTZ => Some(Round::TowardZero),
        RM_RDN => Some(Round::TowardNegative),
        RM_RUP => Some(Round::TowardPositive),
        RM_RMM => Some(Round::NearestTiesToAway),
        _ => None,
    }
}

/// Resolve the rm field of an instruction against the frm CSR
/// (section 11.2 of the unprivileged specification). A static rm is
/// used directly; DYN defers to frm. `None` means the instruction is
/// illegal.
pub fn resolve_rounding_mode(rm: u32, frm: u32) -> Option<Round> {
    if rm == RM_DYN {
        rounding_mode_from_bits(frm)
    } else {
        rounding_mode_from_bits(rm)
    }
}

fn fflags_from_status(status: Status) -> Fflags {
    let mut flags = Fflags::NONE;
    if status.contains(Status::INVALID_OP) {
        flags |= Fflags::NV;
    }
    if status.contains(Status::DIV_BY_ZERO) {
        flags |= Fflags::DZ;
    }
    if status.contains(Status::OVERFLOW) {
        flags |= Fflags::OF;
    }
    if status.contains(Status::UNDERFLOW) {
        flags |= Fflags::UF;
    }
    if status.contains(Status::INEXACT) {
        flags |= Fflags::NX;
    }
    flags
}

/// Integer square root with a remainder-nonzero indicator
fn isqrt_with_remainder(n: u128) -> (u128, bool) {
    if n == 0 {
        return (0, false);
    }
    let shift = (127 - n.leading_zeros()) & !1;
    let mut bit = 1u128 << shift;
    let mut rem = n;
    let mut root = 0u128;
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    (root, rem != 0)
}

/// Square root of a normalised positive significand.
///
/// `sig` holds 1.f with `frac_bits` fractional bits and the implicit
/// bit set; the value is sig x 2^(exp - frac_bits). Returns the
/// rounded significand in the same fixed-point format, the unbiased
/// result exponent, and whether the result is inexact.
fn sqrt_significand(sig: u128, exp: i32, frac_bits: u32, rm: Round) -> (u128, i32, bool) {
    // Split exp = 2h + r so the square root of the power of two is
    // exact; m = sig << r represents a value in [1, 4)
    let mut h = exp.div_euclid(2);
    let r = exp.rem_euclid(2) as u32;
    let m = sig << r;
    // root approximates sqrt(m) with frac_bits + 2 fractional bits,
    // so two guard bits remain below the result precision
    let (root, sticky) = isqrt_with_remainder(m << (frac_bits + 4));
    let extra = (root & 0b11) as u32;
    let lsb_set = (root >> 2) & 1 == 1;
    let increment = match rm {
        Round::NearestTiesToEven => extra > 2 || (extra == 2 && (sticky || lsb_set)),
        Round::NearestTiesToAway => extra >= 2,
        // The result of a square root is never negative, so rounding
        // up is toward positive and truncation covers the rest
        Round::TowardPositive => extra != 0 || sticky,
        Round::TowardZero | Round::TowardNegative => false,
    };
    let mut rounded = (root >> 2) + u128::from(increment);
    if rounded >> (frac_bits + 1) != 0 {
        rounded >>= 1;
        h += 1;
    }
    (rounded, h, extra != 0 || sticky)
}

macro_rules! float_format {
    ($name:ident, $apfloat:ident, $bits:ty, $frac_bits:expr, $exp_mask:expr, $bias:expr,
     $canonical_nan:expr, $doc:expr) => {
        #[doc = $doc]
        pub mod $name {
            use super::*;

            pub const FRAC_BITS: u32 = $frac_bits;
            const EXP_MASK: $bits = $exp_mask;
            const BIAS: i32 = $bias;

            fn from_bits(bits: $bits) -> $apfloat {
                $apfloat::from_bits(bits as u128)
            }

            /// Extract a result, replacing any NaN by the canonical
            /// NaN of the format
            fn result(r: StatusAnd<$apfloat>) -> ($bits, Fflags) {
                let bits = if r.value.is_nan() {
                    $canonical_nan
                } else {
                    r.value.to_bits() as $bits
                };
                (bits, fflags_from_status(r.status))
            }

            pub fn add(a: $bits, b: $bits, rm: Round) -> ($bits, Fflags) {
                result(from_bits(a).add_r(from_bits(b), rm))
            }

            pub fn sub(a: $bits, b: $bits, rm: Round) -> ($bits, Fflags) {
                result(from_bits(a).sub_r(from_bits(b), rm))
            }

            pub fn mul(a: $bits, b: $bits, rm: Round) -> ($bits, Fflags) {
                result(from_bits(a).mul_r(from_bits(b), rm))
            }

            pub fn div(a: $bits, b: $bits, rm: Round) -> ($bits, Fflags) {
                result(from_bits(a).div_r(from_bits(b), rm))
            }

            /// Fused multiply-add with a single rounding: a x b + c
            pub fn mul_add(a: $bits, b: $bits, c: $bits, rm: Round) -> ($bits, Fflags) {
                result(from_bits(a).mul_add_r(from_bits(b), from_bits(c), rm))
            }

            /// a x b + c with the product negated: -(a x b) + c
            pub fn neg_mul_add(a: $bits, b: $bits, c: $bits, rm: Round) -> ($bits, Fflags) {
                result((-from_bits(a)).mul_add_r(from_bits(b), from_bits(c), rm))
            }

            pub fn sqrt(a: $bits, rm: Round) -> ($bits, Fflags) {
                let x = from_bits(a);
                if x.is_nan() {
                    let flags = if x.is_signaling() {
                        Fflags::NV
                    } else {
                        Fflags::NONE
                    };
                    return ($canonical_nan, flags);
                }
                if x.is_zero() {
                    // sqrt(+-0) is +-0
                    return (a, Fflags::NONE);
                }
                if x.is_negative() {
                    return ($canonical_nan, Fflags::NV);
                }
                let exp_field = (a >> FRAC_BITS) & EXP_MASK;
                if exp_field == EXP_MASK {
                    // +infinity
                    return (a, Fflags::NONE);
                }
                let frac = a & ((1 << FRAC_BITS) - 1);
                let implicit = 1 << FRAC_BITS;
                let (sig, exp) = if exp_field == 0 {
                    // Normalise the subnormal so the top set bit
                    // takes the implicit-bit position
                    let shift =
                        frac.leading_zeros() - (<$bits>::BITS - FRAC_BITS - 1);
                    (u128::from(frac) << shift, 1 - BIAS - shift as i32)
                } else {
                    (u128::from(frac | implicit), exp_field as i32 - BIAS)
                };
                let (rounded, res_exp, inexact) =
                    sqrt_significand(sig, exp, FRAC_BITS, rm);
                let bits = (((res_exp + BIAS) as $bits) << FRAC_BITS)
                    | (rounded as $bits & (implicit - 1));
                let flags = if inexact { Fflags::NX } else { Fflags::NONE };
                (bits, flags)
            }

            fn min_max(a: $bits, b: $bits, take_min: bool) -> ($bits, Fflags) {
                let fa = from_bits(a);
                let fb = from_bits(b);
                let a_signaling = fa.is_signaling();
                let b_signaling = fb.is_signaling();
                let flags = if a_signaling || b_signaling {
                    Fflags::NV
                } else {
                    Fflags::NONE
                };
                let value = if a_signaling && b_signaling {
                    $canonical_nan
                } else if a_signaling {
                    b
                } else if b_signaling {
                    a
                } else if fa.is_nan() && fb.is_nan() {
                    $canonical_nan
                } else if fa.is_nan() {
                    b
                } else if fb.is_nan() {
                    a
                } else if fa.is_zero() && fb.is_zero() && fa.is_negative() != fb.is_negative() {
                    // Opposite-signed zeros compare equal; min takes
                    // -0 and max takes +0
                    if take_min == fa.is_negative() {
                        a
                    } else {
                        b
                    }
                } else {
                    match fa.partial_cmp(&fb) {
                        Some(Ordering::Less) => {
                            if take_min {
                                a
                            } else {
                                b
                            }
                        }
                        Some(Ordering::Greater) => {
                            if take_min {
                                b
                            } else {
                                a
                            }
                        }
                        _ => a,
                    }
                };
                (value, flags)
            }

            pub fn min(a: $bits, b: $bits) -> ($bits, Fflags) {
                min_max(a, b, true)
            }

            pub fn max(a: $bits, b: $bits) -> ($bits, Fflags) {
                min_max(a, b, false)
            }

            /// Quiet equality: NV only for a signalling NaN, and any
            /// NaN operand makes the result false
            pub fn eq_quiet(a: $bits, b: $bits) -> (bool, Fflags) {
                let fa = from_bits(a);
                let fb = from_bits(b);
                let flags = if fa.is_signaling() || fb.is_signaling() {
                    Fflags::NV
                } else {
                    Fflags::NONE
                };
                (fa.partial_cmp(&fb) == Some(Ordering::Equal), flags)
            }

            /// Signalling less-than: NV for any NaN operand
            pub fn lt_signaling(a: $bits, b: $bits) -> (bool, Fflags) {
                let fa = from_bits(a);
                let fb = from_bits(b);
                let flags = if fa.is_nan() || fb.is_nan() {
                    Fflags::NV
                } else {
                    Fflags::NONE
                };
                (fa.partial_cmp(&fb) == Some(Ordering::Less), flags)
            }

            /// Signalling less-than-or-equal: NV for any NaN operand
            pub fn le_signaling(a: $bits, b: $bits) -> (bool, Fflags) {
                let fa = from_bits(a);
                let fb = from_bits(b);
                let flags = if fa.is_nan() || fb.is_nan() {
                    Fflags::NV
                } else {
                    Fflags::NONE
                };
                let le = matches!(
                    fa.partial_cmp(&fb),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                );
                (le, flags)
            }

            /// The 10-bit one-hot class mask of the FCLASS
            /// instruction (table 11.5 of the unprivileged
            /// specification)
            pub fn classify(a: $bits) -> u32 {
                let negative = a >> (<$bits>::BITS - 1) != 0;
                let exp = (a >> FRAC_BITS) & EXP_MASK;
                let frac = a & ((1 << FRAC_BITS) - 1);
                let quiet_bit = frac >> (FRAC_BITS - 1) != 0;
                if exp == EXP_MASK && frac != 0 {
                    if quiet_bit {
                        1 << 9
                    } else {
                        1 << 8
                    }
                } else if exp == EXP_MASK {
                    if negative {
                        1 << 0
                    } else {
                        1 << 7
                    }
                } else if exp == 0 && frac == 0 {
                    if negative {
                        1 << 3
                    } else {
                        1 << 4
                    }
                } else if exp == 0 {
                    if negative {
                        1 << 2
                    } else {
                        1 << 5
                    }
                } else if negative {
                    1 << 1
                } else {
                    1 << 6
                }
            }

            /// Convert to a signed 32-bit integer. NaN gives the
            /// most-positive value; out-of-range saturates; both
            /// raise NV. An in-range inexact conversion raises NX.
            pub fn to_i32(a: $bits, rm: Round) -> (u32, Fflags) {
                let x = from_bits(a);
                if x.is_nan() {
                    return (i32::MAX as u32, Fflags::NV);
                }
                let mut exact = false;
                let r = x.to_i128_r(32, rm, &mut exact);
                if r.status.contains(Status::INVALID_OP) {
                    let sat = if x.is_negative() { i32::MIN } else { i32::MAX };
                    (sat as u32, Fflags::NV)
                } else {
                    (r.value as i32 as u32, fflags_from_status(r.status))
                }
            }

            /// Convert to an unsigned 32-bit integer (NaN gives the
            /// most-positive value)
            pub fn to_u32(a: $bits, rm: Round) -> (u32, Fflags) {
                let x = from_bits(a);
                if x.is_nan() {
                    return (u32::MAX, Fflags::NV);
                }
                let mut exact = false;
                let r = x.to_u128_r(32, rm, &mut exact);
                if r.status.contains(Status::INVALID_OP) {
                    let sat = if x.is_negative() { 0 } else { u32::MAX };
                    (sat, Fflags::NV)
                } else {
                    (r.value as u32, fflags_from_status(r.status))
                }
            }

            /// Convert to a signed 64-bit integer
            pub fn to_i64(a: $bits, rm: Round) -> (u64, Fflags) {
                let x = from_bits(a);
                if x.is_nan() {
                    return (i64::MAX as u64, Fflags::NV);
                }
                let mut exact = false;
                let r = x.to_i128_r(64, rm, &mut exact);
                if r.status.contains(Status::INVALID_OP) {
                    let sat = if x.is_negative() { i64::MIN } else { i64::MAX };
                    (sat as u64, Fflags::NV)
                } else {
                    (r.value as i64 as u64, fflags_from_status(r.status))
                }
            }

            /// Convert to an unsigned 64-bit integer
            pub fn to_u64(a: $bits, rm: Round) -> (u64, Fflags) {
                let x = from_bits(a);
                if x.is_nan() {
                    return (u64::MAX, Fflags::NV);
                }
                let mut exact = false;
                let r = x.to_u128_r(64, rm, &mut exact);
                if r.status.contains(Status::INVALID_OP) {
                    let sat = if x.is_negative() { 0 } else { u64::MAX };
                    (sat, Fflags::NV)
                } else {
                    (r.value as u64, fflags_from_status(r.status))
                }
            }

            pub fn from_i32(v: i32, rm: Round) -> ($bits, Fflags) {
                result($apfloat::from_i128_r(i128::from(v), rm))
            }

            pub fn from_u32(v: u32, rm: Round) -> ($bits, Fflags) {
                result($apfloat::from_u128_r(u128::from(v), rm))
            }

            pub fn from_i64(v: i64, rm: Round) -> ($bits, Fflags) {
                result($apfloat::from_i128_r(i128::from(v), rm))
            }

            pub fn from_u64(v: u64, rm: Round) -> ($bits, Fflags) {
                result($apfloat::from_u128_r(u128::from(v), rm))
            }
        }
    };
}

float_format!(
    sp,
    Single,
    u32,
    23,
    0xff,
    127,
    CANONICAL_NAN_SP,
    "Single-precision operations on raw `u32` bit patterns"
);

float_format!(
    dp,
    Double,
    u64,
    52,
    0x7ff,
    1023,
    CANONICAL_NAN_DP,
    "Double-precision operations on raw `u64` bit patterns"
);

/// Widen a single-precision value to double precision. The
/// conversion is exact; a signalling NaN raises NV, and any NaN
/// becomes the canonical double-precision NaN.
pub fn sp_to_dp(a: u32) -> (u64, Fflags) {
    let mut loses_info = false;
    let r: StatusAnd<Double> =
        Single::from_bits(a as u128).convert_r(Round::NearestTiesToEven, &mut loses_info);
    let bits = if r.value.is_nan() {
        CANONICAL_NAN_DP
    } else {
        r.value.to_bits() as u64
    };
    (bits, fflags_from_status(r.status))
}

/// Narrow a double-precision value to single precision under the
/// given rounding mode; may overflow, underflow or be inexact
pub fn dp_to_sp(a: u64, rm: Round) -> (u32, Fflags) {
    let mut loses_info = false;
    let r: StatusAnd<Single> = Double::from_bits(a as u128).convert_r(rm, &mut loses_info);
    let bits = if r.value.is_nan() {
        CANONICAL_NAN_SP
    } else {
        r.value.to_bits() as u32
    };
    (bits, fflags_from_status(r.status))
}
