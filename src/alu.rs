//! Multiply and divide primitives for the M extension
//!
//! These functions implement the arithmetic of chapter 7 of the
//! unprivileged specification, parameterised by register width.
//! Operands arrive as register values (`u64`, truncated to XLEN);
//! signedness is a property of the operation, not the operand.
//!
//! Division by zero and signed overflow are defined results, not
//! errors: a zero divisor gives an all-ones quotient and passes the
//! dividend through as the remainder, and the most-negative-value
//! divided by minus-one wraps to itself with a zero remainder.

use crate::eei::Xlen;
use crate::utils::{
    interpret_i32_as_unsigned, interpret_i64_as_unsigned, interpret_u32_as_signed,
    interpret_u64_as_signed, sign_extend_word,
};

/// Low XLEN bits of the product. The low half is the same for signed
/// and unsigned interpretations.
pub fn mul(a: u64, b: u64, xlen: Xlen) -> u64 {
    a.wrapping_mul(b) & xlen.mask()
}

/// High XLEN bits of the signed x signed product
pub fn mulh(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => {
            let a = i64::from(interpret_u32_as_signed(a as u32));
            let b = i64::from(interpret_u32_as_signed(b as u32));
            interpret_i64_as_unsigned(a * b) >> 32
        }
        Xlen::Xlen64 => {
            let a = i128::from(interpret_u64_as_signed(a));
            let b = i128::from(interpret_u64_as_signed(b));
            ((a * b) >> 64) as u64
        }
    }
}

/// High XLEN bits of the unsigned x unsigned product
pub fn mulhu(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => (u64::from(a as u32) * u64::from(b as u32)) >> 32,
        Xlen::Xlen64 => ((u128::from(a) * u128::from(b)) >> 64) as u64,
    }
}

/// High XLEN bits of the signed a x unsigned b product
pub fn mulhsu(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => {
            let a = i64::from(interpret_u32_as_signed(a as u32));
            let b = i64::from(b as u32);
            interpret_i64_as_unsigned(a * b) >> 32
        }
        Xlen::Xlen64 => {
            let a = i128::from(interpret_u64_as_signed(a));
            let b = i128::from(b);
            ((a * b) >> 64) as u64
        }
    }
}

/// Signed truncated quotient. Divisor zero gives all ones; the
/// overflowing INT_MIN / -1 wraps back to INT_MIN.
pub fn div(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => {
            let a = interpret_u32_as_signed(a as u32);
            let b = interpret_u32_as_signed(b as u32);
            if b == 0 {
                0xffff_ffff
            } else {
                u64::from(interpret_i32_as_unsigned(a.wrapping_div(b)))
            }
        }
        Xlen::Xlen64 => {
            let a = interpret_u64_as_signed(a);
            let b = interpret_u64_as_signed(b);
            if b == 0 {
                u64::MAX
            } else {
                interpret_i64_as_unsigned(a.wrapping_div(b))
            }
        }
    }
}

/// Unsigned quotient; divisor zero gives all ones
pub fn divu(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => {
            let (a, b) = (a as u32, b as u32);
            if b == 0 {
                0xffff_ffff
            } else {
                u64::from(a / b)
            }
        }
        Xlen::Xlen64 => {
            if b == 0 {
                u64::MAX
            } else {
                a / b
            }
        }
    }
}

/// Signed remainder, taking the sign of the dividend. Divisor zero
/// passes the dividend through; the overflow case has remainder
/// zero.
pub fn rem(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => {
            let a = interpret_u32_as_signed(a as u32);
            let b = interpret_u32_as_signed(b as u32);
            if b == 0 {
                u64::from(interpret_i32_as_unsigned(a))
            } else {
                u64::from(interpret_i32_as_unsigned(a.wrapping_rem(b)))
            }
        }
        Xlen::Xlen64 => {
            let a = interpret_u64_as_signed(a);
            let b = interpret_u64_as_signed(b);
            if b == 0 {
                interpret_i64_as_unsigned(a)
            } else {
                interpret_i64_as_unsigned(a.wrapping_rem(b))
            }
        }
    }
}

/// Unsigned remainder; divisor zero passes the dividend through
pub fn remu(a: u64, b: u64, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Xlen32 => {
            let (a, b) = (a as u32, b as u32);
            if b == 0 {
                u64::from(a)
            } else {
                u64::from(a % b)
            }
        }
        Xlen::Xlen64 => {
            if b == 0 {
                a
            } else {
                a % b
            }
        }
    }
}

// The W variants operate on the low 32 bits of each operand and
// sign-extend the 32-bit result to 64 bits (chapter 7, RV64M).

pub fn mulw(a: u64, b: u64) -> u64 {
    sign_extend_word(mul(a & 0xffff_ffff, b & 0xffff_ffff, Xlen::Xlen32))
}

pub fn divw(a: u64, b: u64) -> u64 {
    sign_extend_word(div(a & 0xffff_ffff, b & 0xffff_ffff, Xlen::Xlen32))
}

pub fn divuw(a: u64, b: u64) -> u64 {
    sign_extend_word(divu(a & 0xffff_ffff, b & 0xffff_ffff, Xlen::Xlen32))
}

pub fn remw(a: u64, b: u64) -> u64 {
    sign_extend_word(rem(a & 0xffff_ffff, b & 0xffff_ffff, Xlen::Xlen32))
}

pub fn remuw(a: u64, b: u64) -> u64 {
    sign_extend_word(remu(a & 0xffff_ffff, b & 0xffff_ffff, Xlen::Xlen32))
}
