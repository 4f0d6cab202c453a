//! F and D standard extensions for floating-point arithmetic
//!
//! Semantics for the single- and double-precision instructions of
//! chapters 11 and 12 of the unprivileged specification, grouped
//! into encoding families:
//!
//! * [`arith`]: the OP-FP computational group (FADD/FSUB/FMUL/FDIV/
//!   FSQRT) and the fused multiply-add opcodes
//! * [`compare`]: FMIN/FMAX and FEQ/FLT/FLE
//! * [`convert`]: the FCVT matrix between formats and integers
//! * [`bits`]: sign injection, FMV bit moves and FCLASS
//! * [`mem`]: FLW/FLD/FSW/FSD
//!
//! Every family follows the same shape: decode the fields, compute
//! the legality conjunction (opcode and function fields, extension
//! bits in misa, rounding-mode validity, RV64-only encodings), and
//! only then read operands and write results through the finish
//! helpers. Floating-point exceptional conditions never trap; they
//! accrue in fflags. Only the loads and stores can trap, through the
//! address-translation and memory interfaces.

use crate::eei::Eei;

mod arith;
mod bits;
mod compare;
mod convert;
mod mem;

pub use arith::{execute_fp_fused, execute_fp_op};
pub use bits::{execute_fp_class, execute_fp_mv, execute_fp_sign_inject};
pub use compare::{execute_fp_cmp, execute_fp_min_max};
pub use convert::execute_fp_cvt;
pub use mem::{execute_fp_load, execute_fp_store};

/// The operand format of a floating-point instruction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

/// Whether misa advertises what the format needs: F for
/// single-precision, F and D for double-precision
fn precision_supported<E: Eei>(eei: &E, precision: Precision) -> bool {
    match precision {
        Precision::Single => eei.extension_supported('F'),
        Precision::Double => eei.extension_supported('F') && eei.extension_supported('D'),
    }
}
